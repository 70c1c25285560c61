// src/error.rs
// Fatal pipeline errors. Each variant marks the stage that aborted the run;
// the binary reports the message and exits non-zero. Malformed summarizer
// output is NOT fatal and therefore has no variant here (the summarizer
// degrades to a plain-text digest instead).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Transport failure or non-2xx status, feed fetch and webhook post alike.
    #[error("fetch failure: {0}")]
    FetchFailure(String),

    /// The feed document parsed but contained no item/entry element.
    #[error("feed contained no entries")]
    NoEntryFound,

    /// The latest entry carried no usable body (no content:encoded,
    /// description, or summary with text).
    #[error("latest entry has no body content")]
    NoBodyContent,

    /// Extraction over the cleaned body produced zero qualifying items.
    #[error("no news items extracted from entry body")]
    NoItemsExtracted,

    /// The chat completion call itself failed (auth, transport, empty reply).
    #[error("summarizer failure: {0}")]
    SummarizerFailure(String),

    /// The webhook answered 2xx but rejected the payload (errcode != 0),
    /// or no webhook URL was configured.
    #[error("delivery failure: {0}")]
    DeliveryFailure(String),
}
