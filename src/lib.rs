// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod card;
pub mod config;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod notify;
pub mod pipeline;
pub mod summarize;

// ---- Re-exports for stable public API ----
pub use crate::card::MessagePayload;
pub use crate::config::{CardFormat, Settings, SummaryMode};
pub use crate::error::PipelineError;
pub use crate::extract::NewsItem;
pub use crate::ingest::entry::FeedEntry;
pub use crate::pipeline::run_once;
pub use crate::summarize::DigestOutcome;
