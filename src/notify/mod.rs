// src/notify/mod.rs
// Delivery boundary. The pipeline hands a finished payload to a notifier and
// treats any rejection as fatal for the run.

pub mod wechat;

use async_trait::async_trait;

use crate::card::MessagePayload;
use crate::error::PipelineError;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post the payload. Single attempt; a missed run is simply re-triggered
    /// at the next schedule, so there is no retry/backoff here.
    async fn deliver(&self, payload: &MessagePayload) -> Result<(), PipelineError>;
    fn name(&self) -> &'static str;
}
