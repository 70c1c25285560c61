// src/ingest/mod.rs
// Feed transport. The pipeline consumes one feed document per run; the
// source is a trait so tests can inject fixtures without HTTP.

pub mod entry;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::PipelineError;

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the raw feed document. Any network failure or non-2xx status is
    /// fatal for the run; retries belong to the outer scheduler.
    async fn fetch(&self) -> Result<String, PipelineError>;
    fn name(&self) -> &'static str;
}

pub struct HttpFeedSource {
    url: String,
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(url: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("ai-daily-brief/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .expect("reqwest client");
        Self { url, client }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self) -> Result<String, PipelineError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| PipelineError::FetchFailure(format!("feed get: {e}")))?;
        let resp = resp
            .error_for_status()
            .map_err(|e| PipelineError::FetchFailure(format!("feed status: {e}")))?;
        resp.text()
            .await
            .map_err(|e| PipelineError::FetchFailure(format!("feed body: {e}")))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// In-memory source for tests and dry runs.
pub struct FixtureFeedSource {
    doc: String,
}

impl FixtureFeedSource {
    pub fn from_str(doc: &str) -> Self {
        Self {
            doc: doc.to_string(),
        }
    }
}

#[async_trait]
impl FeedSource for FixtureFeedSource {
    async fn fetch(&self) -> Result<String, PipelineError> {
        Ok(self.doc.clone())
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
