// src/notify/wechat.rs
// WeChat Work (企业微信) group webhook. The webhook returns 200 even for some
// application-level failures, so the {errcode, errmsg} body is the real
// success signal.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::Notifier;
use crate::card::MessagePayload;
use crate::error::PipelineError;

pub struct WeChatNotifier {
    webhook_url: Option<String>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct WebhookReply {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

impl WeChatNotifier {
    pub fn new(webhook_url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("ai-daily-brief/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            webhook_url: webhook_url.filter(|u| !u.trim().is_empty()),
            client,
        }
    }
}

/// Accept only an explicit errcode 0. A 2xx reply whose body cannot be read
/// as {errcode, errmsg} is unverified delivery and counts as a failure.
fn classify_reply(body: &str) -> Result<(), PipelineError> {
    match serde_json::from_str::<WebhookReply>(body) {
        Ok(reply) if reply.errcode == 0 => Ok(()),
        Ok(reply) => Err(PipelineError::DeliveryFailure(format!(
            "errcode={} errmsg={}",
            reply.errcode, reply.errmsg
        ))),
        Err(e) => Err(PipelineError::DeliveryFailure(format!(
            "unreadable webhook reply: {e}"
        ))),
    }
}

#[async_trait]
impl Notifier for WeChatNotifier {
    async fn deliver(&self, payload: &MessagePayload) -> Result<(), PipelineError> {
        let Some(url) = self.webhook_url.as_deref() else {
            return Err(PipelineError::DeliveryFailure(
                "WECHAT_WEBHOOK_URL is not set".to_string(),
            ));
        };

        let resp = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| PipelineError::FetchFailure(format!("webhook post: {e}")))?
            .error_for_status()
            .map_err(|e| PipelineError::FetchFailure(format!("webhook status: {e}")))?;

        let body = resp
            .text()
            .await
            .map_err(|e| PipelineError::FetchFailure(format!("webhook body: {e}")))?;
        classify_reply(&body)?;
        tracing::info!("webhook accepted payload");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "wechat"
    }
}
