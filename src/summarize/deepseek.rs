// src/summarize/deepseek.rs
// DeepSeek chat-completions client (OpenAI-compatible wire format).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::ChatClient;

pub struct DeepSeekClient {
    http: reqwest::Client,
    api_key: Option<String>,
    api_url: String,
    model: String,
}

impl DeepSeekClient {
    pub fn new(api_key: Option<String>, api_url: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("ai-daily-brief/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("reqwest client");
        Self {
            http,
            api_key,
            api_url,
            model: "deepseek-chat".to_string(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }
}

#[async_trait]
impl ChatClient for DeepSeekClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return Err(anyhow!("DEEPSEEK_API_KEY is not set"));
        };

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: String,
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system,
                },
                Msg {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.3,
        };

        let url = format!("{}/chat/completions", self.api_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .bearer_auth(key)
            .json(&req)
            .send()
            .await
            .context("deepseek post")?
            .error_for_status()
            .context("deepseek non-2xx")?;

        let body: Resp = resp.json().await.context("deepseek decode")?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(anyhow!("deepseek returned no completion content"));
        }
        Ok(content)
    }

    fn name(&self) -> &'static str {
        "deepseek"
    }
}
