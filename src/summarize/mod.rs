// src/summarize/mod.rs
// Digest summarizer boundary. One request per run; the model's reply is
// post-processed defensively because it is not trusted to respect either the
// requested shape or the length caps.

pub mod deepseek;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;

use crate::config::SummaryMode;
use crate::error::PipelineError;
use crate::extract::{truncate_chars, NewsItem};

/// Hard cap on any free-text summary field, in chars.
pub const SUMMARY_MAX_CHARS: usize = 100;

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Single chat completion: system instruction + user content in, raw
    /// assistant text out.
    async fn complete(&self, system: &str, user: &str) -> anyhow::Result<String>;
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DigestItem {
    #[serde(default)]
    pub category: Option<String>,
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub summary: String,
    pub items: Vec<DigestItem>,
}

/// Outcome of a summarizer run. A malformed structured reply degrades to
/// `Unstructured`; it never fails the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestOutcome {
    Structured(Digest),
    Unstructured(String),
}

impl DigestOutcome {
    pub fn summary(&self) -> &str {
        match self {
            DigestOutcome::Structured(d) => &d.summary,
            DigestOutcome::Unstructured(s) => s,
        }
    }
}

const SYSTEM_PLAIN: &str = "你是一个专业的 AI 资讯编辑，负责为企业学习群生成每日 AI 简讯。\n\n你的任务：\n1. 从多条 AI 资讯中提取最重要的 2-3 条\n2. 生成极简、客观、内参风格的摘要\n3. 总字数严格控制在 100 字以内\n4. 不使用感叹号、营销话术、\"必须\"、\"一定要\"等词\n5. 采用\"内部简报\"的语气\n6. 突出技术突破和行业动态\n7. 绝对不要包含任何推广信息、公众号推广、联系方式\n\n输出格式：直接输出摘要文本，不要使用 JSON 格式。";

const SYSTEM_STRUCTURED: &str = "你是一个专业的 AI 资讯编辑，负责为企业学习群生成每日 AI 简讯。\n\n你的任务：\n1. 生成极简、客观、内参风格的总摘要（100 字以内）\n2. 挑选最重要的新闻条目，保留原始标题与链接\n3. 不使用感叹号、营销话术，采用\"内部简报\"的语气\n4. 绝对不要包含任何推广信息\n\n输出格式：只输出一个 JSON 代码块：\n```json\n{\"summary\": \"总摘要\", \"news\": [{\"category\": \"四字分类\", \"title\": \"新闻标题\", \"url\": \"链接\"}]}\n```";

/// Build the fixed editorial prompts for the given mode and item list.
pub fn build_prompts(mode: SummaryMode, items: &[NewsItem]) -> (&'static str, String) {
    let mut listing = String::new();
    for (i, item) in items.iter().enumerate() {
        match &item.category {
            Some(c) => listing.push_str(&format!("{}. [{}] {}\n", i + 1, c, item.title)),
            None => listing.push_str(&format!("{}. {}\n", i + 1, item.title)),
        }
        if let Some(u) = &item.url {
            listing.push_str(&format!("   {u}\n"));
        }
    }
    let user = format!("以下是今日的 AI 资讯，请按要求生成简讯：\n\n{listing}");
    let system = match mode {
        SummaryMode::Plain => SYSTEM_PLAIN,
        SummaryMode::Structured => SYSTEM_STRUCTURED,
    };
    (system, user)
}

/// Run the summarizer once and post-process its reply. Transport errors and
/// missing credentials are fatal; malformed output is not.
pub async fn summarize(
    chat: &dyn ChatClient,
    mode: SummaryMode,
    items: &[NewsItem],
) -> Result<DigestOutcome, PipelineError> {
    let (system, user) = build_prompts(mode, items);
    let raw = chat
        .complete(system, &user)
        .await
        .map_err(|e| PipelineError::SummarizerFailure(format!("{e:#}")))?;
    tracing::debug!(provider = chat.name(), chars = raw.chars().count(), "summarizer replied");
    Ok(parse_response(mode, &raw))
}

fn fenced_json_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fenced json regex")
    })
}

#[derive(Deserialize)]
struct StructuredReply {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    news: Vec<DigestItem>,
}

/// Defensive reply parsing: fenced JSON block first, then the raw reply as
/// JSON, then the first `{...}` span; anything else degrades to unstructured
/// summary text. Every free-text summary is hard-truncated to
/// [`SUMMARY_MAX_CHARS`].
pub fn parse_response(mode: SummaryMode, raw: &str) -> DigestOutcome {
    if mode == SummaryMode::Structured {
        let candidates = [
            fenced_json_re()
                .captures(raw)
                .map(|c| c.get(1).map_or("", |m| m.as_str()).to_string()),
            Some(raw.trim().to_string()),
            brace_span(raw).map(|s| s.to_string()),
        ];
        for cand in candidates.into_iter().flatten() {
            if let Ok(reply) = serde_json::from_str::<StructuredReply>(&cand) {
                return DigestOutcome::Structured(Digest {
                    summary: truncate_chars(reply.summary.trim(), SUMMARY_MAX_CHARS),
                    items: reply.news,
                });
            }
        }
        tracing::warn!("structured summarizer reply did not parse; using text fallback");
    }
    DigestOutcome::Unstructured(truncate_chars(raw.trim(), SUMMARY_MAX_CHARS))
}

fn brace_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Deterministic client for tests and offline dry runs.
pub struct FixedReplyClient {
    pub reply: String,
}

#[async_trait]
impl ChatClient for FixedReplyClient {
    async fn complete(&self, _system: &str, _user: &str) -> anyhow::Result<String> {
        Ok(self.reply.clone())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_json_block_is_preferred() {
        let raw = "说明文字\n```json\n{\"summary\": \"今日摘要\", \"news\": [{\"title\": \"条目一\"}]}\n```\n尾注";
        match parse_response(SummaryMode::Structured, raw) {
            DigestOutcome::Structured(d) => {
                assert_eq!(d.summary, "今日摘要");
                assert_eq!(d.items.len(), 1);
                assert_eq!(d.items[0].title, "条目一");
            }
            other => panic!("expected structured, got {other:?}"),
        }
    }

    #[test]
    fn bare_json_reply_parses_too() {
        let raw = r#"{"summary": "s", "news": []}"#;
        assert!(matches!(
            parse_response(SummaryMode::Structured, raw),
            DigestOutcome::Structured(_)
        ));
    }

    #[test]
    fn malformed_reply_degrades_to_unstructured() {
        let raw = "今天没有 JSON，只有一段话。";
        match parse_response(SummaryMode::Structured, raw) {
            DigestOutcome::Unstructured(s) => assert_eq!(s, raw),
            other => panic!("expected unstructured, got {other:?}"),
        }
    }

    #[test]
    fn summary_is_truncated_for_any_reply_length() {
        let long = "字".repeat(500);
        for mode in [SummaryMode::Plain, SummaryMode::Structured] {
            let out = parse_response(mode, &long);
            assert!(out.summary().chars().count() <= SUMMARY_MAX_CHARS);
        }
        let raw = format!("{{\"summary\": \"{}\", \"news\": []}}", "字".repeat(300));
        let out = parse_response(SummaryMode::Structured, &raw);
        assert_eq!(out.summary().chars().count(), SUMMARY_MAX_CHARS);
    }

    #[test]
    fn plain_mode_never_tries_json() {
        let raw = r#"{"summary": "s", "news": []}"#;
        assert!(matches!(
            parse_response(SummaryMode::Plain, raw),
            DigestOutcome::Unstructured(_)
        ));
    }

    #[test]
    fn prompts_number_items_in_order() {
        let items = vec![
            NewsItem {
                category: Some("产品速报".into()),
                title: "第一条".into(),
                url: Some("https://a.test/1".into()),
                raw_text: "第一条".into(),
            },
            NewsItem {
                category: None,
                title: "第二条".into(),
                url: None,
                raw_text: "第二条".into(),
            },
        ];
        let (system, user) = build_prompts(SummaryMode::Plain, &items);
        assert!(system.contains("内部简报"));
        assert!(user.contains("1. [产品速报] 第一条"));
        assert!(user.contains("2. 第二条"));
    }
}
