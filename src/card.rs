// src/card.rs
// Maps the digest + resolved date into the WeChat Work message schema,
// enforcing the delivery surface's field-length and count caps. The payload
// is immutable once built; no partial card is ever produced.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::CardFormat;
use crate::extract::{truncate_chars, NewsItem};
use crate::summarize::{DigestOutcome, SUMMARY_MAX_CHARS};

/// The card must never be actionless, even with zero valid item URLs.
pub const FALLBACK_ACTION_URL: &str =
    "https://justlovemaki.github.io/CloudFlare-AI-Insight-Daily/";
const SOURCE_ICON_URL: &str =
    "https://wework.qpic.cn/wwpic/252813_jOfDHtcISzuodLa_1629280209/0";
const SOURCE_DESC: &str = "AI 每日简讯";
const MAIN_TITLE_DESC: &str = "每日 AI 行业动态精选";

/// WeChat caps horizontal_content_list at 6; three is the house style.
const MAX_QUICK_LINKS: usize = 3;
/// Items listed in a text/structured body.
const MAX_LISTED_ITEMS: usize = 5;
/// Per-entry display title limit imposed by the card surface.
const LINK_TITLE_MAX_CHARS: usize = 20;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "msgtype", rename_all = "snake_case")]
pub enum MessagePayload {
    Text { text: TextContent },
    TemplateCard { template_card: TemplateCard },
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TemplateCard {
    pub card_type: String,
    pub source: CardSource,
    pub main_title: MainTitle,
    pub sub_title_text: String,
    pub horizontal_content_list: Vec<HorizontalEntry>,
    pub jump_list: Vec<JumpEntry>,
    pub card_action: CardAction,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CardSource {
    pub icon_url: String,
    pub desc: String,
    pub desc_color: u8,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MainTitle {
    pub title: String,
    pub desc: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HorizontalEntry {
    pub keyname: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JumpEntry {
    #[serde(rename = "type")]
    pub kind: u8,
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CardAction {
    #[serde(rename = "type")]
    pub kind: u8,
    pub url: String,
}

/// Item view the assembler links to, regardless of which summarizer variant
/// produced it.
struct LinkCandidate<'a> {
    title: &'a str,
    url: Option<&'a str>,
}

/// Build the outgoing payload from the digest, the resolved publish date and
/// the extracted items. Structured digests drive both the body listing and
/// the quick links; unstructured digests fall back to the extracted items for
/// links and use the summary text as body.
pub fn assemble(
    format: CardFormat,
    date: DateTime<Utc>,
    entry_link: &str,
    items: &[NewsItem],
    outcome: &DigestOutcome,
) -> MessagePayload {
    match format {
        CardFormat::TemplateCard => MessagePayload::TemplateCard {
            template_card: build_template_card(date, entry_link, items, outcome),
        },
        CardFormat::Text => MessagePayload::Text {
            text: TextContent {
                content: build_text_message(date, entry_link, outcome),
            },
        },
    }
}

pub fn build_template_card(
    date: DateTime<Utc>,
    entry_link: &str,
    items: &[NewsItem],
    outcome: &DigestOutcome,
) -> TemplateCard {
    let action_url = default_link(entry_link);
    TemplateCard {
        card_type: "text_notice".to_string(),
        source: CardSource {
            icon_url: SOURCE_ICON_URL.to_string(),
            desc: SOURCE_DESC.to_string(),
            desc_color: 3,
        },
        main_title: MainTitle {
            title: main_title(date),
            desc: MAIN_TITLE_DESC.to_string(),
        },
        sub_title_text: body_text(outcome),
        horizontal_content_list: quick_links(items, outcome),
        jump_list: vec![JumpEntry {
            kind: 1,
            url: action_url.clone(),
            title: "查看全部".to_string(),
        }],
        card_action: CardAction {
            kind: 1,
            url: action_url,
        },
    }
}

pub fn build_text_message(
    date: DateTime<Utc>,
    entry_link: &str,
    outcome: &DigestOutcome,
) -> String {
    format!(
        "{}\n{}\n\n{}\n\n查看全部：{}",
        main_title(date),
        MAIN_TITLE_DESC,
        body_text(outcome),
        default_link(entry_link),
    )
}

fn main_title(date: DateTime<Utc>) -> String {
    format!("{}AI简讯", date.format("%Y年%m月%d日"))
}

/// Structured variant: numbered "category: title" listing. Unstructured
/// variant: the (already truncated) summary text.
fn body_text(outcome: &DigestOutcome) -> String {
    match outcome {
        DigestOutcome::Structured(digest) if !digest.items.is_empty() => digest
            .items
            .iter()
            .take(MAX_LISTED_ITEMS)
            .enumerate()
            .map(|(i, item)| match &item.category {
                Some(c) => format!("{}. {}：{}", i + 1, c, item.title),
                None => format!("{}. {}", i + 1, item.title),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        DigestOutcome::Structured(digest) => truncate_chars(&digest.summary, SUMMARY_MAX_CHARS),
        DigestOutcome::Unstructured(summary) => truncate_chars(summary, SUMMARY_MAX_CHARS),
    }
}

fn quick_links(items: &[NewsItem], outcome: &DigestOutcome) -> Vec<HorizontalEntry> {
    let candidates: Vec<LinkCandidate<'_>> = match outcome {
        DigestOutcome::Structured(digest) if !digest.items.is_empty() => digest
            .items
            .iter()
            .map(|i| LinkCandidate {
                title: &i.title,
                url: i.url.as_deref(),
            })
            .collect(),
        _ => items
            .iter()
            .map(|i| LinkCandidate {
                title: &i.title,
                url: i.url.as_deref(),
            })
            .collect(),
    };

    candidates
        .into_iter()
        .filter_map(|c| {
            let url = c.url.filter(|u| is_absolute_url(u))?;
            Some((c.title, url))
        })
        .take(MAX_QUICK_LINKS)
        .enumerate()
        .map(|(i, (title, url))| HorizontalEntry {
            keyname: format!("新闻{}", i + 1),
            value: truncate_chars(title, LINK_TITLE_MAX_CHARS),
            kind: 1,
            url: url.to_string(),
        })
        .collect()
}

fn default_link(entry_link: &str) -> String {
    if is_absolute_url(entry_link) {
        entry_link.to_string()
    } else {
        FALLBACK_ACTION_URL.to_string()
    }
}

/// Scheme-prefix syntax check; the card surface rejects relative URLs.
pub fn is_absolute_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}
