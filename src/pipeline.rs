// src/pipeline.rs
// One run of the digest pipeline, strictly sequential:
// fetch -> parse entry -> filter + extract -> resolve date -> summarize ->
// assemble -> deliver. Every collaborator is injected; nothing reads ambient
// state, and a fatal error aborts the run in place.

use chrono::Utc;
use tracing::info;

use crate::card::{self, MessagePayload};
use crate::config::Settings;
use crate::error::PipelineError;
use crate::extract::{self, date::resolve_publish_date, spam::SpamFilter};
use crate::ingest::{entry::parse_latest_entry, FeedSource};
use crate::notify::Notifier;
use crate::summarize::{self, ChatClient};

/// Returns the assembled payload (also delivered, unless `dry_run`).
pub async fn run_once(
    settings: &Settings,
    feed: &dyn FeedSource,
    chat: &dyn ChatClient,
    notifier: &dyn Notifier,
) -> Result<MessagePayload, PipelineError> {
    info!(source = feed.name(), url = %settings.feed_url, "fetching feed");
    let doc = feed.fetch().await?;

    let entry = parse_latest_entry(&doc)?;
    info!(title = %entry.title, body_chars = entry.body_html.chars().count(), "parsed latest entry");

    let filter = SpamFilter::new(&settings.spam_keywords);
    let items = extract::extract_items(&entry.body_html, &filter);
    if items.is_empty() {
        return Err(PipelineError::NoItemsExtracted);
    }
    info!(count = items.len(), "extracted news items");

    let date = resolve_publish_date(&entry.title, Utc::now());

    let outcome = summarize::summarize(chat, settings.summary_mode, &items).await?;

    let payload = card::assemble(settings.card_format, date, &entry.link, &items, &outcome);

    if settings.dry_run {
        let rendered = serde_json::to_string_pretty(&payload)
            .unwrap_or_else(|_| "<unrenderable payload>".to_string());
        info!("dry run, payload not sent:\n{rendered}");
    } else {
        notifier.deliver(&payload).await?;
        info!(notifier = notifier.name(), "digest delivered");
    }

    Ok(payload)
}
