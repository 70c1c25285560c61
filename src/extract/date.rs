// src/extract/date.rs
// The feed's title convention ("2026-02-06日刊") embeds the authoritative
// publish date; the technical pubDate field is frequently stale or missing
// for this source, so the title-derived date wins whenever both exist.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;

fn date_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("date regex"))
}

/// Resolve the publish date from the entry title: the first embedded
/// `YYYY-MM-DD` as midnight UTC, or "yesterday relative to `now`" as a
/// documented fallback (not an error).
pub fn resolve_publish_date(title: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    if let Some(caps) = date_re().captures(title) {
        let ymd = (
            caps[1].parse::<i32>().ok(),
            caps[2].parse::<u32>().ok(),
            caps[3].parse::<u32>().ok(),
        );
        if let (Some(y), Some(m), Some(d)) = ymd {
            if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
                return Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
            }
        }
        tracing::warn!(title, "title date pattern present but not a calendar date");
    }
    now - Duration::days(1)
}
