// src/extract/mod.rs
// News item extraction over the cleaned body HTML. The upstream daily uses
// two markup conventions: category headers followed by ordered lists, or one
// flat bulleted list. The shape is sniffed once and drives a tagged variant
// instead of two ad-hoc code paths.

pub mod date;
pub mod spam;

use once_cell::sync::OnceCell;
use regex::Regex;

use spam::SpamFilter;

/// The feed is already ordered by importance; everything past this is tail.
pub const MAX_ITEMS: usize = 10;
/// Titles at or below 5 chars are layout artifacts ("read more" footers).
const MIN_TITLE_CHARS: usize = 6;
/// Flat-mode items without a hyperlink take their title from the text head.
const FLAT_TITLE_CHARS: usize = 50;
/// Categories are shown as a fixed four-char code.
const CATEGORY_CHARS: usize = 4;

/// Boilerplate markers that survive the line-level spam filter but still mark
/// an item as noise. Distinct from the spam keyword list on purpose.
const TITLE_DENYLIST: &[&str] = &["剩余内容已省略", "关于运营调整"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    pub category: Option<String>,
    pub title: String,
    pub url: Option<String>,
    pub raw_text: String,
}

/// Structural variant of the entry body, chosen by one explicit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    /// Category headers with item lists underneath.
    Categorized,
    /// A bare list of items with no headers.
    Flat,
}

fn header_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<h[1-4][^>]*>.*?</h[1-4]>").expect("header regex"))
}

fn li_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)<li[^>]*>(.*?)</li>").expect("li regex"))
}

fn link_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<a\s[^>]*href\s*=\s*"([^"]+)"[^>]*>(.*?)</a>"#).expect("link regex")
    })
}

fn tags_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("tags regex"))
}

fn ws_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("ws regex"))
}

pub fn detect_shape(body_html: &str) -> BodyShape {
    if header_re().is_match(body_html) {
        BodyShape::Categorized
    } else {
        BodyShape::Flat
    }
}

/// Walk the body HTML and yield qualifying news items in document order,
/// capped at [`MAX_ITEMS`]. The spam filter runs as a line-level pre-pass and
/// again per candidate fragment.
pub fn extract_items(body_html: &str, filter: &SpamFilter) -> Vec<NewsItem> {
    let cleaned = filter.clean(body_html);
    let mut items = match detect_shape(&cleaned) {
        BodyShape::Categorized => extract_categorized(&cleaned, filter),
        BodyShape::Flat => extract_flat(&cleaned, filter),
    };
    items.truncate(MAX_ITEMS);
    items
}

fn extract_categorized(html: &str, filter: &SpamFilter) -> Vec<NewsItem> {
    let headers: Vec<_> = header_re().find_iter(html).collect();
    let mut out = Vec::new();
    for (i, h) in headers.iter().enumerate() {
        let category = strip_markup(h.as_str());
        let segment_end = headers.get(i + 1).map(|n| n.start()).unwrap_or(html.len());
        let segment = &html[h.end()..segment_end];
        for caps in li_re().captures_iter(segment) {
            if let Some(item) = candidate(&caps[1], Some(&category), filter) {
                out.push(item);
            }
        }
    }
    out
}

fn extract_flat(html: &str, filter: &SpamFilter) -> Vec<NewsItem> {
    li_re()
        .captures_iter(html)
        .filter_map(|caps| candidate(&caps[1], None, filter))
        .collect()
}

fn candidate(inner_html: &str, category: Option<&str>, filter: &SpamFilter) -> Option<NewsItem> {
    if filter.is_spam(inner_html) {
        return None;
    }

    let (url, link_text) = match link_re().captures(inner_html) {
        Some(caps) => (
            Some(caps[1].trim().to_string()),
            Some(strip_markup(&caps[2])),
        ),
        None => (None, None),
    };

    let raw_text = strip_markup(inner_html);
    let title = match link_text.filter(|t| !t.is_empty()) {
        Some(t) => t,
        None => truncate_chars(&raw_text, FLAT_TITLE_CHARS),
    };

    if title.chars().count() < MIN_TITLE_CHARS {
        return None;
    }
    if TITLE_DENYLIST
        .iter()
        .any(|m| title.contains(m) || raw_text.contains(m))
    {
        return None;
    }

    let category = category
        .map(|c| truncate_chars(c, CATEGORY_CHARS))
        .filter(|c| !c.is_empty());

    Some(NewsItem {
        category,
        title,
        url: url.filter(|u| !u.is_empty()),
        raw_text,
    })
}

/// Strip remaining markup tags, decode entities, collapse whitespace.
pub fn strip_markup(fragment: &str) -> String {
    let no_tags = tags_re().replace_all(fragment, " ");
    let decoded = html_escape::decode_html_entities(no_tags.as_ref()).to_string();
    ws_re().replace_all(&decoded, " ").trim().to_string()
}

/// Char-boundary-safe prefix truncation.
pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}
