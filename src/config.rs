// src/config.rs
// All ambient configuration is resolved here, once, at startup. Components
// receive a `Settings` value and never read env themselves. The promo
// keyword list is the built-in set merged with an optional TOML/JSON file
// (path override via SPAM_KEYWORDS_PATH).

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::extract::spam::DEFAULT_SPAM_KEYWORDS;

const ENV_KEYWORDS_PATH: &str = "SPAM_KEYWORDS_PATH";

const DEFAULT_FEED_URL: &str =
    "https://justlovemaki.github.io/CloudFlare-AI-Insight-Daily/rss.xml";
const DEFAULT_DEEPSEEK_API_URL: &str = "https://api.deepseek.com";

/// Outgoing message shape: WeChat Work `template_card` or plain `text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardFormat {
    Text,
    TemplateCard,
}

/// `Structured` asks the model for a JSON digest; `Plain` for prose only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryMode {
    Plain,
    Structured,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub feed_url: String,
    pub webhook_url: Option<String>,
    pub deepseek_api_key: Option<String>,
    pub deepseek_api_url: String,
    /// Entries older than this many days are considered stale.
    pub days_back: i64,
    /// Paginated-feed fetch depth; 1 = first page only.
    pub fetch_pages: u32,
    pub card_format: CardFormat,
    pub summary_mode: SummaryMode,
    pub dry_run: bool,
    pub spam_keywords: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            webhook_url: None,
            deepseek_api_key: None,
            deepseek_api_url: DEFAULT_DEEPSEEK_API_URL.to_string(),
            days_back: 1,
            fetch_pages: 1,
            card_format: CardFormat::TemplateCard,
            summary_mode: SummaryMode::Structured,
            dry_run: false,
            spam_keywords: builtin_keywords(),
        }
    }
}

impl Settings {
    /// Build settings from env, falling back to defaults field by field.
    /// A broken keyword file is logged and skipped rather than fatal.
    pub fn from_env() -> Self {
        let base = Settings::default();
        let spam_keywords = match load_keywords_default() {
            Ok(extra) => merge_keywords(builtin_keywords(), extra),
            Err(e) => {
                tracing::warn!(error = %e, "keyword file unusable, using built-in list");
                builtin_keywords()
            }
        };
        Self {
            feed_url: env_str("FEED_URL").unwrap_or(base.feed_url),
            webhook_url: env_str("WECHAT_WEBHOOK_URL"),
            deepseek_api_key: env_str("DEEPSEEK_API_KEY"),
            deepseek_api_url: env_str("DEEPSEEK_API_URL").unwrap_or(base.deepseek_api_url),
            days_back: env_parse("FEED_FILTER_DAYS").unwrap_or(base.days_back),
            fetch_pages: env_parse("FEED_FETCH_PAGES").unwrap_or(base.fetch_pages),
            card_format: env_str("CARD_FORMAT")
                .and_then(|s| parse_card_format(&s))
                .unwrap_or(base.card_format),
            summary_mode: env_str("SUMMARY_MODE")
                .and_then(|s| parse_summary_mode(&s))
                .unwrap_or(base.summary_mode),
            dry_run: env_str("DRY_RUN").map(|s| is_truthy(&s)).unwrap_or(false),
            spam_keywords,
        }
    }
}

fn env_str(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_str(name).and_then(|s| s.parse().ok())
}

fn parse_card_format(s: &str) -> Option<CardFormat> {
    match s.to_ascii_lowercase().as_str() {
        "text" => Some(CardFormat::Text),
        "template_card" | "card" => Some(CardFormat::TemplateCard),
        _ => None,
    }
}

fn parse_summary_mode(s: &str) -> Option<SummaryMode> {
    match s.to_ascii_lowercase().as_str() {
        "plain" => Some(SummaryMode::Plain),
        "structured" | "json" => Some(SummaryMode::Structured),
        _ => None,
    }
}

fn is_truthy(s: &str) -> bool {
    matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

fn builtin_keywords() -> Vec<String> {
    DEFAULT_SPAM_KEYWORDS.iter().map(|s| s.to_string()).collect()
}

/// Built-ins first, file extras appended, duplicates dropped.
fn merge_keywords(builtin: Vec<String>, extra: Vec<String>) -> Vec<String> {
    let mut out = builtin;
    for kw in extra {
        if !out.contains(&kw) {
            out.push(kw);
        }
    }
    out
}

/// Load extra keywords from an explicit path. Supports TOML or JSON formats.
pub fn load_keywords_from(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading keywords from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_keywords(&content, ext.as_str())
}

/// Load extra keywords using env var + fallbacks:
/// 1) $SPAM_KEYWORDS_PATH
/// 2) config/spam_keywords.toml
/// 3) config/spam_keywords.json
pub fn load_keywords_default() -> Result<Vec<String>> {
    if let Ok(p) = std::env::var(ENV_KEYWORDS_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_keywords_from(&pb);
        } else {
            return Err(anyhow!("SPAM_KEYWORDS_PATH points to non-existent path"));
        }
    }
    let toml_p = PathBuf::from("config/spam_keywords.toml");
    if toml_p.exists() {
        return load_keywords_from(&toml_p);
    }
    let json_p = PathBuf::from("config/spam_keywords.json");
    if json_p.exists() {
        return load_keywords_from(&json_p);
    }
    Ok(Vec::new())
}

fn parse_keywords(s: &str, hint_ext: &str) -> Result<Vec<String>> {
    // Try TOML first if hinted or content looks like toml.
    let try_toml = hint_ext == "toml" || s.contains("keywords");
    if try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    // Try JSON array
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    // Fallback: also try TOML if not attempted
    if !try_toml {
        if let Ok(v) = parse_toml(s) {
            return Ok(v);
        }
    }
    Err(anyhow!("unsupported keyword file format"))
}

fn parse_toml(s: &str) -> Result<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct TomlKw {
        keywords: Vec<String>,
    }
    let v: TomlKw = toml::from_str(s)?;
    Ok(clean_list(v.keywords))
}

fn parse_json(s: &str) -> Result<Vec<String>> {
    let v: Vec<String> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out = Vec::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() && !out.iter().any(|e| e == t) {
            out.push(t.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    fn clear_pipeline_env() {
        for name in [
            "FEED_URL",
            "WECHAT_WEBHOOK_URL",
            "DEEPSEEK_API_KEY",
            "DEEPSEEK_API_URL",
            "FEED_FILTER_DAYS",
            "FEED_FETCH_PAGES",
            "CARD_FORMAT",
            "SUMMARY_MODE",
            "DRY_RUN",
            ENV_KEYWORDS_PATH,
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn keyword_file_trim_dedup_and_formats_work() {
        let toml = r#"keywords = [" 付费社群 ", "", "限时优惠", "限时优惠"]"#;
        let json = r#"["限时优惠", "  付费社群  ", ""]"#;
        let toml_out = parse_toml(toml).unwrap();
        assert_eq!(
            toml_out,
            vec!["付费社群".to_string(), "限时优惠".to_string()]
        );
        let json_out = parse_json(json).unwrap();
        assert_eq!(
            json_out,
            vec!["限时优惠".to_string(), "付费社群".to_string()]
        );
    }

    #[test]
    fn merge_keeps_builtins_and_appends_new_phrases_once() {
        let merged = merge_keywords(
            builtin_keywords(),
            vec!["付费社群".to_string(), "扫码关注".to_string()],
        );
        assert!(merged.iter().any(|k| k == "付费社群"));
        // Already built in, must not be duplicated.
        assert_eq!(merged.iter().filter(|k| *k == "扫码关注").count(), 1);
        assert_eq!(merged.len(), DEFAULT_SPAM_KEYWORDS.len() + 1);
    }

    #[test]
    fn format_and_mode_parsers_accept_known_names_only() {
        assert_eq!(parse_card_format("text"), Some(CardFormat::Text));
        assert_eq!(
            parse_card_format("Template_Card"),
            Some(CardFormat::TemplateCard)
        );
        assert_eq!(parse_card_format("markdown"), None);
        assert_eq!(parse_summary_mode("plain"), Some(SummaryMode::Plain));
        assert_eq!(parse_summary_mode("JSON"), Some(SummaryMode::Structured));
        assert_eq!(parse_summary_mode("verbose"), None);
        assert!(is_truthy("1") && is_truthy("TRUE") && !is_truthy("0"));
    }

    #[serial_test::serial]
    #[test]
    fn from_env_overrides_defaults_field_by_field() {
        // Isolate CWD so a real config/ in the repo cannot interfere.
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        clear_pipeline_env();

        let base = Settings::from_env();
        assert_eq!(base.feed_url, DEFAULT_FEED_URL);
        assert_eq!(base.card_format, CardFormat::TemplateCard);
        assert_eq!(base.summary_mode, SummaryMode::Structured);
        assert!(!base.dry_run);
        assert_eq!(base.spam_keywords.len(), DEFAULT_SPAM_KEYWORDS.len());

        env::set_var("FEED_URL", "https://feeds.test/rss.xml");
        env::set_var("CARD_FORMAT", "text");
        env::set_var("SUMMARY_MODE", "plain");
        env::set_var("DRY_RUN", "true");
        env::set_var("FEED_FILTER_DAYS", "3");
        let s = Settings::from_env();
        assert_eq!(s.feed_url, "https://feeds.test/rss.xml");
        assert_eq!(s.card_format, CardFormat::Text);
        assert_eq!(s.summary_mode, SummaryMode::Plain);
        assert!(s.dry_run);
        assert_eq!(s.days_back, 3);

        // Unrecognized values fall back instead of failing the run.
        env::set_var("CARD_FORMAT", "smoke-signal");
        env::set_var("FEED_FILTER_DAYS", "yesterday");
        let s2 = Settings::from_env();
        assert_eq!(s2.card_format, CardFormat::TemplateCard);
        assert_eq!(s2.days_back, 1);

        clear_pipeline_env();
        env::set_current_dir(&old).unwrap();
    }

    #[serial_test::serial]
    #[test]
    fn keyword_file_merges_over_builtins_with_env_path_priority() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        clear_pipeline_env();

        // No file anywhere, built-ins only.
        let none = Settings::from_env();
        assert_eq!(none.spam_keywords.len(), DEFAULT_SPAM_KEYWORDS.len());

        // CWD fallback: config/spam_keywords.toml.
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(
            tmp.path().join("config/spam_keywords.toml"),
            "keywords = [\"付费社群\"]\n",
        )
        .unwrap();
        let from_cwd = Settings::from_env();
        assert!(from_cwd.spam_keywords.iter().any(|k| k == "付费社群"));
        assert!(from_cwd.spam_keywords.iter().any(|k| k == "扫码关注"));

        // Env path wins over the CWD fallback.
        let p_json = tmp.path().join("extra_keywords.json");
        fs::write(&p_json, r#"["限时优惠"]"#).unwrap();
        env::set_var(ENV_KEYWORDS_PATH, p_json.display().to_string());
        let from_env_path = Settings::from_env();
        assert!(from_env_path.spam_keywords.iter().any(|k| k == "限时优惠"));
        assert!(!from_env_path.spam_keywords.iter().any(|k| k == "付费社群"));

        // A dangling env path is skipped, not fatal.
        env::set_var(ENV_KEYWORDS_PATH, tmp.path().join("missing.toml").display().to_string());
        let dangling = Settings::from_env();
        assert_eq!(dangling.spam_keywords.len(), DEFAULT_SPAM_KEYWORDS.len());

        clear_pipeline_env();
        env::set_current_dir(&old).unwrap();
    }
}
