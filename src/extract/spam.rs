// src/extract/spam.rs
// Promotional-content filter. Applied to the body HTML before structural
// extraction, since spam fragments can otherwise parse as spurious list
// items. Matching is case-insensitive substring; removal is line-granular so
// a bad fragment never takes a good item with it.

/// Canonical keyword set: the union of every upstream variant's list.
pub const DEFAULT_SPAM_KEYWORDS: &[&str] = &[
    "微信关注公众号",
    "关注公众号",
    "扫码关注",
    "二维码",
    "何夕2077",
    "加我进群",
    "前往官网查看完整版",
    "AI日报的小调整",
    "follow our account",
    "scan the qr code",
    "join our group",
];

#[derive(Debug, Clone)]
pub struct SpamFilter {
    // Lowercased once at construction.
    keywords: Vec<String>,
}

impl SpamFilter {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn default_rules() -> Self {
        let owned: Vec<String> = DEFAULT_SPAM_KEYWORDS.iter().map(|s| s.to_string()).collect();
        Self::new(&owned)
    }

    /// True when the fragment contains any configured promotional phrase.
    pub fn is_spam(&self, fragment: &str) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        let lower = fragment.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    /// Remove every line containing a promotional phrase; other lines pass
    /// through verbatim. Empty input yields empty output.
    pub fn clean(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }
        text.lines()
            .filter(|line| !self.is_spam(line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
