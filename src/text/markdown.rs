/*!
 * Markdown to plain-text cleaning.
 *
 * Speech engines read symbols aloud, so headings, list markers, code,
 * link targets and the like are removed before synthesis.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Which group a rule belongs to, so callers can keep some markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    Structure,
    Link,
    Emphasis,
}

struct Rule {
    kind: RuleKind,
    pattern: Regex,
    replacement: &'static str,
}

fn rule(kind: RuleKind, pattern: &str, replacement: &'static str) -> Rule {
    Rule {
        kind,
        // patterns are literals below; a failure here is a programming error
        pattern: Regex::new(pattern).unwrap_or_else(|e| panic!("invalid cleaning rule {}: {}", pattern, e)),
        replacement,
    }
}

// Order matters: code is removed before emphasis so `*` inside code is never touched.
static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    use RuleKind::*;
    vec![
        rule(Structure, r"(?s)```.*?```", ""),
        rule(Structure, r"(?m)^    .*$", ""),
        rule(Structure, r"`([^`]*)`", "$1"),
        rule(Link, r"!\[([^\]]*)\]\([^)]+\)", "$1"),
        rule(Link, r"\[([^\]]+)\]\([^)]+\)", "$1"),
        rule(Link, r"\[([^\]]+)\]\[[^\]]+\]", "$1"),
        rule(Link, r"(?m)^\[\^[^\]]+\]:.*$", ""),
        rule(Link, r"\[\^[^\]]+\]", ""),
        rule(Structure, r"(?m)^#{1,6}\s*", ""),
        rule(Structure, r"(?m)^[\-\*]{3,}$", ""),
        rule(Structure, r"(?m)^>\s*", ""),
        rule(Structure, r"(?m)^[\*\-\+]\s+", ""),
        rule(Structure, r"(?m)^\d+\.\s+", ""),
        rule(Structure, r"(?m)^\|[\s\-\|:]+\|$", ""),
        rule(Structure, r"\|", " "),
        rule(Emphasis, r"\*\*([^\*]+)\*\*", "$1"),
        rule(Emphasis, r"__([^_]+)__", "$1"),
        rule(Emphasis, r"\*([^\*]+)\*", "$1"),
        rule(Emphasis, r"_([^_]+)_", "$1"),
        rule(Emphasis, r"~~([^~]+)~~", "$1"),
        rule(Structure, r"<[^>]+>", ""),
        rule(Structure, r"\n{3,}", "\n\n"),
    ]
});

/// Markup the cleaner should leave in place
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanOptions {
    /// Keep link, image and footnote syntax
    pub preserve_links: bool,
    /// Keep bold, italic and strikethrough markers
    pub preserve_emphasis: bool,
}

/// Removes markdown syntax from text
#[derive(Debug, Clone, Default)]
pub struct MarkdownCleaner {
    options: CleanOptions,
}

impl MarkdownCleaner {
    /// Create a cleaner that strips everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cleaner with the given options
    pub fn with_options(options: CleanOptions) -> Self {
        Self { options }
    }

    fn applies(&self, kind: RuleKind) -> bool {
        match kind {
            RuleKind::Structure => true,
            RuleKind::Link => !self.options.preserve_links,
            RuleKind::Emphasis => !self.options.preserve_emphasis,
        }
    }

    /// Clean `text`, returning trimmed plain text
    pub fn clean(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let normalized = text.replace("\r\n", "\n");
        let mut current = normalized;
        for rule in RULES.iter().filter(|r| self.applies(r.kind)) {
            current = rule.pattern.replace_all(&current, rule.replacement).into_owned();
        }

        current
            .split('\n')
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }
}
