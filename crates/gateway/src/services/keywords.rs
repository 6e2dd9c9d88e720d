//! Keyword checks and normalization

use apit_common::db::models::KEYWORD_SEPARATOR;
use regex_lite::Regex;
use std::sync::OnceLock;

/// Punctuation accepted in keyword lists besides letters, digits and whitespace
const KEYWORD_PUNCTUATION: &[char] = &[',', ';', '.', '-', '\'', '!', '?', '(', ')', '&'];

fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*[,;]+\s*").expect("static regex"))
}

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || c.is_whitespace() || KEYWORD_PUNCTUATION.contains(&c)
}

/// True when every character of the submitted keyword string is allowed
pub fn keywords_allowed(raw: &str) -> bool {
    raw.chars().all(is_allowed)
}

/// Collapse comma/semicolon separated keywords into the stored form, `a;b;c`
pub fn normalize_keywords(raw: &str) -> String {
    separator_regex()
        .split(raw.trim())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>()
        .join(KEYWORD_SEPARATOR)
}

/// Split free-form keywords typed with the inline editor; spaces also separate
pub fn split_inline_keywords(raw: &str) -> Vec<String> {
    raw.split([' ', ',', ';'])
        .filter(|k| !k.is_empty())
        .map(String::from)
        .collect()
}
