//! Identifier extraction from comment text.
//!
//! A purely lexical aid for keyword correlation: pulls identifier-like
//! tokens out of free text so they can be matched against diff content.
//! False positives and negatives here only affect correlation confidence,
//! never correctness elsewhere.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Identifier-like token: starts with a letter or underscore, at least
/// three characters long.
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]{2,}").unwrap());

/// Words too common in review prose to discriminate between diff lines.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "this", "that", "with", "from", "have", "has",
    "had", "are", "was", "were", "will", "would", "here", "there", "should",
    "can", "you", "your", "all", "any", "but", "not", "its", "use", "what",
    "when", "why", "please", "line", "lines", "code", "change", "instead",
];

/// Extract lowercased identifier-like keywords from `text`.
///
/// Deterministic and side-effect-free; returns an ordered set so callers
/// iterate in a stable order.
pub fn extract(text: &str) -> BTreeSet<String> {
    TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|token| !STOPWORDS.contains(&token.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_identifiers() {
        let keywords = extract("The parse_hunk function mishandles newOffset");
        assert!(keywords.contains("parse_hunk"));
        assert!(keywords.contains("function"));
        assert!(keywords.contains("mishandles"));
        assert!(keywords.contains("newoffset"));
    }

    #[test]
    fn test_drops_stopwords_and_short_tokens() {
        let keywords = extract("the fix is ok");
        assert!(!keywords.contains("the"));
        assert!(!keywords.contains("is"));
        assert!(!keywords.contains("ok"));
        assert!(keywords.contains("fix"));
    }

    #[test]
    fn test_numbers_are_not_identifiers() {
        let keywords = extract("at 12345 or x9");
        assert!(keywords.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let a = extract("rename broken_code in handler");
        let b = extract("rename broken_code in handler");
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_text() {
        assert!(extract("").is_empty());
        assert!(extract("?? !! ..").is_empty());
    }
}
