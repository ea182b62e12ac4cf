//! Truncation utilities for limiting output size.

/// Truncate a string to at most `max_chars` characters (ellipsis included),
/// preferring a word boundary when one exists in the back half.
pub fn truncate_text(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }

    let content_limit = max_chars.saturating_sub(3);
    if content_limit == 0 {
        return "...".to_string();
    }

    let truncated: String = s.chars().take(content_limit).collect();

    if let Some(pos) = truncated.rfind(char::is_whitespace) {
        if pos > content_limit / 2 {
            return format!("{}...", truncated[..pos].trim_end());
        }
    }

    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_strings_untouched() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("", 10), "");
    }

    #[test]
    fn test_truncates_at_word_boundary() {
        let text = "the quick brown fox jumps over the lazy dog";
        let out = truncate_text(text, 20);
        assert!(out.len() <= 20);
        assert!(out.ends_with("..."));
        // Broke at a space, not mid-word
        assert_eq!(out, "the quick brown...");
    }

    #[test]
    fn test_hard_truncate_without_boundary() {
        let out = truncate_text(&"x".repeat(50), 10);
        assert_eq!(out, "xxxxxxx...");
    }

    #[test]
    fn test_multibyte_safe() {
        let text = "日本語のコメントですがとても長いのです";
        let out = truncate_text(text, 8);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 8);
    }

    #[test]
    fn test_tiny_limit() {
        assert_eq!(truncate_text("hello world", 3), "...");
        assert_eq!(truncate_text("hello world", 2), "...");
    }
}
