//! UTF-8 safe text helpers for log lines and prompts

/// Shorten `s` to at most `max_chars` characters, appending `...` when cut.
///
/// Survey answers are mostly Hangul (3 bytes per character), so byte slicing
/// would panic mid-character; this counts characters instead.
///
/// ```
/// use school_eval_core::utils::string::preview;
///
/// assert_eq!(preview("급식이 맛있어요", 3), "급식이...");
/// assert_eq!(preview("short", 10), "short");
/// ```
pub fn preview(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &s[..byte_idx]),
        None => s.to_string(),
    }
}

/// Trimmed text, or `None` when only whitespace remains
pub fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_keeps_short_text() {
        assert_eq!(preview("hello", 5), "hello");
        assert_eq!(preview("", 3), "");
    }

    #[test]
    fn test_preview_cuts_on_character_boundary() {
        assert_eq!(preview("hello world", 5), "hello...");
        assert_eq!(preview("학교폭력 예방 교육", 4), "학교폭력...");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  좋아요 ")), Some("좋아요"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
