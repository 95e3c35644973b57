use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Whitelist-based: safe formatting tags (like <b>, <p>) survive while
/// <script>, <iframe> and event-handler attributes are stripped.
/// Used on exam descriptions, which are rendered unescaped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Escapes every HTML-significant character, for text that must not carry markup.
pub fn escape(input: &str) -> String {
    ammonia::clean_text(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_html_strips_script() {
        let cleaned = clean_html("<p>Intro</p><script>alert(1)</script>");
        assert_eq!(cleaned, "<p>Intro</p>");
    }

    #[test]
    fn test_escape_neutralizes_tags() {
        let escaped = escape("<b>bold</b>");
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('>'));
    }
}
