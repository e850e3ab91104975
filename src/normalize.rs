// src/normalize.rs
//
// Markup-to-text normalization for scraped pages. Deliberately regex-based:
// the extractors only need paragraph boundaries and heading text, not a DOM.
// Swapping in a real parser would touch only this module and the extractors.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_SCRIPT_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .unwrap()
});

static RE_BR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());

// Block-level boundaries become paragraph breaks.
static RE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)</?(?:p|h[1-6]|li|ul|ol|tr|table|blockquote|section|article|div|header|footer)\b[^>]*>",
    )
    .unwrap()
});

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").unwrap());

// Horizontal whitespace only; line breaks are handled separately.
static RE_HWS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());

static RE_LINE_EDGE: Lazy<Regex> = Lazy::new(|| Regex::new(r" ?\n ?").unwrap());

static RE_MULTI_NL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Convert markup to plain text while keeping block structure.
///
/// Script and style contents are dropped entirely, block-level boundaries
/// become a blank line, `<br>` becomes a single line break, entities are
/// decoded, and whitespace is collapsed (at most two consecutive breaks).
/// Malformed markup degrades to being treated as text; this never fails.
pub fn html_to_text(raw: &str) -> String {
    let mut out = RE_SCRIPT_STYLE.replace_all(raw, "").into_owned();
    out = RE_BR.replace_all(&out, "\n").into_owned();
    out = RE_BLOCK.replace_all(&out, "\n\n").into_owned();
    out = RE_TAG.replace_all(&out, "").into_owned();
    // Decode after stripping so encoded angle brackets cannot form tags.
    out = html_escape::decode_html_entities(&out).into_owned();
    out = RE_HWS.replace_all(&out, " ").into_owned();
    out = RE_LINE_EDGE.replace_all(&out, "\n").into_owned();
    out = RE_MULTI_NL.replace_all(&out, "\n\n").into_owned();
    out.trim().to_string()
}

/// Flatten markup to a single space-joined line.
///
/// Used where only a comparison string is needed (heading titles, date
/// scanning inside a post span).
pub fn strip_tags(raw: &str) -> String {
    let mut out = RE_SCRIPT_STYLE.replace_all(raw, "").into_owned();
    out = RE_TAG.replace_all(&out, " ").into_owned();
    out = html_escape::decode_html_entities(&out).into_owned();
    out = RE_WS.replace_all(&out, " ").into_owned();
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_and_styles_are_removed() {
        let html = r#"<p>keep</p><script type="text/javascript">var x = "<p>no</p>";</script><style>p { color: red; }</style><p>also</p>"#;
        let out = html_to_text(html);
        assert!(out.contains("keep"));
        assert!(out.contains("also"));
        assert!(!out.contains("var x"));
        assert!(!out.contains("color"));
    }

    #[test]
    fn block_tags_become_paragraph_breaks() {
        let out = html_to_text("<p>one</p><p>two</p>");
        assert_eq!(out, "one\n\ntwo");
    }

    #[test]
    fn br_becomes_single_break_and_entities_decode() {
        let out = html_to_text("a&nbsp;&amp;&nbsp;b<br>c &#39;d&#39;");
        assert_eq!(out, "a & b\nc 'd'");
    }

    #[test]
    fn never_more_than_two_breaks() {
        let out = html_to_text("<div><p>a</p></div><div><p>b</p></div>");
        assert!(!out.contains("\n\n\n"));
        assert_eq!(out, "a\n\nb");
    }

    #[test]
    fn malformed_markup_degrades_to_text() {
        let out = html_to_text("plain < not a tag, just text");
        assert!(out.contains("plain"));
    }

    #[test]
    fn strip_tags_is_single_line() {
        let out = strip_tags("<h2>Big\n<em>News</em></h2>");
        assert_eq!(out, "Big News");
    }
}
