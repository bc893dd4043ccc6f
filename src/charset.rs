//! Character encoding detection and UTF-8 normalization.
//!
//! Detects the declared charset of fetched HTML, transcodes bodies to
//! UTF-8, and guarantees persisted markup carries a UTF-8 charset
//! declaration. Normalization never fails: when the parser-based path
//! cannot be applied, a pure text-pattern insertion takes over.

use dom_query::{Document, Selection};
use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;

/// The declaration inserted when a document lacks one.
const UTF8_META: &str = r#"<meta charset="UTF-8">"#;

/// Match `<meta charset="...">` tag
#[allow(clippy::expect_used)]
static CHARSET_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s>]+)"#).expect("valid regex")
});

/// Match `<meta http-equiv="Content-Type" content="...; charset=...">` tag
#[allow(clippy::expect_used)]
static CONTENT_TYPE_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+http-equiv\s*=\s*["']?content-type["']?[^>]+content\s*=\s*["']?[^"'>]*;\s*charset\s*=\s*([^"'\s>]+)"#).expect("valid regex")
});

/// Match any meta charset declaration, either form, for the fallback scan
#[allow(clippy::expect_used)]
static ANY_CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<meta[^>]+charset\s*=").expect("valid regex"));

/// Match the charset parameter inside an http-equiv meta's content value
#[allow(clippy::expect_used)]
static CONTENT_CHARSET_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)charset\s*=\s*([^;\s]+)").expect("valid regex"));

/// Match an opening `<head>` tag for the text-pattern insertion point
#[allow(clippy::expect_used)]
static HEAD_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<head[^>]*>").expect("valid regex"));

/// Detect character encoding from HTML bytes.
///
/// Looks for charset declarations in the following order:
/// 1. `<meta charset="...">`
/// 2. `<meta http-equiv="Content-Type" content="...; charset=...">`
/// 3. Defaults to UTF-8 if no declaration found
///
/// Only examines the first 1024 bytes for performance.
#[must_use]
pub fn detect_encoding(html: &[u8]) -> &'static Encoding {
    let head = &html[..html.len().min(1024)];
    let head_str = String::from_utf8_lossy(head);

    for re in [&CHARSET_META_RE, &CONTENT_TYPE_CHARSET_RE] {
        if let Some(charset) = re.captures(&head_str).and_then(|c| c.get(1)) {
            if let Some(encoding) = Encoding::for_label(charset.as_str().as_bytes()) {
                return encoding;
            }
        }
    }

    UTF_8
}

/// Transcode HTML bytes to a UTF-8 string.
///
/// Invalid sequences are replaced with the Unicode replacement character
/// rather than causing errors.
#[must_use]
pub fn transcode_to_utf8(html: &[u8]) -> String {
    let encoding = detect_encoding(html);

    if encoding == UTF_8 {
        return String::from_utf8_lossy(html).into_owned();
    }

    let (decoded, _encoding_used, _had_errors) = encoding.decode(html);
    decoded.into_owned()
}

/// Guarantee `html` declares a UTF-8 charset.
///
/// The parser-based path corrects an existing declaration in place —
/// the `<meta charset>` value, or the charset parameter inside an
/// `http-equiv="Content-Type"` meta's content — with other attributes
/// preserved and duplicates beyond the first left alone. Lacking either
/// form, `<meta charset="UTF-8">` is prepended as the first child of
/// `<head>`. Documents that already declare UTF-8 are returned unchanged,
/// so persisted markup stays byte-identical. When no head element can be
/// located the text-pattern fallback takes over; this function never
/// fails.
#[must_use]
pub fn ensure_utf8(html: &str) -> String {
    normalize_parsed(html).unwrap_or_else(|| ensure_utf8_textual(html))
}

/// Pure text-pattern fallback: no parsing, ever.
///
/// When no case-insensitive `charset=` meta pattern is present, inserts
/// the declaration immediately after the opening `<head>` tag, or prepends
/// it to the whole document when there is no head tag at all.
#[must_use]
pub fn ensure_utf8_textual(html: &str) -> String {
    if ANY_CHARSET_RE.is_match(html) {
        return html.to_string();
    }

    if let Some(open) = HEAD_OPEN_RE.find(html) {
        let mut out = String::with_capacity(html.len() + UTF8_META.len());
        out.push_str(&html[..open.end()]);
        out.push_str(UTF8_META);
        out.push_str(&html[open.end()..]);
        return out;
    }

    format!("{UTF8_META}{html}")
}

fn normalize_parsed(html: &str) -> Option<String> {
    let doc = Document::from(html);

    // Only the first declaration is authoritative; later duplicates stay.
    if let Some(node) = doc.select("meta[charset]").nodes().first() {
        let meta = Selection::from(*node);
        let value = meta.attr("charset").map(|v| v.to_string()).unwrap_or_default();

        if value.eq_ignore_ascii_case("utf-8") {
            return Some(html.to_string());
        }

        meta.set_attr("charset", "UTF-8");
        return Some(doc.html().to_string());
    }

    // The http-equiv form declares the charset inside its content value;
    // correcting it there avoids prepending a second, conflicting meta.
    for node in doc.select("meta[http-equiv][content]").nodes() {
        let meta = Selection::from(*node);
        let equiv = meta
            .attr("http-equiv")
            .map(|v| v.to_string())
            .unwrap_or_default();
        if !equiv.eq_ignore_ascii_case("content-type") {
            continue;
        }

        let content = meta
            .attr("content")
            .map(|v| v.to_string())
            .unwrap_or_default();
        let Some(found) = CONTENT_CHARSET_PARAM_RE
            .captures(&content)
            .and_then(|c| c.get(1))
        else {
            continue;
        };

        if found.as_str().eq_ignore_ascii_case("utf-8") {
            return Some(html.to_string());
        }

        let mut corrected = content.clone();
        corrected.replace_range(found.range(), "UTF-8");
        meta.set_attr("content", &corrected);
        return Some(doc.html().to_string());
    }

    let head = doc.select("head");
    if head.is_empty() {
        // No head in the tree (fragment input): degrade to text insertion.
        return None;
    }

    head.prepend_html(UTF8_META);
    Some(doc.html().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_utf8_from_meta_charset() {
        let html = br#"<html><head><meta charset="utf-8"></head><body>Test</body></html>"#;
        assert_eq!(detect_encoding(html), UTF_8);
    }

    #[test]
    fn detect_charset_from_content_type() {
        let html = br#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=ISO-8859-1"></head></html>"#;
        // encoding_rs maps ISO-8859-1 to windows-1252 per WHATWG spec
        assert_eq!(detect_encoding(html).name(), "windows-1252");
    }

    #[test]
    fn default_to_utf8_when_no_charset() {
        let html = b"<html><body>Test</body></html>";
        assert_eq!(detect_encoding(html), UTF_8);
    }

    #[test]
    fn transcode_iso88591_to_utf8() {
        let html = b"<html><head><meta charset=\"ISO-8859-1\"></head><body>Caf\xE9</body></html>";
        let result = transcode_to_utf8(html);
        assert!(result.contains("Caf\u{e9}"));
    }

    #[test]
    fn transcode_handles_invalid_bytes_gracefully() {
        let html = b"<html><body>Test \xFF\xFE Invalid</body></html>";
        let result = transcode_to_utf8(html);
        assert!(result.contains("Test"));
        assert!(result.contains("Invalid"));
    }

    #[test]
    fn ensure_utf8_leaves_correct_declaration_byte_identical() {
        let html = r#"<html><head><meta charset="UTF-8"><title>T</title></head><body></body></html>"#;
        assert_eq!(ensure_utf8(html), html);
    }

    #[test]
    fn ensure_utf8_accepts_lowercase_value_unchanged() {
        let html = r#"<html><head><meta charset="utf-8"></head><body></body></html>"#;
        assert_eq!(ensure_utf8(html), html);
    }

    #[test]
    fn ensure_utf8_corrects_wrong_value_in_place() {
        let html =
            r#"<html><head><meta charset="ISO-8859-1" data-keep="yes"></head><body></body></html>"#;
        let out = ensure_utf8(html);
        assert!(out.contains(r#"charset="UTF-8""#));
        assert!(!out.to_lowercase().contains("iso-8859-1"));
        // Other attributes on the meta tag survive the correction.
        assert!(out.contains(r#"data-keep="yes""#));
    }

    #[test]
    fn ensure_utf8_inserts_declaration_as_first_head_child() {
        let html = "<html><head><title>T</title></head><body></body></html>";
        let out = ensure_utf8(html);
        let head_pos = match out.find("<head>") {
            Some(pos) => pos,
            None => panic!("expected a head element in {out}"),
        };
        let meta_pos = match out.find(r#"<meta charset="UTF-8">"#) {
            Some(pos) => pos,
            None => panic!("expected a charset meta in {out}"),
        };
        let title_pos = match out.find("<title>") {
            Some(pos) => pos,
            None => panic!("expected the title to survive in {out}"),
        };
        assert!(head_pos < meta_pos && meta_pos < title_pos);
        assert_eq!(out.matches("charset").count(), 1);
    }

    #[test]
    fn ensure_utf8_corrects_http_equiv_content_charset_in_place() {
        let html = r#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=ISO-8859-1"></head><body></body></html>"#;
        let out = ensure_utf8(html);

        assert!(out.contains("charset=UTF-8"));
        assert!(!out.to_lowercase().contains("iso-8859-1"));
        // The existing declaration is corrected, not shadowed by a new one.
        assert_eq!(out.matches("charset").count(), 1);
    }

    #[test]
    fn ensure_utf8_leaves_utf8_http_equiv_declaration_unchanged() {
        let html = r#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=utf-8"></head><body></body></html>"#;
        assert_eq!(ensure_utf8(html), html);
    }

    #[test]
    fn ensure_utf8_synthesizes_head_for_headless_input() {
        let out = ensure_utf8("<p>stray text</p>");
        assert_eq!(out.matches(r#"<meta charset="UTF-8">"#).count(), 1);
        assert!(out.contains("stray text"));
    }

    #[test]
    fn ensure_utf8_leaves_duplicates_beyond_the_first() {
        let html = r#"<html><head><meta charset="UTF-8"><meta charset="latin1"></head></html>"#;
        let out = ensure_utf8(html);
        // First declaration is already correct, so nothing moves.
        assert!(out.contains(r#"<meta charset="latin1">"#));
    }

    // The fallback path is a contract of its own and is tested without
    // going through ensure_utf8.

    #[test]
    fn textual_fallback_inserts_after_opening_head_tag() {
        let html = r#"<html><head lang="en"><title>T</title></head><body></body></html>"#;
        let out = ensure_utf8_textual(html);
        assert_eq!(
            out,
            r#"<html><head lang="en"><meta charset="UTF-8"><title>T</title></head><body></body></html>"#
        );
    }

    #[test]
    fn textual_fallback_prepends_without_head() {
        let out = ensure_utf8_textual("<p>fragment</p>");
        assert_eq!(out, r#"<meta charset="UTF-8"><p>fragment</p>"#);
    }

    #[test]
    fn textual_fallback_skips_existing_declaration() {
        let html = r#"<head><META CHARSET=latin1></head>"#;
        assert_eq!(ensure_utf8_textual(html), html);

        let http_equiv =
            r#"<head><meta http-equiv="Content-Type" content="text/html; charset=utf-8"></head>"#;
        assert_eq!(ensure_utf8_textual(http_equiv), http_equiv);
    }
}
