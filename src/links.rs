//! Link extraction and positional rewriting.
//!
//! Parses arbitrary third-party HTML into a tolerant tree, walks every
//! anchor carrying an `href` in document order, and produces the ordered
//! link inventory. The rewrite step re-applies edited targets to the same
//! anchors by position and serializes the tree back to markup.
//!
//! Ordering is load-bearing: anchors with identical hrefs are told apart
//! only by their index in the inventory, so extraction and rewrite must
//! walk the document identically.

use dom_query::{Document, Selection};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::charset;
use crate::error::Result;
use crate::url_utils;

/// Maximum length kept for anchor text, in characters.
const MAX_TEXT_LEN: usize = 100;

/// Stored in place of empty or whitespace-only anchor text.
const EMPTY_TEXT_PLACEHOLDER: &str = "[no text]";

/// One anchor from the source document.
///
/// Records appear in the inventory in document (depth-first, pre-order)
/// traversal order, exactly one per anchor element with an `href`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Absolute, resolved form of the anchor's href. When resolution
    /// fails the raw href string is kept instead.
    pub url: String,

    /// Visible anchor text, trimmed and truncated to 100 characters;
    /// empty text is replaced by a placeholder literal.
    pub text: String,

    /// The anchor's title attribute, empty string when absent.
    #[serde(default)]
    pub title: String,

    /// Whether the link leaves the source document's origin over HTTP(S).
    #[serde(rename = "isExternal")]
    pub is_external: bool,
}

/// An edited link target for the rewrite step.
///
/// Only the URL participates in rewriting; any other fields on incoming
/// edited records are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEdit {
    /// Replacement href. Empty or whitespace-only values leave the anchor
    /// at that position untouched.
    pub url: String,
}

impl From<&LinkRecord> for LinkEdit {
    fn from(record: &LinkRecord) -> Self {
        Self {
            url: record.url.clone(),
        }
    }
}

/// Extract the ordered link inventory from `html`.
///
/// Markup is parsed permissively: unclosed tags, missing `<html>`/`<head>`
/// /`<body>`, and stray text never fail extraction. The only error is an
/// unparseable `base_url`, which callers are expected to validate before
/// invoking. No network access and no script execution take place.
pub fn extract_links(html: &str, base_url: &str) -> Result<Vec<LinkRecord>> {
    let base = url_utils::parse_base_url(base_url)?;
    let doc = Document::from(html);
    Ok(collect_links(&doc, &base))
}

/// Re-apply edited link targets to `html` by position.
///
/// Anchors with `href` are walked in the same document order used at
/// extraction time. For index `i`, a non-empty trimmed `new_links[i].url`
/// replaces that anchor's href; anchors beyond the edit list are left
/// untouched and excess edits are ignored. Matching is strictly
/// positional, never content-based: if the document changed between
/// extraction and rewrite the mapping silently misaligns, which callers
/// accept in exchange for correct handling of duplicate hrefs.
///
/// The mutated tree is serialized back to markup and charset-normalized.
#[must_use]
pub fn rewrite_links(html: &str, new_links: &[LinkEdit]) -> String {
    let doc = Document::from(html);

    for (node, edit) in doc.select("a[href]").nodes().iter().zip(new_links) {
        let target = edit.url.trim();
        if !target.is_empty() {
            Selection::from(*node).set_attr("href", target);
        }
    }

    charset::ensure_utf8(&doc.html())
}

fn collect_links(doc: &Document, base: &Url) -> Vec<LinkRecord> {
    let mut links = Vec::new();

    for node in doc.select("a[href]").nodes() {
        let anchor = Selection::from(*node);

        let href = anchor
            .attr("href")
            .map(|h| h.to_string())
            .unwrap_or_default();
        let url = url_utils::resolve_href(&href, base).unwrap_or(href);
        let is_external = url_utils::is_external(&url, base);

        links.push(LinkRecord {
            is_external,
            text: anchor_text(&anchor),
            title: anchor
                .attr("title")
                .map(|t| t.to_string())
                .unwrap_or_default(),
            url,
        });
    }

    links
}

fn anchor_text(anchor: &Selection) -> String {
    let text = anchor.text();
    let trimmed = text.trim();

    if trimmed.is_empty() {
        EMPTY_TEXT_PLACEHOLDER.to_string()
    } else {
        trimmed.chars().take(MAX_TEXT_LEN).collect()
    }
}
