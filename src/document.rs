//! Persisted document record shapes.
//!
//! A Document is one fetched (or rewritten) HTML blob plus a structured
//! JSON sidecar holding its provenance and link inventory. Field names
//! follow the on-disk JSON shape consumed by the rest of the platform.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::links::LinkRecord;

/// Sidecar metadata persisted alongside a document blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneMetadata {
    /// URL the document was fetched from.
    pub original_url: String,

    /// When the copy was made.
    pub copied_at: DateTime<Utc>,

    /// When the link inventory was last replaced; absent until the first
    /// update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Number of entries in `links`.
    pub total_links: usize,

    /// Ordered link inventory, one record per anchor with an `href`.
    pub links: Vec<LinkRecord>,
}

impl CloneMetadata {
    /// Metadata for a fresh copy.
    #[must_use]
    pub fn new(original_url: impl Into<String>, links: Vec<LinkRecord>) -> Self {
        Self {
            original_url: original_url.into(),
            copied_at: Utc::now(),
            updated_at: None,
            total_links: links.len(),
            links,
        }
    }

    /// Replace the entire link inventory, recording the update time.
    ///
    /// Partial, field-level edits are not supported: the inventory and its
    /// count are swapped wholesale, which is what drives the positional
    /// HTML rewrite.
    pub fn replace_links(&mut self, links: Vec<LinkRecord>) {
        self.total_links = links.len();
        self.links = links;
        self.updated_at = Some(Utc::now());
    }
}
