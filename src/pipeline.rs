//! The fetch → extract → persist pipeline and the Link-Update operation.
//!
//! Each user action is one sequential pipeline with no internal
//! parallelism; the fetch is the only suspension point. Nothing here
//! touches shared mutable state: every document is addressed by a
//! globally-unique key generated at creation time, so concurrent
//! pipelines never contend on a file.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::charset;
use crate::document::CloneMetadata;
use crate::error::{Error, Result};
use crate::fetch;
use crate::links::{self, LinkEdit, LinkRecord};
use crate::registry::{self, PublicationRecord, PublicationRegistry};
use crate::store::{self, BlobStore, MetadataStore};

/// How many links the copy outcome echoes back for display.
const SUMMARY_LINKS: usize = 10;

/// Outcome of one copy operation.
#[derive(Debug, Clone)]
pub struct CopyOutcome {
    /// Opaque key the blob and sidecar were stored under.
    pub key: String,

    /// Size in bytes of the persisted document.
    pub size: usize,

    /// Total links in the inventory.
    pub total_links: usize,

    /// Leading slice of the inventory (at most 10 records).
    pub links: Vec<LinkRecord>,
}

/// Fetch/extract/rewrite pipeline over a blob store and a metadata store.
#[derive(Debug, Clone)]
pub struct Pipeline<B, M> {
    blobs: B,
    metadata: M,
}

impl<B: BlobStore, M: MetadataStore> Pipeline<B, M> {
    pub fn new(blobs: B, metadata: M) -> Self {
        Self { blobs, metadata }
    }

    /// Fetch `url`, inventory its links, and persist the blob plus its
    /// sidecar under a fresh key.
    ///
    /// One successful cycle creates one Document: the body is transcoded
    /// to UTF-8, the inventory is extracted in document order, and the
    /// markup is charset-normalized before persisting.
    pub fn copy_page(&self, url: &str) -> Result<CopyOutcome> {
        let page = fetch::fetch(url)?;
        let html = charset::transcode_to_utf8(&page.body);
        let links = links::extract_links(&html, url)?;
        let html = charset::ensure_utf8(&html);

        let key = store::generate_key();
        self.blobs.put(&key, html.as_bytes())?;
        let metadata = CloneMetadata::new(url, links);
        self.metadata.put(&key, &metadata)?;
        info!(%key, total_links = metadata.total_links, url, "copied page");

        Ok(CopyOutcome {
            size: html.len(),
            total_links: metadata.total_links,
            links: metadata.links.iter().take(SUMMARY_LINKS).cloned().collect(),
            key,
        })
    }

    /// Replace the full link inventory for `key` and positionally rewrite
    /// the stored markup to match.
    ///
    /// The sidecar swap is the source of truth. A failure to rewrite the
    /// blob afterwards is degraded (logged, not surfaced): the markup
    /// catches up on the next successful update. Returns the new total
    /// link count.
    pub fn update_links(&self, key: &str, links: Vec<LinkRecord>) -> Result<usize> {
        let mut metadata = self.metadata.get(key)?;
        metadata.replace_links(links);
        self.metadata.put(key, &metadata)?;

        if self.blobs.exists(key) {
            match self.rewrite_blob(key, &metadata) {
                Ok(()) => debug!(%key, "rewrote stored markup"),
                Err(err) => warn!(%key, error = %err, "failed to rewrite stored markup"),
            }
        } else {
            warn!(%key, "no blob under key, skipping markup rewrite");
        }

        info!(%key, total_links = metadata.total_links, "updated link inventory");
        Ok(metadata.total_links)
    }

    /// Raw document bytes for `key`.
    pub fn document(&self, key: &str) -> Result<Vec<u8>> {
        self.blobs.get(key)
    }

    /// Sidecar metadata for `key`.
    pub fn metadata(&self, key: &str) -> Result<CloneMetadata> {
        self.metadata.get(key)
    }

    /// Delete a document's blob and sidecar together.
    ///
    /// This is the compensating action paired with the caller's deletion
    /// of the clone record; neither half is left behind.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.blobs.delete(key)?;
        self.metadata.delete(key)?;
        info!(%key, "deleted document and sidecar");
        Ok(())
    }

    /// Create a publication record mapping a fresh friendly ID to `key`.
    ///
    /// The clone's original URL is captured from its sidecar when
    /// available. Fails when no blob exists under `key`.
    pub fn publish<P: PublicationRegistry>(
        &self,
        publications: &P,
        key: &str,
    ) -> Result<PublicationRecord> {
        if !self.blobs.exists(key) {
            return Err(Error::NotFound(key.to_string()));
        }

        let record = PublicationRecord {
            friendly_id: registry::friendly_id(),
            filename: key.to_string(),
            published_at: Utc::now(),
            original_url: self.metadata.get(key).ok().map(|m| m.original_url),
        };
        publications.create(record.clone())?;
        info!(%key, friendly_id = %record.friendly_id, "published document");
        Ok(record)
    }

    /// Remove every publication pointing at `key`, returning how many
    /// were removed.
    pub fn unpublish<P: PublicationRegistry>(&self, publications: &P, key: &str) -> Result<usize> {
        let removed = publications.delete_by_filename(key)?;
        info!(%key, removed, "unpublished document");
        Ok(removed)
    }

    fn rewrite_blob(&self, key: &str, metadata: &CloneMetadata) -> Result<()> {
        let bytes = self.blobs.get(key)?;
        let html = charset::transcode_to_utf8(&bytes);
        let edits: Vec<LinkEdit> = metadata.links.iter().map(LinkEdit::from).collect();
        let rewritten = links::rewrite_links(&html, &edits);
        self.blobs.put(key, rewritten.as_bytes())
    }
}
