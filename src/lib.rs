//! # pagecopy
//!
//! Fetch a web page, inventory its links, rewrite them, and republish the
//! result under a short public identifier.
//!
//! The core is the link-extraction-and-rewrite engine: it parses
//! arbitrary third-party HTML into a tolerant tree, produces a stable,
//! ordered link inventory, and later re-applies edited link targets back
//! into the original markup by position, without corrupting document
//! structure or encoding. Everything around it (clone records,
//! publications, blob/metadata storage) is expressed as collaborator
//! interfaces.
//!
//! ## Quick Start
//!
//! ```rust
//! use pagecopy::{extract_links, rewrite_links, LinkEdit};
//!
//! let html = r#"<a href="/a" title="T">Hi</a><a href="b">There</a>"#;
//! let links = extract_links(html, "https://x.com/dir/")?;
//! assert_eq!(links[0].url, "https://x.com/a");
//! assert_eq!(links[1].url, "https://x.com/dir/b");
//!
//! // Edits are applied positionally; empty targets leave anchors alone.
//! let edits = vec![
//!     LinkEdit { url: "https://y.com/new".to_string() },
//!     LinkEdit { url: String::new() },
//! ];
//! let rewritten = rewrite_links(html, &edits);
//! assert!(rewritten.contains(r#"href="https://y.com/new""#));
//! assert!(rewritten.contains(r#"href="b""#));
//! # Ok::<(), pagecopy::Error>(())
//! ```
//!
//! ## Pipeline
//!
//! [`Pipeline`] wires the pieces together over a [`store::BlobStore`] and
//! a [`store::MetadataStore`]: fetch with a bounded timeout, extract the
//! inventory, normalize the charset declaration, persist blob plus JSON
//! sidecar, and later replace the whole inventory while rewriting the
//! stored markup in the same document order.

mod error;

/// HTTP fetching with typed failure classification.
pub mod fetch;

/// Link extraction and positional rewriting.
pub mod links;

/// URL validation, resolution, and origin comparison.
pub mod url_utils;

/// Character encoding detection and UTF-8 normalization.
pub mod charset;

/// Persisted document record shapes.
pub mod document;

/// Blob and metadata collaborator interfaces.
pub mod store;

/// External persistence-service records (clones, publications).
pub mod registry;

/// The fetch → extract → persist pipeline.
pub mod pipeline;

// Public API - re-exports
pub use charset::ensure_utf8;
pub use document::CloneMetadata;
pub use error::{Error, Result};
pub use fetch::{fetch, FetchedPage};
pub use links::{extract_links, rewrite_links, LinkEdit, LinkRecord};
pub use pipeline::{CopyOutcome, Pipeline};
pub use store::FsStore;
