//! Blob and metadata collaborator interfaces.
//!
//! The core never inspects storage layout: blobs and their sidecars are
//! addressed by opaque generated keys, and keys are globally unique at
//! creation time (timestamp plus random suffix), which is what lets
//! concurrent pipelines write without any locking.

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::Utc;
use uuid::Uuid;

use crate::document::CloneMetadata;
use crate::error::{Error, Result};

/// Raw document blob storage.
pub trait BlobStore {
    /// Store `bytes` under `key`, replacing any previous content.
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Fetch the bytes stored under `key`.
    fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Whether a blob exists under `key`.
    fn exists(&self, key: &str) -> bool;

    /// Remove the blob under `key`. Removing an absent key is not an
    /// error.
    fn delete(&self, key: &str) -> Result<()>;
}

/// Structured sidecar storage, keyed identically to blobs.
pub trait MetadataStore {
    /// Store the sidecar for `key`, replacing any previous record.
    fn put(&self, key: &str, metadata: &CloneMetadata) -> Result<()>;

    /// Fetch the sidecar for `key`.
    fn get(&self, key: &str) -> Result<CloneMetadata>;

    /// Remove the sidecar for `key`. Removing an absent key is not an
    /// error.
    fn delete(&self, key: &str) -> Result<()>;
}

/// Generate a fresh document key: timestamp plus random suffix.
#[must_use]
pub fn generate_key() -> String {
    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ");
    let id = short_id();
    format!("{timestamp}_{id}.html")
}

/// Key for a rewritten copy derived from an existing document's key.
#[must_use]
pub fn derived_key(key: &str) -> String {
    let base = key.strip_suffix(".html").unwrap_or(key);
    let timestamp = Utc::now().format("%Y-%m-%dT%H-%M-%S-%3fZ");
    let id = short_id();
    format!("{base}_modified_{timestamp}_{id}.html")
}

/// First 8 hex characters of a v4 UUID.
pub(crate) fn short_id() -> String {
    Uuid::new_v4().simple().to_string().chars().take(8).collect()
}

/// Filesystem-backed blob and metadata store.
///
/// One flat directory: the blob lives at `<dir>/<key>` and its sidecar at
/// `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FsStore {
    dir: PathBuf,
}

impl FsStore {
    /// Open a store rooted at `dir`, creating the directory when absent.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    fn sidecar_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl BlobStore for FsStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        fs::write(self.blob_path(key), bytes)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>> {
        fs::read(self.blob_path(key)).map_err(|err| not_found_or_storage(err, key))
    }

    fn exists(&self, key: &str) -> bool {
        self.blob_path(key).is_file()
    }

    fn delete(&self, key: &str) -> Result<()> {
        remove_if_present(&self.blob_path(key))
    }
}

impl MetadataStore for FsStore {
    fn put(&self, key: &str, metadata: &CloneMetadata) -> Result<()> {
        let json = serde_json::to_vec_pretty(metadata)?;
        fs::write(self.sidecar_path(key), json)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<CloneMetadata> {
        let bytes =
            fs::read(self.sidecar_path(key)).map_err(|err| not_found_or_storage(err, key))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn delete(&self, key: &str) -> Result<()> {
        remove_if_present(&self.sidecar_path(key))
    }
}

fn not_found_or_storage(err: io::Error, key: &str) -> Error {
    if err.kind() == io::ErrorKind::NotFound {
        Error::NotFound(key.to_string())
    } else {
        Error::Storage(err)
    }
}

fn remove_if_present(path: &std::path::Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
