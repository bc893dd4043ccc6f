//! External persistence-service record shapes and interfaces.
//!
//! Clone and publication records are owned by the platform's relational
//! store; the core only needs their shapes and the create/query/delete
//! operations. [`DirRegistry`] is a small file-per-record implementation
//! for deployments without a relational store wired in: every record is
//! keyed individually on disk, never held in one shared mutable table.

use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::short_id;

/// A persisted copy of a fetched document, owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneRecord {
    /// Owning user.
    pub user_id: String,

    /// Opaque blob/sidecar key of the document.
    pub filename: String,

    /// URL the document was fetched from.
    pub original_url: String,

    /// Size in bytes of the persisted blob.
    pub file_size: u64,

    /// Link count recorded at creation time.
    pub total_links: usize,

    /// Optional user-chosen project name; blank names normalize to
    /// `None`. Uniqueness per user is the external store's concern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,

    /// When the clone record was created.
    pub created_at: DateTime<Utc>,
}

/// A short public identifier mapping to a clone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationRecord {
    /// 8-character alphanumeric public identifier.
    pub friendly_id: String,

    /// Key of the published clone.
    pub filename: String,

    /// When the publication was created.
    pub published_at: DateTime<Utc>,

    /// Original URL captured from the clone's sidecar, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
}

/// Per-user usage aggregate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_files: usize,
    pub published: usize,
    pub drafts: usize,
    pub total_links: usize,
}

/// Registry of clone records, keyed by owning user and filename.
pub trait CloneRegistry {
    /// Persist a new clone record.
    fn create(&self, record: CloneRecord) -> Result<()>;

    /// All of a user's clone records, newest first.
    fn list(&self, user_id: &str) -> Result<Vec<CloneRecord>>;

    /// Look up one clone record by filename.
    fn get(&self, user_id: &str, filename: &str) -> Result<Option<CloneRecord>>;

    /// Look up a clone by project name, for availability checks.
    fn get_by_project_name(&self, user_id: &str, project_name: &str)
        -> Result<Option<CloneRecord>>;

    /// Rename a clone's project; `None` clears it. Returns whether a
    /// record was updated.
    fn set_project_name(
        &self,
        user_id: &str,
        filename: &str,
        project_name: Option<&str>,
    ) -> Result<bool>;

    /// Delete a clone record. Returns whether one existed.
    ///
    /// Deleting the record does not delete the blob/sidecar; the caller
    /// runs that compensating action through the pipeline.
    fn delete(&self, user_id: &str, filename: &str) -> Result<bool>;
}

/// Registry of publication records, keyed by friendly ID.
pub trait PublicationRegistry {
    /// Persist a new publication record.
    fn create(&self, record: PublicationRecord) -> Result<()>;

    /// Resolve a friendly ID to its publication record.
    fn get(&self, friendly_id: &str) -> Result<Option<PublicationRecord>>;

    /// Find the publication pointing at `filename`, if any.
    fn find_by_filename(&self, filename: &str) -> Result<Option<PublicationRecord>>;

    /// Remove every publication pointing at `filename`, returning how
    /// many were removed.
    fn delete_by_filename(&self, filename: &str) -> Result<usize>;
}

/// Generate an 8-character alphanumeric friendly ID.
#[must_use]
pub fn friendly_id() -> String {
    short_id()
}

/// Normalize a user-supplied project name: trimmed, blank becomes `None`.
#[must_use]
pub fn normalize_project_name(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(ToString::to_string)
}

/// Compute a user's stats from their clone records and the publication
/// registry.
pub fn stats<P: PublicationRegistry>(records: &[CloneRecord], publications: &P) -> Result<Stats> {
    let mut stats = Stats {
        total_files: records.len(),
        ..Stats::default()
    };

    for record in records {
        stats.total_links += record.total_links;
        if publications.find_by_filename(&record.filename)?.is_some() {
            stats.published += 1;
        } else {
            stats.drafts += 1;
        }
    }

    Ok(stats)
}

/// File-per-record registry rooted at a directory.
///
/// Clone records live at `<dir>/clones/<user>/<filename>.json` and
/// publications at `<dir>/publications/<friendly_id>.json`.
#[derive(Debug, Clone)]
pub struct DirRegistry {
    dir: PathBuf,
}

impl DirRegistry {
    /// Open a registry rooted at `dir`, creating its layout when absent.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(dir.join("clones"))?;
        fs::create_dir_all(dir.join("publications"))?;
        Ok(Self { dir })
    }

    fn clone_path(&self, user_id: &str, filename: &str) -> PathBuf {
        self.dir
            .join("clones")
            .join(user_id)
            .join(format!("{filename}.json"))
    }

    fn publication_path(&self, friendly_id: &str) -> PathBuf {
        self.dir
            .join("publications")
            .join(format!("{friendly_id}.json"))
    }

    fn read_clone(&self, path: &std::path::Path) -> Result<CloneRecord> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn write_clone(&self, record: &CloneRecord) -> Result<()> {
        let path = self.clone_path(&record.user_id, &record.filename);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(record)?)?;
        Ok(())
    }

    fn publications(&self) -> Result<Vec<PublicationRecord>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(self.dir.join("publications"))? {
            let bytes = fs::read(entry?.path())?;
            records.push(serde_json::from_slice(&bytes)?);
        }
        Ok(records)
    }
}

impl CloneRegistry for DirRegistry {
    fn create(&self, record: CloneRecord) -> Result<()> {
        self.write_clone(&record)
    }

    fn list(&self, user_id: &str) -> Result<Vec<CloneRecord>> {
        let user_dir = self.dir.join("clones").join(user_id);
        let entries = match fs::read_dir(&user_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut records = Vec::new();
        for entry in entries {
            records.push(self.read_clone(&entry?.path())?);
        }
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    fn get(&self, user_id: &str, filename: &str) -> Result<Option<CloneRecord>> {
        let path = self.clone_path(user_id, filename);
        if !path.is_file() {
            return Ok(None);
        }
        self.read_clone(&path).map(Some)
    }

    fn get_by_project_name(
        &self,
        user_id: &str,
        project_name: &str,
    ) -> Result<Option<CloneRecord>> {
        let wanted = match normalize_project_name(Some(project_name)) {
            Some(wanted) => wanted,
            None => return Ok(None),
        };

        Ok(self
            .list(user_id)?
            .into_iter()
            .find(|record| record.project_name.as_deref() == Some(wanted.as_str())))
    }

    fn set_project_name(
        &self,
        user_id: &str,
        filename: &str,
        project_name: Option<&str>,
    ) -> Result<bool> {
        let Some(mut record) = CloneRegistry::get(self, user_id, filename)? else {
            return Ok(false);
        };

        record.project_name = normalize_project_name(project_name);
        self.write_clone(&record)?;
        Ok(true)
    }

    fn delete(&self, user_id: &str, filename: &str) -> Result<bool> {
        let path = self.clone_path(user_id, filename);
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

impl PublicationRegistry for DirRegistry {
    fn create(&self, record: PublicationRecord) -> Result<()> {
        let path = self.publication_path(&record.friendly_id);
        fs::write(path, serde_json::to_vec_pretty(&record)?)?;
        Ok(())
    }

    fn get(&self, friendly_id: &str) -> Result<Option<PublicationRecord>> {
        let path = self.publication_path(friendly_id);
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = fs::read(path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn find_by_filename(&self, filename: &str) -> Result<Option<PublicationRecord>> {
        Ok(self
            .publications()?
            .into_iter()
            .find(|record| record.filename == filename))
    }

    fn delete_by_filename(&self, filename: &str) -> Result<usize> {
        let mut removed = 0;
        for record in self.publications()? {
            if record.filename == filename {
                fs::remove_file(self.publication_path(&record.friendly_id))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
