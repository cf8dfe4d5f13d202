//! Disk persistence for rendered documents
//!
//! Provides a `DiskStore` that writes each cache entry to a JSON file so a
//! later run can reuse rendered HTML that is still within its TTL.

use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::CacheEntry;
use crate::data::DocId;

/// Errors from reading or writing the disk store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Stores cache entries as JSON files on disk
///
/// Uses an XDG-compliant cache directory (`~/.cache/docdown/` on Linux) unless
/// a directory is given explicitly. Freshness is not judged here; the
/// document cache compares `fetched_at` against its own clock and TTL.
#[derive(Debug, Clone)]
pub struct DiskStore {
    cache_dir: PathBuf,
}

impl DiskStore {
    /// Creates a store in the platform cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "docdown")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a store in a custom directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, id: &DocId) -> PathBuf {
        self.cache_dir.join(format!("{}.json", id))
    }

    /// Writes `entry` for `id`, creating the directory if missing
    pub fn write(&self, id: &DocId, entry: &CacheEntry) -> Result<(), StoreError> {
        fs::create_dir_all(&self.cache_dir)?;
        let json = serde_json::to_string_pretty(entry)?;
        fs::write(self.entry_path(id), json)?;
        Ok(())
    }

    /// Reads the entry for `id`
    ///
    /// Returns `None` if the file doesn't exist or cannot be parsed.
    pub fn read(&self, id: &DocId) -> Option<CacheEntry> {
        let content = fs::read_to_string(self.entry_path(id)).ok()?;
        serde_json::from_str(&content).ok()
    }
}
