//! Persistent record of the page timestamps seen on previous runs.
//!
//! The cache is a flat JSON object keyed by page id:
//!
//! ```json
//! {
//!   "12": {
//!     "createdAt": "2024-03-01T09:00:00.000Z",
//!     "updatedAt": "2024-03-04T17:22:10.512Z"
//!   }
//! }
//! ```
//!
//! It is loaded once per run, mutated in memory and written back in full at
//! the end of a successful pass. A missing or unreadable file is never fatal:
//! it degrades to an empty cache, which the detector treats as a first run.

use crate::{CacheEntry, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// In-memory page cache, ordered by key so the file diff stays stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCache {
    entries: BTreeMap<String, CacheEntry>,
}

impl PageCache {
    /// Creates an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no page has been recorded yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of recorded pages
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entry for a page key, if recorded
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Records or replaces the entry for a page key
    pub fn insert(&mut self, key: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(key.into(), entry);
    }

    /// Refreshes `updatedAt` for a recorded page, leaving `createdAt` alone.
    ///
    /// Returns `false` when the key is not recorded.
    pub fn touch(&mut self, key: &str, updated_at: &str) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                updated_at.clone_into(&mut entry.updated_at);
                true
            },
            None => false,
        }
    }
}

/// Abstraction over where the cache lives between runs.
pub trait CacheStore {
    /// Load the cache, falling back to an empty one when nothing usable is stored.
    fn load(&self) -> PageCache;
    /// Persist the whole cache, replacing what was stored before.
    fn save(&self, cache: &PageCache) -> Result<()>;
}

/// Cache persisted as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonCacheStore {
    path: PathBuf,
}

impl JsonCacheStore {
    /// Creates a store backed by `path`. The file does not need to exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CacheStore for JsonCacheStore {
    fn load(&self) -> PageCache {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "Cache file not found, starting empty");
                return PageCache::new();
            },
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cache file unreadable, starting empty");
                return PageCache::new();
            },
        };

        match serde_json::from_str::<PageCache>(&json) {
            Ok(cache) => {
                debug!(entries = cache.len(), "Loaded cache");
                cache
            },
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cache file corrupt, starting empty");
                PageCache::new()
            },
        }
    }

    fn save(&self, cache: &PageCache) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create cache directory: {e}")))?;
        }

        let json = serde_json::to_string_pretty(cache)
            .map_err(|e| Error::Storage(format!("Failed to serialize cache: {e}")))?;

        // Write to a sibling temp file, then rename over the cache
        let tmp_path = self.temp_path();
        fs::write(&tmp_path, json)
            .map_err(|e| Error::Storage(format!("Failed to write cache: {e}")))?;

        #[cfg(target_os = "windows")]
        if self.path.exists() {
            fs::remove_file(&self.path)
                .map_err(|e| Error::Storage(format!("Failed to remove existing cache: {e}")))?;
        }
        fs::rename(&tmp_path, &self.path)
            .map_err(|e| Error::Storage(format!("Failed to commit cache: {e}")))?;

        debug!(entries = cache.len(), path = %self.path.display(), "Cache saved");
        Ok(())
    }
}
