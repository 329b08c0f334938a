use std::collections::BTreeMap;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::sync::SyncError;

/// Flat view of a cache directory: filename -> absolute path.
#[derive(Debug, Clone, Default)]
pub struct CacheIndex {
    entries: BTreeMap<String, Utf8PathBuf>,
}

impl CacheIndex {
    /// Scan the top level of `cache_dir`. Subdirectories are ignored and a
    /// missing directory yields an empty index. Never touches the filesystem
    /// beyond reading it.
    pub fn build(cache_dir: &Utf8Path) -> Result<Self, SyncError> {
        let mut entries = BTreeMap::new();
        if !cache_dir.exists() {
            debug!("Cache directory {} does not exist yet", cache_dir);
            return Ok(Self { entries });
        }

        for entry in WalkDir::new(cache_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| SyncError::Local(format!("scan {cache_dir}: {e}")))?;
            if !entry.path().is_file() {
                continue;
            }
            let path = match Utf8PathBuf::from_path_buf(entry.into_path()) {
                Ok(p) => p,
                Err(p) => {
                    warn!("Ignoring non-utf8 cache entry {}", p.display());
                    continue;
                }
            };
            if let Some(name) = path.file_name() {
                entries.insert(name.to_string(), path.clone());
            }
        }

        debug!("Indexed {} cached files in {}", entries.len(), cache_dir);
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &BTreeMap<String, Utf8PathBuf> {
        &self.entries
    }

    pub fn get(&self, file_name: &str) -> Option<&Utf8Path> {
        self.entries.get(file_name).map(|p| p.as_path())
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.entries.contains_key(file_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every file below `cache_dir`, at any depth.
pub fn cached_file_paths(cache_dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, SyncError> {
    if !cache_dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in WalkDir::new(cache_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| SyncError::Local(format!("walk {cache_dir}: {e}")))?;
        if !entry.file_type().is_file() {
            continue;
        }
        match Utf8PathBuf::from_path_buf(entry.into_path()) {
            Ok(p) => paths.push(p),
            Err(p) => warn!("Ignoring non-utf8 cache entry {}", p.display()),
        }
    }
    Ok(paths)
}

/// Remove `cache_dir` and everything in it. Returns whether anything was removed.
pub fn clear_cache(cache_dir: &Utf8Path) -> Result<bool, SyncError> {
    if !cache_dir.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(cache_dir)
        .map_err(|e| SyncError::Local(format!("clear {cache_dir}: {e}")))?;
    debug!("Cleared cache directory {}", cache_dir);
    Ok(true)
}
