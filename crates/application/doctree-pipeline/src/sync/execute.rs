use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use doctree_core::path_utils::DocPath;
use doctree_core::{NodeIdentity, SyncPlan};
use tracing::{debug, warn};

use crate::sync::SyncStats;

#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("source {0} is unavailable")]
    SourceUnavailable(String),
    #[error("unsafe target file name: {0}")]
    UnsafeName(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Materializes one remote file as `target_dir/file_name`, returning the
/// local path written.
pub trait CopyPrimitive: Send + Sync {
    fn copy(
        &self,
        source: &NodeIdentity,
        target_dir: &Utf8Path,
        file_name: &str,
    ) -> Result<Utf8PathBuf, CopyError>;
}

impl<T: CopyPrimitive + ?Sized> CopyPrimitive for std::sync::Arc<T> {
    fn copy(
        &self,
        source: &NodeIdentity,
        target_dir: &Utf8Path,
        file_name: &str,
    ) -> Result<Utf8PathBuf, CopyError> {
        (**self).copy(source, target_dir, file_name)
    }
}

/// Runs a [`SyncPlan`] against a cache directory. Every action is
/// best-effort: failures are logged, counted and skipped.
pub struct PlanExecutor<'a> {
    copier: &'a dyn CopyPrimitive,
}

impl<'a> PlanExecutor<'a> {
    pub fn new(copier: &'a dyn CopyPrimitive) -> Self {
        Self { copier }
    }

    pub fn execute(&self, cache_dir: &Utf8Path, plan: &SyncPlan) -> (Vec<Utf8PathBuf>, SyncStats) {
        let mut stats = SyncStats::default();

        // Deletes
        for del in &plan.deletes {
            if !del.path.starts_with(cache_dir) {
                warn!("Refusing to delete {} outside {}", del.path, cache_dir);
                stats.delete_failures += 1;
                continue;
            }
            match fs::remove_file(&del.path) {
                Ok(()) => {
                    debug!("Evicted {}", del.path);
                    stats.files_deleted += 1;
                }
                Err(e) => {
                    warn!("Failed to evict {}: {}", del.path, e);
                    stats.delete_failures += 1;
                }
            }
        }

        // Copies
        let mut copied = Vec::with_capacity(plan.copies.len());
        for action in &plan.copies {
            if !DocPath::verify_safe(&action.file_name) {
                warn!("Skipping {}: unsafe file name {:?}", action.source, action.file_name);
                stats.copy_failures += 1;
                continue;
            }
            match self.copier.copy(&action.source, cache_dir, &action.file_name) {
                Ok(path) => {
                    debug!("Copied {} -> {}", action.source, path);
                    stats.files_copied += 1;
                    copied.push(path);
                }
                Err(e) => {
                    warn!("Failed to copy {}: {}", action.source, e);
                    stats.copy_failures += 1;
                }
            }
        }

        (copied, stats)
    }
}
