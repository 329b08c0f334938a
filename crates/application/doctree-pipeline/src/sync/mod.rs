use std::fmt;

use camino::Utf8PathBuf;
use doctree_core::Category;
use serde::{Deserialize, Serialize};

use crate::walk::TraversalError;

pub mod engine;
pub mod execute;
pub mod local;

pub use engine::Reconciler;
pub use execute::{CopyError, CopyPrimitive, PlanExecutor};
pub use local::{cached_file_paths, clear_cache, CacheIndex};

type CompletionCb = Box<dyn FnOnce(&ReconcileReport) + Send>;

/// What one reconciliation pass should do.
pub struct ReconcileRequest {
    /// Only files of this category are pulled. `None` keeps every file.
    pub filter: Option<Category>,
    /// Delete cached files whose name no longer exists remotely.
    pub evict: bool,
    on_complete: Option<CompletionCb>,
}

impl ReconcileRequest {
    /// Keep the cache a by-name mirror of the remote subtree.
    pub fn mirror() -> Self {
        Self {
            filter: None,
            evict: true,
            on_complete: None,
        }
    }

    /// Pull files of one category into the cache, leaving other entries alone.
    pub fn filtered(category: Category) -> Self {
        Self {
            filter: Some(category),
            evict: false,
            on_complete: None,
        }
    }

    /// Invoked once with the final report after a successful pass.
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&ReconcileReport) + Send + 'static,
    {
        self.on_complete = Some(Box::new(f));
        self
    }

    pub(crate) fn take_completion(&mut self) -> Option<CompletionCb> {
        self.on_complete.take()
    }
}

impl fmt::Debug for ReconcileRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReconcileRequest")
            .field("filter", &self.filter)
            .field("evict", &self.evict)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub files_discovered: u64,
    pub files_unnamed: u64,
    pub files_filtered_out: u64,
    pub files_deleted: u64,
    pub delete_failures: u64,
    pub files_copied: u64,
    pub copy_failures: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    /// Local paths produced by successful copies, in copy order.
    pub copied: Vec<Utf8PathBuf>,
    pub stats: SyncStats,
}

/// High-level error type for reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Remote traversal error: {0}")]
    Traversal(#[from] TraversalError),
    #[error("Local state error: {0}")]
    Local(String),
}
