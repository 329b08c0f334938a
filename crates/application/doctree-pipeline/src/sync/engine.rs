use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use doctree_core::plan::plan as plan_cache;
use doctree_core::{
    classify, Category, Column, ColumnProjection, DirectoryRow, NodeIdentity, RemoteFile,
};
use tracing::{debug, info, warn};

use crate::cursor::CursorAdapter;
use crate::sync::execute::{CopyPrimitive, PlanExecutor};
use crate::sync::local::CacheIndex;
use crate::sync::{ReconcileReport, ReconcileRequest, SyncError, SyncStats};
use crate::walk::{TraversalError, TraversalStats, Walker};

/// Columns queried while collecting files to reconcile.
pub const SYNC_COLUMNS: [Column; 3] = [Column::DocumentId, Column::MimeType, Column::LastModified];

/// Keeps local cache directories consistent with remote subtrees.
///
/// One pass walks the remote subtree, diffs the discovered files against the
/// cache by filename, evicts stale entries when asked to, and re-copies every
/// remote file of interest. Listing failures abort the pass; eviction and
/// copy failures only drop the affected file from the result.
pub struct Reconciler {
    cursor: Arc<dyn CursorAdapter>,
    copier: Arc<dyn CopyPrimitive>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Reconciler {
    /// Use a single provider for both listing and copying.
    pub fn new<P>(provider: Arc<P>) -> Self
    where
        P: CursorAdapter + CopyPrimitive + 'static,
    {
        Self {
            cursor: provider.clone(),
            copier: provider,
            cancel: None,
        }
    }

    pub fn with_components(cursor: Arc<dyn CursorAdapter>, copier: Arc<dyn CopyPrimitive>) -> Self {
        Self {
            cursor,
            copier,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn walker(&self) -> Walker<'_> {
        let walker = Walker::new(self.cursor.as_ref());
        match &self.cancel {
            Some(c) => walker.with_cancel(c.clone()),
            None => walker,
        }
    }

    /// Enumerate `root`, streaming rows to `on_row`.
    pub fn traverse<F>(
        &self,
        root: &NodeIdentity,
        projection: &ColumnProjection,
        recursive: bool,
        on_row: F,
    ) -> Result<TraversalStats, TraversalError>
    where
        F: FnMut(DirectoryRow),
    {
        self.walker().traverse(root, projection, recursive, on_row)
    }

    /// Mirror every remote file under `root` into `cache_dir`, evicting
    /// cached names that no longer exist remotely.
    pub fn reconcile_mirror(
        &self,
        root: &NodeIdentity,
        cache_dir: &Utf8Path,
    ) -> Result<Vec<Utf8PathBuf>, SyncError> {
        Ok(self
            .reconcile(root, cache_dir, ReconcileRequest::mirror())?
            .copied)
    }

    /// Copy every remote file of `category` under `root` into `cache_dir`.
    pub fn reconcile_filtered(
        &self,
        root: &NodeIdentity,
        cache_dir: &Utf8Path,
        category: Category,
    ) -> Result<Vec<Utf8PathBuf>, SyncError> {
        Ok(self
            .reconcile(root, cache_dir, ReconcileRequest::filtered(category))?
            .copied)
    }

    pub fn reconcile(
        &self,
        root: &NodeIdentity,
        cache_dir: &Utf8Path,
        mut request: ReconcileRequest,
    ) -> Result<ReconcileReport, SyncError> {
        info!("Reconciling {} into {} ({:?})", root, cache_dir, request);

        let mut stats = SyncStats::default();
        let remote = self.collect_remote(root, request.filter, &mut stats)?;

        let index = CacheIndex::build(cache_dir)?;
        let plan = plan_cache(&remote, index.entries(), request.evict);
        debug!(
            "Plan for {}: {} deletes, {} copies",
            cache_dir,
            plan.deletes.len(),
            plan.copies.len()
        );

        let (copied, exec_stats) = PlanExecutor::new(self.copier.as_ref()).execute(cache_dir, &plan);
        stats.files_deleted = exec_stats.files_deleted;
        stats.delete_failures = exec_stats.delete_failures;
        stats.files_copied = exec_stats.files_copied;
        stats.copy_failures = exec_stats.copy_failures;

        info!(
            "Reconciled {}: {} copied, {} evicted, {} copy failures",
            cache_dir, stats.files_copied, stats.files_deleted, stats.copy_failures
        );

        let report = ReconcileReport { copied, stats };
        if let Some(cb) = request.take_completion() {
            cb(&report);
        }
        Ok(report)
    }

    /// Non-directory nodes under `root` that belong to `category`.
    pub fn matching_files(
        &self,
        root: &NodeIdentity,
        category: Category,
    ) -> Result<Vec<NodeIdentity>, SyncError> {
        let mut nodes = Vec::new();
        let projection = ColumnProjection::new(SYNC_COLUMNS);
        self.walker().traverse(root, &projection, true, |row| {
            if !row.is_file() {
                return;
            }
            let name = row.node.file_name().unwrap_or_default();
            if classify(category, row.mime_type(), &name) {
                nodes.push(row.node);
            }
        })?;
        Ok(nodes)
    }

    /// Copy one node into `cache_dir` under its inferred name.
    pub fn cache_single(&self, node: &NodeIdentity, cache_dir: &Utf8Path) -> Option<Utf8PathBuf> {
        let Some(file_name) = node.file_name() else {
            warn!("Cannot infer a file name for {}", node);
            return None;
        };
        match self.copier.copy(node, cache_dir, &file_name) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Failed to cache {}: {}", node, e);
                None
            }
        }
    }

    fn collect_remote(
        &self,
        root: &NodeIdentity,
        filter: Option<Category>,
        stats: &mut SyncStats,
    ) -> Result<Vec<RemoteFile>, SyncError> {
        let mut files = Vec::new();
        let projection = ColumnProjection::new(SYNC_COLUMNS);

        self.walker().traverse(root, &projection, true, |row| {
            if !row.is_file() {
                return;
            }
            stats.files_discovered += 1;

            let Some(file_name) = row.node.file_name() else {
                debug!("No file name for {}, skipping", row.node);
                stats.files_unnamed += 1;
                return;
            };
            if let Some(category) = filter {
                if !classify(category, row.mime_type(), &file_name) {
                    stats.files_filtered_out += 1;
                    return;
                }
            }
            files.push(RemoteFile {
                node: row.node,
                file_name,
            });
        })?;

        Ok(files)
    }
}
