use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use doctree_core::{ChildListing, Column, ColumnProjection, DirectoryRow, DocumentId, NodeIdentity};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cursor::{CursorAdapter, CursorError};

#[derive(Debug, thiserror::Error)]
pub enum TraversalError {
    #[error("traversal aborted: {0}")]
    Listing(#[from] CursorError),
    #[error("traversal cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalStats {
    pub rows_emitted: u64,
    pub directories_expanded: u64,
    /// Rows dropped because the provider gave no document id.
    pub rows_skipped: u64,
}

/// Breadth-first walker over a remote tree.
///
/// Directories are expanded from an explicit FIFO queue, one blocking listing
/// per pop. Rows reach the callback in provider order as soon as they are
/// read. A listing that cannot be produced aborts the whole walk; rows already
/// delivered are not retracted.
pub struct Walker<'a> {
    cursor: &'a dyn CursorAdapter,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> Walker<'a> {
    pub fn new(cursor: &'a dyn CursorAdapter) -> Self {
        Self {
            cursor,
            cancel: None,
        }
    }

    /// Checked before each directory expansion.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn traverse<F>(
        &self,
        root: &NodeIdentity,
        projection: &ColumnProjection,
        recursive: bool,
        mut on_row: F,
    ) -> Result<TraversalStats, TraversalError>
    where
        F: FnMut(DirectoryRow),
    {
        let columns = projection.effective(recursive);
        debug!(
            "Traversing {} (recursive: {}, columns: {:?})",
            root, recursive, columns
        );

        let mut stats = TraversalStats::default();
        let mut queue: VecDeque<(NodeIdentity, ChildListing)> = VecDeque::new();
        let mut expanded: HashSet<DocumentId> = HashSet::new();

        expanded.insert(root.document_id.clone());
        queue.push_back((root.clone(), root.root.child_listing(&root.document_id)));

        while let Some((parent, listing)) = queue.pop_front() {
            if self.is_cancelled() {
                debug!("Traversal of {} cancelled", root);
                return Err(TraversalError::Cancelled);
            }

            debug!("Expanding {}", listing.uri());
            let rows = self.cursor.list_children(&listing, &columns).map_err(|e| {
                warn!("Listing unavailable for {}: {}", listing.uri(), e);
                e
            })?;
            stats.directories_expanded += 1;

            for mut values in rows {
                let Some(id) = values
                    .get(&Column::DocumentId)
                    .and_then(|v| v.as_str())
                    .map(DocumentId::new)
                else {
                    warn!("Skipping row without document id under {}", parent);
                    stats.rows_skipped += 1;
                    continue;
                };
                let mime = values
                    .get(&Column::MimeType)
                    .and_then(|v| v.as_str())
                    .map(str::to_owned);
                values.retain(|column, _| projection.contains(*column));

                let node = parent.root.child(&parent.document_id, id);
                let row = DirectoryRow::new(node, values, mime);

                let next = if recursive
                    && row.is_directory == Some(true)
                    && expanded.insert(row.node.document_id.clone())
                {
                    let listing = row.node.root.child_listing(&row.node.document_id);
                    Some((row.node.clone(), listing))
                } else {
                    None
                };

                on_row(row);
                stats.rows_emitted += 1;

                if let Some(next) = next {
                    queue.push_back(next);
                }
            }
        }

        debug!(
            "Traversal of {} complete: {} rows, {} directories",
            root, stats.rows_emitted, stats.directories_expanded
        );
        Ok(stats)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|c| c.load(Ordering::Relaxed))
    }
}

/// Walk `root` with `cursor`, streaming every discovered row to `on_row`.
pub fn traverse<F>(
    cursor: &dyn CursorAdapter,
    root: &NodeIdentity,
    projection: &ColumnProjection,
    recursive: bool,
    on_row: F,
) -> Result<TraversalStats, TraversalError>
where
    F: FnMut(DirectoryRow),
{
    Walker::new(cursor).traverse(root, projection, recursive, on_row)
}
