pub mod cursor;
pub mod sync;
pub mod walk;

pub use cursor::{CursorAdapter, CursorError, CursorRow, RowCursor};
pub use sync::{
    CacheIndex, CopyError, CopyPrimitive, ReconcileReport, ReconcileRequest, Reconciler,
    SyncError, SyncStats,
};
pub use walk::{traverse, TraversalError, TraversalStats, Walker};

// Re-export domain types callers need alongside the engine
pub use doctree_core::{classify, Category, Column, ColumnProjection, DirectoryRow, NodeIdentity};
