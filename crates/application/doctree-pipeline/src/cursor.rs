use std::collections::BTreeMap;
use std::sync::Arc;

use doctree_core::{ChildListing, Column, ColumnValue};

/// One child row as delivered by the provider: every requested column it
/// could retrieve, keyed by column.
pub type CursorRow = BTreeMap<Column, ColumnValue>;

/// Forward-only sequence of child rows.
pub type RowCursor<'a> = Box<dyn Iterator<Item = CursorRow> + 'a>;

#[derive(Debug, thiserror::Error)]
pub enum CursorError {
    #[error("children of {uri} are unavailable: {reason}")]
    Unavailable { uri: String, reason: String },
}

impl CursorError {
    pub fn unavailable(listing: &ChildListing, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            uri: listing.uri(),
            reason: reason.into(),
        }
    }
}

/// Query capability of the remote store: list the children of one directory.
pub trait CursorAdapter: Send + Sync {
    fn list_children(
        &self,
        listing: &ChildListing,
        columns: &[Column],
    ) -> Result<RowCursor<'_>, CursorError>;
}

impl<T: CursorAdapter + ?Sized> CursorAdapter for Arc<T> {
    fn list_children(
        &self,
        listing: &ChildListing,
        columns: &[Column],
    ) -> Result<RowCursor<'_>, CursorError> {
        (**self).list_children(listing, columns)
    }
}
