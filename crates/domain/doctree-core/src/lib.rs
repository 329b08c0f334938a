use camino::Utf8PathBuf;

pub mod classify;
pub mod node;
pub mod path_utils;
pub mod plan;
pub mod projection;

pub use classify::{classify, Category};
pub use node::{ChildListing, DocumentId, NodeIdentity, TreeRoot, UriError};
pub use projection::{Column, ColumnProjection, ColumnValue, DirectoryRow};

/// MIME type the provider reports for directory nodes.
pub const MIME_TYPE_DIR: &str = "vnd.android.document/directory";

/// A non-directory node discovered during traversal, paired with the flat
/// filename it will occupy in the local cache.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteFile {
    pub node: NodeIdentity,
    pub file_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub deletes: Vec<DeleteAction>,
    pub copies: Vec<CopyAction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteAction {
    pub file_name: String,
    pub path: Utf8PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CopyAction {
    pub source: NodeIdentity,
    pub file_name: String,
}
