//! Document provider backed by a local directory.
//!
//! Document ids take the form `<volume>:<relative/path>`, with `<volume>:` naming
//! the base directory itself. Listings are sorted by file name so traversal
//! order is reproducible.

use std::fs;
use std::time::UNIX_EPOCH;

use camino::{Utf8Path, Utf8PathBuf};
use doctree_config::{LOCAL_AUTHORITY, LOCAL_VOLUME};
use doctree_core::path_utils::DocPath;
use doctree_core::{
    ChildListing, Column, ColumnValue, DocumentId, NodeIdentity, TreeRoot, MIME_TYPE_DIR,
};
use doctree_pipeline::{CopyError, CopyPrimitive, CursorAdapter, CursorError, CursorRow, RowCursor};
use tracing::{debug, warn};

use crate::io_utils::robust_rename;

mod mime;

pub use mime::mime_for;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("document {0} does not belong to this provider")]
    ForeignDocument(String),
    #[error("document id escapes the provider root: {0}")]
    OutsideRoot(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct LocalTreeProvider {
    authority: String,
    volume: String,
    base: Utf8PathBuf,
}

impl LocalTreeProvider {
    pub fn new(base: impl Into<Utf8PathBuf>) -> Self {
        Self {
            authority: LOCAL_AUTHORITY.to_string(),
            volume: LOCAL_VOLUME.to_string(),
            base: base.into(),
        }
    }

    pub fn base(&self) -> &Utf8Path {
        &self.base
    }

    /// The granted root: the whole base directory.
    pub fn tree_root(&self) -> TreeRoot {
        TreeRoot::new(&self.authority, DocumentId::new(format!("{}:", self.volume)))
    }

    /// Reference to the node at `rel_path` below the base directory.
    pub fn node(&self, rel_path: &str) -> Result<NodeIdentity, ProviderError> {
        let rel = DocPath::normalize(rel_path);
        let rel = rel.trim_matches('/');
        let root = self.tree_root();
        if rel.is_empty() {
            return Ok(root.node());
        }
        let id = self.document_id(Utf8Path::new(rel));
        self.resolve(&id)?;
        let parent = match rel.rsplit_once('/') {
            Some((parent, _)) => self.document_id(Utf8Path::new(parent)),
            None => root.document_id().clone(),
        };
        Ok(root.child(&parent, id))
    }

    fn document_id(&self, rel: &Utf8Path) -> DocumentId {
        DocumentId::new(format!("{}:{}", self.volume, rel))
    }

    fn resolve(&self, id: &DocumentId) -> Result<Utf8PathBuf, ProviderError> {
        let rel = id
            .as_str()
            .strip_prefix(&self.volume)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or_else(|| ProviderError::ForeignDocument(id.to_string()))?;
        if rel.is_empty() {
            return Ok(self.base.clone());
        }
        if !DocPath::verify_safe(rel) {
            return Err(ProviderError::OutsideRoot(id.to_string()));
        }
        Ok(self.base.join(rel))
    }

    fn check_authority(&self, root: &TreeRoot) -> Result<(), ProviderError> {
        if root.authority() != self.authority {
            return Err(ProviderError::ForeignDocument(root.uri()));
        }
        Ok(())
    }

    fn row_for(&self, path: &Utf8Path, columns: &[Column]) -> Option<CursorRow> {
        let rel = path.strip_prefix(&self.base).ok()?;
        let name = path.file_name()?;
        let meta = match fs::symlink_metadata(path) {
            // Links to files are served as the file; links to directories are
            // never listed, so a link back to an ancestor cannot loop.
            Ok(link) if link.file_type().is_symlink() => match fs::metadata(path) {
                Ok(target) if target.is_dir() => {
                    debug!("Not following directory link {}", path);
                    return None;
                }
                Ok(target) => Some(target),
                Err(e) => {
                    warn!("Dangling link {}: {}", path, e);
                    None
                }
            },
            Ok(meta) => Some(meta),
            Err(e) => {
                warn!("Cannot stat {}: {}", path, e);
                None
            }
        };

        let mut row = CursorRow::new();
        for column in columns {
            let value = match column {
                Column::DocumentId => Some(ColumnValue::Text(self.document_id(rel).to_string())),
                Column::DisplayName => Some(ColumnValue::Text(name.to_string())),
                Column::MimeType => meta.as_ref().map(|m| {
                    let mime = if m.is_dir() { MIME_TYPE_DIR } else { mime_for(name) };
                    ColumnValue::Text(mime.to_string())
                }),
                Column::LastModified => meta
                    .as_ref()
                    .and_then(|m| m.modified().ok())
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| ColumnValue::Integer(d.as_millis() as i64)),
                Column::Size => meta
                    .as_ref()
                    .filter(|m| m.is_file())
                    .map(|m| ColumnValue::Integer(m.len() as i64)),
                Column::Summary => None,
            };
            if let Some(v) = value {
                row.insert(*column, v);
            }
        }
        Some(row)
    }
}

impl CursorAdapter for LocalTreeProvider {
    fn list_children(
        &self,
        listing: &ChildListing,
        columns: &[Column],
    ) -> Result<RowCursor<'_>, CursorError> {
        let dir = self
            .check_authority(&listing.root)
            .and_then(|_| self.resolve(&listing.parent))
            .map_err(|e| CursorError::unavailable(listing, e.to_string()))?;

        let read = fs::read_dir(&dir).map_err(|e| CursorError::unavailable(listing, e.to_string()))?;
        let mut paths: Vec<Utf8PathBuf> = read
            .filter_map(|e| e.ok())
            .filter_map(|e| Utf8PathBuf::from_path_buf(e.path()).ok())
            .collect();
        paths.sort();
        debug!("Listing {}: {} entries", dir, paths.len());

        let columns = columns.to_vec();
        Ok(Box::new(
            paths
                .into_iter()
                .filter_map(move |p| self.row_for(&p, &columns)),
        ))
    }
}

impl CopyPrimitive for LocalTreeProvider {
    fn copy(
        &self,
        source: &NodeIdentity,
        target_dir: &Utf8Path,
        file_name: &str,
    ) -> Result<Utf8PathBuf, CopyError> {
        if !DocPath::verify_safe(file_name) {
            return Err(CopyError::UnsafeName(file_name.to_string()));
        }
        let src = self
            .check_authority(&source.root)
            .and_then(|_| self.resolve(&source.document_id))
            .map_err(|e| CopyError::SourceUnavailable(format!("{source}: {e}")))?;
        if !src.is_file() {
            return Err(CopyError::SourceUnavailable(source.uri()));
        }

        fs::create_dir_all(target_dir)?;
        let target = target_dir.join(file_name);
        let tmp = target_dir.join(format!(".{}.part", uuid::Uuid::new_v4()));

        if let Err(e) = fs::copy(&src, &tmp) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        if let Ok(meta) = fs::metadata(&src) {
            let mtime = filetime::FileTime::from_last_modification_time(&meta);
            if let Err(e) = filetime::set_file_mtime(&tmp, mtime) {
                warn!("Failed to carry mtime onto {}: {}", target, e);
            }
        }
        if let Err(e) = robust_rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        Ok(target)
    }
}
