#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use doctree_core::{
    ChildListing, Column, ColumnValue, DocumentId, NodeIdentity, TreeRoot, MIME_TYPE_DIR,
};
use doctree_pipeline::{CopyError, CopyPrimitive, CursorAdapter, CursorError, CursorRow, RowCursor};

pub const VOLUME: &str = "vol:";

#[derive(Debug, Clone)]
struct Entry {
    id: String,
    name: String,
    mime: Option<String>,
    content: Vec<u8>,
}

/// In-memory document tree. Paths are `/`-separated and relative to the root;
/// document ids are `vol:<path>`.
#[derive(Default)]
pub struct MemoryTree {
    children: HashMap<String, Vec<Entry>>,
    fail_listing: HashSet<String>,
    fail_copy: HashSet<String>,
    pub listings: Mutex<Vec<String>>,
    pub queried_columns: Mutex<Vec<Vec<Column>>>,
}

fn id_of(path: &str) -> String {
    format!("{VOLUME}{path}")
}

fn parent_id(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((parent, _)) => id_of(parent),
        None => VOLUME.to_string(),
    }
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> NodeIdentity {
        TreeRoot::new("test.docs", DocumentId::new(VOLUME)).node()
    }

    fn push(mut self, path: &str, mime: Option<&str>, content: &[u8]) -> Self {
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        self.children.entry(parent_id(path)).or_default().push(Entry {
            id: id_of(path),
            name,
            mime: mime.map(str::to_string),
            content: content.to_vec(),
        });
        self
    }

    pub fn dir(self, path: &str) -> Self {
        self.push(path, Some(MIME_TYPE_DIR), &[])
    }

    pub fn file(self, path: &str, mime: &str, content: &[u8]) -> Self {
        self.push(path, Some(mime), content)
    }

    /// A node whose MIME type the provider cannot report.
    pub fn untyped(self, path: &str, content: &[u8]) -> Self {
        self.push(path, None, content)
    }

    /// Listing the children of `path` ("" for the root) fails.
    pub fn failing_listing(mut self, path: &str) -> Self {
        let id = if path.is_empty() { VOLUME.to_string() } else { id_of(path) };
        self.fail_listing.insert(id);
        self
    }

    pub fn failing_copy(mut self, path: &str) -> Self {
        self.fail_copy.insert(id_of(path));
        self
    }

    pub fn listing_count(&self) -> usize {
        self.listings.lock().unwrap().len()
    }

    fn find(&self, id: &str) -> Option<&Entry> {
        self.children.values().flatten().find(|e| e.id == id)
    }
}

impl CursorAdapter for MemoryTree {
    fn list_children(
        &self,
        listing: &ChildListing,
        columns: &[Column],
    ) -> Result<RowCursor<'_>, CursorError> {
        let parent = listing.parent.as_str().to_string();
        self.listings.lock().unwrap().push(parent.clone());
        self.queried_columns.lock().unwrap().push(columns.to_vec());

        if self.fail_listing.contains(&parent) {
            return Err(CursorError::unavailable(listing, "permission revoked"));
        }

        let columns = columns.to_vec();
        let entries = self.children.get(&parent).cloned().unwrap_or_default();
        Ok(Box::new(entries.into_iter().map(move |e| {
            let mut row = CursorRow::new();
            for c in &columns {
                let value = match c {
                    Column::DocumentId => Some(ColumnValue::Text(e.id.clone())),
                    Column::DisplayName => Some(ColumnValue::Text(e.name.clone())),
                    Column::MimeType => e.mime.clone().map(ColumnValue::Text),
                    Column::Size => Some(ColumnValue::Integer(e.content.len() as i64)),
                    Column::LastModified => Some(ColumnValue::Integer(1_700_000_000_000)),
                    Column::Summary => None,
                };
                if let Some(v) = value {
                    row.insert(*c, v);
                }
            }
            row
        })))
    }
}

impl CopyPrimitive for MemoryTree {
    fn copy(
        &self,
        source: &NodeIdentity,
        target_dir: &Utf8Path,
        file_name: &str,
    ) -> Result<Utf8PathBuf, CopyError> {
        let id = source.document_id.as_str();
        if self.fail_copy.contains(id) {
            return Err(CopyError::SourceUnavailable(source.uri()));
        }
        let entry = self
            .find(id)
            .ok_or_else(|| CopyError::SourceUnavailable(source.uri()))?;
        std::fs::create_dir_all(target_dir)?;
        let target = target_dir.join(file_name);
        std::fs::write(&target, &entry.content)?;
        Ok(target)
    }
}

/// Route engine logs to the test harness so failures show the walk.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("doctree_pipeline=debug")
        .with_test_writer()
        .try_init();
}

pub fn utf8_dir(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
}

/// Sorted names of the files directly inside `dir`.
pub fn file_names(dir: &Utf8Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
