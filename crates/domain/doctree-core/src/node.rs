use std::fmt;
use std::sync::Arc;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::path_utils::DocPath;

/// Characters left untouched when a document id is embedded in a URI path segment.
const DOCUMENT_ID: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const SCHEME: &str = "content://";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UriError {
    #[error("not a content uri: {0}")]
    Scheme(String),
    #[error("not a tree uri: {0}")]
    NotTree(String),
    #[error("invalid percent-encoding in {0}")]
    Encoding(String),
}

/// Opaque document identity as handed out by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The top-level node a caller was granted. Every reference produced during a
/// traversal is anchored to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TreeRoot {
    authority: Arc<str>,
    document_id: DocumentId,
}

impl TreeRoot {
    pub fn new(authority: impl AsRef<str>, document_id: DocumentId) -> Self {
        Self {
            authority: Arc::from(authority.as_ref()),
            document_id,
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    /// Identity of the root node itself.
    pub fn node(&self) -> NodeIdentity {
        NodeIdentity {
            root: self.clone(),
            parent: None,
            document_id: self.document_id.clone(),
            is_tree_root: true,
        }
    }

    /// Listing handle for the children of `parent`. Handles are always derived
    /// from the tree root, never from the intermediate directory.
    pub fn child_listing(&self, parent: &DocumentId) -> ChildListing {
        ChildListing {
            root: self.clone(),
            parent: parent.clone(),
        }
    }

    /// Reference to `document_id` re-anchored under this tree, with `parent` as
    /// its logical directory.
    pub fn child(&self, parent: &DocumentId, document_id: DocumentId) -> NodeIdentity {
        NodeIdentity {
            root: self.clone(),
            parent: Some(parent.clone()),
            document_id,
            is_tree_root: false,
        }
    }

    pub fn uri(&self) -> String {
        format!(
            "{SCHEME}{}/tree/{}",
            self.authority,
            encode(self.document_id.as_str())
        )
    }

    fn document_uri(&self, document_id: &DocumentId) -> String {
        format!("{}/document/{}", self.uri(), encode(document_id.as_str()))
    }
}

/// Handle passed to a cursor adapter to list the children of one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildListing {
    pub root: TreeRoot,
    pub parent: DocumentId,
}

impl ChildListing {
    pub fn uri(&self) -> String {
        format!("{}/children", self.root.document_uri(&self.parent))
    }
}

/// Reference to one node of the remote tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeIdentity {
    pub root: TreeRoot,
    pub parent: Option<DocumentId>,
    pub document_id: DocumentId,
    pub is_tree_root: bool,
}

impl NodeIdentity {
    pub fn uri(&self) -> String {
        if self.is_tree_root {
            self.root.uri()
        } else {
            self.root.document_uri(&self.document_id)
        }
    }

    pub fn parent_uri(&self) -> Option<String> {
        self.parent.as_ref().map(|p| {
            if *p == self.root.document_id {
                self.root.uri()
            } else {
                self.root.document_uri(p)
            }
        })
    }

    /// Final path segment of the document id, used as the flat cache filename.
    pub fn file_name(&self) -> Option<String> {
        if self.is_tree_root {
            return None;
        }
        DocPath::file_name(self.document_id.as_str())
    }

    /// Parse `content://{authority}/tree/{root}[/document/{doc}]`.
    pub fn parse_uri(uri: &str) -> Result<Self, UriError> {
        let rest = uri
            .strip_prefix(SCHEME)
            .ok_or_else(|| UriError::Scheme(uri.to_string()))?;
        let segments: Vec<&str> = rest.split('/').collect();

        match segments.as_slice() {
            [authority, "tree", root_id] => {
                let root = TreeRoot::new(authority, DocumentId::new(decode(root_id)?));
                Ok(root.node())
            }
            [authority, "tree", root_id, "document", doc_id] => {
                let root = TreeRoot::new(authority, DocumentId::new(decode(root_id)?));
                let doc = DocumentId::new(decode(doc_id)?);
                if doc == root.document_id {
                    return Ok(root.node());
                }
                Ok(NodeIdentity {
                    root,
                    parent: None,
                    document_id: doc,
                    is_tree_root: false,
                })
            }
            _ => Err(UriError::NotTree(uri.to_string())),
        }
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}

fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, DOCUMENT_ID).to_string()
}

fn decode(segment: &str) -> Result<String, UriError> {
    percent_decode_str(segment)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| UriError::Encoding(segment.to_string()))
}
