use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::node::NodeIdentity;
use crate::MIME_TYPE_DIR;

/// Metadata fields a provider can report for each child row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum Column {
    #[serde(rename = "id")]
    DocumentId,
    DisplayName,
    MimeType,
    LastModified,
    Size,
    Summary,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::DocumentId,
        Column::DisplayName,
        Column::MimeType,
        Column::LastModified,
        Column::Size,
        Column::Summary,
    ];

    /// Columns the traversal engine needs to recurse.
    pub const REQUIRED_FOR_RECURSION: [Column; 2] = [Column::MimeType, Column::DocumentId];

    /// Field name on the provider side of the query.
    pub fn key(self) -> &'static str {
        match self {
            Column::DocumentId => "document_id",
            Column::DisplayName => "_display_name",
            Column::MimeType => "mime_type",
            Column::LastModified => "last_modified",
            Column::Size => "_size",
            Column::Summary => "summary",
        }
    }

    /// Field name in encoded rows.
    pub fn output_name(self) -> &'static str {
        match self {
            Column::DocumentId => "id",
            Column::DisplayName => "displayName",
            Column::MimeType => "mimeType",
            Column::LastModified => "lastModified",
            Column::Size => "size",
            Column::Summary => "summary",
        }
    }

    /// Whether the provider reports this column as an integer.
    pub fn is_integer(self) -> bool {
        matches!(self, Column::LastModified | Column::Size)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.output_name())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown column: {0}")]
pub struct UnknownColumn(pub String);

impl FromStr for Column {
    type Err = UnknownColumn;

    /// Accepts either the output name or the provider key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Column::ALL
            .into_iter()
            .find(|c| c.output_name() == s || c.key() == s)
            .ok_or_else(|| UnknownColumn(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Integer(i64),
    Text(String),
}

impl ColumnValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ColumnValue::Text(s) => Some(s),
            ColumnValue::Integer(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Integer(v) => Some(*v),
            ColumnValue::Text(_) => None,
        }
    }
}

/// Caller-requested columns, deduplicated in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnProjection {
    requested: Vec<Column>,
}

impl ColumnProjection {
    pub fn new(columns: impl IntoIterator<Item = Column>) -> Self {
        let mut requested = Vec::new();
        for c in columns {
            if !requested.contains(&c) {
                requested.push(c);
            }
        }
        Self { requested }
    }

    pub fn requested(&self) -> &[Column] {
        &self.requested
    }

    pub fn contains(&self, column: Column) -> bool {
        self.requested.contains(&column)
    }

    /// Columns to query: the requested set plus what the engine needs. The
    /// document id is always needed to reference emitted rows; the MIME type
    /// only when directories must be expanded.
    pub fn effective(&self, recursive: bool) -> Vec<Column> {
        let mut columns = self.requested.clone();
        let required: &[Column] = if recursive {
            &Column::REQUIRED_FOR_RECURSION
        } else {
            &[Column::DocumentId]
        };
        for c in required {
            if !columns.contains(c) {
                columns.push(*c);
            }
        }
        columns
    }
}

/// One node discovered during traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryRow {
    pub node: NodeIdentity,
    /// Only the caller-requested columns the provider could deliver.
    pub data: BTreeMap<Column, ColumnValue>,
    /// `None` when the MIME type was not retrievable.
    pub is_directory: Option<bool>,
    mime_type: Option<String>,
}

impl DirectoryRow {
    pub fn new(
        node: NodeIdentity,
        data: BTreeMap<Column, ColumnValue>,
        mime_type: Option<String>,
    ) -> Self {
        let is_directory = mime_type.as_deref().map(|m| m == MIME_TYPE_DIR);
        Self {
            node,
            data,
            is_directory,
            mime_type,
        }
    }

    /// MIME type as reported by the provider, whether or not it was requested.
    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn is_file(&self) -> bool {
        self.is_directory == Some(false)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RowMetadata {
    parent_uri: Option<String>,
    root_uri: String,
    is_directory: Option<bool>,
    uri: String,
}

#[derive(Serialize)]
struct EncodedRow<'a> {
    data: &'a BTreeMap<Column, ColumnValue>,
    metadata: RowMetadata,
}

impl Serialize for DirectoryRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        EncodedRow {
            data: &self.data,
            metadata: RowMetadata {
                parent_uri: self.node.parent_uri(),
                root_uri: self.node.root.uri(),
                is_directory: self.is_directory,
                uri: self.node.uri(),
            },
        }
        .serialize(serializer)
    }
}
