use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::path_utils::DocPath;

/// Content category used to select files of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Any,
    Image,
    Audio,
    Video,
    Text,
    Application,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Any => "any",
            Category::Image => "image",
            Category::Audio => "audio",
            Category::Video => "video",
            Category::Text => "text",
            Category::Application => "application",
        }
    }

    /// Categories a bare extension maps to when no MIME type is known.
    fn for_extension(ext: &str) -> &'static [Category] {
        match ext {
            "mp3" | "m4a" | "m4b" | "wav" | "flac" | "aac" | "ogg" => &[Category::Audio],
            "mp4" | "avi" | "mkv" | "mov" | "wmv" => &[Category::Video],
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" => &[Category::Image],
            "txt" | "pdf" | "doc" | "docx" => &[Category::Text, Category::Application],
            _ => &[],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown file type: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "any" => Ok(Category::Any),
            "image" => Ok(Category::Image),
            "audio" => Ok(Category::Audio),
            "video" => Ok(Category::Video),
            "text" => Ok(Category::Text),
            "application" => Ok(Category::Application),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

/// Whether a file with the given MIME type and name belongs to `category`.
///
/// The MIME prefix decides when present; otherwise the lowercased extension of
/// `file_name` is looked up in a fixed table.
pub fn classify(category: Category, mime: Option<&str>, file_name: &str) -> bool {
    if category == Category::Any {
        return true;
    }
    match mime {
        Some(mime) => mime
            .strip_prefix(category.as_str())
            .is_some_and(|rest| rest.starts_with('/')),
        None => DocPath::extension(file_name)
            .is_some_and(|ext| Category::for_extension(&ext).contains(&category)),
    }
}
