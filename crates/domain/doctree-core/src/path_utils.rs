use std::path::{Component, Path};

pub struct DocPath;

impl DocPath {
    /// Standardize directory separators to forward slashes.
    pub fn normalize(path: &str) -> String {
        path.replace('\\', "/")
    }

    /// Last segment of a hierarchical document id. A volume prefix such as
    /// `primary:` is dropped from top-level ids; nested segments are kept whole.
    pub fn file_name(document_id: &str) -> Option<String> {
        let normalized = Self::normalize(document_id);
        let name = match normalized.rsplit_once('/') {
            Some((_, last)) => last,
            None => normalized
                .split_once(':')
                .map_or(normalized.as_str(), |(_, rest)| rest),
        };
        if name.is_empty() || !Self::verify_safe(name) {
            return None;
        }
        Some(name.to_string())
    }

    /// A cache filename must stay inside the cache directory.
    pub fn verify_safe(name: &str) -> bool {
        let p = Path::new(name);
        !p.is_absolute()
            && !p.components().any(|c| {
                matches!(
                    c,
                    Component::ParentDir | Component::RootDir | Component::CurDir
                )
            })
    }

    /// Lowercased extension of `file_name`, if any.
    pub fn extension(file_name: &str) -> Option<String> {
        let (_, ext) = file_name.rsplit_once('.')?;
        if ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::DocPath;

    #[test]
    fn file_name_takes_final_segment() {
        assert_eq!(DocPath::file_name("primary:Music/a.mp3").as_deref(), Some("a.mp3"));
        assert_eq!(DocPath::file_name("primary:top.txt").as_deref(), Some("top.txt"));
        assert_eq!(DocPath::file_name("1234").as_deref(), Some("1234"));
        assert_eq!(DocPath::file_name("dir\\nested.bin").as_deref(), Some("nested.bin"));
    }

    #[test]
    fn colons_inside_nested_names_are_kept() {
        assert_eq!(DocPath::file_name("primary:Music/a:b.mp3").as_deref(), Some("a:b.mp3"));
        assert_eq!(
            DocPath::file_name("local:sub/notes:2024.txt").as_deref(),
            Some("notes:2024.txt")
        );
        assert_eq!(DocPath::file_name("primary:top:1.txt").as_deref(), Some("top:1.txt"));
    }

    #[test]
    fn file_name_rejects_empty_and_parent() {
        assert_eq!(DocPath::file_name("primary:"), None);
        assert_eq!(DocPath::file_name("primary:Music/"), None);
        assert_eq!(DocPath::file_name("primary:Music/.."), None);
        assert_eq!(DocPath::file_name("primary:Music/."), None);
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(DocPath::extension("Song.MP3").as_deref(), Some("mp3"));
        assert_eq!(DocPath::extension("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(DocPath::extension("README"), None);
        assert_eq!(DocPath::extension("trailing."), None);
    }
}
