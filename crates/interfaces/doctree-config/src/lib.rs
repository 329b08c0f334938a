//! Central configuration constants and defaults.

use camino::Utf8PathBuf;

/// Authority reported by the local-directory provider.
pub const LOCAL_AUTHORITY: &str = "org.doctree.localstorage";

/// Volume prefix of document ids handed out by the local-directory provider.
pub const LOCAL_VOLUME: &str = "local";

/// Cache directory name used when the caller does not pick one.
pub const DEFAULT_CACHE_DIR_NAME: &str = "doctree-cache";

/// Environment variable overriding the per-user cache base directory.
pub const CACHE_ROOT_ENV: &str = "DOCTREE_CACHE_ROOT";

/// Columns listed when the caller does not ask for specific ones.
pub const DEFAULT_LIST_COLUMNS: &[&str] = &["id", "displayName", "mimeType", "lastModified"];

/// Per-user base directory under which named caches live.
pub fn cache_root() -> Option<Utf8PathBuf> {
    if let Ok(p) = std::env::var(CACHE_ROOT_ENV) {
        if !p.is_empty() {
            return Some(Utf8PathBuf::from(p));
        }
    }
    let dirs = directories::ProjectDirs::from("org", "doctree", "doctree")?;
    Utf8PathBuf::from_path_buf(dirs.cache_dir().to_path_buf()).ok()
}

/// Resolve a cache argument: absolute paths are used as-is, bare names live
/// under [`cache_root`].
pub fn resolve_cache_dir(name_or_path: &str) -> Option<Utf8PathBuf> {
    let candidate = Utf8PathBuf::from(name_or_path);
    if candidate.is_absolute() {
        return Some(candidate);
    }
    cache_root().map(|root| root.join(name_or_path))
}
