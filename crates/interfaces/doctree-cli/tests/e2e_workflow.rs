use std::fs;
use std::io;

use camino::Utf8PathBuf;
use doctree_cli::{commands, CliFileType};
use doctree_core::{Column, ColumnProjection};
use doctree_infra::LocalTreeProvider;
use tempfile::tempdir;

fn utf8(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
}

fn seed_tree(base: &Utf8PathBuf) {
    fs::create_dir_all(base.join("photos")).unwrap();
    fs::create_dir_all(base.join("music")).unwrap();
    fs::write(base.join("readme.txt"), b"hello").unwrap();
    fs::write(base.join("photos").join("cat.jpg"), b"jpeg").unwrap();
    fs::write(base.join("music").join("song.mp3"), b"mp3").unwrap();
}

#[tokio::test]
async fn mirror_pull_and_clear_workflow() {
    let tree_dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let tree = utf8(&tree_dir);
    let cache = utf8(&cache_dir).join("mirror");
    seed_tree(&tree);

    // 1. listing
    let stats = commands::cmd_list(tree.clone(), vec![], true).await.unwrap();
    assert_eq!(stats.rows_emitted, 5);
    assert_eq!(stats.directories_expanded, 3);

    let root_only = commands::cmd_list(tree.clone(), vec!["displayName".into()], false)
        .await
        .unwrap();
    assert_eq!(root_only.rows_emitted, 3);
    assert_eq!(root_only.directories_expanded, 1);

    // 2. matching
    let images = commands::cmd_matching(tree.clone(), CliFileType::Image)
        .await
        .unwrap();
    assert_eq!(images.len(), 1);
    assert!(images[0].ends_with("photos%2Fcat.jpg"), "{}", images[0]);

    // 3. filtered pull leaves other entries alone
    fs::create_dir_all(&cache).unwrap();
    fs::write(cache.join("keep.bin"), b"x").unwrap();
    let pulled = commands::cmd_pull(tree.clone(), cache.clone(), CliFileType::Audio)
        .await
        .unwrap();
    assert_eq!(pulled.stats.files_copied, 1);
    assert!(cache.join("song.mp3").exists());
    assert!(cache.join("keep.bin").exists());

    // 4. mirror evicts what the tree no longer has
    let mirrored = commands::cmd_mirror(tree.clone(), cache.clone()).await.unwrap();
    assert_eq!(mirrored.stats.files_deleted, 1);
    assert!(!cache.join("keep.bin").exists());

    let mut cached = commands::cmd_cached(cache.clone()).unwrap();
    cached.sort();
    let names: Vec<&str> = cached.iter().filter_map(|p| p.file_name()).collect();
    assert_eq!(names, vec!["cat.jpg", "readme.txt", "song.mp3"]);

    // 5. clear
    assert!(commands::cmd_clear(cache.clone()).unwrap());
    assert!(!cache.exists());
    assert!(!commands::cmd_clear(cache.clone()).unwrap());
    assert!(commands::cmd_cached(cache).unwrap().is_empty());
}

#[tokio::test]
async fn cache_one_copies_a_single_file() {
    let tree_dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let tree = utf8(&tree_dir);
    let cache = utf8(&cache_dir);
    seed_tree(&tree);

    let copied = commands::cmd_cache_one(tree.clone(), "photos/cat.jpg".into(), cache.clone())
        .await
        .unwrap();
    assert_eq!(copied, Some(cache.join("cat.jpg")));
    assert_eq!(fs::read(cache.join("cat.jpg")).unwrap(), b"jpeg");

    let missing = commands::cmd_cache_one(tree, "photos/none.jpg".into(), cache)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn listing_a_missing_tree_fails() {
    let dir = tempdir().unwrap();
    let tree = utf8(&dir).join("absent");
    assert!(commands::cmd_list(tree, vec![], true).await.is_err());
}

#[test]
fn unknown_columns_are_rejected() {
    assert!(commands::parse_columns(&["bogus".to_string()]).is_err());
    let p = commands::parse_columns(&[]).unwrap();
    assert_eq!(p.requested().len(), 4);
}

/// Accepts nothing: every write reports a closed pipe.
#[derive(Default)]
struct ClosedPipe {
    writes: usize,
}

impl io::Write for ClosedPipe {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn write_failure_stops_the_listing() {
    let dir = tempdir().unwrap();
    let tree = utf8(&dir);
    seed_tree(&tree);
    let provider = LocalTreeProvider::new(tree);
    let mut out = ClosedPipe::default();

    let err = commands::write_rows(
        &provider,
        &ColumnProjection::new([Column::DisplayName]),
        true,
        &mut out,
    )
    .unwrap_err();

    assert_eq!(out.writes, 1, "no row is written after the first failure");
    let io_err = err.downcast_ref::<io::Error>().unwrap();
    assert_eq!(io_err.kind(), io::ErrorKind::BrokenPipe);
}

#[test]
fn rows_are_written_as_json_lines() {
    let dir = tempdir().unwrap();
    let tree = utf8(&dir);
    seed_tree(&tree);
    let provider = LocalTreeProvider::new(tree);
    let mut out = Vec::new();

    let stats = commands::write_rows(
        &provider,
        &ColumnProjection::new([Column::DisplayName]),
        false,
        &mut out,
    )
    .unwrap();

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len() as u64, stats.rows_emitted);
    let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(first["data"]["displayName"], "music");
}
