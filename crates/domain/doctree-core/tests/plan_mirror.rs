use std::collections::BTreeMap;

use camino::Utf8PathBuf;
use doctree_core::plan::plan;
use doctree_core::{DocumentId, RemoteFile, TreeRoot};

// --- Helpers ---

fn remote_file(id: &str) -> RemoteFile {
    let root = TreeRoot::new("auth", DocumentId::new("vol:"));
    let node = root.child(root.document_id(), DocumentId::new(id));
    let file_name = node.file_name().unwrap();
    RemoteFile { node, file_name }
}

fn index(names: &[&str]) -> BTreeMap<String, Utf8PathBuf> {
    names
        .iter()
        .map(|n| (n.to_string(), Utf8PathBuf::from(format!("/cache/{n}"))))
        .collect()
}

// --- Tests ---

#[test]
fn stale_names_are_evicted_and_all_remote_copied() {
    let remote = vec![remote_file("vol:a.txt"), remote_file("vol:sub/b.jpg")];
    let local = index(&["a.txt", "stale.txt"]);

    let plan = plan(&remote, &local, true);

    assert_eq!(plan.deletes.len(), 1);
    assert_eq!(plan.deletes[0].file_name, "stale.txt");
    assert_eq!(plan.deletes[0].path, Utf8PathBuf::from("/cache/stale.txt"));

    let names: Vec<&str> = plan.copies.iter().map(|c| c.file_name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.jpg"], "present files are still re-copied");
}

#[test]
fn no_eviction_when_disabled() {
    let remote = vec![remote_file("vol:a.txt")];
    let plan = plan(&remote, &index(&["stale.txt"]), false);
    assert!(plan.deletes.is_empty());
    assert_eq!(plan.copies.len(), 1);
}

#[test]
fn empty_remote_evicts_everything() {
    let plan = plan(&[], &index(&["x", "y"]), true);
    assert_eq!(plan.deletes.len(), 2);
    assert!(plan.copies.is_empty());
}

#[test]
fn duplicate_remote_names_are_both_copied() {
    let remote = vec![remote_file("vol:one/same.txt"), remote_file("vol:two/same.txt")];
    let plan = plan(&remote, &index(&["same.txt"]), true);
    assert!(plan.deletes.is_empty());
    assert_eq!(plan.copies.len(), 2);
}
