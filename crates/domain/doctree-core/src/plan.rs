use std::collections::{BTreeMap, HashSet};

use camino::Utf8PathBuf;

use crate::{CopyAction, DeleteAction, RemoteFile, SyncPlan};

/// Build the plan that brings a flat cache directory in line with `remote`.
///
/// With `evict`, every cached filename that no remote file maps to is
/// scheduled for deletion. Every remote file is copied regardless of whether
/// the cache already holds that name; matching is by name only.
pub fn plan(
    remote: &[RemoteFile],
    local: &BTreeMap<String, Utf8PathBuf>,
    evict: bool,
) -> SyncPlan {
    let mut deletes = Vec::new();

    if evict {
        let remote_names: HashSet<&str> = remote.iter().map(|f| f.file_name.as_str()).collect();
        for (name, path) in local {
            if !remote_names.contains(name.as_str()) {
                deletes.push(DeleteAction {
                    file_name: name.clone(),
                    path: path.clone(),
                });
            }
        }
    }

    let copies = remote
        .iter()
        .map(|f| CopyAction {
            source: f.node.clone(),
            file_name: f.file_name.clone(),
        })
        .collect();

    SyncPlan { deletes, copies }
}
