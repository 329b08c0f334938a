use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use doctree_core::{Column, ColumnProjection};
use doctree_infra::LocalTreeProvider;
use doctree_pipeline::sync::{cached_file_paths, clear_cache};
use doctree_pipeline::{ReconcileReport, ReconcileRequest, Reconciler, TraversalStats, Walker};
use indicatif::{ProgressBar, ProgressStyle};

use crate::CliFileType;

fn open_tree(tree: &Utf8Path) -> Arc<LocalTreeProvider> {
    Arc::new(LocalTreeProvider::new(tree.to_owned()))
}

/// Resolve a cache argument (bare name or absolute path) to a directory.
pub fn resolve_cache(cache: Option<String>) -> Result<Utf8PathBuf> {
    let name = cache.unwrap_or_else(|| doctree_config::DEFAULT_CACHE_DIR_NAME.to_string());
    doctree_config::resolve_cache_dir(&name)
        .with_context(|| format!("No cache base directory available for {name}"))
}

pub fn parse_columns(columns: &[String]) -> Result<ColumnProjection> {
    let names: Vec<&str> = if columns.is_empty() {
        doctree_config::DEFAULT_LIST_COLUMNS.to_vec()
    } else {
        columns.iter().map(String::as_str).collect()
    };
    let parsed = names
        .into_iter()
        .map(|n| n.parse::<Column>())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ColumnProjection::new(parsed))
}

fn spinner(msg: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(msg);
    pb
}

/// Write every row below the provider's root to `out` as JSON lines. The walk
/// is cancelled at the first write error, which is returned.
pub fn write_rows<W: Write>(
    provider: &LocalTreeProvider,
    projection: &ColumnProjection,
    recursive: bool,
    out: &mut W,
) -> Result<TraversalStats> {
    let root = provider.tree_root().node();
    let cancel = Arc::new(AtomicBool::new(false));
    let mut write_error: Option<io::Error> = None;

    let walked = Walker::new(provider)
        .with_cancel(cancel.clone())
        .traverse(&root, projection, recursive, |row| {
            if write_error.is_some() {
                return;
            }
            if let Err(e) = writeln!(out, "{}", row.to_json()) {
                write_error = Some(e);
                cancel.store(true, Ordering::Relaxed);
            }
        });

    if let Some(e) = write_error {
        return Err(anyhow::Error::new(e).context("Writing rows failed"));
    }
    let stats = walked?;
    out.flush().context("Writing rows failed")?;
    Ok(stats)
}

/// Stream rows of `tree` to stdout, one JSON object per line.
pub async fn cmd_list(
    tree: Utf8PathBuf,
    columns: Vec<String>,
    recursive: bool,
) -> Result<TraversalStats> {
    let projection = parse_columns(&columns)?;
    let provider = open_tree(&tree);

    let stats = tokio::task::spawn_blocking(move || {
        let mut out = io::stdout().lock();
        write_rows(&provider, &projection, recursive, &mut out)
    })
    .await?
    .with_context(|| format!("Listing {tree} failed"))?;

    tracing::info!(
        "Listed {} rows from {} directories",
        stats.rows_emitted,
        stats.directories_expanded
    );
    Ok(stats)
}

/// Print the URI of every file under `tree` matching `file_type`.
pub async fn cmd_matching(tree: Utf8PathBuf, file_type: CliFileType) -> Result<Vec<String>> {
    let provider = open_tree(&tree);
    let nodes = tokio::task::spawn_blocking(move || {
        let root = provider.tree_root().node();
        Reconciler::new(provider).matching_files(&root, file_type.into())
    })
    .await?
    .with_context(|| format!("Enumerating {tree} failed"))?;

    let uris: Vec<String> = nodes.iter().map(|n| n.uri()).collect();
    for uri in &uris {
        println!("{uri}");
    }
    Ok(uris)
}

pub async fn cmd_mirror(tree: Utf8PathBuf, cache: Utf8PathBuf) -> Result<ReconcileReport> {
    println!(":: Mirroring {} into {}", tree, cache);
    reconcile(tree, cache, ReconcileRequest::mirror()).await
}

pub async fn cmd_pull(
    tree: Utf8PathBuf,
    cache: Utf8PathBuf,
    file_type: CliFileType,
) -> Result<ReconcileReport> {
    println!(":: Pulling {:?} files from {} into {}", file_type, tree, cache);
    reconcile(tree, cache, ReconcileRequest::filtered(file_type.into())).await
}

async fn reconcile(
    tree: Utf8PathBuf,
    cache: Utf8PathBuf,
    request: ReconcileRequest,
) -> Result<ReconcileReport> {
    let pb = spinner(format!("Reconciling {cache}"));
    let request = {
        let pb = pb.clone();
        request.on_complete(move |report| {
            pb.finish_with_message(format!(
                "Copied {} files, evicted {}",
                report.stats.files_copied, report.stats.files_deleted
            ));
        })
    };

    let provider = open_tree(&tree);
    let target = cache.clone();
    let result = tokio::task::spawn_blocking(move || {
        let root = provider.tree_root().node();
        Reconciler::new(provider).reconcile(&root, &target, request)
    })
    .await?;

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            pb.abandon_with_message("Reconciliation aborted");
            return Err(anyhow::Error::new(e)
                .context(format!("Reconciling {tree} into {cache} failed")));
        }
    };

    println!("\n:: Result");
    println!("   Copied:        {}", report.stats.files_copied);
    println!("   Evicted:       {}", report.stats.files_deleted);
    println!("   Copy failures: {}", report.stats.copy_failures);
    if report.stats.files_unnamed > 0 {
        println!("   Unnamed:       {}", report.stats.files_unnamed);
    }
    Ok(report)
}

/// Copy one file of `tree` into `cache`.
pub async fn cmd_cache_one(
    tree: Utf8PathBuf,
    rel_path: String,
    cache: Utf8PathBuf,
) -> Result<Option<Utf8PathBuf>> {
    let provider = open_tree(&tree);
    let node = provider
        .node(&rel_path)
        .with_context(|| format!("Invalid document path {rel_path}"))?;

    let copied = tokio::task::spawn_blocking(move || {
        Reconciler::new(provider).cache_single(&node, &cache)
    })
    .await?;

    match &copied {
        Some(path) => println!("{path}"),
        None => println!(":: Could not cache {rel_path}"),
    }
    Ok(copied)
}

pub fn cmd_cached(cache: Utf8PathBuf) -> Result<Vec<Utf8PathBuf>> {
    let paths = cached_file_paths(&cache)?;
    for p in &paths {
        println!("{p}");
    }
    Ok(paths)
}

pub fn cmd_clear(cache: Utf8PathBuf) -> Result<bool> {
    let removed = clear_cache(&cache)?;
    if removed {
        println!(":: Cleared {cache}");
    } else {
        println!(":: Nothing to clear at {cache}");
    }
    Ok(removed)
}
