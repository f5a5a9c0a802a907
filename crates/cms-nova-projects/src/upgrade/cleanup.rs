//! Removal of files the template no longer ships
//!
//! Two detectors feed the same deletion step:
//! - files deleted upstream between the base and the target
//! - "zombies": tracked files under catalog roots that are absent from the
//!   target but appear in its history, directly or through a removed parent
//!   directory
//!
//! Deletion is only performed after confirmation. In batch mode the findings
//! are listed and nothing is removed.

use super::commit_all;
use super::prompt::Prompter;
use crate::error::Result;
use crate::git::{ChangeKind, VcsGateway};
use camino::{Utf8Path, Utf8PathBuf};
use cms_nova_core::config::SWEEP_ROOT;
use cms_nova_core::WorkingContext;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Commit message used after deleting deprecated files
pub const CLEANUP_COMMIT_MESSAGE: &str = "chore(upgrade): remove deprecated template files";

/// Inputs for the cleanup pass
#[derive(Debug, Clone)]
pub struct CleanupOptions<'a> {
    pub target: &'a str,
    pub base: Option<&'a str>,
    pub interactive: bool,
    /// Directories and files scanned for zombies
    pub scan_roots: &'a [String],
}

/// Outcome of the cleanup pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Deleted upstream between base and target, still present locally
    pub deprecated: Vec<String>,
    /// Absent from the target but known to its history
    pub zombies: Vec<String>,
    pub deleted: Vec<String>,
    /// Files that could not be removed, with the reason
    pub failed: Vec<(String, String)>,
    pub removed_dirs: Vec<String>,
    pub committed: bool,
}

impl CleanupReport {
    pub fn found_anything(&self) -> bool {
        !self.deprecated.is_empty() || !self.zombies.is_empty()
    }
}

/// Detect and, after confirmation, remove deprecated files
pub async fn cleanup_deprecated<G, P>(
    git: &G,
    prompter: &mut P,
    ctx: &WorkingContext,
    opts: &CleanupOptions<'_>,
) -> Result<CleanupReport>
where
    G: VcsGateway,
    P: Prompter + ?Sized,
{
    let mut report = CleanupReport::default();

    if !opts.interactive && opts.base.is_none() {
        info!("No base reference; skipping deprecated file detection");
        return Ok(report);
    }

    if let Some(base) = opts.base {
        report.deprecated = deleted_upstream(git, ctx, base, opts.target).await;
    }

    report.zombies = match find_zombies(git, ctx, opts.target, opts.scan_roots, &report.deprecated)
        .await
    {
        Ok(zombies) => zombies,
        Err(e) => {
            warn!("Zombie scan failed: {}", e);
            Vec::new()
        }
    };

    if !opts.interactive {
        for path in report.deprecated.iter().chain(report.zombies.iter()) {
            warn!("Deprecated template file still present: {}", path);
        }
        return Ok(report);
    }

    if !report.deprecated.is_empty() {
        prompter.show(&file_list("Removed upstream since your version:", &report.deprecated));
        let question = format!("Delete {} file(s) removed upstream?", report.deprecated.len());
        if prompter.confirm(&question, false)? {
            let paths = report.deprecated.clone();
            delete_files(ctx, &paths, &mut report);
        }
    }

    if !report.zombies.is_empty() {
        prompter.show(&file_list(
            "No longer in the template but present locally:",
            &report.zombies,
        ));
        let question = format!("Delete {} leftover file(s)?", report.zombies.len());
        if prompter.confirm(&question, false)? {
            let paths = report.zombies.clone();
            delete_files(ctx, &paths, &mut report);
        }
    }

    if !report.deleted.is_empty() {
        report.committed = commit_all(git, CLEANUP_COMMIT_MESSAGE).await;
    }

    let sweep_root = ctx.path(SWEEP_ROOT);
    if sweep_root.is_dir()
        && prompter.confirm(&format!("Remove empty directories under {}/?", SWEEP_ROOT), false)?
    {
        for dir in sweep_empty_dirs(&sweep_root) {
            report.removed_dirs.push(relative(&ctx.root, &dir));
        }
    }

    Ok(report)
}

fn file_list(title: &str, paths: &[String]) -> String {
    let mut text = title.to_string();
    for path in paths {
        text.push_str("\n  - ");
        text.push_str(path);
    }
    text
}

/// Files deleted between `base` and `target` that still exist locally
async fn deleted_upstream<G: VcsGateway>(
    git: &G,
    ctx: &WorkingContext,
    base: &str,
    target: &str,
) -> Vec<String> {
    let entries = match git.diff_name_status(base, target, &[]).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot list upstream deletions: {}", e);
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|entry| match entry.kind {
            ChangeKind::Deleted => Some(entry.path),
            ChangeKind::Renamed { old_path } => Some(old_path),
            _ => None,
        })
        .filter(|path| ctx.path(path).is_file())
        .collect()
}

/// Tracked files under `roots` that the target dropped
///
/// A file qualifies when the target's history contains it, or when its parent
/// directory is gone from the target but appears in its history. Paths in
/// `exclude` are not reported again.
pub async fn find_zombies<G: VcsGateway>(
    git: &G,
    ctx: &WorkingContext,
    target: &str,
    roots: &[String],
    exclude: &[String],
) -> Result<Vec<String>> {
    let roots: Vec<String> = roots
        .iter()
        .filter(|root| ctx.path(root).exists())
        .cloned()
        .collect();
    if roots.is_empty() {
        return Ok(Vec::new());
    }

    let tracked = git.tracked_files(&roots).await?;
    let in_target = git.list_tree(target, &roots).await?;
    let exclude: BTreeSet<&str> = exclude.iter().map(String::as_str).collect();
    let mut removed_dirs: HashMap<String, bool> = HashMap::new();
    let mut zombies = Vec::new();

    for path in tracked {
        if in_target.contains(&path)
            || exclude.contains(path.as_str())
            || !ctx.path(&path).is_file()
        {
            continue;
        }

        if git.path_history(target, &path).await {
            debug!("Zombie (file history): {}", path);
            zombies.push(path);
            continue;
        }

        let Some(parent) = Utf8Path::new(&path).parent().map(Utf8Path::as_str) else {
            continue;
        };
        if parent.is_empty() {
            continue;
        }
        let parent_removed = match removed_dirs.get(parent) {
            Some(known) => *known,
            None => {
                let removed = !git.path_exists_at_ref(target, parent).await
                    && git.path_history(target, parent).await;
                removed_dirs.insert(parent.to_string(), removed);
                removed
            }
        };
        if parent_removed {
            debug!("Zombie (removed directory): {}", path);
            zombies.push(path);
        }
    }

    Ok(zombies)
}

/// Remove files one at a time, pruning directories they leave empty
///
/// A failure is logged and recorded; the remaining files are still processed.
fn delete_files(ctx: &WorkingContext, paths: &[String], report: &mut CleanupReport) {
    for path in paths {
        match fs::remove_file(ctx.path(path)) {
            Ok(()) => {
                info!("Deleted {}", path);
                report.deleted.push(path.clone());
                report
                    .removed_dirs
                    .extend(prune_empty_ancestors(&ctx.root, path));
            }
            Err(e) => {
                warn!("Could not delete {}: {}", path, e);
                report.failed.push((path.clone(), e.to_string()));
            }
        }
    }
}

/// Remove the now-empty parent directories of `rel`, deepest first
///
/// Stops at the first non-empty directory and never removes `root`.
pub fn prune_empty_ancestors(root: &Utf8Path, rel: &str) -> Vec<String> {
    let mut removed = Vec::new();
    let mut current = Utf8Path::new(rel).parent();

    while let Some(dir) = current {
        if dir.as_str().is_empty() {
            break;
        }
        let abs = root.join(dir);
        if !is_empty_dir(&abs) || fs::remove_dir(&abs).is_err() {
            break;
        }
        debug!("Removed empty directory {}", dir);
        removed.push(dir.to_string());
        current = dir.parent();
    }

    removed
}

/// Remove every empty directory below `dir`, children before parents
pub fn sweep_empty_dirs(dir: &Utf8Path) -> Vec<Utf8PathBuf> {
    let mut removed = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let Some(path) = Utf8Path::from_path(entry.path()) else {
            continue;
        };
        if is_empty_dir(path) && fs::remove_dir(path).is_ok() {
            debug!("Removed empty directory {}", path);
            removed.push(path.to_path_buf());
        }
    }

    removed
}

fn is_empty_dir(path: &Utf8Path) -> bool {
    fs::read_dir(path)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}

fn relative(root: &Utf8Path, path: &Utf8Path) -> String {
    path.strip_prefix(root)
        .map(|p| p.to_string())
        .unwrap_or_else(|_| path.to_string())
}
