//! Per-file reconciliation between the working tree and the target
//!
//! Every file the target changed relative to `HEAD` is classified, then
//! either updated in batch or offered to the operator one at a time.

use super::prompt::{prompt_choice, Choice, Prompter};
use super::{commit_all, create_backup_tag};
use crate::error::Result;
use crate::git::{ChangeKind, DiffEntry, VcsGateway};
use cms_nova_core::config::PACKAGE_MANIFEST;
use cms_nova_core::WorkingContext;
use chrono::Utc;
use std::fmt;
use tracing::{debug, info, warn};

/// Classification of one changed file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Local content already matches the target
    Identical,
    /// Both the project and the template changed the file
    Conflict,
    /// Only the template changed the file
    RemoteOnlyChange,
    /// File is gone from the target; the local copy is never touched here
    LocalOnly,
}

impl FileState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identical => "identical",
            Self::Conflict => "conflict",
            Self::RemoteOnlyChange => "template change",
            Self::LocalOnly => "local only",
        }
    }
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    KeptLocal,
    TakenFromTemplate,
    PatchedPartially,
    Skipped,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeptLocal => "kept local",
            Self::TakenFromTemplate => "updated",
            Self::PatchedPartially => "patched",
            Self::Skipped => "skipped",
        }
    }

    /// Whether the working tree now differs from `HEAD` for this file
    pub fn changed_working_tree(&self) -> bool {
        matches!(self, Self::TakenFromTemplate | Self::PatchedPartially)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sticky decision covering every remaining file
///
/// Starts `Undecided` and flips at most once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplyToRest {
    #[default]
    Undecided,
    AcceptAll,
    RejectAll,
}

/// Classification and outcome for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDecision {
    pub path: String,
    pub change: ChangeKind,
    pub exists_in_target: bool,
    pub is_content_identical: bool,
    /// `None` when no base was available to compare against
    pub is_locally_modified: Option<bool>,
    pub state: FileState,
    pub resolution: Resolution,
}

/// Inputs for a reconciliation pass
#[derive(Debug, Clone)]
pub struct ReconcileOptions<'a> {
    pub target: &'a str,
    pub base: Option<&'a str>,
    pub interactive: bool,
    pub backup: bool,
    pub commit_message: &'a str,
}

/// Outcome of a reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    pub backup_tag: Option<String>,
    pub decisions: Vec<FileDecision>,
    pub committed: bool,
}

impl ReconcileReport {
    /// Paths whose working copy was updated from the target
    pub fn changed_files(&self) -> Vec<&str> {
        self.decisions
            .iter()
            .filter(|d| d.resolution.changed_working_tree())
            .map(|d| d.path.as_str())
            .collect()
    }

    /// Files that needed a decision because both sides changed
    pub fn conflicts(&self) -> Vec<&str> {
        self.decisions
            .iter()
            .filter(|d| d.state == FileState::Conflict)
            .map(|d| d.path.as_str())
            .collect()
    }

    /// Whether the package manifest changed, so dependencies need reinstalling
    pub fn manifest_changed(&self) -> bool {
        self.changed_files().contains(&PACKAGE_MANIFEST)
    }
}

/// Compare two file contents ignoring carriage returns and outer whitespace
pub fn contents_match(local: &[u8], remote: &[u8]) -> bool {
    normalize(local) == normalize(remote)
}

fn normalize(content: &[u8]) -> Vec<u8> {
    let stripped: Vec<u8> = content.iter().copied().filter(|b| *b != b'\r').collect();
    stripped.trim_ascii().to_vec()
}

/// Reconcile `paths` against `opts.target`
///
/// Files deleted upstream are reported as local-only and left alone; cleanup
/// handles them separately. Working-tree changes are staged and committed in
/// one commit at the end. A failed commit is reported, not raised.
pub async fn reconcile<G, P>(
    git: &G,
    prompter: &mut P,
    ctx: &WorkingContext,
    paths: &[String],
    opts: &ReconcileOptions<'_>,
) -> Result<ReconcileReport>
where
    G: VcsGateway,
    P: Prompter + ?Sized,
{
    let mut report = ReconcileReport::default();
    if opts.backup {
        report.backup_tag = create_backup_tag(git, Utc::now()).await;
    }

    let entries = git.diff_name_status("HEAD", opts.target, paths).await?;
    info!("{} file(s) differ from {}", entries.len(), opts.target);

    let mut batch = Vec::new();
    let mut sticky = ApplyToRest::Undecided;

    for (path, change) in entries.into_iter().flat_map(expand) {
        let mut decision = classify(git, ctx, &path, change, opts).await;

        match decision.state {
            FileState::Identical => decision.resolution = Resolution::Skipped,
            FileState::LocalOnly => decision.resolution = Resolution::KeptLocal,
            _ if !opts.interactive => {
                if decision.state == FileState::Conflict {
                    warn!("{} has local changes; overwriting with template version", path);
                }
                batch.push(path.clone());
                decision.resolution = Resolution::TakenFromTemplate;
            }
            _ => {
                let (resolution, next) =
                    resolve_interactively(git, prompter, &decision, opts.target, sticky).await?;
                decision.resolution = resolution;
                sticky = next;
            }
        }

        debug!("{}: {} -> {}", decision.path, decision.state, decision.resolution);
        report.decisions.push(decision);
    }

    if !batch.is_empty() {
        git.checkout_paths(opts.target, &batch).await?;
    }

    report.committed = commit_all(git, opts.commit_message).await;
    Ok(report)
}

/// Split a diff entry into (path, change) pairs to classify
///
/// A rename contributes its new path as an addition and its old path as a
/// local-only file.
fn expand(entry: DiffEntry) -> Vec<(String, ChangeKind)> {
    match entry.kind {
        ChangeKind::Renamed { old_path } => vec![
            (entry.path, ChangeKind::Added),
            (old_path, ChangeKind::Deleted),
        ],
        kind => vec![(entry.path, kind)],
    }
}

async fn classify<G: VcsGateway>(
    git: &G,
    ctx: &WorkingContext,
    path: &str,
    change: ChangeKind,
    opts: &ReconcileOptions<'_>,
) -> FileDecision {
    let mut decision = FileDecision {
        path: path.to_string(),
        change: change.clone(),
        exists_in_target: !matches!(change, ChangeKind::Deleted),
        is_content_identical: false,
        is_locally_modified: None,
        state: FileState::LocalOnly,
        resolution: Resolution::Skipped,
    };

    if !decision.exists_in_target {
        return decision;
    }

    let local = tokio::fs::read(ctx.path(path)).await.ok();
    if let Some(local) = &local {
        decision.is_content_identical = match git.show_file(opts.target, path).await {
            Ok(remote) => contents_match(local, &remote),
            Err(e) => {
                debug!("Cannot read {} at {}: {}", path, opts.target, e);
                false
            }
        };
    }
    if decision.is_content_identical {
        decision.state = FileState::Identical;
        return decision;
    }

    decision.is_locally_modified = match (&change, &local) {
        // New upstream file with nothing local in the way
        (ChangeKind::Added, None) => Some(false),
        // Untracked local file occupying the template's path
        (ChangeKind::Added, Some(_)) => Some(true),
        _ => match opts.base {
            Some(base) => match git.diff_name_status(base, "HEAD", &[path.to_string()]).await {
                Ok(entries) => Some(!entries.is_empty()),
                Err(e) => {
                    debug!("Cannot compare {} with base {}: {}", path, base, e);
                    None
                }
            },
            None => None,
        },
    };

    decision.state = match decision.is_locally_modified {
        Some(false) => FileState::RemoteOnlyChange,
        _ => FileState::Conflict,
    };
    decision
}

async fn resolve_interactively<G, P>(
    git: &G,
    prompter: &mut P,
    decision: &FileDecision,
    target: &str,
    sticky: ApplyToRest,
) -> Result<(Resolution, ApplyToRest)>
where
    G: VcsGateway,
    P: Prompter + ?Sized,
{
    let path = decision.path.as_str();
    match sticky {
        ApplyToRest::AcceptAll => return Ok((take_from_template(git, target, path).await, sticky)),
        ApplyToRest::RejectAll => return Ok((Resolution::KeptLocal, sticky)),
        ApplyToRest::Undecided => {}
    }

    prompter.show(&format!("[{}] {} ({})", decision.change.letter(), path, decision.state));
    if decision.state == FileState::Conflict {
        prompter.show("Local changes detected: taking the template version overwrites them.");
    }

    loop {
        let question = format!("Update {} from template?", path);
        match prompt_choice(prompter, &question, Choice::ALL)? {
            Choice::AcceptTemplate => {
                return Ok((take_from_template(git, target, path).await, sticky));
            }
            Choice::KeepLocal => return Ok((Resolution::KeptLocal, sticky)),
            Choice::ShowDiff => match git.diff_text("HEAD", target, path).await {
                Ok(diff) if diff.trim().is_empty() => prompter.show("(no textual difference)"),
                Ok(diff) => prompter.show(&diff),
                Err(e) => prompter.show(&format!("Diff unavailable: {}", e)),
            },
            Choice::Patch => match git.patch_path(target, path).await {
                Ok(()) => return Ok((Resolution::PatchedPartially, sticky)),
                Err(e) => prompter.show(&format!("Patch failed: {}", e)),
            },
            Choice::AcceptAll => {
                let resolution = take_from_template(git, target, path).await;
                return Ok((resolution, ApplyToRest::AcceptAll));
            }
            Choice::RejectAll => return Ok((Resolution::KeptLocal, ApplyToRest::RejectAll)),
        }
    }
}

async fn take_from_template<G: VcsGateway>(git: &G, target: &str, path: &str) -> Resolution {
    match git.checkout_paths(target, &[path.to_string()]).await {
        Ok(()) => Resolution::TakenFromTemplate,
        Err(e) => {
            warn!("Could not update {}: {}", path, e);
            Resolution::Skipped
        }
    }
}
