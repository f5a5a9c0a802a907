//! Merge mode: a single git merge of the target into the project

use super::prompt::{prompt_choice, MenuChoice, Prompter};
use super::{commit_all, create_backup_tag};
use crate::error::{Error, Result};
use crate::git::{ConflictSide, MergeStatus, VcsGateway};
use chrono::Utc;
use tracing::{info, warn};

/// Commit message for a completed merge
pub const MERGE_COMMIT_MESSAGE: &str = "chore(upgrade): merge template";

/// Command the operator runs after resolving leftover conflicts
pub const RESOLVE_CONFLICTS_HINT: &str =
    "git add -A && git commit -m \"chore(upgrade): resolve conflicts\"";

/// Flags passed to `git merge`; the commit is made separately
pub const MERGE_FLAGS: &[&str] = &["--no-commit", "--no-ff", "--allow-unrelated-histories"];

/// How to settle one conflicted path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictChoice {
    KeepOurs,
    TakeTheirs,
    Manual,
    Skip,
}

impl ConflictChoice {
    pub const ALL: &'static [ConflictChoice] = &[
        ConflictChoice::KeepOurs,
        ConflictChoice::TakeTheirs,
        ConflictChoice::Manual,
        ConflictChoice::Skip,
    ];
}

impl MenuChoice for ConflictChoice {
    fn key(&self) -> &'static str {
        match self {
            Self::KeepOurs => "o",
            Self::TakeTheirs => "t",
            Self::Manual => "m",
            Self::Skip => "s",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::KeepOurs => "keep mine",
            Self::TakeTheirs => "take template",
            Self::Manual => "resolve manually",
            Self::Skip => "leave conflicted",
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            Self::KeepOurs => &["ours"],
            Self::TakeTheirs => &["theirs"],
            Self::Manual => &["manual"],
            Self::Skip => &["skip"],
        }
    }
}

/// Outcome of a merge-mode upgrade
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub backup_tag: Option<String>,
    /// Paths git reported as conflicted
    pub conflicts: Vec<String>,
    pub resolved: Vec<String>,
    /// Conflicts left for the operator; nothing was committed
    pub unresolved: Vec<String>,
    /// Staged changes rolled back during review
    pub reverted: Vec<String>,
    pub committed: bool,
}

/// Commits the target has that `HEAD` lacks, as a decorated graph
pub async fn pending_commits<G: VcsGateway>(git: &G, target: &str) -> Result<String> {
    if !git.ref_exists(target).await {
        return Err(Error::target_ref_unresolved(target));
    }
    git.log_graph(&format!("..{}", target)).await
}

/// Merge `target` into the working branch
///
/// Conflicts are offered one by one when `interactive`. The merge is only
/// committed when no conflict remains.
pub async fn merge_upstream<G, P>(
    git: &G,
    prompter: &mut P,
    target: &str,
    interactive: bool,
    backup: bool,
) -> Result<MergeReport>
where
    G: VcsGateway,
    P: Prompter + ?Sized,
{
    if !git.ref_exists(target).await {
        return Err(Error::target_ref_unresolved(target));
    }

    let mut report = MergeReport::default();
    if backup {
        report.backup_tag = create_backup_tag(git, Utc::now()).await;
    }

    info!("Merging {}", target);
    report.conflicts = match git.merge(target, MERGE_FLAGS).await? {
        MergeStatus::Clean => Vec::new(),
        MergeStatus::Conflicts(paths) => paths,
    };

    for path in &report.conflicts {
        let settled = interactive && resolve_conflict(git, prompter, path).await?;
        if settled {
            report.resolved.push(path.clone());
        } else {
            report.unresolved.push(path.clone());
        }
    }

    if !report.unresolved.is_empty() {
        warn!("{} conflict(s) left unresolved", report.unresolved.len());
        return Ok(report);
    }

    if interactive && prompter.confirm("Review staged changes before committing?", false)? {
        report.reverted = review_staged(git, prompter).await?;
    }

    report.committed = commit_all(git, MERGE_COMMIT_MESSAGE).await;
    Ok(report)
}

/// Returns whether the path was resolved and staged
async fn resolve_conflict<G, P>(git: &G, prompter: &mut P, path: &str) -> Result<bool>
where
    G: VcsGateway,
    P: Prompter + ?Sized,
{
    let question = format!("Conflict in {}", path);
    let side = match prompt_choice(prompter, &question, ConflictChoice::ALL)? {
        ConflictChoice::KeepOurs => ConflictSide::Ours,
        ConflictChoice::TakeTheirs => ConflictSide::Theirs,
        ConflictChoice::Manual => {
            let done = prompter.confirm(
                &format!("Edit {} to resolve the markers. Mark as resolved?", path),
                true,
            )?;
            if done {
                git.stage(&[path.to_string()]).await?;
            }
            return Ok(done);
        }
        ConflictChoice::Skip => return Ok(false),
    };

    if let Err(e) = git.checkout_side(side, path).await {
        warn!("Could not check out {} side of {}: {}", side.as_flag(), path, e);
        return Ok(false);
    }
    git.stage(&[path.to_string()]).await?;
    Ok(true)
}

/// Walk staged paths, restoring the ones the operator rejects
async fn review_staged<G, P>(git: &G, prompter: &mut P) -> Result<Vec<String>>
where
    G: VcsGateway,
    P: Prompter + ?Sized,
{
    let mut reverted = Vec::new();
    for path in git.staged_paths().await? {
        if prompter.confirm(&format!("Keep template change to {}?", path), true)? {
            continue;
        }
        if git.path_exists_at_ref("HEAD", &path).await {
            git.checkout_paths("HEAD", &[path.clone()]).await?;
        } else {
            git.remove_path(&path).await?;
        }
        reverted.push(path);
    }
    Ok(reverted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fake::FakeGateway;
    use crate::upgrade::prompt::ScriptedPrompter;
    use camino::Utf8Path;
    use tempfile::TempDir;

    fn gateway(dir: &TempDir) -> FakeGateway {
        FakeGateway::new(Utf8Path::from_path(dir.path()).unwrap())
            .with_head(&[("package.json", "{}"), ("src/lib/auth.ts", "auth")])
            .with_ref("upstream/main", &[("package.json", "{\"v\":2}")])
    }

    #[tokio::test]
    async fn test_clean_merge_commits() {
        let dir = TempDir::new().unwrap();
        let git = gateway(&dir).with_staged(&["package.json"]);
        let mut prompter = ScriptedPrompter::new(["n"]);

        let report = merge_upstream(&git, &mut prompter, "upstream/main", true, false)
            .await
            .unwrap();

        assert!(report.committed);
        assert!(report.conflicts.is_empty());
        assert_eq!(git.commits(), vec![MERGE_COMMIT_MESSAGE]);
        assert!(git.calls().contains(
            &"merge --no-commit --no-ff --allow-unrelated-histories upstream/main".to_string()
        ));
    }

    #[tokio::test]
    async fn test_interactive_conflict_resolution() {
        let dir = TempDir::new().unwrap();
        let git = gateway(&dir)
            .with_conflicts(&["package.json", "src/lib/auth.ts", "README.md"])
            .with_staged(&["package.json"]);
        // ours, manual + confirm, theirs, then skip review
        let mut prompter = ScriptedPrompter::new(["o", "m", "y", "t", "n"]);

        let report = merge_upstream(&git, &mut prompter, "upstream/main", true, false)
            .await
            .unwrap();

        assert_eq!(report.resolved.len(), 3);
        assert!(report.unresolved.is_empty());
        assert!(report.committed);
        let calls = git.calls();
        assert!(calls.contains(&"checkout --ours -- package.json".to_string()));
        assert!(calls.contains(&"checkout --theirs -- README.md".to_string()));
        assert!(calls.contains(&"add src/lib/auth.ts".to_string()));
    }

    #[tokio::test]
    async fn test_skipped_conflict_blocks_commit() {
        let dir = TempDir::new().unwrap();
        let git = gateway(&dir).with_conflicts(&["package.json"]);
        let mut prompter = ScriptedPrompter::new(["s"]);

        let report = merge_upstream(&git, &mut prompter, "upstream/main", true, false)
            .await
            .unwrap();

        assert_eq!(report.unresolved, vec!["package.json"]);
        assert!(!report.committed);
        assert!(git.commits().is_empty());
    }

    #[tokio::test]
    async fn test_batch_leaves_conflicts() {
        let dir = TempDir::new().unwrap();
        let git = gateway(&dir).with_conflicts(&["package.json"]);
        let mut prompter = ScriptedPrompter::default();

        let report = merge_upstream(&git, &mut prompter, "upstream/main", false, false)
            .await
            .unwrap();

        assert_eq!(report.unresolved, vec!["package.json"]);
        assert!(prompter.questions.is_empty());
    }

    #[tokio::test]
    async fn test_review_reverts_rejected_paths() {
        let dir = TempDir::new().unwrap();
        let git = gateway(&dir).with_staged(&["package.json", "src/new.ts"]);
        // review yes, reject both
        let mut prompter = ScriptedPrompter::new(["y", "n", "n"]);

        let report = merge_upstream(&git, &mut prompter, "upstream/main", true, false)
            .await
            .unwrap();

        assert_eq!(report.reverted, vec!["package.json", "src/new.ts"]);
        let calls = git.calls();
        assert!(calls.contains(&"checkout HEAD -- package.json".to_string()));
        assert!(calls.contains(&"rm src/new.ts".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_target() {
        let dir = TempDir::new().unwrap();
        let git = gateway(&dir);
        let mut prompter = ScriptedPrompter::default();

        let result = merge_upstream(&git, &mut prompter, "upstream/gone", true, false).await;
        assert!(matches!(result, Err(Error::TargetRefUnresolved { .. })));
        assert!(pending_commits(&git, "upstream/gone").await.is_err());
        assert!(pending_commits(&git, "upstream/main").await.unwrap().contains("..upstream/main"));
    }
}
