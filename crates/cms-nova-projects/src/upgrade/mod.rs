//! Template upgrade engine
//!
//! Brings an existing project up to date with the template repository it was
//! created from, without losing local customizations. Two strategies exist:
//!
//! - **paths** (default): reconcile a curated set of paths file by file,
//!   then offer to remove files the template dropped
//! - **merge**: one `git merge` of the template into the project
//!
//! Every component takes the project root through [`WorkingContext`] and
//! talks to git through [`VcsGateway`]; operator input goes through a
//! [`Prompter`].
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use cms_nova_core::{UpgradeFlags, WorkingContext};
//! use cms_nova_projects::git::GitCli;
//! use cms_nova_projects::upgrade::{run_upgrade, ScriptedPrompter};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let root = Utf8Path::new("/srv/my-cms");
//! let ctx = WorkingContext::resolve(root, None);
//! let git = GitCli::new(root);
//! let flags = UpgradeFlags {
//!     interactive: false,
//!     ..Default::default()
//! };
//!
//! let outcome = run_upgrade(&git, &mut ScriptedPrompter::default(), &ctx, &flags).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

mod cleanup;
mod merge;
mod paths;
mod prompt;
mod reconcile;
mod refs;

pub use cleanup::{
    cleanup_deprecated, find_zombies, prune_empty_ancestors, sweep_empty_dirs, CleanupOptions,
    CleanupReport, CLEANUP_COMMIT_MESSAGE,
};
pub use merge::{
    merge_upstream, pending_commits, ConflictChoice, MergeReport, MERGE_COMMIT_MESSAGE,
    MERGE_FLAGS, RESOLVE_CONFLICTS_HINT,
};
pub use paths::{select_paths, smart_filter, PathSelection};
pub use prompt::{prompt_choice, Choice, MenuChoice, Prompter, ScriptedPrompter};
pub use reconcile::{
    contents_match, reconcile, ApplyToRest, FileDecision, FileState, ReconcileOptions,
    ReconcileReport, Resolution,
};
pub use refs::{resolve_base_ref, resolve_target_ref, BaseRef, BaseSource};

use crate::error::{Error, Result};
use crate::git::{DiffEntry, VcsGateway};
use chrono::{DateTime, Utc};
use cms_nova_core::{backup_tag_name, PathCatalog, UpgradeFlags, UpgradeMode, WorkingContext};
use tracing::{debug, info, warn};

/// Commit message when the smart filter narrowed the paths
pub const SMART_COMMIT_MESSAGE: &str = "chore(upgrade): sync template files (smart)";

/// Commit message when every present path was reconciled
pub const PATHS_COMMIT_MESSAGE: &str = "chore(upgrade): sync template files (paths mode)";

/// Facts about the project gathered before an upgrade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectState {
    pub is_git_repo: bool,
    /// `false` when the project is not a repository
    pub is_clean: bool,
    pub declared_version: Option<String>,
    pub template_repo: String,
}

impl ProjectState {
    pub async fn inspect<G: VcsGateway>(git: &G, ctx: &WorkingContext) -> Result<Self> {
        let is_git_repo = git.is_repository().await;
        let is_clean = if is_git_repo {
            git.is_clean().await?
        } else {
            false
        };

        Ok(Self {
            is_git_repo,
            is_clean,
            declared_version: ctx.metadata.declared_version.clone(),
            template_repo: ctx.template_repo.clone(),
        })
    }
}

/// What an upgrade run did
#[derive(Debug, Clone)]
pub enum UpgradeOutcome {
    /// Paths mode dry run: what would be reconciled
    Preview {
        target: String,
        base: Option<BaseRef>,
        entries: Vec<DiffEntry>,
        skipped: Vec<String>,
    },
    /// Merge mode dry run: commits the merge would bring in
    MergePreview { target: String, log: String },
    /// Smart filter found no template changes
    UpToDate {
        target: String,
        base: Option<BaseRef>,
        skipped: Vec<String>,
    },
    Synced {
        target: String,
        base: Option<BaseRef>,
        selection: PathSelection,
        reconcile: ReconcileReport,
        cleanup: CleanupReport,
    },
    Merged { target: String, report: MergeReport },
}

/// Run an upgrade of the project described by `ctx`
pub async fn run_upgrade<G, P>(
    git: &G,
    prompter: &mut P,
    ctx: &WorkingContext,
    flags: &UpgradeFlags,
) -> Result<UpgradeOutcome>
where
    G: VcsGateway,
    P: Prompter + ?Sized,
{
    check_preconditions(git, ctx, flags).await?;
    ensure_remote(git, ctx).await?;

    let target = resolve_target_ref(git, &ctx.remote, flags.tag.as_deref()).await;
    info!("Upgrading towards {} ({} mode)", target, flags.mode);

    match flags.mode {
        UpgradeMode::Paths => run_paths_mode(git, prompter, ctx, flags, target).await,
        UpgradeMode::Merge => run_merge_mode(git, prompter, flags, target).await,
    }
}

async fn check_preconditions<G: VcsGateway>(
    git: &G,
    ctx: &WorkingContext,
    flags: &UpgradeFlags,
) -> Result<()> {
    if !git.is_available().await {
        return Err(Error::GitNotFound);
    }
    if !git.is_repository().await {
        return Err(Error::not_a_repository(ctx.root.as_str()));
    }
    if !flags.allow_dirty && !git.is_clean().await? {
        return Err(Error::DirtyWorkingTree);
    }
    Ok(())
}

/// Register the template remote if missing, then fetch it with tags
pub async fn ensure_remote<G: VcsGateway>(git: &G, ctx: &WorkingContext) -> Result<()> {
    match git.remote_url(&ctx.remote).await? {
        Some(url) => debug!("Remote {} -> {}", ctx.remote, url),
        None => {
            info!("Adding remote {} -> {}", ctx.remote, ctx.template_repo);
            git.add_remote(&ctx.remote, &ctx.template_repo).await?;
        }
    }
    git.fetch_with_tags(&ctx.remote).await
}

/// Declared version, if it is valid semver
fn lookup_version(ctx: &WorkingContext) -> Option<&str> {
    match ctx.metadata.declared_semver() {
        Ok(Some(_)) => ctx.metadata.declared_version.as_deref(),
        Ok(None) => None,
        Err(e) => {
            warn!("Ignoring declared version: {}", e);
            None
        }
    }
}

async fn run_paths_mode<G, P>(
    git: &G,
    prompter: &mut P,
    ctx: &WorkingContext,
    flags: &UpgradeFlags,
    target: String,
) -> Result<UpgradeOutcome>
where
    G: VcsGateway,
    P: Prompter + ?Sized,
{
    let base = resolve_base_ref(git, lookup_version(ctx), &target).await;
    let base_name = base.as_ref().map(|b| b.name.as_str());

    let selection = select_paths(
        git,
        &ctx.catalog,
        &target,
        base_name,
        flags.explicit_paths.as_deref(),
    )
    .await?;

    if selection.is_up_to_date() {
        info!("Template paths unchanged since {}", base_name.unwrap_or("base"));
        return Ok(UpgradeOutcome::UpToDate {
            target,
            base,
            skipped: selection.skipped,
        });
    }

    if flags.dry_run {
        let entries = git
            .diff_name_status("HEAD", &target, &selection.to_process)
            .await?;
        return Ok(UpgradeOutcome::Preview {
            target,
            base,
            entries,
            skipped: selection.skipped,
        });
    }

    let reconcile_opts = ReconcileOptions {
        target: &target,
        base: base_name,
        interactive: flags.interactive,
        backup: flags.backup,
        commit_message: if selection.smart {
            SMART_COMMIT_MESSAGE
        } else {
            PATHS_COMMIT_MESSAGE
        },
    };
    let reconciled = reconcile(git, prompter, ctx, &selection.to_process, &reconcile_opts).await?;

    let scan_roots = match &flags.explicit_paths {
        Some(paths) if !paths.is_empty() => PathCatalog::from_paths(paths).paths,
        _ => ctx.catalog.paths.clone(),
    };
    let cleanup_opts = CleanupOptions {
        target: &target,
        base: base_name,
        interactive: flags.interactive,
        scan_roots: &scan_roots,
    };
    let cleanup = cleanup_deprecated(git, prompter, ctx, &cleanup_opts).await?;

    Ok(UpgradeOutcome::Synced {
        target,
        base,
        selection,
        reconcile: reconciled,
        cleanup,
    })
}

async fn run_merge_mode<G, P>(
    git: &G,
    prompter: &mut P,
    flags: &UpgradeFlags,
    target: String,
) -> Result<UpgradeOutcome>
where
    G: VcsGateway,
    P: Prompter + ?Sized,
{
    if flags.dry_run {
        let log = pending_commits(git, &target).await?;
        return Ok(UpgradeOutcome::MergePreview { target, log });
    }

    let report = merge_upstream(git, prompter, &target, flags.interactive, flags.backup).await?;
    Ok(UpgradeOutcome::Merged { target, report })
}

/// Tag `HEAD` as a restore point
///
/// Failure is logged and the upgrade continues without a backup.
pub async fn create_backup_tag<G: VcsGateway>(git: &G, at: DateTime<Utc>) -> Option<String> {
    let name = backup_tag_name(at);
    match git.create_tag(&name).await {
        Ok(()) => {
            info!("Created backup tag {}", name);
            Some(name)
        }
        Err(e) => {
            warn!("Could not create backup tag {}: {}", name, e);
            None
        }
    }
}

/// Stage everything and commit
///
/// Returns whether a commit was made. Nothing to commit is not an error.
pub(crate) async fn commit_all<G: VcsGateway>(git: &G, message: &str) -> bool {
    if let Err(e) = git.stage_all().await {
        warn!("Could not stage changes: {}", e);
        return false;
    }
    match git.commit(message).await {
        Ok(()) => {
            info!("Committed: {}", message);
            true
        }
        Err(e) => {
            info!("No commit created: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fake::FakeGateway;
    use camino::Utf8Path;
    use std::fs;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> WorkingContext {
        WorkingContext::resolve(Utf8Path::from_path(dir.path()).unwrap(), None)
    }

    fn batch_flags() -> UpgradeFlags {
        UpgradeFlags {
            interactive: false,
            backup: false,
            ..Default::default()
        }
    }

    /// Project declaring 1.0.0, template now ships a new schema
    fn project(dir: &TempDir) -> FakeGateway {
        fs::write(
            dir.path().join("package.json"),
            r#"{"name":"site","version":"1.0.0"}"#,
        )
        .unwrap();
        FakeGateway::new(Utf8Path::from_path(dir.path()).unwrap())
            .with_head(&[
                ("package.json", r#"{"name":"site","version":"1.0.0"}"#),
                ("prisma/schema.prisma", "model Post {}"),
                ("src/lib/db.ts", "db"),
            ])
            .with_ref(
                "v1.0.0",
                &[
                    ("package.json", r#"{"name":"site","version":"1.0.0"}"#),
                    ("prisma/schema.prisma", "model Post {}"),
                    ("src/lib/db.ts", "db"),
                ],
            )
            .with_ref(
                "upstream/main",
                &[
                    ("package.json", r#"{"name":"site","version":"1.0.0"}"#),
                    ("prisma/schema.prisma", "model Post {}\nmodel Tag {}"),
                    ("src/lib/db.ts", "db"),
                ],
            )
    }

    #[tokio::test]
    async fn test_preconditions() {
        let dir = TempDir::new().unwrap();
        let mut git = project(&dir);
        let ctx = context(&dir);
        let mut prompter = ScriptedPrompter::default();

        git.available = false;
        let result = run_upgrade(&git, &mut prompter, &ctx, &batch_flags()).await;
        assert!(matches!(result, Err(Error::GitNotFound)));

        git.available = true;
        git.repository = false;
        let result = run_upgrade(&git, &mut prompter, &ctx, &batch_flags()).await;
        assert!(matches!(result, Err(Error::NotARepository { .. })));

        git.repository = true;
        git.clean = false;
        let result = run_upgrade(&git, &mut prompter, &ctx, &batch_flags()).await;
        assert!(matches!(result, Err(Error::DirtyWorkingTree)));
        assert!(git.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut git = project(&dir);
        let ctx = context(&dir);
        git.fetch_fails = true;

        let result = run_upgrade(&git, &mut ScriptedPrompter::default(), &ctx, &batch_flags()).await;
        assert!(matches!(result, Err(Error::GitOperation { .. })));
        assert_eq!(git.remote("upstream").as_deref(), Some(ctx.template_repo.as_str()));
    }

    #[tokio::test]
    async fn test_paths_mode_syncs_and_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let git = project(&dir);
        let ctx = context(&dir);
        let mut prompter = ScriptedPrompter::default();

        let outcome = run_upgrade(&git, &mut prompter, &ctx, &batch_flags()).await.unwrap();
        let UpgradeOutcome::Synced { base, reconcile, selection, .. } = outcome else {
            panic!("expected a sync");
        };
        assert_eq!(base.unwrap().name, "v1.0.0");
        assert!(selection.smart);
        assert_eq!(reconcile.changed_files(), vec!["prisma/schema.prisma"]);
        assert_eq!(git.commits(), vec![SMART_COMMIT_MESSAGE]);
        assert_eq!(
            fs::read_to_string(dir.path().join("prisma/schema.prisma")).unwrap(),
            "model Post {}\nmodel Tag {}"
        );

        run_upgrade(&git, &mut prompter, &ctx, &batch_flags()).await.unwrap();
        assert_eq!(git.commits().len(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let git = project(&dir);
        let ctx = context(&dir);
        let flags = UpgradeFlags {
            dry_run: true,
            ..batch_flags()
        };

        let outcome = run_upgrade(&git, &mut ScriptedPrompter::default(), &ctx, &flags)
            .await
            .unwrap();

        let UpgradeOutcome::Preview { entries, .. } = outcome else {
            panic!("expected a preview");
        };
        assert_eq!(entries, vec![DiffEntry::modified("prisma/schema.prisma")]);
        assert!(git.commits().is_empty());
        assert_eq!(
            fs::read_to_string(dir.path().join("prisma/schema.prisma")).unwrap(),
            "model Post {}"
        );
    }

    #[tokio::test]
    async fn test_up_to_date() {
        let dir = TempDir::new().unwrap();
        let git = project(&dir).with_ref(
            "upstream/main",
            &[
                ("package.json", r#"{"name":"site","version":"1.0.0"}"#),
                ("prisma/schema.prisma", "model Post {}"),
                ("src/lib/db.ts", "db"),
            ],
        );
        let catalog = PathCatalog {
            paths: vec!["src/lib".to_string()],
            always_check: Vec::new(),
        };
        let ctx = context(&dir).with_catalog(catalog);

        let outcome = run_upgrade(&git, &mut ScriptedPrompter::default(), &ctx, &batch_flags())
            .await
            .unwrap();
        assert!(matches!(outcome, UpgradeOutcome::UpToDate { .. }));
    }

    #[tokio::test]
    async fn test_merge_mode_dry_run() {
        let dir = TempDir::new().unwrap();
        let git = project(&dir);
        let ctx = context(&dir);
        let flags = UpgradeFlags {
            mode: UpgradeMode::Merge,
            dry_run: true,
            ..batch_flags()
        };

        let outcome = run_upgrade(&git, &mut ScriptedPrompter::default(), &ctx, &flags)
            .await
            .unwrap();
        let UpgradeOutcome::MergePreview { log, .. } = outcome else {
            panic!("expected a merge preview");
        };
        assert!(log.contains("..upstream/main"));
        assert!(!git.calls().iter().any(|c| c.starts_with("merge")));
    }

    #[tokio::test]
    async fn test_project_state() {
        let dir = TempDir::new().unwrap();
        let git = project(&dir);
        let ctx = context(&dir);

        let state = ProjectState::inspect(&git, &ctx).await.unwrap();
        assert!(state.is_git_repo);
        assert!(state.is_clean);
        assert_eq!(state.declared_version.as_deref(), Some("1.0.0"));
    }

    #[tokio::test]
    async fn test_backup_tag_uses_timestamp() {
        let dir = TempDir::new().unwrap();
        let git = FakeGateway::new(Utf8Path::from_path(dir.path()).unwrap());
        let at = DateTime::parse_from_rfc3339("2026-03-01T10:20:30Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(
            create_backup_tag(&git, at).await.as_deref(),
            Some("backup-20260301102030")
        );
    }
}
