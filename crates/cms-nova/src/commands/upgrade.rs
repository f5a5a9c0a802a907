//! Upgrade command: sync an existing project with the template

use anyhow::Result;
use cms_nova_core::{UpgradeFlags, WorkingContext};
use cms_nova_projects::git::{ChangeKind, DiffEntry, GitCli};
use cms_nova_projects::upgrade::{
    run_upgrade, CleanupReport, FileDecision, MergeReport, ProjectState, ReconcileReport,
    UpgradeOutcome, RESOLVE_CONFLICTS_HINT,
};
use tabled::{settings::Style as TableStyle, Table, Tabled};
use tracing::debug;

use super::current_dir;
use crate::cli::UpgradeArgs;
use crate::output;
use crate::prompt::TerminalPrompter;

pub async fn run(args: UpgradeArgs) -> Result<()> {
    let root = match args.dir {
        Some(dir) => dir,
        None => current_dir()?,
    };
    let ctx = WorkingContext::resolve(&root, args.template_repo.as_deref());
    let flags = UpgradeFlags {
        mode: args.mode.into(),
        tag: args.tag,
        dry_run: args.dry_run,
        backup: args.backup,
        allow_dirty: args.allow_dirty,
        interactive: args.interactive,
        explicit_paths: args.paths,
    };
    debug!("Upgrade flags: {:?}", flags);

    let git = GitCli::new(&root);
    let state = ProjectState::inspect(&git, &ctx).await?;

    output::header("CMS Nova Upgrade");
    output::kv("Project", root.as_str());
    output::kv("Template", &state.template_repo);
    output::kv(
        "Version",
        state.declared_version.as_deref().unwrap_or("unknown"),
    );
    output::kv("Mode", flags.mode.as_str());
    if flags.dry_run {
        output::kv("Dry run", "yes");
    }
    println!();

    let mut prompter = TerminalPrompter;
    let outcome = run_upgrade(&git, &mut prompter, &ctx, &flags).await?;

    match outcome {
        UpgradeOutcome::Preview {
            target,
            base,
            entries,
            skipped,
        } => {
            if let Some(base) = base {
                output::kv("Base", &base.to_string());
            }
            show_preview(&target, &entries);
            show_skipped(&skipped);
        }
        UpgradeOutcome::MergePreview { target, log } => {
            output::header(&format!("Commits to merge from {}", target));
            if log.trim().is_empty() {
                output::success("Already up to date");
            } else {
                println!("{}", log.trim_end());
                println!();
                output::info("Run without --dry-run to merge");
            }
        }
        UpgradeOutcome::UpToDate {
            target,
            base,
            skipped,
        } => {
            show_skipped(&skipped);
            match base {
                Some(base) => output::success(&format!(
                    "Project is up to date with {} (no template changes since {})",
                    target, base.name
                )),
                None => output::success(&format!("Project is up to date with {}", target)),
            }
        }
        UpgradeOutcome::Synced {
            target,
            base,
            selection,
            reconcile,
            cleanup,
        } => {
            if let Some(base) = &base {
                output::kv("Base", &base.to_string());
            } else {
                output::warning(
                    "No base version found: every file was compared directly and deletion detection was limited",
                );
            }
            show_skipped(&selection.skipped);
            show_reconcile(&target, &reconcile);
            show_cleanup(&cleanup, flags.interactive);
        }
        UpgradeOutcome::Merged { target, report } => show_merge(&target, &report),
    }

    Ok(())
}

#[derive(Tabled)]
struct DecisionRow {
    file: String,
    change: String,
    state: String,
    result: String,
}

impl From<&FileDecision> for DecisionRow {
    fn from(decision: &FileDecision) -> Self {
        Self {
            file: decision.path.clone(),
            change: decision.change.letter().to_string(),
            state: decision.state.to_string(),
            result: decision.resolution.to_string(),
        }
    }
}

fn describe(entry: &DiffEntry) -> String {
    match &entry.kind {
        ChangeKind::Renamed { old_path } => format!("{} -> {}", old_path, entry.path),
        _ => entry.path.clone(),
    }
}

fn show_preview(target: &str, entries: &[DiffEntry]) {
    output::header(&format!("Changes available from {}", target));
    if entries.is_empty() {
        output::success("No file differences in the selected paths");
        return;
    }
    for entry in entries {
        output::item(&format!("[{}] {}", entry.kind.letter(), describe(entry)));
    }
    println!();
    output::info("Run without --dry-run to apply");
}

/// Heading and the paths to list, `None` when nothing was skipped
fn skipped_report(skipped: &[String]) -> Option<(String, &[String])> {
    if skipped.is_empty() {
        return None;
    }
    let heading = format!(
        "{} path(s) not present in the template were skipped:",
        skipped.len()
    );
    Some((heading, skipped))
}

fn show_skipped(skipped: &[String]) {
    if let Some((heading, paths)) = skipped_report(skipped) {
        output::info(&heading);
        for path in paths {
            output::item(path);
        }
    }
}

fn show_reconcile(target: &str, report: &ReconcileReport) {
    output::header(&format!("Files from {}", target));
    if report.decisions.is_empty() {
        output::success("No file differences in the selected paths");
    } else {
        let rows: Vec<DecisionRow> = report.decisions.iter().map(DecisionRow::from).collect();
        let table = Table::new(&rows).with(TableStyle::rounded()).to_string();
        println!("{}", table);
    }

    if let Some(tag) = &report.backup_tag {
        output::kv("Backup tag", tag);
        output::info(&format!("Restore with: git reset --hard {}", tag));
    }

    let changed = report.changed_files();
    if report.committed {
        output::success(&format!("Updated {} file(s) and committed", changed.len()));
    } else if changed.is_empty() {
        output::info("No template changes were applied");
    } else {
        output::warning("Changes applied but not committed; review and commit them yourself");
    }

    let conflicts = report.conflicts();
    if !conflicts.is_empty() {
        output::warning(&format!(
            "{} file(s) had local changes: {}",
            conflicts.len(),
            conflicts.join(", ")
        ));
    }

    if report.manifest_changed() {
        output::warning("package.json changed. Install dependencies with:");
        output::command("npm install --legacy-peer-deps");
    }
}

fn show_cleanup(report: &CleanupReport, interactive: bool) {
    if !report.found_anything() && report.removed_dirs.is_empty() {
        return;
    }

    output::header("Deprecated files");
    if !interactive && report.found_anything() {
        for path in report.deprecated.iter().chain(report.zombies.iter()) {
            output::item(path);
        }
        output::info("These files are no longer in the template. Re-run interactively to remove them");
        return;
    }

    if !report.deleted.is_empty() {
        output::success(&format!("Deleted {} file(s)", report.deleted.len()));
    }
    for (path, reason) in &report.failed {
        output::warning(&format!("Could not delete {}: {}", path, reason));
    }
    if !report.removed_dirs.is_empty() {
        output::info(&format!(
            "Removed {} empty director(ies)",
            report.removed_dirs.len()
        ));
    }
    if report.committed {
        output::success("Cleanup committed");
    }
}

fn show_merge(target: &str, report: &MergeReport) {
    output::header(&format!("Merge from {}", target));

    if let Some(tag) = &report.backup_tag {
        output::kv("Backup tag", tag);
    }
    for path in &report.resolved {
        output::item(&format!("resolved {}", path));
    }
    for path in &report.reverted {
        output::item(&format!("reverted {}", path));
    }

    if !report.unresolved.is_empty() {
        output::warning(&format!(
            "{} conflict(s) still need attention:",
            report.unresolved.len()
        ));
        for path in &report.unresolved {
            output::item(path);
        }
        output::info("Resolve them, then run:");
        output::command(RESOLVE_CONFLICTS_HINT);
        return;
    }

    if report.committed {
        output::success("Template merged and committed");
    } else {
        output::info("Nothing to commit; the project already contains these changes");
    }
}
