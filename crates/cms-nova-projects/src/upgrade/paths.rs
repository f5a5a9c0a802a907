//! Candidate path selection
//!
//! Narrows the path catalog (or an explicit path list) to what exists in the
//! target, then, when a base is known, to what the template actually changed
//! since that base.

use crate::error::{Error, Result};
use crate::git::VcsGateway;
use cms_nova_core::PathCatalog;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Result of path selection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSelection {
    /// Paths handed to reconciliation
    pub to_process: Vec<String>,
    /// Candidates absent from the target
    pub skipped: Vec<String>,
    /// Whether the smart filter narrowed the set
    pub smart: bool,
}

impl PathSelection {
    /// Nothing changed upstream for any candidate
    pub fn is_up_to_date(&self) -> bool {
        self.to_process.is_empty()
    }
}

/// Select the paths to reconcile
///
/// Explicit paths replace the catalog and bypass smart filtering. Fails with
/// [`Error::TargetRefUnresolved`] when no candidate exists because the target
/// itself is unknown, and with [`Error::NoCandidatePaths`] otherwise.
pub async fn select_paths<G: VcsGateway>(
    git: &G,
    catalog: &PathCatalog,
    target: &str,
    base: Option<&str>,
    explicit: Option<&[String]>,
) -> Result<PathSelection> {
    let (candidates, smart_allowed) = match explicit {
        Some(paths) if !paths.is_empty() => (PathCatalog::from_paths(paths).paths, false),
        _ => (catalog.paths.clone(), true),
    };

    let mut present = Vec::new();
    let mut skipped = Vec::new();
    for path in candidates {
        if git.path_exists_at_ref(target, &path).await {
            present.push(path);
        } else {
            debug!("Skipping {}: not present in {}", path, target);
            skipped.push(path);
        }
    }

    if present.is_empty() {
        if !git.ref_exists(target).await {
            return Err(Error::target_ref_unresolved(target));
        }
        return Err(Error::no_candidate_paths(target, &skipped));
    }

    let mut selection = PathSelection {
        to_process: present,
        skipped,
        smart: false,
    };

    if let (true, Some(base)) = (smart_allowed, base) {
        match smart_filter(git, catalog, base, target, &selection.to_process).await {
            Ok(filtered) => {
                info!(
                    "Smart filter kept {} of {} paths",
                    filtered.len(),
                    selection.to_process.len()
                );
                selection.to_process = filtered;
                selection.smart = true;
            }
            Err(e) => {
                warn!("Smart filter unavailable ({}); processing every present path", e);
            }
        }
    }

    Ok(selection)
}

/// Keep candidates the template changed between `base` and `target`
///
/// A candidate survives when it was changed itself, when it is a directory
/// containing a changed path, or when it is on the always-check list.
pub async fn smart_filter<G: VcsGateway>(
    git: &G,
    catalog: &PathCatalog,
    base: &str,
    target: &str,
    candidates: &[String],
) -> Result<Vec<String>> {
    let changed: BTreeSet<String> = git
        .diff_name_status(base, target, &[])
        .await?
        .iter()
        .flat_map(|entry| entry.touched_paths())
        .map(str::to_string)
        .collect();

    Ok(candidates
        .iter()
        .filter(|candidate| {
            let prefix = format!("{}/", candidate);
            changed.contains(candidate.as_str())
                || changed.iter().any(|p| p.starts_with(&prefix))
                || catalog.is_always_check(candidate)
        })
        .cloned()
        .collect())
}
