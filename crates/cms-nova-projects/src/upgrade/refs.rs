//! Target and base reference resolution

use crate::git::VcsGateway;
use cms_nova_core::config::FALLBACK_TARGET_BRANCH;
use std::fmt;
use tracing::{debug, info, warn};

/// Where a base reference came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseSource {
    /// Tag matching the version declared in the project manifest
    VersionTag,
    /// Common ancestor of `HEAD` and the target
    MergeBase,
}

/// Snapshot of the template the project was last aligned with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseRef {
    pub name: String,
    pub source: BaseSource,
}

impl fmt::Display for BaseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            BaseSource::VersionTag => write!(f, "{} (version tag)", self.name),
            BaseSource::MergeBase => write!(f, "{} (merge-base)", self.name),
        }
    }
}

/// Pick the reference to upgrade towards
///
/// An explicit reference is used verbatim. Otherwise the remote's default
/// branch is used, falling back to `<remote>/main`.
pub async fn resolve_target_ref<G: VcsGateway>(
    git: &G,
    remote: &str,
    explicit: Option<&str>,
) -> String {
    if let Some(reference) = explicit.map(str::trim).filter(|r| !r.is_empty()) {
        debug!("Using explicit target reference {}", reference);
        return reference.to_string();
    }

    match git.default_branch(remote).await {
        Some(branch) => branch,
        None => {
            let fallback = format!("{}/{}", remote, FALLBACK_TARGET_BRANCH);
            debug!("Remote HEAD unknown, falling back to {}", fallback);
            fallback
        }
    }
}

/// Tag names tried for a declared version, in order
fn version_tags(version: &str) -> Vec<String> {
    let bare = version.trim().trim_start_matches('v');
    if bare.is_empty() {
        return Vec::new();
    }
    vec![format!("v{}", bare), bare.to_string()]
}

/// Find the template snapshot the project last matched
///
/// Tries `v<version>` then `<version>` for the declared version, then the
/// merge-base of `HEAD` and `target`. Returns `None` when nothing resolves;
/// callers then skip smart filtering and deletion detection.
pub async fn resolve_base_ref<G: VcsGateway>(
    git: &G,
    declared_version: Option<&str>,
    target: &str,
) -> Option<BaseRef> {
    if let Some(version) = declared_version {
        for tag in version_tags(version) {
            if git.ref_exists(&tag).await {
                info!("Base reference: tag {}", tag);
                return Some(BaseRef {
                    name: tag,
                    source: BaseSource::VersionTag,
                });
            }
        }
        debug!("No tag found for declared version {}", version);
    }

    if let Some(commit) = git.merge_base("HEAD", target).await {
        info!("Base reference: merge-base {}", commit);
        return Some(BaseRef {
            name: commit,
            source: BaseSource::MergeBase,
        });
    }

    warn!("No base reference found; comparing against {} without history", target);
    None
}
