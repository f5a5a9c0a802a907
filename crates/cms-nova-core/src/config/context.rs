//! Working context threaded through the upgrade components

use super::catalog::PathCatalog;
use super::loader::ProjectMetadata;
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use tracing::debug;

/// Official template repository
pub const DEFAULT_TEMPLATE_REPO: &str = "https://github.com/danielcadev/cms-nova-template.git";

/// Remote name the template is fetched through
pub const UPSTREAM_REMOTE: &str = "upstream";

/// Branch targeted when the remote has no symbolic HEAD
pub const FALLBACK_TARGET_BRANCH: &str = "main";

/// How the upgrade applies upstream changes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpgradeMode {
    /// Selective file-level sync
    #[default]
    Paths,
    /// True VCS merge of the target ref
    Merge,
}

impl UpgradeMode {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Paths => "paths",
            Self::Merge => "merge",
        }
    }
}

impl fmt::Display for UpgradeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flags for one upgrade invocation
#[derive(Debug, Clone)]
pub struct UpgradeFlags {
    pub mode: UpgradeMode,
    /// Explicit target tag, branch or commit
    pub tag: Option<String>,
    pub dry_run: bool,
    /// Create a `backup-*` tag before mutating
    pub backup: bool,
    /// Skip the clean working tree check
    pub allow_dirty: bool,
    pub interactive: bool,
    /// Paths given with `--paths`; bypass smart filtering
    pub explicit_paths: Option<Vec<String>>,
}

impl Default for UpgradeFlags {
    fn default() -> Self {
        Self {
            mode: UpgradeMode::Paths,
            tag: None,
            dry_run: false,
            backup: true,
            allow_dirty: false,
            interactive: true,
            explicit_paths: None,
        }
    }
}

/// Everything a component needs to know about the project being upgraded
///
/// Built once per invocation. Components receive it by reference; nothing
/// reads the process working directory or environment after construction.
#[derive(Debug, Clone)]
pub struct WorkingContext {
    /// Project root; every git command runs here
    pub root: Utf8PathBuf,
    /// Resolved upstream template URL
    pub template_repo: String,
    /// Remote name used for fetching the template
    pub remote: String,
    /// Candidate paths for sync
    pub catalog: PathCatalog,
    /// Metadata read from the project root
    pub metadata: ProjectMetadata,
}

impl WorkingContext {
    /// Resolve the context for a project root
    ///
    /// Template URL precedence: explicit override, then `.cms-nova.json`,
    /// then [`DEFAULT_TEMPLATE_REPO`].
    pub fn resolve(root: &Utf8Path, template_override: Option<&str>) -> Self {
        let metadata = ProjectMetadata::load(root);

        let template_repo = template_override
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .or_else(|| metadata.template_repo.clone())
            .unwrap_or_else(|| DEFAULT_TEMPLATE_REPO.to_string());

        debug!("Template repository resolved to {}", template_repo);

        Self {
            root: root.to_path_buf(),
            template_repo,
            remote: UPSTREAM_REMOTE.to_string(),
            catalog: PathCatalog::default(),
            metadata,
        }
    }

    /// Replace the path catalog
    pub fn with_catalog(mut self, catalog: PathCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Absolute path of a project-relative path
    pub fn path(&self, rel: &str) -> Utf8PathBuf {
        self.root.join(rel)
    }
}
