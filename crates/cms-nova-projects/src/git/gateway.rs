//! Typed interface over the version-control tool
//!
//! The upgrade engine only talks to git through [`VcsGateway`]. Existence
//! style probes answer `bool`/`Option` and treat command failure as "no";
//! mutating operations return [`Result`] so callers decide whether a failure
//! is fatal.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Kind of change reported by a name-status diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed { old_path: String },
}

impl ChangeKind {
    /// Single-letter status as git prints it
    pub fn letter(&self) -> char {
        match self {
            Self::Added => 'A',
            Self::Modified => 'M',
            Self::Deleted => 'D',
            Self::Renamed { .. } => 'R',
        }
    }
}

/// One line of a name-status diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    /// Path on the `to` side (the `from` side for deletions)
    pub path: String,
    pub kind: ChangeKind,
}

impl DiffEntry {
    pub fn added(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::Added,
        }
    }

    pub fn modified(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::Modified,
        }
    }

    pub fn deleted(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ChangeKind::Deleted,
        }
    }

    pub fn renamed(old_path: impl Into<String>, new_path: impl Into<String>) -> Self {
        Self {
            path: new_path.into(),
            kind: ChangeKind::Renamed {
                old_path: old_path.into(),
            },
        }
    }

    /// Every path this entry touches (both sides of a rename)
    pub fn touched_paths(&self) -> Vec<&str> {
        match &self.kind {
            ChangeKind::Renamed { old_path } => vec![old_path.as_str(), self.path.as_str()],
            _ => vec![self.path.as_str()],
        }
    }
}

/// Result of starting a merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeStatus {
    /// Merge applied without conflicts (not yet committed)
    Clean,
    /// Merge stopped with these conflicted paths
    Conflicts(Vec<String>),
}

/// Side to take when resolving a merge conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictSide {
    Ours,
    Theirs,
}

impl ConflictSide {
    pub(crate) fn as_flag(&self) -> &'static str {
        match self {
            Self::Ours => "--ours",
            Self::Theirs => "--theirs",
        }
    }
}

/// Synchronous command/response contract with the version-control tool
///
/// Calls are awaited one at a time; implementations never run commands
/// concurrently.
#[async_trait(?Send)]
pub trait VcsGateway {
    /// Whether the tool is installed and runnable
    async fn is_available(&self) -> bool;

    /// Whether the root is inside a work tree
    async fn is_repository(&self) -> bool;

    /// Whether the work tree has no uncommitted or untracked changes
    async fn is_clean(&self) -> Result<bool>;

    /// URL of a remote, `None` if it does not exist
    async fn remote_url(&self, name: &str) -> Result<Option<String>>;

    async fn add_remote(&self, name: &str, url: &str) -> Result<()>;

    /// Fetch a remote including its tags
    async fn fetch_with_tags(&self, remote: &str) -> Result<()>;

    /// Short name of the remote's symbolic default branch (`upstream/main`)
    async fn default_branch(&self, remote: &str) -> Option<String>;

    /// Whether a reference resolves to a commit
    async fn ref_exists(&self, reference: &str) -> bool;

    /// Whether a file or directory exists in a reference's tree
    async fn path_exists_at_ref(&self, reference: &str, path: &str) -> bool;

    /// Name-status diff between two references, restricted to `paths` when non-empty
    async fn diff_name_status(
        &self,
        from: &str,
        to: &str,
        paths: &[String],
    ) -> Result<Vec<DiffEntry>>;

    /// Human-readable diff of one path between two references
    async fn diff_text(&self, from: &str, to: &str, path: &str) -> Result<String>;

    /// Raw content of a file at a reference
    async fn show_file(&self, reference: &str, path: &str) -> Result<Vec<u8>>;

    /// All file paths in a reference's tree under `paths` (whole tree when empty)
    async fn list_tree(&self, reference: &str, paths: &[String]) -> Result<BTreeSet<String>>;

    /// Tracked files under `paths` (all tracked files when empty)
    async fn tracked_files(&self, paths: &[String]) -> Result<Vec<String>>;

    /// Create a lightweight tag at `HEAD`
    async fn create_tag(&self, name: &str) -> Result<()>;

    /// Overwrite working copies of `paths` from a reference
    async fn checkout_paths(&self, reference: &str, paths: &[String]) -> Result<()>;

    /// Let the operator pick hunks of a path from a reference
    async fn patch_path(&self, reference: &str, path: &str) -> Result<()>;

    async fn stage_all(&self) -> Result<()>;

    async fn stage(&self, paths: &[String]) -> Result<()>;

    /// Commit staged changes; fails when nothing is staged
    async fn commit(&self, message: &str) -> Result<()>;

    /// Start a merge of `reference` with extra flags
    async fn merge(&self, reference: &str, flags: &[&str]) -> Result<MergeStatus>;

    /// Paths left unmerged by a merge
    async fn conflicted_paths(&self) -> Result<Vec<String>>;

    /// Resolve a conflicted path by taking one side
    async fn checkout_side(&self, side: ConflictSide, path: &str) -> Result<()>;

    /// Paths with staged changes
    async fn staged_paths(&self) -> Result<Vec<String>>;

    /// Remove a path from the index and the work tree
    async fn remove_path(&self, path: &str) -> Result<()>;

    /// Nearest common ancestor of two references
    async fn merge_base(&self, a: &str, b: &str) -> Option<String>;

    /// Whether `path` appears anywhere in the history of `reference`
    async fn path_history(&self, reference: &str, path: &str) -> bool;

    /// One-line graph log for a revision range
    async fn log_graph(&self, range: &str) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touched_paths() {
        assert_eq!(DiffEntry::modified("a.ts").touched_paths(), vec!["a.ts"]);
        assert_eq!(
            DiffEntry::renamed("old.ts", "new.ts").touched_paths(),
            vec!["old.ts", "new.ts"]
        );
    }

    #[test]
    fn test_change_letters() {
        assert_eq!(DiffEntry::added("a").kind.letter(), 'A');
        assert_eq!(DiffEntry::deleted("a").kind.letter(), 'D');
        assert_eq!(DiffEntry::renamed("a", "b").kind.letter(), 'R');
    }
}
