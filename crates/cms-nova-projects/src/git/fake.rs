//! In-memory [`VcsGateway`] for engine unit tests
//!
//! References are plain path→content maps. `HEAD` is the committed tree;
//! the working tree is the real filesystem under `root`, so engine code that
//! reads or deletes local files behaves exactly as in production.

use super::gateway::{ConflictSide, DiffEntry, MergeStatus, VcsGateway};
use crate::error::{Error, Result};
use async_trait::async_trait;
use camino::Utf8PathBuf;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;

type Tree = BTreeMap<String, Vec<u8>>;

fn under(path: &str, filter: &str) -> bool {
    path == filter || path.starts_with(&format!("{}/", filter))
}

fn matches_any(path: &str, filters: &[String]) -> bool {
    filters.is_empty() || filters.iter().any(|f| under(path, f))
}

pub(crate) struct FakeGateway {
    pub root: Utf8PathBuf,
    pub available: bool,
    pub repository: bool,
    pub clean: bool,
    pub fetch_fails: bool,
    pub default_branch: Option<String>,
    pub merge_base: Option<String>,
    refs: RefCell<BTreeMap<String, Tree>>,
    history: BTreeMap<String, BTreeSet<String>>,
    failing_diffs: BTreeSet<(String, String)>,
    remotes: RefCell<BTreeMap<String, String>>,
    pending: RefCell<BTreeSet<String>>,
    conflicts: RefCell<Vec<String>>,
    staged: RefCell<Vec<String>>,
    calls: RefCell<Vec<String>>,
    commits: RefCell<Vec<String>>,
}

impl FakeGateway {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        let mut refs = BTreeMap::new();
        refs.insert("HEAD".to_string(), Tree::new());
        Self {
            root: root.into(),
            available: true,
            repository: true,
            clean: true,
            fetch_fails: false,
            default_branch: None,
            merge_base: None,
            refs: RefCell::new(refs),
            history: BTreeMap::new(),
            failing_diffs: BTreeSet::new(),
            remotes: RefCell::new(BTreeMap::new()),
            pending: RefCell::new(BTreeSet::new()),
            conflicts: RefCell::new(Vec::new()),
            staged: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
            commits: RefCell::new(Vec::new()),
        }
    }

    /// Add a reference with the given tree
    pub fn with_ref(self, name: &str, files: &[(&str, &str)]) -> Self {
        let tree = files
            .iter()
            .map(|(p, c)| (p.to_string(), c.as_bytes().to_vec()))
            .collect();
        self.refs.borrow_mut().insert(name.to_string(), tree);
        self
    }

    /// Set the committed tree and write the same files to the work tree
    pub fn with_head(self, files: &[(&str, &str)]) -> Self {
        for (path, content) in files {
            let abs = self.root.join(path);
            if let Some(parent) = abs.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&abs, content).unwrap();
        }
        self.with_ref("HEAD", files)
    }

    /// Paths that appear somewhere in a reference's history
    pub fn with_history(mut self, reference: &str, paths: &[&str]) -> Self {
        self.history
            .entry(reference.to_string())
            .or_default()
            .extend(paths.iter().map(|p| p.to_string()));
        self
    }

    pub fn with_merge_base(mut self, commit: &str) -> Self {
        self.merge_base = Some(commit.to_string());
        self
    }

    pub fn with_failing_diff(mut self, from: &str, to: &str) -> Self {
        self.failing_diffs.insert((from.to_string(), to.to_string()));
        self
    }

    pub fn with_conflicts(self, paths: &[&str]) -> Self {
        *self.conflicts.borrow_mut() = paths.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn with_staged(self, paths: &[&str]) -> Self {
        *self.staged.borrow_mut() = paths.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn commits(&self) -> Vec<String> {
        self.commits.borrow().clone()
    }

    pub fn remote(&self, name: &str) -> Option<String> {
        self.remotes.borrow().get(name).cloned()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn tree(&self, reference: &str) -> Result<Tree> {
        self.refs
            .borrow()
            .get(reference)
            .cloned()
            .ok_or_else(|| Error::git_operation(format!("unknown revision '{}'", reference)))
    }
}

#[async_trait(?Send)]
impl VcsGateway for FakeGateway {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn is_repository(&self) -> bool {
        self.repository
    }

    async fn is_clean(&self) -> Result<bool> {
        Ok(self.clean)
    }

    async fn remote_url(&self, name: &str) -> Result<Option<String>> {
        Ok(self.remote(name))
    }

    async fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        self.record(format!("remote add {} {}", name, url));
        self.remotes
            .borrow_mut()
            .insert(name.to_string(), url.to_string());
        Ok(())
    }

    async fn fetch_with_tags(&self, remote: &str) -> Result<()> {
        self.record(format!("fetch {} --tags", remote));
        if self.fetch_fails {
            return Err(Error::git_operation("fetch failed"));
        }
        Ok(())
    }

    async fn default_branch(&self, _remote: &str) -> Option<String> {
        self.default_branch.clone()
    }

    async fn ref_exists(&self, reference: &str) -> bool {
        self.refs.borrow().contains_key(reference)
    }

    async fn path_exists_at_ref(&self, reference: &str, path: &str) -> bool {
        match self.refs.borrow().get(reference) {
            Some(tree) => tree.keys().any(|p| under(p, path)),
            None => false,
        }
    }

    async fn diff_name_status(
        &self,
        from: &str,
        to: &str,
        paths: &[String],
    ) -> Result<Vec<DiffEntry>> {
        if self
            .failing_diffs
            .contains(&(from.to_string(), to.to_string()))
        {
            return Err(Error::git_operation("diff failed"));
        }
        let a = self.tree(from)?;
        let b = self.tree(to)?;

        let all: BTreeSet<&String> = a.keys().chain(b.keys()).collect();
        let mut entries = Vec::new();
        for path in all {
            if !matches_any(path, paths) {
                continue;
            }
            match (a.get(path), b.get(path)) {
                (None, Some(_)) => entries.push(DiffEntry::added(path.clone())),
                (Some(_), None) => entries.push(DiffEntry::deleted(path.clone())),
                (Some(x), Some(y)) if x != y => entries.push(DiffEntry::modified(path.clone())),
                _ => {}
            }
        }
        Ok(entries)
    }

    async fn diff_text(&self, from: &str, to: &str, path: &str) -> Result<String> {
        Ok(format!("--- {}:{}\n+++ {}:{}\n", from, path, to, path))
    }

    async fn show_file(&self, reference: &str, path: &str) -> Result<Vec<u8>> {
        self.tree(reference)?
            .get(path)
            .cloned()
            .ok_or_else(|| Error::git_operation(format!("path '{}' not in {}", path, reference)))
    }

    async fn list_tree(&self, reference: &str, paths: &[String]) -> Result<BTreeSet<String>> {
        Ok(self
            .tree(reference)?
            .into_keys()
            .filter(|p| matches_any(p, paths))
            .collect())
    }

    async fn tracked_files(&self, paths: &[String]) -> Result<Vec<String>> {
        Ok(self
            .tree("HEAD")?
            .into_keys()
            .filter(|p| matches_any(p, paths))
            .collect())
    }

    async fn create_tag(&self, name: &str) -> Result<()> {
        self.record(format!("tag {}", name));
        let head = self.tree("HEAD")?;
        self.refs.borrow_mut().insert(name.to_string(), head);
        Ok(())
    }

    async fn checkout_paths(&self, reference: &str, paths: &[String]) -> Result<()> {
        let tree = self.tree(reference)?;
        for filter in paths {
            self.record(format!("checkout {} -- {}", reference, filter));
            for (path, content) in tree.iter().filter(|(p, _)| under(p, filter)) {
                let abs = self.root.join(path);
                if let Some(parent) = abs.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&abs, content)?;
                self.pending.borrow_mut().insert(path.clone());
            }
        }
        Ok(())
    }

    async fn patch_path(&self, reference: &str, path: &str) -> Result<()> {
        self.record(format!("checkout -p {} -- {}", reference, path));
        Ok(())
    }

    async fn stage_all(&self) -> Result<()> {
        self.record("add -A".to_string());
        let head = self.tree("HEAD")?;
        for path in head.keys() {
            if !self.root.join(path).exists() {
                self.pending.borrow_mut().insert(path.clone());
            }
        }
        Ok(())
    }

    async fn stage(&self, paths: &[String]) -> Result<()> {
        for path in paths {
            self.record(format!("add {}", path));
            self.conflicts.borrow_mut().retain(|c| c != path);
        }
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<()> {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        if pending.is_empty() && self.staged.borrow().is_empty() {
            return Err(Error::git_operation("nothing to commit, working tree clean"));
        }

        let mut refs = self.refs.borrow_mut();
        let head = refs.entry("HEAD".to_string()).or_default();
        for path in pending {
            match fs::read(self.root.join(&path)) {
                Ok(content) => {
                    head.insert(path, content);
                }
                Err(_) => {
                    head.remove(&path);
                }
            }
        }
        self.staged.borrow_mut().clear();
        self.commits.borrow_mut().push(message.to_string());
        Ok(())
    }

    async fn merge(&self, reference: &str, flags: &[&str]) -> Result<MergeStatus> {
        self.record(format!("merge {} {}", flags.join(" "), reference));
        let conflicts = self.conflicts.borrow().clone();
        if conflicts.is_empty() {
            Ok(MergeStatus::Clean)
        } else {
            Ok(MergeStatus::Conflicts(conflicts))
        }
    }

    async fn conflicted_paths(&self) -> Result<Vec<String>> {
        Ok(self.conflicts.borrow().clone())
    }

    async fn checkout_side(&self, side: ConflictSide, path: &str) -> Result<()> {
        self.record(format!("checkout {} -- {}", side.as_flag(), path));
        Ok(())
    }

    async fn staged_paths(&self) -> Result<Vec<String>> {
        Ok(self.staged.borrow().clone())
    }

    async fn remove_path(&self, path: &str) -> Result<()> {
        self.record(format!("rm {}", path));
        self.staged.borrow_mut().retain(|p| p != path);
        Ok(())
    }

    async fn merge_base(&self, _a: &str, _b: &str) -> Option<String> {
        self.merge_base.clone()
    }

    async fn path_history(&self, reference: &str, path: &str) -> bool {
        let in_history = self
            .history
            .get(reference)
            .is_some_and(|paths| paths.iter().any(|p| under(p, path)));
        in_history || self.path_exists_at_ref(reference, path).await
    }

    async fn log_graph(&self, range: &str) -> Result<String> {
        Ok(format!("* 1a2b3c4 template update ({})\n", range))
    }
}
