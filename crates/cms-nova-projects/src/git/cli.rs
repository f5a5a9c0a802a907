//! [`VcsGateway`] backed by the `git` command line

use super::gateway::{ConflictSide, DiffEntry, MergeStatus, VcsGateway};
use super::parse::{first_line, parse_name_status, parse_nul_list};
use crate::error::{Error, Result};
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::BTreeSet;
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, info};

/// Runs `git` subprocesses inside a project root
#[derive(Debug, Clone)]
pub struct GitCli {
    root: Utf8PathBuf,
}

impl GitCli {
    /// Create a gateway rooted at a project directory
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Project root every command runs in
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.root);
        cmd
    }

    async fn output(&self, args: &[&str]) -> Result<Output> {
        debug!("Running: git {}", args.join(" "));
        self.command()
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::GitNotFound
                } else {
                    Error::Io(e)
                }
            })
    }

    /// Run and return stdout, failing on a non-zero exit
    async fn run(&self, args: &[&str]) -> Result<Vec<u8>> {
        let output = self.output(args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(Error::git_operation(format!(
                "git {} failed: {}",
                args.first().copied().unwrap_or_default(),
                detail
            )));
        }

        Ok(output.stdout)
    }

    async fn succeeds(&self, args: &[&str]) -> bool {
        matches!(self.output(args).await, Ok(o) if o.status.success())
    }

    /// Run with the terminal attached (interactive git modes)
    async fn run_attached(&self, args: &[&str]) -> Result<()> {
        debug!("Running attached: git {}", args.join(" "));
        let status = self.command().args(args).status().await?;

        if !status.success() {
            return Err(Error::git_operation(format!(
                "git {} exited with {}",
                args.first().copied().unwrap_or_default(),
                status
            )));
        }
        Ok(())
    }
}

/// Append `-- paths` to an argument list when paths are given
fn with_paths<'a>(args: &[&'a str], paths: &'a [String]) -> Vec<&'a str> {
    let mut all = args.to_vec();
    if !paths.is_empty() {
        all.push("--");
        all.extend(paths.iter().map(String::as_str));
    }
    all
}

#[async_trait(?Send)]
impl VcsGateway for GitCli {
    async fn is_available(&self) -> bool {
        if which::which("git").is_err() {
            return false;
        }
        matches!(
            Command::new("git").arg("--version").output().await,
            Ok(o) if o.status.success()
        )
    }

    async fn is_repository(&self) -> bool {
        match self.run(&["rev-parse", "--is-inside-work-tree"]).await {
            Ok(out) => first_line(&out).as_deref() == Some("true"),
            Err(_) => false,
        }
    }

    async fn is_clean(&self) -> Result<bool> {
        let out = self.run(&["status", "--porcelain"]).await?;
        Ok(String::from_utf8_lossy(&out).trim().is_empty())
    }

    async fn remote_url(&self, name: &str) -> Result<Option<String>> {
        let output = self.output(&["remote", "get-url", name]).await?;

        if !output.status.success() {
            // Remote doesn't exist
            return Ok(None);
        }

        Ok(first_line(&output.stdout))
    }

    async fn add_remote(&self, name: &str, url: &str) -> Result<()> {
        info!("Adding remote '{}': {}", name, url);
        self.run(&["remote", "add", name, url]).await?;
        Ok(())
    }

    async fn fetch_with_tags(&self, remote: &str) -> Result<()> {
        info!("Fetching from remote: {}", remote);
        self.run(&["fetch", remote, "--tags"]).await.map_err(|e| {
            Error::git_operation(format!("Failed to fetch from '{}': {}", remote, e))
        })?;
        Ok(())
    }

    async fn default_branch(&self, remote: &str) -> Option<String> {
        let symbolic = format!("refs/remotes/{}/HEAD", remote);
        let out = self
            .run(&["symbolic-ref", "-q", "--short", &symbolic])
            .await
            .ok()?;
        first_line(&out)
    }

    async fn ref_exists(&self, reference: &str) -> bool {
        let spec = format!("{}^{{commit}}", reference);
        self.succeeds(&["rev-parse", "--verify", "--quiet", &spec])
            .await
    }

    async fn path_exists_at_ref(&self, reference: &str, path: &str) -> bool {
        let spec = format!("{}:{}", reference, path);
        self.succeeds(&["cat-file", "-e", &spec]).await
    }

    async fn diff_name_status(
        &self,
        from: &str,
        to: &str,
        paths: &[String],
    ) -> Result<Vec<DiffEntry>> {
        let args = with_paths(
            &["diff", "--name-status", "-z", "--no-color", "-M", from, to],
            paths,
        );
        let out = self.run(&args).await?;
        parse_name_status(&out)
    }

    async fn diff_text(&self, from: &str, to: &str, path: &str) -> Result<String> {
        let out = self
            .run(&["diff", "--no-color", from, to, "--", path])
            .await?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    async fn show_file(&self, reference: &str, path: &str) -> Result<Vec<u8>> {
        let spec = format!("{}:{}", reference, path);
        self.run(&["show", &spec]).await
    }

    async fn list_tree(&self, reference: &str, paths: &[String]) -> Result<BTreeSet<String>> {
        let args = with_paths(&["ls-tree", "-r", "-z", "--name-only", reference], paths);
        let out = self.run(&args).await?;
        Ok(parse_nul_list(&out).into_iter().collect())
    }

    async fn tracked_files(&self, paths: &[String]) -> Result<Vec<String>> {
        let args = with_paths(&["ls-files", "-z"], paths);
        let out = self.run(&args).await?;
        Ok(parse_nul_list(&out))
    }

    async fn create_tag(&self, name: &str) -> Result<()> {
        self.run(&["tag", name]).await?;
        Ok(())
    }

    async fn checkout_paths(&self, reference: &str, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let args = with_paths(&["checkout", reference], paths);
        self.run(&args).await?;
        Ok(())
    }

    async fn patch_path(&self, reference: &str, path: &str) -> Result<()> {
        self.run_attached(&["checkout", "-p", reference, "--", path])
            .await
    }

    async fn stage_all(&self) -> Result<()> {
        self.run(&["add", "-A"]).await?;
        Ok(())
    }

    async fn stage(&self, paths: &[String]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let args = with_paths(&["add"], paths);
        self.run(&args).await?;
        Ok(())
    }

    async fn commit(&self, message: &str) -> Result<()> {
        self.run(&["commit", "-m", message]).await?;
        Ok(())
    }

    async fn merge(&self, reference: &str, flags: &[&str]) -> Result<MergeStatus> {
        let mut args = vec!["merge"];
        args.extend_from_slice(flags);
        args.push(reference);

        let output = self.output(&args).await?;
        if output.status.success() {
            return Ok(MergeStatus::Clean);
        }

        let conflicts = self.conflicted_paths().await?;
        if conflicts.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::git_operation(format!(
                "git merge failed: {}",
                stderr.trim()
            )));
        }

        Ok(MergeStatus::Conflicts(conflicts))
    }

    async fn conflicted_paths(&self) -> Result<Vec<String>> {
        let out = self
            .run(&["diff", "--name-only", "--diff-filter=U", "-z"])
            .await?;
        let mut paths = parse_nul_list(&out);
        paths.dedup();
        Ok(paths)
    }

    async fn checkout_side(&self, side: ConflictSide, path: &str) -> Result<()> {
        self.run(&["checkout", side.as_flag(), "--", path]).await?;
        Ok(())
    }

    async fn staged_paths(&self) -> Result<Vec<String>> {
        let out = self.run(&["diff", "--cached", "--name-only", "-z"]).await?;
        Ok(parse_nul_list(&out))
    }

    async fn remove_path(&self, path: &str) -> Result<()> {
        self.run(&["rm", "-f", "-q", "--", path]).await?;
        Ok(())
    }

    async fn merge_base(&self, a: &str, b: &str) -> Option<String> {
        let out = self.run(&["merge-base", a, b]).await.ok()?;
        first_line(&out)
    }

    async fn path_history(&self, reference: &str, path: &str) -> bool {
        match self
            .run(&["rev-list", "-n", "1", reference, "--", path])
            .await
        {
            Ok(out) => first_line(&out).is_some(),
            Err(_) => false,
        }
    }

    async fn log_graph(&self, range: &str) -> Result<String> {
        let out = self
            .run(&["log", "--oneline", "--decorate", "--graph", range])
            .await?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
