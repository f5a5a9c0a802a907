//! Repository cloning

use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Options for cloning a repository
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// Shallow clone with specified depth
    pub depth: Option<u32>,
    /// Branch or tag to checkout after clone
    pub branch: Option<String>,
}

/// Clone a repository
///
/// # Arguments
/// * `url` - Repository URL (or local path) to clone
/// * `destination` - Destination directory path
/// * `options` - Clone options
///
/// # Returns
/// Path to the cloned repository
///
/// # Errors
/// Returns error if:
/// - Invalid repository URL
/// - Destination already exists
/// - Clone operation fails
pub async fn clone_repository(
    url: &str,
    destination: &Utf8Path,
    options: &CloneOptions,
) -> Result<Utf8PathBuf> {
    info!("Cloning repository: {} -> {}", url, destination);

    if !is_valid_repo_url(url) {
        return Err(Error::invalid_repo_url(url));
    }

    if destination.exists() {
        return Err(Error::project_exists(destination.as_str()));
    }

    let mut cmd = Command::new("git");
    cmd.arg("clone");

    if let Some(depth) = options.depth {
        cmd.arg("--depth").arg(depth.to_string());
    }

    if let Some(branch) = &options.branch {
        cmd.arg("--branch").arg(branch);
    }

    cmd.arg(url).arg(destination.as_str());

    debug!("Running: git clone");
    let output = cmd.output().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::GitNotFound
        } else {
            Error::Io(e)
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::clone_failed(stderr.trim()));
    }

    info!("Repository cloned successfully");
    Ok(destination.to_path_buf())
}

/// Validate if a string is a usable repository location
///
/// Remote URLs (`https://`, `http://`, `ssh://`, `git@`, `file://`) and
/// existing local directories are accepted.
pub fn is_valid_repo_url(url: &str) -> bool {
    const SCHEMES: &[&str] = &["https://", "http://", "ssh://", "git@", "file://"];
    SCHEMES.iter().any(|s| url.starts_with(s)) || Utf8Path::new(url).is_dir()
}
