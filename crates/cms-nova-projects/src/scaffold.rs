//! New project creation from the template repository

use crate::error::{Error, Result};
use crate::git::{clone_repository, CloneOptions};
use camino::{Utf8Path, Utf8PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Names that would shadow a subcommand
const RESERVED_NAMES: &[&str] = &["upgrade"];

/// Options for creating a project
#[derive(Debug, Clone)]
pub struct CreateOptions {
    pub name: String,
    /// Directory the project folder is created in
    pub parent_dir: Utf8PathBuf,
    pub template_repo: String,
    /// Template branch or tag to clone
    pub branch: Option<String>,
}

impl CreateOptions {
    /// Directory the project will live in
    pub fn destination(&self) -> Utf8PathBuf {
        self.parent_dir.join(&self.name)
    }
}

/// Check a project name before anything touches the disk
pub fn validate_project_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_project_name(name, "a project name is required"));
    }
    if RESERVED_NAMES.contains(&trimmed) {
        return Err(Error::invalid_project_name(
            name,
            "this is a subcommand; run `create-cms-nova upgrade` inside an existing project",
        ));
    }
    if trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
        return Err(Error::invalid_project_name(
            name,
            "use a plain directory name, not a path",
        ));
    }
    Ok(())
}

/// Validate the name and make sure the destination is free
pub fn prepare_destination(options: &CreateOptions) -> Result<Utf8PathBuf> {
    validate_project_name(&options.name)?;
    let destination = options.destination();
    if destination.exists() {
        return Err(Error::project_exists(destination.as_str()));
    }
    Ok(destination)
}

/// Shallow-clone the template and drop its history
///
/// The new project starts without the template's commits; `upgrade` later
/// relates the two through the template remote.
pub async fn clone_template(options: &CreateOptions) -> Result<Utf8PathBuf> {
    let destination = prepare_destination(options)?;
    let clone = CloneOptions {
        depth: Some(1),
        branch: options.branch.clone(),
    };
    clone_repository(&options.template_repo, &destination, &clone).await?;
    strip_history(&destination).await?;
    info!("Project created at {}", destination);
    Ok(destination)
}

/// Remove the `.git` directory of a fresh clone
pub async fn strip_history(project_dir: &Utf8Path) -> Result<()> {
    let git_dir = project_dir.join(".git");
    if git_dir.exists() {
        debug!("Removing {}", git_dir);
        tokio::fs::remove_dir_all(&git_dir).await?;
    }
    Ok(())
}

/// Install npm dependencies with output attached to the terminal
pub async fn install_dependencies(project_dir: &Utf8Path) -> Result<()> {
    let npm = which::which("npm").map_err(|_| Error::command_not_found("npm"))?;

    info!("Running npm install in {}", project_dir);
    let status = Command::new(npm)
        .args(["install", "--legacy-peer-deps"])
        .current_dir(project_dir)
        .status()
        .await?;

    if !status.success() {
        return Err(Error::dependency_install(format!(
            "npm install exited with {}",
            status
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn options(dir: &TempDir, name: &str) -> CreateOptions {
        CreateOptions {
            name: name.to_string(),
            parent_dir: Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap(),
            template_repo: "https://github.com/danielcadev/cms-nova-template.git".to_string(),
            branch: None,
        }
    }

    #[test]
    fn test_validate_project_name() {
        assert!(validate_project_name("my-site").is_ok());
        assert!(matches!(
            validate_project_name("  "),
            Err(Error::InvalidProjectName { .. })
        ));
        assert!(validate_project_name("upgrade").is_err());
        assert!(validate_project_name("../escape").is_err());
        assert!(validate_project_name("..").is_err());
    }

    #[test]
    fn test_prepare_destination_rejects_existing() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("taken")).unwrap();

        assert!(matches!(
            prepare_destination(&options(&dir, "taken")),
            Err(Error::ProjectExists { .. })
        ));

        let free = prepare_destination(&options(&dir, "fresh")).unwrap();
        assert!(free.ends_with("fresh"));
    }

    #[tokio::test]
    async fn test_strip_history() {
        let dir = TempDir::new().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::write(root.join("package.json"), "{}").unwrap();

        strip_history(root).await.unwrap();
        assert!(!root.join(".git").exists());
        assert!(root.join("package.json").exists());

        // Idempotent
        strip_history(root).await.unwrap();
    }
}
