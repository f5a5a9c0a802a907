//! Error types for cms-nova-projects

use thiserror::Error;

/// Result type alias using cms-nova-projects's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Project and upgrade error types
#[derive(Error, Debug)]
pub enum Error {
    /// Git command not found
    #[error("Git is not installed or not in PATH. Install it from https://git-scm.com/downloads")]
    GitNotFound,

    /// Directory is not a git work tree
    #[error(
        "Not a git repository: {path}. Initialize one and commit before upgrading:\n   \
         git init && git add -A && git commit -m \"chore: initial snapshot\""
    )]
    NotARepository { path: String },

    /// Uncommitted changes block the upgrade
    #[error(
        "Working tree has uncommitted changes. Commit or stash them first \
         (git stash), or re-run with --allow-dirty"
    )]
    DirtyWorkingTree,

    /// Target reference does not resolve
    #[error(
        "Target reference '{reference}' could not be resolved. Check --tag or run: \
         git fetch upstream --tags"
    )]
    TargetRefUnresolved { reference: String },

    /// None of the candidate paths exist in the target
    #[error(
        "The template ref '{reference}' contains none of the requested paths \
         (not found: {skipped}). Specify paths with --paths or check the ref with --tag"
    )]
    NoCandidatePaths { reference: String, skipped: String },

    /// Git operation failed
    #[error("Git operation failed: {message}")]
    GitOperation { message: String },

    /// Project already exists
    #[error("Directory {path} already exists. Choose a different name or remove it")]
    ProjectExists { path: String },

    /// Invalid project name
    #[error("Invalid project name: '{name}'. {reason}")]
    InvalidProjectName { name: String, reason: String },

    /// Invalid repository URL
    #[error("Invalid repository URL: {url}")]
    InvalidRepoUrl { url: String },

    /// Clone failed
    #[error("Failed to clone repository: {message}")]
    CloneFailed { message: String },

    /// Dependency installation failed
    #[error("Dependency installation failed: {message}")]
    DependencyInstall { message: String },

    /// Required command not found
    #[error("Required command not found: {command}")]
    CommandNotFound { command: String },

    /// Interactive prompt failed or ran out of input
    #[error("Prompt failed: {message}")]
    Prompt { message: String },

    /// Core library error
    #[error("Core error: {0}")]
    Core(#[from] cms_nova_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a not-a-repository error
    pub fn not_a_repository(path: impl Into<String>) -> Self {
        Self::NotARepository { path: path.into() }
    }

    /// Create a target-ref-unresolved error
    pub fn target_ref_unresolved(reference: impl Into<String>) -> Self {
        Self::TargetRefUnresolved {
            reference: reference.into(),
        }
    }

    /// Create a no-candidate-paths error
    pub fn no_candidate_paths(reference: impl Into<String>, skipped: &[String]) -> Self {
        Self::NoCandidatePaths {
            reference: reference.into(),
            skipped: skipped.join(", "),
        }
    }

    /// Create a git operation error
    pub fn git_operation(message: impl Into<String>) -> Self {
        Self::GitOperation {
            message: message.into(),
        }
    }

    /// Create a project exists error
    pub fn project_exists(path: impl Into<String>) -> Self {
        Self::ProjectExists { path: path.into() }
    }

    /// Create an invalid project name error
    pub fn invalid_project_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidProjectName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid repo URL error
    pub fn invalid_repo_url(url: impl Into<String>) -> Self {
        Self::InvalidRepoUrl { url: url.into() }
    }

    /// Create a clone failed error
    pub fn clone_failed(message: impl Into<String>) -> Self {
        Self::CloneFailed {
            message: message.into(),
        }
    }

    /// Create a dependency install error
    pub fn dependency_install(message: impl Into<String>) -> Self {
        Self::DependencyInstall {
            message: message.into(),
        }
    }

    /// Create a command not found error
    pub fn command_not_found(command: impl Into<String>) -> Self {
        Self::CommandNotFound {
            command: command.into(),
        }
    }

    /// Create a prompt error
    pub fn prompt(message: impl Into<String>) -> Self {
        Self::Prompt {
            message: message.into(),
        }
    }
}
