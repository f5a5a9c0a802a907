//! Git operations module
//!
//! This module provides the version-control gateway used by project
//! creation and the upgrade engine:
//! - [`VcsGateway`]: typed, narrow interface the engine depends on
//! - [`GitCli`]: implementation running `git` subprocesses in a project root
//! - Output parsers, kept separate so they can be tested on literal bytes
//! - Cloning for new projects
//!
//! # Examples
//!
//! ## Probe a reference
//!
//! ```no_run
//! use cms_nova_projects::git::{GitCli, VcsGateway};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let git = GitCli::new("/tmp/my-cms");
//! if git.path_exists_at_ref("upstream/main", "prisma/schema.prisma").await {
//!     let content = git.show_file("upstream/main", "prisma/schema.prisma").await?;
//!     println!("{} bytes", content.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Clone a template
//!
//! ```no_run
//! use cms_nova_projects::git::{clone_repository, CloneOptions};
//! use camino::Utf8Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = CloneOptions {
//!     depth: Some(1),
//!     ..Default::default()
//! };
//! clone_repository(
//!     "https://github.com/danielcadev/cms-nova-template.git",
//!     Utf8Path::new("/tmp/my-cms"),
//!     &options,
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

mod cli;
mod clone;
mod gateway;
mod parse;

#[cfg(test)]
pub(crate) mod fake;

// Re-export public API
pub use cli::GitCli;
pub use clone::{clone_repository, is_valid_repo_url, CloneOptions};
pub use gateway::{ChangeKind, ConflictSide, DiffEntry, MergeStatus, VcsGateway};
pub use parse::{parse_name_status, parse_nul_list};
