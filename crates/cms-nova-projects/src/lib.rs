//! # cms-nova-projects
//!
//! Project library for the create-cms-nova CLI providing:
//! - A narrow git gateway ([`git::VcsGateway`]) and its subprocess implementation
//! - Project scaffolding from the template repository
//! - The template upgrade engine (paths and merge modes)
//!
//! # Examples
//!
//! ## Scaffold a project
//!
//! ```no_run
//! use cms_nova_projects::scaffold::{clone_template, install_dependencies, CreateOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = CreateOptions {
//!     name: "my-cms".to_string(),
//!     parent_dir: "/tmp".into(),
//!     template_repo: cms_nova_core::DEFAULT_TEMPLATE_REPO.to_string(),
//!     branch: None,
//! };
//! let project = clone_template(&options).await?;
//! install_dependencies(&project).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod git;
pub mod scaffold;
pub mod upgrade;

pub use error::{Error, Result};
