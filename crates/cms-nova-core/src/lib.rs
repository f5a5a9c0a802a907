//! # cms-nova-core
//!
//! Core library for the create-cms-nova CLI providing:
//! - Project metadata loading (`.cms-nova.json`, `package.json`)
//! - The explicit working context threaded through every upgrade component
//! - The path catalog that decides which template files are eligible for sync
//! - Backup tag naming

pub mod config;
pub mod error;
pub mod utils;

pub use config::{
    PathCatalog, ProjectMetadata, UpgradeFlags, UpgradeMode, WorkingContext,
    DEFAULT_TEMPLATE_REPO, UPSTREAM_REMOTE,
};
pub use error::{Error, Result};
pub use utils::backup_tag_name;
