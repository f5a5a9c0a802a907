//! Configuration loading and management

mod catalog;
mod context;
mod loader;

pub use catalog::{PathCatalog, ALWAYS_CHECK_PATHS, DEFAULT_SYNC_PATHS, SWEEP_ROOT};
pub use context::{
    UpgradeFlags, UpgradeMode, WorkingContext, DEFAULT_TEMPLATE_REPO, FALLBACK_TARGET_BRANCH,
    UPSTREAM_REMOTE,
};
pub use loader::{MetadataFile, ProjectMetadata, METADATA_FILE, PACKAGE_MANIFEST};
