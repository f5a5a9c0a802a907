//! Shared utility functions for CMS Nova crates

use chrono::{DateTime, Utc};

/// Prefix of the lightweight tags created before an upgrade mutates anything
pub const BACKUP_TAG_PREFIX: &str = "backup-";

/// Build the backup tag name for an instant: `backup-YYYYMMDDHHMMSS` in UTC
pub fn backup_tag_name(at: DateTime<Utc>) -> String {
    format!("{}{}", BACKUP_TAG_PREFIX, at.format("%Y%m%d%H%M%S"))
}

/// Normalize a project-relative path the way git prints it
///
/// Strips `./` prefixes and trailing slashes and converts backslashes, so
/// `./src/app/` and `src\app` both become `src/app`.
pub fn normalize_rel_path(path: &str) -> String {
    let mut p = path.trim().replace('\\', "/");
    while let Some(rest) = p.strip_prefix("./") {
        p = rest.to_string();
    }
    p.trim_end_matches('/').to_string()
}
