//! Project metadata loading
//!
//! Two files in the project root feed the upgrade flow:
//! - `.cms-nova.json` (optional) may override the upstream template URL
//! - `package.json` declares the template version the project was created from

use crate::error::{Error, Result};
use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{debug, warn};

/// Optional metadata file name
pub const METADATA_FILE: &str = ".cms-nova.json";

/// Node package manifest holding the declared version
pub const PACKAGE_MANIFEST: &str = "package.json";

/// Contents of `.cms-nova.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataFile {
    /// Upstream template repository URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_repo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PackageManifest {
    #[serde(default)]
    version: Option<String>,
}

/// Metadata read from the project root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMetadata {
    /// Template URL from `.cms-nova.json`, if set
    pub template_repo: Option<String>,
    /// `version` from `package.json`, if set
    pub declared_version: Option<String>,
}

impl ProjectMetadata {
    /// Load metadata leniently
    ///
    /// Missing files yield `None` fields. Malformed files are logged and
    /// ignored so a broken metadata file never blocks an upgrade.
    pub fn load(root: &Utf8Path) -> Self {
        let template_repo = match read_metadata_file(root) {
            Ok(meta) => meta.and_then(|m| m.template_repo).filter(|u| !u.trim().is_empty()),
            Err(e) => {
                warn!("Ignoring {}: {}", METADATA_FILE, e);
                None
            }
        };

        let declared_version = match read_declared_version(root) {
            Ok(version) => version,
            Err(e) => {
                warn!("Could not read version from {}: {}", PACKAGE_MANIFEST, e);
                None
            }
        };

        debug!(
            "Project metadata: template_repo={:?}, declared_version={:?}",
            template_repo, declared_version
        );

        Self {
            template_repo,
            declared_version,
        }
    }

    /// Declared version parsed as semver
    ///
    /// A leading `v` is accepted (`v1.2.0`).
    pub fn declared_semver(&self) -> Result<Option<semver::Version>> {
        match &self.declared_version {
            None => Ok(None),
            Some(raw) => {
                let trimmed = raw.trim().trim_start_matches('v');
                semver::Version::parse(trimmed)
                    .map(Some)
                    .map_err(|_| Error::invalid_version(raw.clone()))
            }
        }
    }
}

/// Read `.cms-nova.json` from the project root
pub fn read_metadata_file(root: &Utf8Path) -> Result<Option<MetadataFile>> {
    let path = root.join(METADATA_FILE);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::Io(e)),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| Error::invalid_metadata(path.as_str(), e.to_string()))
}

/// Read the `version` field of `package.json`
pub fn read_declared_version(root: &Utf8Path) -> Result<Option<String>> {
    let path = root.join(PACKAGE_MANIFEST);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::Io(e)),
    };

    let manifest: PackageManifest = serde_json::from_str(&content)?;
    Ok(manifest
        .version
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}
