//! Error types for cms-nova-core

use thiserror::Error;

/// Result type alias using cms-nova-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for CMS Nova
#[derive(Error, Debug)]
pub enum Error {
    /// Metadata file could not be parsed
    #[error("Invalid project metadata in {path}: {message}")]
    InvalidMetadata { path: String, message: String },

    /// Invalid semver version
    #[error("Invalid version format: {version}")]
    InvalidVersion { version: String },

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid metadata error
    pub fn invalid_metadata(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidMetadata {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid version error
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
        }
    }
}
