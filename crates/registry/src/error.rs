use std::path::PathBuf;
use thiserror::Error;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur while loading registry state
#[derive(Error, Debug)]
pub enum RegistryError {
    /// IO error occurred
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Snapshot was not valid JSON
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Snapshot parsed but violates a registry invariant
    #[error("Invalid registry snapshot: {0}")]
    InvalidSnapshot(String),
}

impl RegistryError {
    /// Create an invalid snapshot error
    pub fn invalid_snapshot(msg: impl Into<String>) -> Self {
        Self::InvalidSnapshot(msg.into())
    }
}

/// The MIME database has no type for a path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("no MIME type found for {}", path.display())]
pub struct MimeTypeNotFound {
    pub path: PathBuf,
}
