use thiserror::Error;

pub type Result<T> = std::result::Result<T, PrefsError>;

#[derive(Error, Debug)]
pub enum PrefsError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Could not take the preferences file lock
    #[error("Lock error: {0}")]
    LockError(String),

    /// Preferences file is readable but not an object of strings
    #[error("Invalid preferences file: {0}")]
    InvalidPreferences(String),
}
