use thiserror::Error;

pub type Result<T> = std::result::Result<T, OptimiserError>;

#[derive(Error, Debug)]
pub enum OptimiserError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Preferences error: {0}")]
    PrefsError(#[from] startopt_prefs::PrefsError),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl OptimiserError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
