use crate::{OptimiserError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Preference holding the blacklist
pub const DEFAULT_PREFERENCE_KEY: &str = "start_optimiser/id_blacklist";

/// Optimiser settings, read from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimiserConfig {
    /// Preference key the blacklist is stored under
    pub preference_key: String,

    /// Directories holding local container files
    pub search_paths: Vec<PathBuf>,

    /// Return no unused containers when no machine is active, instead of
    /// treating every known container as unused
    pub skip_when_no_active_stacks: bool,
}

impl Default for OptimiserConfig {
    fn default() -> Self {
        Self {
            preference_key: DEFAULT_PREFERENCE_KEY.to_string(),
            search_paths: Vec::new(),
            skip_when_no_active_stacks: false,
        }
    }
}

impl OptimiserConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&raw)?;

        // relative search paths are relative to the config file
        if let Some(base) = path.parent() {
            for search_path in &mut config.search_paths {
                if search_path.is_relative() {
                    *search_path = base.join(&*search_path);
                }
            }
        }
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// [`Self::load`], or the defaults when `path` does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.preference_key.trim().is_empty() {
            return Err(OptimiserError::invalid_config(
                "preference_key must not be empty",
            ));
        }
        Ok(())
    }
}
