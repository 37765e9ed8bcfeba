//! Configuration Loader (Figment-based)
//!
//! Merges configuration from three sources, later entries winning:
//! 1. Built-in defaults (Serialized)
//! 2. Project config (`finassist.toml`)
//! 3. Environment variables (`FINASSIST_` prefix, `__` as separator,
//!    e.g. `FINASSIST_AI__PROVIDER=gemini`)

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::Config;
use crate::types::{AssistError, Result};

pub const PROJECT_CONFIG_FILE: &str = "finassist.toml";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load with the full resolution chain: defaults -> project file -> env.
    pub fn load() -> Result<Config> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        figment = figment.merge(Env::prefixed("FINASSIST_").split("__").lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| AssistError::Config(format!("Configuration error: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file only (defaults still apply underneath).
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| AssistError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Path to the project config file in the working directory.
    pub fn project_config_path() -> PathBuf {
        PathBuf::from(PROJECT_CONFIG_FILE)
    }
}
