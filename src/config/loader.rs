//! Configuration file loading and parsing.

use crate::errors::Error;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration loaded from TOML file.
///
/// Absent numeric fields stay `None` so they never override defaults.
#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub database_path: PathBuf,

    #[serde(default)]
    pub embedding_model: String,

    #[serde(default)]
    pub embedding_dims: Option<usize>,

    #[serde(default)]
    pub model_cache: PathBuf,

    #[serde(default)]
    pub search_limit: Option<usize>,
}

/// Location of the config file: `<config_dir>/amnesia/config.toml`.
pub fn config_path() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let config_dir = dirs::config_dir().unwrap_or_else(|| home.join(".config"));
    config_dir.join("amnesia/config.toml")
}

/// Load configuration from TOML file.
pub fn load_from_file() -> Result<Option<ConfigFile>, Error> {
    load_from_path(&config_path())
}

/// Load configuration from a specific TOML file, if it exists.
pub(crate) fn load_from_path(config_path: &Path) -> Result<Option<ConfigFile>, Error> {
    if !config_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(config_path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file {}: {e}",
            config_path.display()
        ))
    })?;

    let config: ConfigFile = toml::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse config file {}: {e}",
            config_path.display()
        ))
    })?;

    tracing::debug!(path = %config_path.display(), "loaded config file");
    Ok(Some(config))
}
