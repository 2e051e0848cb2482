use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::{
    errors::CoreError,
    storage::json_backend::replace_file,
    utils::paths::{app_data_dir, config_file_in, data_dir_in, ensure_dir},
};

const DEFAULT_HORIZON_MONTHS: u32 = 3;
const DEFAULT_CACHE_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed configuration: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<ConfigError> for CoreError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(err) => CoreError::Io(err),
            ConfigError::Serde(err) => CoreError::Serde(err),
        }
    }
}

/// Engine-level settings read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CoreConfig {
    /// Fallback base currency until the repository settings are loaded.
    pub base_currency: String,
    pub default_horizon_months: u32,
    pub cache_capacity: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            base_currency: "USD".into(),
            default_horizon_months: DEFAULT_HORIZON_MONTHS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            data_dir: None,
        }
    }
}

impl CoreConfig {
    /// Directory for persisted collections, relative to `base` unless overridden.
    pub fn resolve_data_dir(&self, base: &Path) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| data_dir_in(base))
    }
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_base_dir(app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, ConfigError> {
        ensure_dir(&base)?;
        Ok(Self {
            path: config_file_in(&base),
            base,
        })
    }

    /// Missing file yields defaults.
    pub fn load(&self) -> Result<CoreConfig, ConfigError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(CoreConfig::default())
        }
    }

    pub fn save(&self, config: &CoreConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let json = serde_json::to_string_pretty(config)?;
        replace_file(&self.path, &json)?;
        Ok(())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
