//! Persisted application settings stored as TOML in the `.fbpick` directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;
use crate::artifact::{FingerprintAlgorithm, normalize_fingerprint};
use crate::readiness::ReadinessRule;

/// Default filename used to store the app configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Environment variable overriding the pinned model fingerprint.
pub const WEIGHTS_FINGERPRINT_ENV: &str = "FBPICK_WEIGHTS_FINGERPRINT";

/// Aggregate application settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelSettings,
    #[serde(default)]
    pub picking: PickingSettings,
    #[serde(default)]
    pub jobs: JobSettings,
    /// Directory the trace file dialog opens in.
    #[serde(default)]
    pub last_trace_dir: Option<PathBuf>,
}

/// Model weights pinning.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Hex fingerprint the weights file must match before it is loaded.
    #[serde(default)]
    pub weights_fingerprint: String,
    #[serde(default)]
    pub fingerprint_algorithm: FingerprintAlgorithm,
    #[serde(default)]
    pub last_weights_path: Option<PathBuf>,
}

/// Picking run parameters and action gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickingSettings {
    #[serde(default = "default_traces_per_gather")]
    pub traces_per_gather: usize,
    #[serde(default)]
    pub readiness_rule: ReadinessRule,
}

impl Default for PickingSettings {
    fn default() -> Self {
        Self {
            traces_per_gather: default_traces_per_gather(),
            readiness_rule: ReadinessRule::default(),
        }
    }
}

/// Background worker pool sizing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSettings {
    /// Worker thread cap (0 = one thread per job).
    #[serde(default)]
    pub max_workers: usize,
}

fn default_traces_per_gather() -> usize {
    2
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No config directory available: {0}")]
    AppDir(#[from] app_dirs::AppDirError),
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
}

impl AppConfig {
    /// Fingerprint the weights file must match, preferring the environment override.
    pub fn expected_weights_fingerprint(&self) -> Option<String> {
        resolve_fingerprint(
            std::env::var(WEIGHTS_FINGERPRINT_ENV).ok().as_deref(),
            &self.model.weights_fingerprint,
        )
    }
}

fn resolve_fingerprint(env_value: Option<&str>, configured: &str) -> Option<String> {
    [env_value.unwrap_or_default(), configured]
        .into_iter()
        .map(normalize_fingerprint)
        .find(|value| !value.is_empty())
}

/// Resolve the path to the TOML config file.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from disk, returning defaults if missing.
pub fn load_or_default() -> Result<AppConfig, ConfigError> {
    load_from(&config_path()?)
}

/// Load configuration from a specific path, returning defaults if missing.
pub fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Persist configuration to disk, overwriting any previous contents.
pub fn save(config: &AppConfig) -> Result<(), ConfigError> {
    save_to_path(config, &config_path()?)
}

/// Save configuration to a specific path, creating parent directories as needed.
pub fn save_to_path(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let text = toml::to_string_pretty(config).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, text).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}
