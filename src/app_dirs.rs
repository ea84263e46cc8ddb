//! Application directory helpers anchored to a single `.fbpick` folder.
//!
//! Config and log files live under the OS config directory unless
//! `FBPICK_CONFIG_HOME` points somewhere else (tests, portable installs).

use std::{ffi::OsString, path::PathBuf};

use directories::BaseDirs;
use thiserror::Error;

/// Name of the application directory that lives under the OS config root.
pub const APP_DIR_NAME: &str = ".fbpick";
/// Environment variable that relocates the config root.
pub const CONFIG_HOME_ENV: &str = "FBPICK_CONFIG_HOME";
const LOGS_DIR_NAME: &str = "logs";

/// Errors that can occur while resolving or preparing application directories.
#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("No suitable base config directory available for application files")]
    NoBaseDir,
    #[error("Failed to create application directory at {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Return the root `.fbpick` directory, creating it if needed.
pub fn app_root_dir() -> Result<PathBuf, AppDirError> {
    let base = config_base_dir(std::env::var_os(CONFIG_HOME_ENV)).ok_or(AppDirError::NoBaseDir)?;
    ensure_dir(base.join(APP_DIR_NAME))
}

/// Return the logs directory inside the `.fbpick` root, creating it if needed.
pub fn logs_dir() -> Result<PathBuf, AppDirError> {
    ensure_dir(app_root_dir()?.join(LOGS_DIR_NAME))
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf, AppDirError> {
    std::fs::create_dir_all(&path).map_err(|source| AppDirError::CreateDir {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// A non-blank `override_home` wins over the OS config directory.
fn config_base_dir(override_home: Option<OsString>) -> Option<PathBuf> {
    override_home
        .filter(|home| !home.to_string_lossy().trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf()))
}
