use std::{
    path::PathBuf,
    sync::{Mutex, OnceLock},
};

use fbpick::app_dirs::CONFIG_HOME_ENV;
use fbpick::config::WEIGHTS_FINGERPRINT_ENV;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Points the app at a private config home and clears the fingerprint
/// override for the guard's lifetime.
pub struct FbpickEnvGuard {
    previous: Vec<(&'static str, Option<String>)>,
    _lock: std::sync::MutexGuard<'static, ()>,
}

impl FbpickEnvGuard {
    pub fn set_config_home(path: PathBuf) -> Self {
        let lock = ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|err| err.into_inner());
        let previous = [CONFIG_HOME_ENV, WEIGHTS_FINGERPRINT_ENV]
            .into_iter()
            .map(|key| (key, std::env::var(key).ok()))
            .collect();
        // SAFETY: tests run under a global lock to prevent concurrent env mutations.
        unsafe {
            std::env::set_var(CONFIG_HOME_ENV, path);
            std::env::remove_var(WEIGHTS_FINGERPRINT_ENV);
        }
        Self {
            previous,
            _lock: lock,
        }
    }

    pub fn set_weights_fingerprint(&self, value: &str) {
        // SAFETY: the guard holds the global env lock.
        unsafe {
            std::env::set_var(WEIGHTS_FINGERPRINT_ENV, value);
        }
    }
}

impl Drop for FbpickEnvGuard {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..) {
            // SAFETY: tests run under a global lock to prevent concurrent env mutations.
            unsafe {
                match value {
                    Some(value) => std::env::set_var(key, value),
                    None => std::env::remove_var(key),
                }
            }
        }
    }
}
