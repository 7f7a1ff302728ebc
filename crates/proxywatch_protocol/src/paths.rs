use std::path::{Path, PathBuf};
use std::sync::Once;

use crate::defaults::HOME_ENV_VAR;

static CREATE_DIR_WARNED: Once = Once::new();

/// Resolve the proxywatch home directory.
///
/// Priority:
/// 1) PROXYWATCH_HOME
/// 2) HOME/USERPROFILE
/// 3) ./.proxywatch
pub fn proxywatch_home() -> PathBuf {
    if let Ok(override_path) = std::env::var(HOME_ENV_VAR) {
        return PathBuf::from(override_path);
    }
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        return PathBuf::from(home).join(".proxywatch");
    }
    PathBuf::from(".").join(".proxywatch")
}

fn ensure_home_dir(home: &Path) {
    if let Err(err) = std::fs::create_dir_all(home) {
        CREATE_DIR_WARNED.call_once(|| {
            eprintln!(
                "Warning: failed to create proxywatch home directory {}: {}. Set {} to a writable path.",
                home.display(),
                err,
                HOME_ENV_VAR
            );
        });
    }
}

/// Default config file: ~/.proxywatch/config.toml
pub fn default_config_path() -> PathBuf {
    proxywatch_home().join("config.toml")
}

/// Default logs directory: ~/.proxywatch/logs
pub fn default_logs_dir() -> PathBuf {
    let home = proxywatch_home();
    ensure_home_dir(&home);
    home.join("logs")
}
