//! Client configuration, read from `~/.proxywatch/config.toml`.
//!
//! Every field has a default, so an absent file or an empty table is a
//! valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::defaults::{
    API_ENV_VAR, DEFAULT_BASE_URL, DEFAULT_DEBOUNCE_MS, DEFAULT_REQUEST_TIMEOUT_SECS,
    FAST_CADENCE_MS, SLOW_CADENCE_MS,
};
use crate::pages::Page;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid config value for {field}: {message}")]
    Invalid { field: &'static str, message: String },
    #[error("failed to serialize config: {0}")]
    Serialize(String),
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxywatchConfig {
    /// REST API root, e.g. `http://localhost:8089/api`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Quiet period after the last filter edit before polling
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Upper bound for one collection request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Delay between a completed response and the next poll, per page
    #[serde(default)]
    pub cadence: CadenceConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadenceConfig {
    #[serde(default = "fast_cadence")]
    pub history_ms: u64,
    #[serde(default = "fast_cadence")]
    pub pool_ms: u64,
    #[serde(default = "slow_cadence")]
    pub blacklist_ms: u64,
    #[serde(default = "slow_cadence")]
    pub reverify_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn fast_cadence() -> u64 {
    FAST_CADENCE_MS
}

fn slow_cadence() -> u64 {
    SLOW_CADENCE_MS
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            history_ms: Page::History.default_cadence_ms(),
            pool_ms: Page::Pool.default_cadence_ms(),
            blacklist_ms: Page::Blacklist.default_cadence_ms(),
            reverify_ms: Page::Reverify.default_cadence_ms(),
        }
    }
}

impl Default for ProxywatchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            debounce_ms: default_debounce_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            cadence: CadenceConfig::default(),
        }
    }
}

impl ProxywatchConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ProxywatchConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults. The
    /// `PROXYWATCH_API` environment variable overrides `base_url` either way.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        if let Ok(base_url) = std::env::var(API_ENV_VAR) {
            config.base_url = base_url;
            config.validate()?;
        }
        Ok(config)
    }

    /// Save configuration to a TOML file, creating its directory.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        std::fs::write(path, content).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                field: "base_url",
                message: format!("'{}' must start with http:// or https://", self.base_url),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                message: "must be at least 1".to_string(),
            });
        }
        for page in Page::ALL {
            if self.cadence_ms(page) == 0 {
                return Err(ConfigError::Invalid {
                    field: "cadence",
                    message: format!("{} cadence must be positive", page),
                });
            }
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cadence_ms(&self, page: Page) -> u64 {
        match page {
            Page::History => self.cadence.history_ms,
            Page::Pool => self.cadence.pool_ms,
            Page::Blacklist => self.cadence.blacklist_ms,
            Page::Reverify => self.cadence.reverify_ms,
        }
    }

    pub fn cadence_for(&self, page: Page) -> Duration {
        Duration::from_millis(self.cadence_ms(page))
    }
}
