//! CLI module for proxywatch
//!
//! One-shot commands (`query`, `remove`, `config`) build a current-thread
//! runtime per invocation; `tui` runs the live views on one runtime until
//! the user quits.

pub mod config;
pub mod error;
pub mod output;
pub mod query;
pub mod records;
pub mod remove;
pub mod tui;

use anyhow::Result;
use proxywatch_live::HttpFetcher;
use proxywatch_protocol::{paths, ProxywatchConfig};

use crate::cli::error::HelpfulError;

/// Resolve configuration from `~/.proxywatch/config.toml` and the
/// environment.
pub fn load_config() -> Result<ProxywatchConfig> {
    let path = paths::default_config_path();
    ProxywatchConfig::load_or_default(&path)
        .map_err(|err| HelpfulError::config_invalid(&path, &err.to_string()).into())
}

pub fn http_fetcher(config: &ProxywatchConfig) -> Result<HttpFetcher> {
    HttpFetcher::new(&config.base_url, config.request_timeout()).map_err(|err| {
        HelpfulError::new("Failed to create HTTP client")
            .with_context(err.to_string())
            .into()
    })
}

/// Build the runtime used by one-shot commands.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
