//! `proxywatch config`: show where settings come from and what they resolve to.

use std::path::Path;

use anyhow::{Context, Result};
use proxywatch_protocol::{paths, Page, ProxywatchConfig};
use tracing::info;

use crate::cli::load_config;

/// Arguments for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Write a config file with every default filled in, if none exists
    #[arg(long)]
    pub write_default: bool,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    if args.write_default {
        let path = paths::default_config_path();
        if write_default(&path)? {
            println!("Wrote {}", path.display());
        } else {
            println!("{} already exists, left unchanged", path.display());
        }
    }
    let config = load_config()?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&config_json(&config))?);
    } else {
        print!("{}", config_text(&config));
    }
    Ok(())
}

/// Returns `false` when a file is already present.
fn write_default(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    ProxywatchConfig::default()
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote default config");
    Ok(true)
}

fn config_json(config: &ProxywatchConfig) -> serde_json::Value {
    let config_path = paths::default_config_path();
    let cadence: serde_json::Map<String, serde_json::Value> = Page::ALL
        .iter()
        .map(|page| (page.as_str().to_string(), config.cadence_ms(*page).into()))
        .collect();
    serde_json::json!({
        "home": paths::proxywatch_home().to_string_lossy(),
        "config_file": {
            "path": config_path.to_string_lossy(),
            "exists": config_path.exists(),
        },
        "base_url": config.base_url,
        "debounce_ms": config.debounce_ms,
        "request_timeout_secs": config.request_timeout_secs,
        "cadence_ms": cadence,
    })
}

fn config_text(config: &ProxywatchConfig) -> String {
    let config_path = paths::default_config_path();
    let mut out = String::new();
    out.push_str("PROXYWATCH CONFIGURATION\n");
    out.push_str("========================\n\n");
    out.push_str(&format!("Home:     {}\n", paths::proxywatch_home().display()));
    out.push_str(&format!(
        "Config:   {} ({})\n\n",
        config_path.display(),
        if config_path.exists() { "exists" } else { "not found, using defaults" }
    ));
    out.push_str(&format!("API:      {}\n", config.base_url));
    out.push_str(&format!("Debounce: {}ms\n", config.debounce_ms));
    out.push_str(&format!("Timeout:  {}s\n\n", config.request_timeout_secs));
    out.push_str("Refresh cadence:\n");
    for page in Page::ALL {
        out.push_str(&format!("  {:<10} {}ms\n", page.as_str(), config.cadence_ms(page)));
    }
    out
}
