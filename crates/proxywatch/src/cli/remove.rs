//! `proxywatch remove`: delete one record, outside any live view.

use anyhow::Result;
use proxywatch_protocol::{removal_id, Page};
use tracing::info;

use crate::cli::error::HelpfulError;
use crate::cli::{http_fetcher, load_config, runtime};

/// Arguments for the remove command
#[derive(Debug, clap::Args)]
pub struct RemoveArgs {
    /// Collection to remove from: pool, blacklist or reverify
    pub page: Page,

    /// Proxy address, e.g. http://1.2.3.4:8080
    pub proxy: String,
}

pub fn run(args: RemoveArgs) -> Result<()> {
    let endpoint = args
        .page
        .removal_endpoint()
        .ok_or_else(|| HelpfulError::removal_unsupported(args.page))?;
    let config = load_config()?;
    let fetcher = http_fetcher(&config)?;
    let id = removal_id(&args.proxy);

    let rt = runtime()?;
    rt.block_on(fetcher.delete(endpoint, &id))
        .map_err(|err| HelpfulError::from_fetch(fetcher.base_url(), args.page, "", &err))?;

    info!(page = %args.page, proxy = %args.proxy, "record removed");
    println!("Removed {} from {}", args.proxy, args.page);
    Ok(())
}
