//! `proxywatch query`: one filtered request, printed once.

use anyhow::Result;
use chrono::Utc;
use proxywatch_live::{
    render_facets, FacetView, FetchRequest, Fetcher, HttpFetcher, Location, QueryStateStore,
    RequestTag, ResultSink,
};
use proxywatch_protocol::{BlacklistRecord, HistoryRecord, Page, PoolRecord, QueryResult, ReverifyRecord};

use crate::cli::error::HelpfulError;
use crate::cli::output::print_table;
use crate::cli::records::RecordTable;
use crate::cli::{http_fetcher, load_config, runtime};

/// Arguments for the query command
#[derive(Debug, clap::Args)]
pub struct QueryArgs {
    /// Collection to query: history, pool, blacklist or reverify
    pub page: Page,

    /// Filter expression, passed to the server verbatim
    #[arg(short, long, default_value = "")]
    pub filter: String,

    /// Output the raw result as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: QueryArgs) -> Result<()> {
    let config = load_config()?;
    let fetcher = http_fetcher(&config)?;

    let rt = runtime()?;
    rt.block_on(async {
        match args.page {
            Page::History => query_page::<HistoryRecord>(&fetcher, &args).await,
            Page::Pool => query_page::<PoolRecord>(&fetcher, &args).await,
            Page::Blacklist => query_page::<BlacklistRecord>(&fetcher, &args).await,
            Page::Reverify => query_page::<ReverifyRecord>(&fetcher, &args).await,
        }
    })
}

/// The request a live view of `page` would send for `filter`.
fn build_request(page: Page, filter: &str) -> FetchRequest {
    let mut store = QueryStateStore::new(Location::new(page.as_str()));
    store.set_filter(filter);
    FetchRequest {
        endpoint: page.endpoint().to_string(),
        params: store.query_pairs(),
        tag: RequestTag {
            seq: 1,
            filter: store.filter().to_string(),
        },
    }
}

async fn query_page<T: RecordTable>(fetcher: &HttpFetcher, args: &QueryArgs) -> Result<()> {
    let request = build_request(args.page, &args.filter);
    let result: QueryResult<T> = <HttpFetcher as Fetcher<T>>::fetch(fetcher, &request)
        .await
        .map_err(|err| HelpfulError::from_fetch(fetcher.base_url(), args.page, &args.filter, &err))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    let mut sink = ResultSink::new();
    sink.on_result(result);

    let now = Utc::now();
    if !sink.records().is_empty() {
        let rows = sink.records().iter().map(|r| r.cells(now)).collect();
        print_table(T::HEADERS, rows);
    }
    if let Some(label) = sink.total_label() {
        match T::summary(sink.records()) {
            Some(summary) => println!("{} ({})", label, summary),
            None => println!("{}", label),
        }
    }
    for facet in render_facets(sink.facets()) {
        println!("{}", facet_line(&facet));
    }
    Ok(())
}

fn facet_line(facet: &FacetView) -> String {
    let entries: Vec<String> = facet
        .entries
        .iter()
        .map(|entry| match &entry.link {
            Some(link) => format!("{} ({}) [{}]", entry.label, entry.value, link.filter),
            None => format!("{} ({})", entry.label, entry.value),
        })
        .collect();
    format!("{}: {}", facet.name, entries.join(", "))
}
