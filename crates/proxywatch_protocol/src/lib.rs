//! Wire types shared by the proxywatch client crates.
//!
//! The dashboard backend answers every live collection endpoint with the same
//! envelope:
//!
//! ```text
//! { "Total": 42, "Records": [...], "Facets": [{ "Name": ..., "Top": [...] }] }
//! ```
//!
//! Record payloads are opaque to the live query machinery; the typed records in
//! [`records`] exist for presentation only.

pub mod config;
pub mod defaults;
pub mod http_types;
pub mod pages;
pub mod paths;
pub mod records;

pub use config::{CadenceConfig, ConfigError, ProxywatchConfig};
pub use http_types::{ErrorBody, Facet, FacetEntry, QueryResult, NO_LINK_SENTINEL};
pub use pages::{Page, UnknownPage};
pub use records::{removal_id, BlacklistRecord, HistoryRecord, PoolRecord, ReverifyRecord};
