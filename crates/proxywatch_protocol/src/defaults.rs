//! Canonical default values shared by the CLI and the live query engine.

/// REST API root of a locally running harvester.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8089/api";

/// The only query-string parameter owned by the live filter.
pub const FILTER_KEY: &str = "filter";

/// Quiet period after the last edit before a poll is sent.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Upper bound for a single collection request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Cadence for fast-changing collections (history, pool).
pub const FAST_CADENCE_MS: u64 = 2_000;

/// Cadence for slow-changing collections (blacklist, reverify).
pub const SLOW_CADENCE_MS: u64 = 10_000;

/// Facet labels longer than this are shortened for display.
pub const FACET_LABEL_MAX_CHARS: usize = 32;

pub const API_ENV_VAR: &str = "PROXYWATCH_API";
pub const HOME_ENV_VAR: &str = "PROXYWATCH_HOME";
