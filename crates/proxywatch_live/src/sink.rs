//! Result Sink: the last applied result of a view.

use proxywatch_protocol::{Facet, QueryResult};

/// Receives every result that survives the scheduler's checks.
///
/// The sink stores results as they arrive. Sums and other aggregates are
/// computed by the presentation layer from `records()` at render time.
#[derive(Debug, Clone)]
pub struct ResultSink<T> {
    total: Option<u64>,
    records: Vec<T>,
    facets: Vec<Facet>,
    applied: u64,
}

impl<T> Default for ResultSink<T> {
    fn default() -> Self {
        Self {
            total: None,
            records: Vec::new(),
            facets: Vec::new(),
            applied: 0,
        }
    }
}

impl<T> ResultSink<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_result(&mut self, result: QueryResult<T>) {
        self.total = Some(result.total);
        self.records = result.records;
        self.facets = result.facets.unwrap_or_default();
        self.applied += 1;
    }

    /// `None` until the first result has been applied.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn records(&self) -> &[T] {
        &self.records
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    /// Number of results applied since mount.
    pub fn applied(&self) -> u64 {
        self.applied
    }

    pub fn has_result(&self) -> bool {
        self.total.is_some()
    }

    /// Header text such as `"42 total"`.
    pub fn total_label(&self) -> Option<String> {
        self.total.map(|total| format!("{} total", total))
    }
}
