//! Query State Store: the filter expression, kept inside the page location.

use proxywatch_protocol::defaults::FILTER_KEY;

use crate::location::Location;

/// Owns the location of one mounted page. The filter expression is never
/// stored separately; it is always read back from the location so the two
/// cannot drift apart.
#[derive(Debug, Clone)]
pub struct QueryStateStore {
    location: Location,
}

impl QueryStateStore {
    pub fn new(location: Location) -> Self {
        Self { location }
    }

    /// The current filter expression; `""` when the location has no filter.
    pub fn filter(&self) -> &str {
        self.location.get(FILTER_KEY).unwrap_or("")
    }

    /// Replace the filter expression. An empty value removes the key so the
    /// unfiltered location stays canonical. Returns whether the filter
    /// changed.
    pub fn set_filter(&mut self, value: &str) -> bool {
        let changed = self.filter() != value;
        if value.is_empty() {
            self.location.remove(FILTER_KEY);
        } else {
            self.location.set(FILTER_KEY, value);
        }
        changed
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Request parameters: the location's query pairs, filter included.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.location.pairs().to_vec()
    }
}
