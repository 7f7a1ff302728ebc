//! Facet Renderer: turns server facet summaries into drill-down links.

use std::collections::HashSet;

use proxywatch_protocol::defaults::FACET_LABEL_MAX_CHARS;
use proxywatch_protocol::Facet;

use crate::store::QueryStateStore;

/// A filter that replaces the current one when activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillDown {
    pub filter: String,
}

impl DrillDown {
    /// Substitute this filter into `store`. The previous expression is
    /// replaced, never combined. Returns whether the filter changed.
    pub fn apply(&self, store: &mut QueryStateStore) -> bool {
        store.set_filter(&self.filter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    /// Display label, shortened when long.
    pub label: String,
    pub value: String,
    /// `None` for "no link" entries, which render as plain text.
    pub link: Option<DrillDown>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetView {
    pub name: String,
    pub entries: Vec<EntryView>,
}

impl FacetView {
    pub fn links(&self) -> impl Iterator<Item = &DrillDown> {
        self.entries.iter().filter_map(|e| e.link.as_ref())
    }
}

/// Facets with fewer than two distinct entries carry no information and are
/// left out. Facet and entry order is the server's.
pub fn render_facets(facets: &[Facet]) -> Vec<FacetView> {
    facets
        .iter()
        .filter(|facet| distinct_entries(facet) >= 2)
        .map(|facet| FacetView {
            name: facet.name.clone(),
            entries: facet
                .top
                .iter()
                .map(|entry| EntryView {
                    label: shorten(&entry.name),
                    value: entry.value.clone(),
                    link: entry.drill_down().map(|filter| DrillDown {
                        filter: filter.to_string(),
                    }),
                })
                .collect(),
        })
        .collect()
}

fn distinct_entries(facet: &Facet) -> usize {
    facet
        .top
        .iter()
        .map(|e| e.name.as_str())
        .collect::<HashSet<_>>()
        .len()
}

fn shorten(label: &str) -> String {
    if label.chars().count() <= FACET_LABEL_MAX_CHARS {
        return label.to_string();
    }
    let mut short: String = label.chars().take(FACET_LABEL_MAX_CHARS).collect();
    short.push_str("...");
    short
}
