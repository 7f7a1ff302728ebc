//! HTTP API types for the live collection endpoints.
//!
//! Field names follow the backend's JSON encoding (PascalCase). Go encodes
//! empty slices as `null`, so every sequence tolerates both a missing field
//! and an explicit `null`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Entry name the backend uses for an empty value. Such entries carry no
/// usable drill-down filter.
pub const NO_LINK_SENTINEL: &str = "n/a";

// ============================================================================
// Query envelope
// ============================================================================

/// One page of a filtered collection query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct QueryResult<T> {
    /// Number of records matching the filter, before the page limit.
    pub total: u64,
    /// The records on this page, in server order.
    #[serde(default = "Vec::new", deserialize_with = "null_as_empty")]
    pub records: Vec<T>,
    /// Facet summaries of the filtered set, if the endpoint computes them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets: Option<Vec<Facet>>,
}

impl<T> QueryResult<T> {
    pub fn new(total: u64, records: Vec<T>) -> Self {
        Self {
            total,
            records,
            facets: None,
        }
    }

    pub fn with_facets(mut self, facets: Vec<Facet>) -> Self {
        self.facets = Some(facets);
        self
    }
}

/// A server-computed summary of the most common values of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Facet {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub top: Vec<FacetEntry>,
}

/// One value of a facet together with a ready-made drill-down filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FacetEntry {
    pub name: String,
    /// Occurrence count. The backend sends a number; older builds sent a
    /// preformatted string.
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    #[serde(default)]
    pub filter: String,
}

impl FacetEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            filter: filter.into(),
        }
    }

    /// The filter to substitute when this entry is activated, or `None` when
    /// the entry is the "no link" sentinel.
    pub fn drill_down(&self) -> Option<&str> {
        if self.name == NO_LINK_SENTINEL || self.filter.trim().is_empty() {
            None
        } else {
            Some(&self.filter)
        }
    }
}

/// Error payload returned with non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "Message")]
    pub message: String,
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

// ============================================================================
// Lenient field decoders
// ============================================================================

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Loose::deserialize(deserializer)? {
        Loose::Text(s) => s,
        Loose::Int(n) => n.to_string(),
        Loose::Float(n) => n.to_string(),
    })
}
