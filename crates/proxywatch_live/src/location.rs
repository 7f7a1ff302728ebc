//! Addressable page location: a path plus ordered query pairs.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::form_urlencoded;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("invalid location '{input}': {reason}")]
    Invalid { input: String, reason: String },
}

/// A page location such as `/history?filter=StatusCode%3A404`.
///
/// Query pairs keep their original order; [`Location::set`] edits a key in
/// place so unrelated parameters never move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    path: String,
    pairs: Vec<(String, String)>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        Self {
            path,
            pairs: Vec::new(),
        }
    }

    /// Parse a relative (`/pool?filter=x`) or absolute
    /// (`http://host:8089/pool?filter=x`) location. Fragments are ignored.
    pub fn parse(input: &str) -> Result<Self, LocationError> {
        let base = Url::parse("http://localhost/").map_err(|e| LocationError::Invalid {
            input: input.to_string(),
            reason: e.to_string(),
        })?;
        let url = base.join(input.trim()).map_err(|e| LocationError::Invalid {
            input: input.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            path: url.path().to_string(),
            pairs: url
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set `key` to `value`, replacing the first occurrence and dropping any
    /// duplicates. Appends when the key is absent.
    pub fn set(&mut self, key: &str, value: &str) {
        let mut seen = false;
        self.pairs.retain_mut(|(k, v)| {
            if k != key {
                return true;
            }
            if seen {
                return false;
            }
            seen = true;
            *v = value.to_string();
            true
        });
        if !seen {
            self.pairs.push((key.to_string(), value.to_string()));
        }
    }

    /// Remove every occurrence of `key`. Returns whether anything was removed.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.pairs.len();
        self.pairs.retain(|(k, _)| k != key);
        self.pairs.len() != before
    }

    /// The encoded query string without the leading `?`.
    pub fn query(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.pairs.is_empty() {
            f.write_str(&self.path)
        } else {
            write!(f, "{}?{}", self.path, self.query())
        }
    }
}

impl FromStr for Location {
    type Err = LocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Location::parse(s)
    }
}
