//! The live collections exposed by the dashboard backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::defaults::{FAST_CADENCE_MS, SLOW_CADENCE_MS};

/// A dashboard page backed by one live collection endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    /// Requests recently sent through harvested proxies.
    History,
    /// Proxies currently in the working pool.
    Pool,
    /// Proxies rejected by the checker.
    Blacklist,
    /// Proxies waiting for a re-check.
    Reverify,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::History, Page::Pool, Page::Blacklist, Page::Reverify];

    pub fn as_str(&self) -> &'static str {
        match self {
            Page::History => "history",
            Page::Pool => "pool",
            Page::Blacklist => "blacklist",
            Page::Reverify => "reverify",
        }
    }

    /// Collection endpoint, relative to the API root.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Page::History => "/history",
            Page::Pool => "/pool",
            Page::Blacklist => "/blacklist",
            Page::Reverify => "/reverify",
        }
    }

    /// Endpoint used for single-record removal. Pool entries are removed
    /// through the probe service, blacklisted and reverify entries through
    /// the blacklist service. History records cannot be removed.
    pub fn removal_endpoint(&self) -> Option<&'static str> {
        match self {
            Page::Pool => Some("/probe"),
            Page::Blacklist | Page::Reverify => Some("/blacklist"),
            Page::History => None,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::History => "History",
            Page::Pool => "Proxies",
            Page::Blacklist => "Blacklist",
            Page::Reverify => "Reverify",
        }
    }

    pub fn default_cadence_ms(&self) -> u64 {
        match self {
            Page::History | Page::Pool => FAST_CADENCE_MS,
            Page::Blacklist | Page::Reverify => SLOW_CADENCE_MS,
        }
    }

    pub fn next(&self) -> Page {
        let idx = Page::ALL.iter().position(|p| p == self).unwrap_or(0);
        Page::ALL[(idx + 1) % Page::ALL.len()]
    }

    pub fn prev(&self) -> Page {
        let idx = Page::ALL.iter().position(|p| p == self).unwrap_or(0);
        Page::ALL[(idx + Page::ALL.len() - 1) % Page::ALL.len()]
    }

    /// Find the page whose endpoint matches a location path such as
    /// `/history` or `/proxies`.
    pub fn from_path(path: &str) -> Option<Page> {
        let trimmed = path.trim_matches('/');
        Page::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == trimmed)
            .or(match trimmed {
                "proxies" => Some(Page::Pool),
                _ => None,
            })
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown page '{0}' (expected one of: history, pool, blacklist, reverify)")]
pub struct UnknownPage(pub String);

impl FromStr for Page {
    type Err = UnknownPage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::from_path(&s.trim().to_ascii_lowercase()).ok_or_else(|| UnknownPage(s.to_string()))
    }
}
