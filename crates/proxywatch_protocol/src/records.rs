//! Record shapes of the four live collections.
//!
//! The live query engine treats records as opaque; these structs only serve
//! the table views. Every field is defaulted so that schema drift on the
//! backend degrades a column instead of failing the whole page.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A request proxied through the pool (`/history`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HistoryRecord {
    #[serde(rename = "ID")]
    pub id: u64,
    pub serial: u64,
    pub attempt: u32,
    pub ts: Option<DateTime<Utc>>,
    pub method: String,
    #[serde(rename = "URL")]
    pub url: String,
    pub status: String,
    pub status_code: u16,
    pub proxy: String,
    pub appeared: u32,
    pub size: u64,
    /// Seconds.
    pub took: f64,
}

impl HistoryRecord {
    /// Path and query of the requested URL, without scheme and host.
    pub fn path(&self) -> &str {
        let after_scheme = self.url.find("://").map(|idx| idx + 3).unwrap_or(0);
        match self.url[after_scheme..].find('/') {
            Some(idx) => &self.url[after_scheme + idx..],
            None => "/",
        }
    }
}

/// A proxy in the working pool (`/pool`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PoolRecord {
    pub proxy: String,
    /// Unix seconds.
    pub first_seen: i64,
    /// Unix seconds.
    pub last_seen: i64,
    pub reanimate_after: Option<DateTime<Utc>>,
    pub ok: bool,
    /// Nanoseconds.
    pub speed: u64,
    pub seen: u32,
    pub timeouts: u32,
    pub offered: u64,
    pub reanimated: u32,
    pub succeed: u64,
    pub hour_offered: Vec<u64>,
    pub hour_succeed: Vec<u64>,
    pub country: String,
    pub provider: String,
    #[serde(rename = "ASN")]
    pub asn: u32,
}

/// A proxy rejected by the checker (`/blacklist`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct BlacklistRecord {
    pub proxy: String,
    pub country: String,
    pub provider: String,
    #[serde(rename = "ASN")]
    pub asn: u32,
    pub failure: String,
    pub sources: Vec<String>,
}

/// A proxy scheduled for another check (`/reverify`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ReverifyRecord {
    pub proxy: String,
    pub attempt: u32,
    pub after: Option<DateTime<Utc>>,
    pub country: String,
    pub provider: String,
    #[serde(rename = "ASN")]
    pub asn: u32,
    pub failure: String,
    pub sources: Vec<String>,
}

/// Identifier accepted by the removal endpoint for a proxy address:
/// `http://1.2.3.4:8080` becomes `http:1.2.3.4:8080`.
pub fn removal_id(proxy: &str) -> String {
    proxy.replacen("//", "", 1)
}
