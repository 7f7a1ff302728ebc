//! Table layout of the four collections.
//!
//! Aggregates shown under a table are computed here from the records of the
//! current result, at render time.

use chrono::{DateTime, Utc};
use proxywatch_protocol::{removal_id, BlacklistRecord, HistoryRecord, PoolRecord, ReverifyRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cli::output::{format_ago, format_nanos, format_secs, format_size, format_unix_ago};

/// A record type that can be shown as a table row.
pub trait RecordTable: Clone + Send + Sync + DeserializeOwned + Serialize + 'static {
    const HEADERS: &'static [&'static str];

    fn cells(&self, now: DateTime<Utc>) -> Vec<String>;

    /// Identifier for the collection's removal endpoint, if records can be
    /// removed.
    fn removal_id(&self) -> Option<String> {
        None
    }

    /// One-line aggregate over the shown records.
    fn summary(_records: &[Self]) -> Option<String> {
        None
    }
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn optional_ago(time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    time.map(|t| format_ago(t, now)).unwrap_or_else(|| "-".to_string())
}

impl RecordTable for HistoryRecord {
    const HEADERS: &'static [&'static str] =
        &["Serial", "When", "Method", "Status", "Proxy", "Path", "Size", "Took"];

    fn cells(&self, now: DateTime<Utc>) -> Vec<String> {
        let serial = if self.attempt > 1 {
            format!("{}/{}", self.serial, self.attempt)
        } else {
            self.serial.to_string()
        };
        vec![
            serial,
            optional_ago(self.ts, now),
            or_dash(&self.method),
            format!("{} {}", self.status_code, self.status).trim().to_string(),
            or_dash(&self.proxy),
            self.path().to_string(),
            format_size(self.size),
            format_secs(self.took),
        ]
    }

    fn summary(records: &[Self]) -> Option<String> {
        if records.is_empty() {
            return None;
        }
        let bytes: u64 = records.iter().map(|r| r.size).sum();
        Some(format!("{} transferred", format_size(bytes)))
    }
}

impl RecordTable for PoolRecord {
    const HEADERS: &'static [&'static str] = &[
        "Proxy", "Country", "Provider", "Ok", "Speed", "Seen", "Timeouts", "Offered", "Succeed",
        "Last seen",
    ];

    fn cells(&self, now: DateTime<Utc>) -> Vec<String> {
        vec![
            self.proxy.clone(),
            or_dash(&self.country),
            or_dash(&self.provider),
            if self.ok { "yes" } else { "no" }.to_string(),
            format_nanos(self.speed),
            self.seen.to_string(),
            self.timeouts.to_string(),
            self.offered.to_string(),
            self.succeed.to_string(),
            format_unix_ago(self.last_seen, now),
        ]
    }

    fn removal_id(&self) -> Option<String> {
        Some(removal_id(&self.proxy))
    }

    fn summary(records: &[Self]) -> Option<String> {
        if records.is_empty() {
            return None;
        }
        let offered: u64 = records.iter().map(|r| r.offered).sum();
        let succeed: u64 = records.iter().map(|r| r.succeed).sum();
        Some(format!("{} offered, {} succeeded", offered, succeed))
    }
}

impl RecordTable for BlacklistRecord {
    const HEADERS: &'static [&'static str] =
        &["Proxy", "Country", "Provider", "ASN", "Failure", "Sources"];

    fn cells(&self, _now: DateTime<Utc>) -> Vec<String> {
        vec![
            self.proxy.clone(),
            or_dash(&self.country),
            or_dash(&self.provider),
            self.asn.to_string(),
            or_dash(&self.failure),
            self.sources.join(", "),
        ]
    }

    fn removal_id(&self) -> Option<String> {
        Some(removal_id(&self.proxy))
    }
}

impl RecordTable for ReverifyRecord {
    const HEADERS: &'static [&'static str] =
        &["Proxy", "Attempt", "Next check", "Country", "Provider", "Failure"];

    fn cells(&self, now: DateTime<Utc>) -> Vec<String> {
        vec![
            self.proxy.clone(),
            self.attempt.to_string(),
            optional_ago(self.after, now),
            or_dash(&self.country),
            or_dash(&self.provider),
            or_dash(&self.failure),
        ]
    }

    fn removal_id(&self) -> Option<String> {
        Some(removal_id(&self.proxy))
    }
}
