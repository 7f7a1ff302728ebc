//! In-memory fetcher for driving live views under a paused clock.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proxywatch_live::{FetchRequest, Fetcher, LiveError};
use proxywatch_protocol::{Facet, FacetEntry, QueryResult};
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Call {
    pub filter: String,
    pub params: Vec<(String, String)>,
    pub at: Instant,
}

#[derive(Debug, Default)]
struct Script {
    latency: Duration,
    failures: VecDeque<LiveError>,
    fixed: Option<QueryResult<String>>,
    facets: Option<Vec<Facet>>,
    calls: Vec<Call>,
    in_flight: usize,
    max_in_flight: usize,
}

/// Answers every request with one record: the filter it was sent for.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFetcher {
    script: Arc<Mutex<Script>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        self.script.lock().unwrap().latency = latency;
        self
    }

    pub fn with_facets(self, facets: Vec<Facet>) -> Self {
        self.script.lock().unwrap().facets = Some(facets);
        self
    }

    pub fn respond_with(self, result: QueryResult<String>) -> Self {
        self.script.lock().unwrap().fixed = Some(result);
        self
    }

    pub fn fail_next(&self, err: LiveError) {
        self.script.lock().unwrap().failures.push_back(err);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn filters(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.filter).collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.script.lock().unwrap().max_in_flight
    }
}

impl Fetcher<String> for ScriptedFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<QueryResult<String>, LiveError> {
        let latency = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(Call {
                filter: request.tag.filter.clone(),
                params: request.params.clone(),
                at: Instant::now(),
            });
            script.in_flight += 1;
            script.max_in_flight = script.max_in_flight.max(script.in_flight);
            script.latency
        };

        tokio::time::sleep(latency).await;

        let mut script = self.script.lock().unwrap();
        script.in_flight -= 1;
        if let Some(err) = script.failures.pop_front() {
            return Err(err);
        }
        if let Some(fixed) = &script.fixed {
            return Ok(fixed.clone());
        }
        let result = QueryResult::new(1, vec![request.tag.filter.clone()]);
        Ok(match &script.facets {
            Some(facets) => result.with_facets(facets.clone()),
            None => result,
        })
    }
}

pub fn facet(name: &str, entries: &[(&str, &str, &str)]) -> Facet {
    Facet {
        name: name.to_string(),
        top: entries
            .iter()
            .map(|(n, v, f)| FacetEntry::new(*n, *v, *f))
            .collect(),
    }
}
