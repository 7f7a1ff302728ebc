//! The network boundary of a live view.

use std::future::Future;
use std::time::Duration;

use proxywatch_protocol::{ErrorBody, QueryResult};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::LiveError;
use crate::scheduler::RequestTag;

/// One outgoing collection request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Collection endpoint such as `/history`.
    pub endpoint: String,
    /// Query parameters, mirroring the page location.
    pub params: Vec<(String, String)>,
    pub tag: RequestTag,
}

/// Executes collection requests for a live view.
///
/// Implementations must resolve every request eventually; the driver relies
/// on it to release the single in-flight slot.
pub trait Fetcher<T>: Send + Sync + 'static {
    fn fetch(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<QueryResult<T>, LiveError>> + Send;
}

/// [`Fetcher`] over HTTP with a bounded per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LiveError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LiveError::transport(format!("could not build HTTP client: {}", e)))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> Result<Url, LiveError> {
        let raw = format!("{}{}", self.base_url, endpoint);
        Url::parse(&raw).map_err(|e| LiveError::transport(format!("invalid URL '{}': {}", raw, e)))
    }

    fn map_send_error(&self, err: reqwest::Error) -> LiveError {
        if err.is_timeout() {
            LiveError::timed_out(self.timeout)
        } else {
            LiveError::from(err)
        }
    }

    /// `DELETE <endpoint>/<id>`. Not coordinated with any poll loop.
    pub async fn delete(&self, endpoint: &str, id: &str) -> Result<(), LiveError> {
        let mut url = self.url(endpoint)?;
        url.path_segments_mut()
            .map_err(|_| LiveError::transport(format!("cannot append to '{}'", self.base_url)))?
            .push(id);

        debug!(%url, "removing record");
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        Err(error_from_body(status, &body))
    }
}

impl<T> Fetcher<T> for HttpFetcher
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self, request: &FetchRequest) -> Result<QueryResult<T>, LiveError> {
        let url = self.url(&request.endpoint)?;
        debug!(%url, seq = request.tag.seq, filter = %request.tag.filter, "fetching");

        let response = self
            .client
            .get(url)
            .query(&request.params)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.map_send_error(e))?;
        decode_response(status, &body)
    }
}

/// Decode a collection response. Non-2xx statuses become
/// [`LiveError::Application`] carrying the body's `Message`, or the status
/// text when the body has none.
pub fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    body: &[u8],
) -> Result<QueryResult<T>, LiveError> {
    if !status.is_success() {
        return Err(error_from_body(status, body));
    }
    serde_json::from_slice(body)
        .map_err(|e| LiveError::transport(format!("could not decode response: {}", e)))
}

fn error_from_body(status: StatusCode, body: &[u8]) -> LiveError {
    let message = match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) if !parsed.message.is_empty() => parsed.message,
        _ => status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string()),
    };
    LiveError::application(status.as_u16(), message)
}
