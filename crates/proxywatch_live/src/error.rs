//! Fetch failures and the per-view error channel.

use std::time::Duration;
use thiserror::Error;

/// Why a collection request failed.
///
/// Both variants halt automatic polling and are shown to the user the same
/// way; the split only matters for logging.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LiveError {
    /// The request never produced a usable response: connection refused,
    /// timeout, malformed body.
    #[error("{0}")]
    Transport(String),
    /// The server answered with an error payload. `message` is the payload's
    /// `Message` field, verbatim.
    #[error("{message}")]
    Application { status: u16, message: String },
}

impl LiveError {
    pub fn transport(message: impl Into<String>) -> Self {
        LiveError::Transport(message.into())
    }

    pub fn timed_out(after: Duration) -> Self {
        LiveError::Transport(format!("request timed out after {}s", after.as_secs()))
    }

    pub fn application(status: u16, message: impl Into<String>) -> Self {
        LiveError::Application {
            status,
            message: message.into(),
        }
    }

    /// The text shown in the failure banner.
    pub fn message(&self) -> &str {
        match self {
            LiveError::Transport(message) => message,
            LiveError::Application { message, .. } => message,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, LiveError::Transport(_))
    }
}

impl From<reqwest::Error> for LiveError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LiveError::Transport(format!("could not decode response: {}", err))
        } else {
            LiveError::Transport(err.to_string())
        }
    }
}

/// Holds the last failure of one view until something clears it.
#[derive(Debug, Default, Clone)]
pub struct ErrorChannel {
    last: Option<LiveError>,
}

impl ErrorChannel {
    pub fn raise(&mut self, err: LiveError) {
        self.last = Some(err);
    }

    pub fn clear(&mut self) {
        self.last = None;
    }

    pub fn last(&self) -> Option<&LiveError> {
        self.last.as_ref()
    }

    pub fn message(&self) -> Option<&str> {
        self.last.as_ref().map(LiveError::message)
    }
}
