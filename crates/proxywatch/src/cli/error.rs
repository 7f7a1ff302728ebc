//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use std::fmt;
use std::path::Path;

use proxywatch_live::LiveError;
use proxywatch_protocol::{defaults::API_ENV_VAR, Page};

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// The dashboard API could not be reached at all
    pub fn api_unreachable(base_url: &str, reason: &str) -> Self {
        Self::new(format!("Cannot reach the dashboard API at {}", base_url))
            .with_context(reason.to_string())
            .with_suggestions([
                "TRY: Check that the proxy pool service is running".to_string(),
                format!("TRY: Point to another instance: {}=http://host:8089/api proxywatch ...", API_ENV_VAR),
                "TRY: Show the resolved settings: proxywatch config".to_string(),
            ])
    }

    /// The server rejected the query
    pub fn query_rejected(page: Page, filter: &str, message: &str) -> Self {
        let context = if filter.is_empty() {
            format!("Querying {}", page.endpoint())
        } else {
            format!("Querying {} with filter '{}'", page.endpoint(), filter)
        };
        Self::new(format!("Query failed: {}", message))
            .with_context(context)
            .with_suggestion("TRY: Check the filter expression for typos")
            .with_suggestion(format!("TRY: Run without a filter: proxywatch query {}", page))
    }

    /// Map a fetch failure onto the right helpful error
    pub fn from_fetch(base_url: &str, page: Page, filter: &str, err: &LiveError) -> Self {
        match err {
            LiveError::Transport(reason) => Self::api_unreachable(base_url, reason),
            LiveError::Application { message, .. } => Self::query_rejected(page, filter, message),
        }
    }

    /// Configuration file could not be loaded
    pub fn config_invalid(path: &Path, reason: &str) -> Self {
        Self::new(format!("Invalid configuration: {}", path.display()))
            .with_context(reason.to_string())
            .with_suggestions([
                format!("TRY: Inspect the file: cat {}", path.display()),
                "TRY: Remove the file to fall back to defaults".to_string(),
            ])
    }

    /// Page has no removal endpoint
    pub fn removal_unsupported(page: Page) -> Self {
        let supported: Vec<&str> = Page::ALL
            .iter()
            .filter(|p| p.removal_endpoint().is_some())
            .map(|p| p.as_str())
            .collect();
        Self::new(format!("Records cannot be removed from {}", page))
            .with_suggestion(format!("TRY: Remove from one of: {}", supported.join(", ")))
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Print an error as a JSON object on stdout for `--json` callers
pub fn print_json_error(err: &anyhow::Error) {
    let value = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => serde_json::json!({
            "error": helpful.message,
            "context": helpful.context,
            "suggestions": helpful.suggestions,
        }),
        None => serde_json::json!({ "error": format!("{:#}", err) }),
    };
    println!("{}", value);
}
