//! Error types for the Claude API client.

use core::fmt;

/// Errors that can arise when calling the Claude API.
#[derive(Debug)]
pub enum ClaudeError {
    /// Transport failures (connection, TLS, timeouts).
    Http(reqwest::Error),
    /// JSON serialization/deserialization errors.
    Json(serde_json::Error),
    /// The API answered with a non-success status.
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from the response body.
        message: String,
    },
    /// The response contained no text content.
    EmptyResponse,
}

impl fmt::Display for ClaudeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(err) => write!(f, "HTTP error: {err}"),
            Self::Json(err) => write!(f, "JSON error: {err}"),
            Self::Api { status, message } => write!(f, "Claude API returned {status}: {message}"),
            Self::EmptyResponse => f.write_str("Claude response contained no text"),
        }
    }
}

impl std::error::Error for ClaudeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Http(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Api { .. } | Self::EmptyResponse => None,
        }
    }
}

impl From<reqwest::Error> for ClaudeError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl From<serde_json::Error> for ClaudeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}
