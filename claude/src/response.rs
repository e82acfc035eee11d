//! Response parsing for the Claude API.

use serde::Deserialize;

use crate::error::ClaudeError;

/// Non-streaming Messages API response.
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    /// Content blocks produced by the model.
    pub content: Vec<ResponseBlock>,
    /// Why generation stopped.
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// Content block in a response.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBlock {
    /// Generated text.
    Text {
        /// The text.
        text: String,
    },
    /// Any block type this client does not use.
    #[serde(other)]
    Other,
}

/// Error envelope returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Error details.
    pub error: ErrorDetail,
}

/// Error details.
#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    /// Human readable message.
    pub message: String,
}

impl MessagesResponse {
    /// Concatenates all text blocks.
    ///
    /// # Errors
    /// Returns [`ClaudeError::EmptyResponse`] if there is no text.
    pub fn into_text(self) -> Result<String, ClaudeError> {
        let text = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if text.is_empty() {
            Err(ClaudeError::EmptyResponse)
        } else {
            Ok(text)
        }
    }
}

/// Extracts the message from an error body, falling back to the raw text.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .map_or_else(|_| body.trim().to_string(), |e| e.error.message)
}
