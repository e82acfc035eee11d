//! # Language Models
//!
//! Provider-agnostic text and vision completions.
//!
//! - **[`LanguageModel`]** - The trait every provider implements
//! - **[`LLMRequest`]** - Messages plus sampling parameters for one call
//! - **[`Message`]** - Individual messages, optionally carrying image attachments
//!
//! ## Text completion
//!
//! ```rust
//! use lookout_core::llm::{LanguageModel, oneshot};
//!
//! async fn answer(model: impl LanguageModel) -> lookout_core::Result {
//!     let request = oneshot("You are an intelligent assistant.", "What's the capital of Japan?");
//!     Ok(model.respond(request).await?)
//! }
//! ```
//!
//! ## Vision completion
//!
//! Images travel as `data:` URL attachments on the user message:
//!
//! ```rust
//! use lookout_core::llm::{LLMRequest, Message, model::Parameters};
//! use url::Url;
//!
//! let screenshot = Url::parse("data:image/jpeg;base64,/9j/4AAQ").unwrap();
//! let request = LLMRequest::new([
//!     Message::system("Read the screenshot."),
//!     Message::user("What is the price?").with_attachment(screenshot),
//! ])
//! .with_parameters(Parameters::default().max_tokens(1024));
//! ```

/// Message types and conversation handling.
pub mod message;
/// Sampling parameters.
pub mod model;

use crate::llm::model::Parameters;
use alloc::{
    boxed::Box,
    format,
    string::{String, ToString},
    sync::Arc,
    vec,
    vec::Vec,
};
use anyhow::anyhow;
use core::future::Future;
pub use message::{Message, Role};
use serde::de::DeserializeOwned;

/// Builder-style request passed into [`LanguageModel::respond`].
#[derive(Debug, Clone)]
pub struct LLMRequest {
    messages: Vec<Message>,
    parameters: Parameters,
}

impl LLMRequest {
    /// Creates a request from the provided messages using default parameters.
    pub fn new(messages: impl Into<Vec<Message>>) -> Self {
        Self {
            messages: messages.into(),
            parameters: Parameters::default(),
        }
    }

    /// Overrides the sampling parameters used for this call.
    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Returns the current conversation messages.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Returns the current parameter snapshot.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Returns `true` if any message carries an attachment.
    #[must_use]
    pub fn has_attachments(&self) -> bool {
        self.messages
            .iter()
            .any(|message| !message.attachments().is_empty())
    }

    /// Breaks the request into owned components for providers that want to take ownership.
    #[must_use]
    pub fn into_parts(self) -> (Vec<Message>, Parameters) {
        (self.messages, self.parameters)
    }
}

/// Language models for text and vision completion.
///
/// One call produces one complete reply. Vision-capable providers read image attachments from
/// user messages; text-only providers may reject them.
pub trait LanguageModel: Sized + Send + Sync {
    /// The error type returned by this language model.
    type Error: core::error::Error + Send + Sync + 'static;

    /// Generates the reply to a conversation.
    fn respond(&self, request: LLMRequest)
    -> impl Future<Output = Result<String, Self::Error>> + Send;
}

macro_rules! impl_language_model {
    ($($name:ident),*) => {
        $(
            impl<T: LanguageModel> LanguageModel for $name<T> {
                type Error = T::Error;

                fn respond(
                    &self,
                    request: LLMRequest,
                ) -> impl Future<Output = Result<String, Self::Error>> + Send {
                    T::respond(self, request)
                }
            }
        )*
    };
}

impl<T: LanguageModel> LanguageModel for &T {
    type Error = T::Error;

    fn respond(
        &self,
        request: LLMRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send {
        T::respond(self, request)
    }
}

impl_language_model!(Arc, Box);

/// Convenience helper that creates a single system + user [`LLMRequest`].
pub fn oneshot(system: impl Into<String>, user: impl Into<String>) -> LLMRequest {
    let messages = vec![Message::system(system.into()), Message::user(user.into())];
    LLMRequest::new(messages)
}

/// Parses a model reply as JSON, tolerating code fences, labels and surrounding prose.
///
/// # Errors
///
/// Returns an error if no candidate extracted from `raw` deserializes into `T`.
pub fn parse_json_with_recovery<T: DeserializeOwned>(raw: &str) -> crate::Result<T> {
    let trimmed = raw.trim();
    let mut last_error: Option<serde_json::Error> = None;

    for candidate in build_json_candidates(trimmed) {
        match serde_json::from_str::<T>(&candidate) {
            Ok(value) => return Ok(value),
            Err(err) => last_error = Some(err),
        }
    }

    let primary = last_error.map_or_else(
        || anyhow!("reply was empty or missing a JSON block"),
        anyhow::Error::new,
    );
    let snippet = trimmed.chars().take(200).collect::<String>();
    Err(primary.context(format!("failed to parse JSON reply; sample: {snippet}")))
}

fn strip_code_fences(raw: &str) -> Option<String> {
    let fence_start = raw.find("```")?;
    let after_fence = &raw[fence_start + 3..];
    let mut lines = after_fence.lines();
    let _language = lines.next();
    let body = lines.collect::<Vec<_>>().join("\n");
    let content = body.rfind("```").map_or(body.as_str(), |end| &body[..end]);

    let cleaned = content.trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

fn extract_json_object(raw: &str) -> Option<String> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| raw[start..=end].trim().to_string())
}

fn build_json_candidates(raw: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    if !raw.is_empty() {
        candidates.push(raw.to_string());
    }
    if let Some(fenced) = strip_code_fences(raw) {
        candidates.push(fenced);
    }
    if let Some(object) = extract_json_object(raw) {
        candidates.push(object);
    }

    let mut deduped: Vec<String> = Vec::new();
    for candidate in candidates {
        if !deduped.contains(&candidate) {
            deduped.push(candidate);
        }
    }
    deduped
}
