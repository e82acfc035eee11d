//! Claude API client implementation.

use std::sync::Arc;
use std::time::Duration;

use lookout_core::{LanguageModel, llm::LLMRequest};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::{
    constant::{ANTHROPIC_VERSION, CLAUDE_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_MODEL},
    error::ClaudeError,
    request::{MessagesRequest, to_claude_messages},
    response::{MessagesResponse, error_message},
};

/// Claude chat model client for the Anthropic Messages API.
///
/// Vision requests are ordinary requests whose user message carries image
/// attachments, so the same client serves both text and screenshot prompts.
///
/// # Example
///
/// ```ignore
/// use lookout_claude::Claude;
/// use lookout_core::{LanguageModel, llm::oneshot};
///
/// let client = Claude::new(std::env::var("ANTHROPIC_API_KEY")?);
///
/// let response = client.respond(oneshot(
///     "You are a helpful assistant.",
///     "What is the capital of France?"
/// )).await?;
///
/// println!("{response}");
/// ```
#[derive(Clone, Debug)]
pub struct Claude {
    inner: Arc<Config>,
}

impl Claude {
    /// Create a new client using the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::builder(api_key).build()
    }

    /// Start building a Claude client with custom configuration.
    #[must_use]
    pub fn builder(api_key: impl Into<String>) -> Builder {
        Builder::new(api_key)
    }

    /// Override the default model in-place.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).model = sanitize_model(model);
        self
    }

    /// Override the base URL (useful for proxies or local deployments).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).base_url = base_url.into();
        self
    }

    /// Override the default `max_tokens`.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        Arc::make_mut(&mut self.inner).default_max_tokens = max_tokens;
        self
    }

    /// The model identifier requests are sent to.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }
}

impl LanguageModel for Claude {
    type Error = ClaudeError;

    fn respond(
        &self,
        request: LLMRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send {
        let cfg = self.inner.clone();
        let (messages, parameters) = request.into_parts();
        let (system, messages) = to_claude_messages(&messages);

        let body = MessagesRequest {
            model: cfg.model.clone(),
            max_tokens: parameters.max_tokens.unwrap_or(cfg.default_max_tokens),
            messages,
            system,
            temperature: parameters.temperature,
        };

        async move {
            debug!(model = %body.model, messages = body.messages.len(), "sending Claude request");

            let response = cfg
                .http
                .post(cfg.request_url("/v1/messages"))
                .headers(cfg.headers()?)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            let text = response.text().await?;
            if !status.is_success() {
                return Err(ClaudeError::Api {
                    status: status.as_u16(),
                    message: error_message(&text),
                });
            }

            let parsed: MessagesResponse = serde_json::from_str(&text)?;
            debug!(stop_reason = ?parsed.stop_reason, "Claude response complete");
            parsed.into_text()
        }
    }
}

/// Builder for Claude clients.
#[derive(Debug)]
pub struct Builder {
    api_key: String,
    base_url: String,
    model: String,
    default_max_tokens: u32,
    timeout: Duration,
}

impl Builder {
    fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: CLAUDE_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            default_max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(120),
        }
    }

    /// Set a custom API base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Select a model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = sanitize_model(model);
        self
    }

    /// Set the default `max_tokens` for requests.
    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.default_max_tokens = max_tokens;
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Consume the builder and create a Claude client.
    #[must_use]
    pub fn build(self) -> Claude {
        let http = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .unwrap_or_default();

        Claude {
            inner: Arc::new(Config {
                http,
                api_key: self.api_key,
                base_url: self.base_url,
                model: self.model,
                default_max_tokens: self.default_max_tokens,
            }),
        }
    }
}

/// Internal configuration for the Claude client.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) http: reqwest::Client,
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) model: String,
    pub(crate) default_max_tokens: u32,
}

impl Config {
    pub(crate) fn request_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn headers(&self) -> Result<HeaderMap, ClaudeError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(self.api_key.trim()).map_err(|_| ClaudeError::Api {
            status: 401,
            message: "API key contains characters not allowed in a header".into(),
        })?;
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("lookout-claude/0.1"));
        Ok(headers)
    }
}

fn sanitize_model(model: impl Into<String>) -> String {
    model.into().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_url_joins_cleanly() {
        let client = Claude::new("key").with_base_url("http://localhost:8080/");
        assert_eq!(
            client.inner.request_url("/v1/messages"),
            "http://localhost:8080/v1/messages"
        );
    }

    #[test]
    fn builder_overrides() {
        let client = Claude::builder("key")
            .model("  claude-haiku-4-5 ")
            .max_tokens(256)
            .build();
        assert_eq!(client.model(), "claude-haiku-4-5");
        assert_eq!(client.inner.default_max_tokens, 256);
    }

    #[test]
    fn headers_carry_key_and_version() {
        let headers = Claude::new(" secret ").inner.headers().unwrap();
        assert_eq!(headers["x-api-key"], "secret");
        assert_eq!(headers["anthropic-version"], ANTHROPIC_VERSION);
    }

    #[test]
    fn invalid_key_is_rejected() {
        assert!(Claude::new("bad\nkey").inner.headers().is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_http_error() {
        let client = Claude::builder("key")
            .base_url("http://127.0.0.1:9")
            .timeout(Duration::from_millis(500))
            .build();
        let result = client
            .respond(lookout_core::llm::oneshot("system", "user"))
            .await;
        assert!(matches!(result, Err(ClaudeError::Http(_))));
    }
}
