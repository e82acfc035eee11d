//! HTTP routes.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use lookout_agent::{Agent, AgentError};
use lookout_browser::Browser;
use lookout_core::{EmbeddingModel, LanguageModel};
use lookout_rag::Phase;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

/// Reply sent for any failure other than a bad request.
pub const GENERIC_FAILURE: &str = "An error occurred while processing your request.";

/// Something that can answer a chat message.
pub trait ChatService: Send + Sync + 'static {
    /// Answers one message.
    fn chat(&self, message: &str) -> impl Future<Output = Result<String, AgentError>> + Send;

    /// Knowledge base status for health checks.
    fn health(&self) -> Health;
}

impl<E, T, V, B> ChatService for Agent<E, T, V, B>
where
    E: EmbeddingModel + 'static,
    T: LanguageModel + 'static,
    V: LanguageModel + 'static,
    B: Browser + 'static,
{
    fn chat(&self, message: &str) -> impl Future<Output = Result<String, AgentError>> + Send {
        self.handle(message)
    }

    fn health(&self) -> Health {
        let knowledge = self.knowledge();
        Health {
            phase: knowledge.phase(),
            passages: knowledge.snapshot().map_or(0, |index| index.len()),
        }
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
}

/// Successful reply to `POST /chat`.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Always `"assistant"`.
    pub role: &'static str,
    /// The answer.
    pub content: String,
}

/// Failure reply.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// What went wrong.
    pub error: String,
}

/// Body of `GET /healthz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Health {
    /// Knowledge base lifecycle phase.
    pub phase: Phase,
    /// Passages in the published index.
    pub passages: usize,
}

type ApiError = (StatusCode, Json<ErrorBody>);

/// Builds the application router.
pub fn router<S: ChatService>(service: Arc<S>) -> Router {
    Router::new()
        .route("/chat", post(chat::<S>))
        .route("/healthz", get(healthz::<S>))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

async fn chat<S: ChatService>(
    State(service): State<Arc<S>>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = request.map_err(|rejection| {
        debug!(error = %rejection, "malformed chat request");
        failure(StatusCode::BAD_REQUEST, "request body must be JSON with a string `message`")
    })?;
    if request.message.trim().is_empty() {
        return Err(failure(StatusCode::BAD_REQUEST, "message must not be empty"));
    }

    match service.chat(&request.message).await {
        Ok(content) => Ok(Json(ChatResponse {
            role: "assistant",
            content,
        })),
        Err(e) => {
            error!(error = %e, "chat request failed");
            let status = if e.is_not_ready() {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            Err(failure(status, GENERIC_FAILURE))
        }
    }
}

async fn healthz<S: ChatService>(State(service): State<Arc<S>>) -> Json<Health> {
    Json(service.health())
}

fn failure(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.to_owned(),
        }),
    )
}
