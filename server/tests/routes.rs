//! HTTP contract of the chat service.

use std::sync::{Arc, Mutex};

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use lookout_agent::AgentError;
use lookout_rag::{Phase, RagError};
use lookout_server::{ChatService, GENERIC_FAILURE, Health, router};
use serde_json::{Value, json};
use tower::ServiceExt;

enum Outcome {
    Answer(&'static str),
    NotReady,
    ModelDown,
}

struct Canned {
    outcome: Outcome,
    seen: Mutex<Vec<String>>,
}

impl Canned {
    fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            seen: Mutex::new(Vec::new()),
        })
    }
}

impl ChatService for Canned {
    async fn chat(&self, message: &str) -> Result<String, AgentError> {
        self.seen.lock().unwrap().push(message.to_owned());
        match self.outcome {
            Outcome::Answer(text) => Ok(text.to_owned()),
            Outcome::NotReady => Err(RagError::NotReady.into()),
            Outcome::ModelDown => Err(AgentError::Model("overloaded".into())),
        }
    }

    fn health(&self) -> Health {
        Health {
            phase: Phase::Ready,
            passages: 2,
        }
    }
}

async fn post_chat(service: Arc<Canned>, body: Value) -> Response {
    router(service)
        .oneshot(
            Request::post("/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn chat_returns_the_assistant_reply() {
    let service = Canned::new(Outcome::Answer("The price is $10"));
    let response = post_chat(Arc::clone(&service), json!({ "message": "What is the price?" })).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "role": "assistant", "content": "The price is $10" })
    );
    assert_eq!(*service.seen.lock().unwrap(), ["What is the price?"]);
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let service = Canned::new(Outcome::Answer("unused"));
    let response = post_chat(Arc::clone(&service), json!({ "message": "   " })).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
    assert!(service.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn not_ready_is_unavailable() {
    let response = post_chat(Canned::new(Outcome::NotReady), json!({ "message": "hi" })).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await, json!({ "error": GENERIC_FAILURE }));
}

#[tokio::test]
async fn failures_hide_details() {
    let response = post_chat(Canned::new(Outcome::ModelDown), json!({ "message": "hi" })).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"], GENERIC_FAILURE);
    assert!(!body.to_string().contains("overloaded"));
}

#[tokio::test]
async fn healthz_reports_knowledge_base() {
    let response = router(Canned::new(Outcome::Answer("unused")))
        .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "phase": "ready", "passages": 2 })
    );
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let response = router(Canned::new(Outcome::Answer("ok")))
        .oneshot(
            Request::post("/chat")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"message":"hi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn malformed_bodies_answer_with_error_json() {
    let service = Canned::new(Outcome::Answer("unused"));
    let response = post_chat(Arc::clone(&service), json!({ "msg": "hi" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());

    let response = post_chat(Arc::clone(&service), json!({ "message": 42 })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());

    let response = router(Arc::clone(&service))
        .oneshot(
            Request::post("/chat")
                .header(header::CONTENT_TYPE, "text/plain")
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());

    assert!(service.seen.lock().unwrap().is_empty());
}
