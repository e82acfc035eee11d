//! HTTP chat service for lookout.
//!
//! Exposes a single agent over HTTP:
//!
//! - `POST /chat` takes `{"message": "..."}` and answers `{"role": "assistant", "content": "..."}`
//! - `GET /healthz` reports the knowledge base phase and passage count
//!
//! # Usage
//!
//! Run the binary with an Anthropic key and a local embedding model:
//!
//! ```bash
//! ANTHROPIC_API_KEY=xxx LOOKOUT_MODEL_DIR=./models/UAE-Large-V1 cargo run -p lookout-server
//! ```

mod config;
mod routes;

pub use config::Args;
pub use routes::{
    ChatRequest, ChatResponse, ChatService, ErrorBody, GENERIC_FAILURE, Health, router,
};
