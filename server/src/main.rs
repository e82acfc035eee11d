//! The `lookout` chat server.
//!
//! Loads the local embedding model, brings the knowledge base up from its snapshot or corpus,
//! then serves `POST /chat`. Startup fails if the model or the knowledge base cannot be loaded.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use lookout_agent::Agent;
use lookout_browser::ChromeBrowser;
use lookout_claude::Claude;
use lookout_core::EmbeddingModel;
use lookout_ort::OrtEmbedding;
use lookout_rag::KnowledgeBase;
use lookout_server::{Args, router};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let model_dir = args.model_dir();
    let embedder = OrtEmbedding::builder()
        .model_name(&args.model_name)
        .directory(&model_dir)
        .with_context(|| format!("no embedding model found in {}", model_dir.display()))?
        .max_length(args.max_length)
        .build()
        .with_context(|| format!("failed to load embedding model {}", args.model_name))?;
    info!(
        model = embedder.model_name(),
        dimension = embedder.dim(),
        "embedding model loaded"
    );

    let knowledge = Arc::new(KnowledgeBase::new(embedder, args.knowledge_config()));
    let passages = knowledge
        .initialize()
        .await
        .context("failed to initialize the knowledge base")?;
    info!(passages, "knowledge base ready");

    let text_model = Claude::builder(args.anthropic_api_key.clone())
        .model(args.text_model())
        .build();
    let vision_model = Claude::builder(args.anthropic_api_key.clone())
        .model(args.vision_model())
        .build();
    let browser = ChromeBrowser::new(args.chrome_config());

    let agent = Agent::new(knowledge, text_model, vision_model, browser)
        .with_config(args.agent_config());
    let app = router(Arc::new(agent));

    let addr = args.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("lookout listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server shutdown")?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
