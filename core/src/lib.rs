//! # lookout-core
//!
//! `lookout-core` hosts the no-std trait APIs shared by the rest of the workspace. Provider crates
//! implement these traits, and the knowledge base and agent crates only ever talk to them.
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │  lookout-agent  │───▶│   lookout-core   │◀───│   Providers     │
//! │  lookout-rag    │    │                  │    │                 │
//! │                 │    │ - EmbeddingModel │    │ - lookout-ort   │
//! │                 │    │ - LanguageModel  │    │ - lookout-claude│
//! └─────────────────┘    └──────────────────┘    └─────────────────┘
//! ```
//!
//! | Capability | Trait | Description |
//! |------------|-------|-------------|
//! | **Embeddings** | [`EmbeddingModel`] | Convert text to vectors for semantic search |
//! | **Language Models** | [`LanguageModel`] | Text and vision completions returning one reply |
//!
//! ## Semantic search with embeddings
//!
//! ```rust
//! use lookout_core::{EmbeddingModel, embedding::aggregate};
//!
//! async fn combined_query<M: EmbeddingModel>(
//!     model: &M,
//!     variants: &[String],
//! ) -> lookout_core::Result<Vec<f32>> {
//!     let vectors = model
//!         .embed_batch(variants)
//!         .await
//!         .into_iter()
//!         .collect::<lookout_core::Result<Vec<_>>>()?;
//!     aggregate(&vectors)
//! }
//! ```
//!
//! ## Asking a model
//!
//! ```rust
//! use lookout_core::{LanguageModel, llm::oneshot};
//!
//! async fn ask(model: impl LanguageModel) -> lookout_core::Result {
//!     let reply = model
//!         .respond(oneshot("You are an intelligent assistant.", "Why is the sky blue?"))
//!         .await?;
//!     Ok(reply)
//! }
//! ```

#![no_std]
extern crate alloc;

/// Text embeddings.
pub mod embedding;
pub mod llm;

use alloc::string::String;

#[doc(inline)]
pub use embedding::{Embedding, EmbeddingModel};
#[doc(inline)]
pub use llm::LanguageModel;

/// Result type used throughout the crate.
///
/// Type alias for [`anyhow::Result<T>`](anyhow::Result) with [`String`] as default success type.
pub type Result<T = String> = anyhow::Result<T>;

pub use anyhow::Error;
