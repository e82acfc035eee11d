#![no_std]
//! # lookout
//!
//! Façade crate that re-exports everything from [`lookout_core`] plus the optional member
//! crates behind feature flags. Pull this crate into a binary to answer questions either by
//! looking at a live web page or from a knowledge base that grows with every page read.
//!
//! ## What's inside?
//!
//! - [`EmbeddingModel`](lookout_core::EmbeddingModel) and
//!   [`LanguageModel`](lookout_core::LanguageModel), the two traits everything else is built on.
//! - `rag`: word chunking, an exact cosine index with atomic snapshots, and the
//!   self-updating `KnowledgeBase`.
//! - `agent`: routes a message to browsing or retrieval.
//! - `ort`, `claude`, `browser`: local embeddings, the Anthropic client, and headless Chrome.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lookout::{agent::Agent, claude::Claude, ort::OrtEmbedding, rag::KnowledgeBase};
//!
//! let knowledge = Arc::new(KnowledgeBase::new(
//!     OrtEmbedding::from_directory("./models/UAE-Large-V1")?,
//!     Default::default(),
//! ));
//! knowledge.initialize().await?;
//!
//! let agent = Agent::new(knowledge, Claude::new(key).with_model(lookout::claude::CLAUDE_3_HAIKU),
//!     Claude::new(key), lookout::browser::ChromeBrowser::default());
//! let answer = agent.handle("go to https://example.com and find the price").await?;
//! ```
//!
//! ## Feature flags
//!
//! | Feature | Crate |
//! |---------|-------|
//! | `rag` | [`lookout_rag`] |
//! | `agent` | [`lookout_agent`] |
//! | `ort` | [`lookout_ort`] |
//! | `claude` | [`lookout_claude`] |
//! | `browser` / `chrome` | [`lookout_browser`] |

pub use lookout_core::*;

#[cfg(feature = "agent")]
#[doc(inline)]
pub use lookout_agent as agent;
#[cfg(feature = "browser")]
#[doc(inline)]
pub use lookout_browser as browser;
#[cfg(feature = "claude")]
#[doc(inline)]
pub use lookout_claude as claude;
#[cfg(feature = "ort")]
#[doc(inline)]
pub use lookout_ort as ort;
#[cfg(feature = "rag")]
#[doc(inline)]
pub use lookout_rag as rag;
