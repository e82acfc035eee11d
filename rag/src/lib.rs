//! Self-updating knowledge base for retrieval-augmented generation.
//!
//! A [`KnowledgeBase`] owns a plain-text corpus and a vector index derived from it:
//!
//! - [`KnowledgeBase::initialize`] loads the persisted snapshot, or builds one from the corpus.
//! - [`KnowledgeBase::query`] embeds a question and returns the best matching passage text.
//! - [`KnowledgeBase::append`] grows the corpus and rebuilds the index before returning.
//!
//! The corpus is split into fixed windows of words by [`WordChunker`], embedded with any
//! [`EmbeddingModel`](lookout_core::EmbeddingModel), and searched exhaustively by
//! [`VectorIndex`]. Snapshots are single JSON files replaced atomically on every rebuild.
//!
//! # Example
//!
//! ```rust,ignore
//! use lookout_rag::{KnowledgeBase, KnowledgeBaseConfig};
//!
//! let kb = KnowledgeBase::new(embedder, KnowledgeBaseConfig::default());
//! kb.initialize().await?;
//!
//! let context = kb.query("What is the capital of France?").await?;
//! kb.append("Zebras live in herds.").await?;
//! ```

pub mod chunking;
pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
mod manager;
pub mod persistence;
pub mod types;

pub use chunking::{Chunker, WordChunker};
pub use config::{KnowledgeBaseConfig, KnowledgeBaseConfigBuilder};
pub use corpus::Corpus;
pub use error::{RagError, Result};
pub use index::{Metric, VectorIndex, cosine_similarity};
pub use manager::{KnowledgeBase, Phase};
pub use types::{Document, IndexEntry, Passage, SearchResult};
