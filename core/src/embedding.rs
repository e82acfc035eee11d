//! # Embedding Module
//!
//! This module provides types and traits for working with text embeddings.
//!
//! ## What are Embeddings?
//!
//! Embeddings are dense vector representations of text that capture semantic meaning.
//! Similar texts produce similar embedding vectors, which is what the knowledge base relies on
//! when it ranks passages against a question.
//!
//! ## Embedding Models
//!
//! An embedding model turns text into a vector of a fixed dimension. Every vector produced by one
//! model instance has the same length, so vectors built at indexing time stay comparable with
//! vectors built at query time.
//!
//! ## Usage
//!
//! ```rust
//! use lookout_core::EmbeddingModel;
//!
//! async fn example<T: EmbeddingModel>(model: &T) -> lookout_core::Result<()> {
//!     let dim = model.dim();
//!
//!     let embedding = model.embed_query("Hello, world!").await?;
//!     assert_eq!(embedding.len(), dim);
//!
//!     let texts = ["first".to_string(), "second".to_string()];
//!     let batch = model.embed_batch(&texts).await;
//!     assert_eq!(batch.len(), texts.len());
//!
//!     Ok(())
//! }
//! ```

use alloc::vec::Vec;
use core::future::Future;

use alloc::string::String;
use anyhow::ensure;

/// A type alias for an embedding vector of 32-bit floats.
///
/// The vector length is determined by the embedding model's architecture.
pub type Embedding = Vec<f32>;

/// Converts text to vector representations.
///
/// # Implementation Requirements
///
/// - [`embed`](EmbeddingModel::embed) must return vectors with length equal to [`dim`](EmbeddingModel::dim)
/// - [`embed_batch`](EmbeddingModel::embed_batch) must return exactly one result per input, in
///   input order, so a caller can skip the inputs that failed and keep the rest
///
/// # Example
///
/// ```rust
/// use lookout_core::EmbeddingModel;
///
/// struct Constant;
///
/// impl EmbeddingModel for Constant {
///     fn dim(&self) -> usize {
///         3
///     }
///
///     async fn embed(&self, _text: &str) -> lookout_core::Result<Vec<f32>> {
///         Ok(vec![1.0; self.dim()])
///     }
/// }
///
/// # tokio_test::block_on(async {
/// let embedding = Constant.embed("The quick brown fox").await.unwrap();
/// assert_eq!(embedding.len(), 3);
/// # });
/// ```
pub trait EmbeddingModel: Send + Sized + Sync {
    /// Returns the embedding vector dimension.
    fn dim(&self) -> usize;

    /// Converts text to an embedding vector.
    ///
    /// Inputs longer than the model's maximum token length are truncated; shorter inputs are
    /// padded, so every call yields a vector of length [`Self::dim`](EmbeddingModel::dim).
    fn embed(&self, text: &str) -> impl Future<Output = crate::Result<Embedding>> + Send;

    /// Embeds a batch of texts.
    ///
    /// Returns one result per input, in input order. A failure on one text never fails the
    /// others. Providers that can run several inputs through the model at once should override
    /// this.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Vec<crate::Result<Embedding>>> + Send {
        async move {
            let mut results = Vec::with_capacity(texts.len());
            for text in texts {
                results.push(self.embed(text).await);
            }
            results
        }
    }

    /// Embeds a single search query.
    ///
    /// Same semantics as [`embed`](EmbeddingModel::embed). Providers that use an instruction prefix
    /// for queries can override this.
    fn embed_query(&self, text: &str) -> impl Future<Output = crate::Result<Embedding>> + Send {
        self.embed(text)
    }
}

impl<T: EmbeddingModel> EmbeddingModel for alloc::sync::Arc<T> {
    fn dim(&self) -> usize {
        T::dim(self)
    }

    fn embed(&self, text: &str) -> impl Future<Output = crate::Result<Embedding>> + Send {
        T::embed(self, text)
    }

    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl Future<Output = Vec<crate::Result<Embedding>>> + Send {
        T::embed_batch(self, texts)
    }

    fn embed_query(&self, text: &str) -> impl Future<Output = crate::Result<Embedding>> + Send {
        T::embed_query(self, text)
    }
}

/// Combines several embeddings into one by taking the element-wise mean.
///
/// # Errors
///
/// Returns an error if `vectors` is empty or the vectors do not share one dimension.
#[allow(clippy::cast_precision_loss)]
pub fn aggregate(vectors: &[Embedding]) -> crate::Result<Embedding> {
    let Some(first) = vectors.first() else {
        anyhow::bail!("cannot aggregate an empty set of embeddings");
    };
    let dim = first.len();
    let mut mean = alloc::vec![0.0f32; dim];
    for vector in vectors {
        ensure!(
            vector.len() == dim,
            "cannot aggregate embeddings of different dimensions ({dim} and {})",
            vector.len()
        );
        for (acc, value) in mean.iter_mut().zip(vector) {
            *acc += value;
        }
    }
    let count = vectors.len() as f32;
    for value in &mut mean {
        *value /= count;
    }
    Ok(mean)
}
