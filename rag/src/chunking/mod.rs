//! Text chunking strategies.
//!
//! This module provides the [`Chunker`] trait and [`WordChunker`], which
//! splits documents into fixed windows of whitespace-separated words.

mod words;

pub use words::WordChunker;

use crate::error::Result;
use crate::types::{Document, Passage};

/// Trait for text chunking strategies.
///
/// Chunkers split documents into smaller pieces that can be individually
/// embedded and searched.
pub trait Chunker: Send + Sync {
    /// Splits a document into passages.
    ///
    /// Passage IDs are derived from the document ID and ordinals start at zero.
    fn chunk(&self, doc: &Document) -> Result<Vec<Passage>>;

    /// Returns the name of this chunking strategy.
    fn name(&self) -> &'static str;
}
