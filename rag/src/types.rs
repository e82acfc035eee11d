//! Core types for the knowledge base.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// A document derived from the raw corpus.
///
/// Documents are rebuilt from scratch on every reindex and never mutated in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier for the document.
    pub id: String,
    /// Raw text content.
    pub text: String,
    /// Human readable title.
    pub title: String,
    /// Where the text came from.
    pub source_url: String,
}

impl Document {
    /// Creates a new document.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        title: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            title: title.into(),
            source_url: source_url.into(),
        }
    }

    /// Creates the document for a corpus file, titled and identified by the file stem.
    #[must_use]
    pub fn from_file(path: &Path, text: impl Into<String>) -> Self {
        let stem = path
            .file_stem()
            .map_or_else(|| "corpus".to_string(), |s| s.to_string_lossy().into_owned());
        Self::new(stem.clone(), text, stem, path.display().to_string())
    }
}

/// A contiguous, non-overlapping slice of a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Unique identifier for this passage (format: `{document_id}#chunk_{ordinal}`).
    pub id: String,
    /// Parent document ID.
    pub document_id: String,
    /// Text content of the passage.
    pub text: String,
    /// Position of this passage within its document.
    pub ordinal: usize,
}

impl Passage {
    /// Creates a new passage.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        document_id: impl Into<String>,
        text: impl Into<String>,
        ordinal: usize,
    ) -> Self {
        Self {
            id: id.into(),
            document_id: document_id.into(),
            text: text.into(),
            ordinal,
        }
    }
}

/// A search result containing a passage and its similarity score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The matching passage.
    pub passage: Passage,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Entry stored in the index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The passage.
    pub passage: Passage,
    /// The embedding vector.
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    /// Creates a new index entry.
    #[must_use]
    pub const fn new(passage: Passage, embedding: Vec<f32>) -> Self {
        Self { passage, embedding }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corpus_document_uses_file_stem() {
        let doc = Document::from_file(Path::new("data/knowledge_base.txt"), "hello");
        assert_eq!(doc.id, "knowledge_base");
        assert_eq!(doc.title, "knowledge_base");
        assert!(doc.source_url.ends_with("knowledge_base.txt"));
        assert_eq!(doc.text, "hello");
    }
}
