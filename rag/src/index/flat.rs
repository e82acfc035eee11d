//! Exact brute-force vector index.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::Path;

use ordered_float::OrderedFloat;
use rayon::prelude::*;

use super::Metric;
use crate::error::{RagError, Result};
use crate::persistence::{self, Snapshot};
use crate::types::{IndexEntry, Passage, SearchResult};

/// Brute-force vector index over passage embeddings.
///
/// Every stored embedding has exactly `dimension` components. Search ranks by
/// descending score and breaks ties by ascending passage ordinal, then by ID,
/// so results are stable across runs.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    dimension: usize,
    metric: Metric,
    entries: Vec<IndexEntry>,
    positions: HashMap<String, usize>,
}

impl VectorIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new(dimension: usize, metric: Metric) -> Self {
        Self {
            dimension,
            metric,
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Builds an index from passages and their embeddings in one pass.
    ///
    /// # Errors
    /// Returns [`RagError::DimensionMismatch`] if any embedding has the wrong length.
    pub fn from_entries(
        dimension: usize,
        metric: Metric,
        entries: impl IntoIterator<Item = IndexEntry>,
    ) -> Result<Self> {
        let mut index = Self::new(dimension, metric);
        for entry in entries {
            index.insert(entry.passage, entry.embedding)?;
        }
        Ok(index)
    }

    /// Inserts a passage with its embedding. An existing passage with the same ID is replaced.
    ///
    /// # Errors
    /// Returns [`RagError::DimensionMismatch`] if `embedding` has the wrong length.
    pub fn insert(&mut self, passage: Passage, embedding: Vec<f32>) -> Result<()> {
        if embedding.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        if let Some(&idx) = self.positions.get(&passage.id) {
            self.entries[idx] = IndexEntry::new(passage, embedding);
        } else {
            self.positions.insert(passage.id.clone(), self.entries.len());
            self.entries.push(IndexEntry::new(passage, embedding));
        }
        Ok(())
    }

    /// Returns the `k` passages most similar to `query`.
    ///
    /// Fewer than `k` results are returned when the index holds fewer entries.
    ///
    /// # Errors
    /// - [`RagError::IndexEmpty`] if the index has no entries.
    /// - [`RagError::DimensionMismatch`] if `query` has the wrong length.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        if self.entries.is_empty() {
            return Err(RagError::IndexEmpty);
        }
        if query.len() != self.dimension {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let metric = self.metric;
        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .par_iter()
            .map(|entry| {
                let score = metric.score(query, &entry.embedding);
                // NaN would otherwise outrank every real score.
                let score = if score.is_nan() { f32::NEG_INFINITY } else { score };
                (score, entry)
            })
            .collect();

        scored.sort_by(|(score_a, a), (score_b, b)| {
            Reverse(OrderedFloat(*score_a))
                .cmp(&Reverse(OrderedFloat(*score_b)))
                .then_with(|| a.passage.ordinal.cmp(&b.passage.ordinal))
                .then_with(|| a.passage.id.cmp(&b.passage.id))
        });

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, entry)| SearchResult {
                passage: entry.passage.clone(),
                score,
            })
            .collect())
    }

    /// Looks up a passage by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&IndexEntry> {
        self.positions.get(id).map(|&idx| &self.entries[idx])
    }

    /// Returns the embedding dimension.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the similarity metric.
    #[must_use]
    pub const fn metric(&self) -> Metric {
        self.metric
    }

    /// Returns the number of indexed passages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns all entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Writes the index to `path` atomically.
    ///
    /// A concurrent reader sees either the previous snapshot or this one, never a mix.
    ///
    /// # Errors
    /// Returns [`RagError::Persistence`] on I/O failure.
    pub fn persist(&self, path: &Path) -> Result<()> {
        persistence::save(path, &Snapshot::from_index(self))
    }

    /// Loads an index previously written with [`persist`](Self::persist).
    ///
    /// # Errors
    /// - [`RagError::Persistence`] if the file cannot be read.
    /// - [`RagError::CorruptIndex`] if it is not a valid snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        persistence::load(path)?.into_index(path)
    }
}
