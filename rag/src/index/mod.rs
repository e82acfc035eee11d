//! Vector index for the knowledge base.
//!
//! [`VectorIndex`] is an exact, brute-force index: every query is scored against
//! every stored passage. Corpora here are small enough that this beats the
//! bookkeeping of an approximate structure, and results are fully deterministic.

mod flat;

pub use flat::VectorIndex;

use serde::{Deserialize, Serialize};

/// Similarity metric used to rank passages against a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Cosine similarity. Zero-norm vectors score `0.0`.
    #[default]
    Cosine,
    /// Raw inner product, for embeddings that are already normalized.
    DotProduct,
}

impl Metric {
    /// Scores `a` against `b`. Higher is more similar.
    #[must_use]
    pub fn score(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::DotProduct => dot(a, b),
        }
    }
}

/// Computes cosine similarity between two vectors.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (lhs, rhs) in a.iter().zip(b) {
        dot += lhs * rhs;
        norm_a += lhs * lhs;
        norm_b += rhs * rhs;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(lhs, rhs)| lhs * rhs).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_parallel_and_orthogonal() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 3.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_zero() {
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).abs() < f32::EPSILON);
        assert!(Metric::Cosine.score(&[1.0], &[0.0]).abs() < f32::EPSILON);
    }

    #[test]
    fn dot_product_is_unnormalized() {
        assert!((Metric::DotProduct.score(&[1.0, 2.0], &[3.0, 4.0]) - 11.0).abs() < 1e-6);
    }
}
