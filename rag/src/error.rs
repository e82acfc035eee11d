//! Error types for the knowledge base crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building, loading or querying the knowledge base.
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding provider failed.
    #[error("embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),

    /// Search was attempted on an index without entries.
    #[error("vector index is empty")]
    IndexEmpty,

    /// A persisted snapshot is structurally invalid.
    #[error("corrupt index snapshot at {path}: {reason}")]
    CorruptIndex {
        /// Snapshot file that failed validation.
        path: PathBuf,
        /// What was wrong with it.
        reason: String,
    },

    /// The knowledge base was queried before it finished initializing.
    #[error("knowledge base is not ready")]
    NotReady,

    /// Neither a snapshot nor a corpus file exists, so there is nothing to serve.
    #[error("corpus file {0} does not exist and no index snapshot was found")]
    CorpusMissing(PathBuf),

    /// Persistence operation failed.
    #[error("persistence error at {path}: {source}")]
    Persistence {
        /// Path where the error occurred.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Dimension mismatch between an embedding and the index.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension provided.
        actual: usize,
    },
}

impl RagError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptIndex {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for knowledge base operations.
pub type Result<T> = std::result::Result<T, RagError>;
