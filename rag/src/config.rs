//! Configuration for the knowledge base.

use crate::index::Metric;
use std::path::PathBuf;

/// Name of the snapshot file inside [`KnowledgeBaseConfig::index_dir`].
pub const SNAPSHOT_FILE: &str = "index.json";

/// Configuration for a [`KnowledgeBase`](crate::KnowledgeBase).
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBaseConfig {
    /// Plain-text corpus that new knowledge is appended to.
    pub corpus_path: PathBuf,
    /// Directory holding the persisted index snapshot.
    pub index_dir: PathBuf,
    /// Number of whitespace-separated words per passage.
    pub chunk_size: usize,
    /// Candidates retrieved per query.
    pub top_k: usize,
    /// How many of the retrieved candidates are handed back as context.
    pub context_passages: usize,
    /// Similarity metric used for ranking.
    pub metric: Metric,
    /// Discard any persisted snapshot on startup and rebuild from the corpus.
    pub reset_index: bool,
}

impl Default for KnowledgeBaseConfig {
    fn default() -> Self {
        Self {
            corpus_path: PathBuf::from("knowledge_base.txt"),
            index_dir: PathBuf::from("index_dir"),
            chunk_size: 75,
            top_k: 3,
            context_passages: 1,
            metric: Metric::Cosine,
            reset_index: false,
        }
    }
}

impl KnowledgeBaseConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for custom configuration.
    #[must_use]
    pub fn builder() -> KnowledgeBaseConfigBuilder {
        KnowledgeBaseConfigBuilder::new()
    }

    /// Full path of the snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.index_dir.join(SNAPSHOT_FILE)
    }
}

/// Builder for [`KnowledgeBaseConfig`].
#[derive(Debug, Default)]
pub struct KnowledgeBaseConfigBuilder {
    config: KnowledgeBaseConfig,
}

impl KnowledgeBaseConfigBuilder {
    /// Creates a new configuration builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: KnowledgeBaseConfig::default(),
        }
    }

    /// Sets the corpus file.
    #[must_use]
    pub fn corpus_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.corpus_path = path.into();
        self
    }

    /// Sets the snapshot directory.
    #[must_use]
    pub fn index_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.index_dir = path.into();
        self
    }

    /// Sets the passage size in words.
    #[must_use]
    pub const fn chunk_size(mut self, words: usize) -> Self {
        self.config.chunk_size = words;
        self
    }

    /// Sets the number of candidates retrieved per query.
    #[must_use]
    pub const fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Sets how many candidates are returned as context.
    #[must_use]
    pub const fn context_passages(mut self, n: usize) -> Self {
        self.config.context_passages = n;
        self
    }

    /// Sets the similarity metric.
    #[must_use]
    pub const fn metric(mut self, metric: Metric) -> Self {
        self.config.metric = metric;
        self
    }

    /// Discards any snapshot on startup when `true`.
    #[must_use]
    pub const fn reset_index(mut self, reset: bool) -> Self {
        self.config.reset_index = reset;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> KnowledgeBaseConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = KnowledgeBaseConfig::default();
        assert_eq!(config.chunk_size, 75);
        assert_eq!(config.top_k, 3);
        assert_eq!(config.context_passages, 1);
        assert_eq!(config.snapshot_path(), PathBuf::from("index_dir/index.json"));
    }

    #[test]
    fn builder_overrides() {
        let config = KnowledgeBaseConfig::builder()
            .corpus_path("/tmp/kb.txt")
            .index_dir("/tmp/idx")
            .chunk_size(10)
            .top_k(5)
            .context_passages(2)
            .metric(Metric::DotProduct)
            .reset_index(true)
            .build();

        assert_eq!(config.corpus_path, PathBuf::from("/tmp/kb.txt"));
        assert_eq!(config.chunk_size, 10);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.context_passages, 2);
        assert_eq!(config.metric, Metric::DotProduct);
        assert!(config.reset_index);
    }
}
