//! The self-updating knowledge base.

use std::fmt;
use std::fs;
use std::sync::Arc;

use lookout_core::EmbeddingModel;
use lookout_core::embedding::aggregate;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chunking::{Chunker, WordChunker};
use crate::config::KnowledgeBaseConfig;
use crate::corpus::Corpus;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;
use crate::types::{IndexEntry, SearchResult};

/// Lifecycle of a [`KnowledgeBase`].
///
/// `Uninitialized -> Loading -> Ready` when a snapshot exists,
/// `Uninitialized -> Building -> Ready` otherwise, and `Ready -> Building -> Ready`
/// on every append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing has been loaded yet.
    Uninitialized,
    /// A snapshot is being read from disk.
    Loading,
    /// The index is being rebuilt from the corpus.
    Building,
    /// An index is published and queries are served.
    Ready,
}

/// A corpus file plus the vector index derived from it.
///
/// The corpus is the source of truth. The index is a cache that is rebuilt in
/// full whenever the corpus grows. Rebuilds are serialized, and a finished index
/// is published with a single pointer swap, so concurrent queries see either the
/// previous index or the new one.
pub struct KnowledgeBase<M> {
    embedder: M,
    chunker: WordChunker,
    corpus: Corpus,
    config: KnowledgeBaseConfig,
    phase: RwLock<Phase>,
    index: RwLock<Option<Arc<VectorIndex>>>,
    rebuild: tokio::sync::Mutex<()>,
}

impl<M> fmt::Debug for KnowledgeBase<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("corpus", &self.corpus.path())
            .field("phase", &*self.phase.read())
            .field("passages", &self.index.read().as_ref().map(|i| i.len()))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<M: EmbeddingModel> KnowledgeBase<M> {
    /// Creates an uninitialized knowledge base. Call [`initialize`](Self::initialize)
    /// before querying.
    ///
    /// # Panics
    ///
    /// Panics if `config.chunk_size` is zero.
    pub fn new(embedder: M, config: KnowledgeBaseConfig) -> Self {
        Self {
            embedder,
            chunker: WordChunker::new(config.chunk_size),
            corpus: Corpus::new(&config.corpus_path),
            config,
            phase: RwLock::new(Phase::Uninitialized),
            index: RwLock::new(None),
            rebuild: tokio::sync::Mutex::new(()),
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        *self.phase.read()
    }

    /// Returns `true` once an index has been published.
    pub fn is_ready(&self) -> bool {
        self.index.read().is_some()
    }

    /// The configuration in use.
    pub const fn config(&self) -> &KnowledgeBaseConfig {
        &self.config
    }

    /// The embedding provider.
    pub const fn embedder(&self) -> &M {
        &self.embedder
    }

    /// The currently published index, if any.
    pub fn snapshot(&self) -> Option<Arc<VectorIndex>> {
        self.index.read().clone()
    }

    /// Loads the persisted snapshot if present, otherwise builds the index from the corpus.
    ///
    /// Calling this on a ready knowledge base is a no-op. Returns the number of
    /// indexed passages.
    ///
    /// # Errors
    /// - [`RagError::CorruptIndex`] if the snapshot exists but is invalid.
    /// - [`RagError::CorpusMissing`] if neither a snapshot nor the corpus exists.
    /// - Any error from building or persisting the index.
    pub async fn initialize(&self) -> Result<usize> {
        let _guard = self.rebuild.lock().await;

        if let Some(index) = self.snapshot() {
            return Ok(index.len());
        }

        let index_dir = &self.config.index_dir;
        if self.config.reset_index && index_dir.exists() {
            info!(path = %index_dir.display(), "discarding persisted index");
            fs::remove_dir_all(index_dir).map_err(|e| RagError::persistence(index_dir, e))?;
        }

        let path = self.config.snapshot_path();
        if path.is_file() {
            self.set_phase(Phase::Loading);
            let loaded = VectorIndex::load(&path).and_then(|index| {
                if index.dimension() == self.embedder.dim() {
                    Ok(index)
                } else {
                    Err(RagError::corrupt(
                        &path,
                        format!(
                            "snapshot dimension {} does not match embedder dimension {}",
                            index.dimension(),
                            self.embedder.dim()
                        ),
                    ))
                }
            });

            return match loaded {
                Ok(index) => {
                    let passages = index.len();
                    info!(passages, path = %path.display(), "loaded index snapshot");
                    self.publish(index);
                    Ok(passages)
                }
                Err(e) => {
                    self.set_phase(Phase::Uninitialized);
                    Err(e)
                }
            };
        }

        self.rebuild_locked().await
    }

    /// Rebuilds the index from the corpus and persists it.
    ///
    /// Returns the number of indexed passages.
    ///
    /// # Errors
    /// Returns an error if the corpus cannot be read or the snapshot cannot be
    /// written. The previously published index stays in place on failure.
    pub async fn index(&self) -> Result<usize> {
        let _guard = self.rebuild.lock().await;
        self.rebuild_locked().await
    }

    /// Appends `text` to the corpus and rebuilds before returning.
    ///
    /// # Errors
    /// Returns an error if the append or the rebuild fails.
    pub async fn append(&self, text: &str) -> Result<usize> {
        let _guard = self.rebuild.lock().await;
        self.corpus.append(text)?;
        debug!(bytes = text.len(), "appended to corpus");
        self.rebuild_locked().await
    }

    /// Returns the text of the best matching passages for `question`.
    ///
    /// Retrieves `top_k` candidates and keeps the first `context_passages` of them,
    /// joined by blank lines.
    ///
    /// # Errors
    /// - [`RagError::NotReady`] before initialization.
    /// - [`RagError::IndexEmpty`] if the corpus produced no passages.
    /// - [`RagError::Embedding`] if the question cannot be embedded.
    pub async fn query(&self, question: &str) -> Result<String> {
        let results = self.retrieve(question, self.config.top_k).await?;
        Ok(results
            .iter()
            .take(self.config.context_passages)
            .map(|r| r.passage.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    /// Returns the `k` passages most similar to `question`, with scores.
    ///
    /// # Errors
    /// Same as [`query`](Self::query).
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<SearchResult>> {
        let index = self.snapshot().ok_or(RagError::NotReady)?;
        let embedding = self
            .embedder
            .embed_query(question)
            .await
            .map_err(RagError::Embedding)?;
        index.search(&embedding, k)
    }

    /// Searches with the mean embedding of several phrasings of the same question.
    ///
    /// Variants that fail to embed are skipped.
    ///
    /// # Errors
    /// Same as [`query`](Self::query), plus [`RagError::Embedding`] if no variant embeds.
    pub async fn query_variants(&self, variants: &[String], k: usize) -> Result<Vec<SearchResult>> {
        let index = self.snapshot().ok_or(RagError::NotReady)?;
        let vectors: Vec<_> = self
            .embedder
            .embed_batch(variants)
            .await
            .into_iter()
            .filter_map(|result| {
                result
                    .inspect_err(|e| warn!(error = %e, "skipping query variant"))
                    .ok()
            })
            .collect();
        let embedding = aggregate(&vectors).map_err(RagError::Embedding)?;
        index.search(&embedding, k)
    }

    async fn rebuild_locked(&self) -> Result<usize> {
        let previous = std::mem::replace(&mut *self.phase.write(), Phase::Building);

        match self.build().await {
            Ok(index) => {
                let passages = index.len();
                self.publish(index);
                info!(passages, "knowledge base rebuilt");
                Ok(passages)
            }
            Err(e) => {
                self.set_phase(previous);
                Err(e)
            }
        }
    }

    async fn build(&self) -> Result<VectorIndex> {
        let document = self.corpus.document()?;
        let passages = self.chunker.chunk(&document)?;
        debug!(
            passages = passages.len(),
            chunker = self.chunker.name(),
            "chunked corpus"
        );

        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await;

        let entries = passages
            .into_iter()
            .zip(embeddings)
            .filter_map(|(passage, embedding)| match embedding {
                Ok(vector) => Some(IndexEntry::new(passage, vector)),
                Err(e) => {
                    warn!(passage = %passage.id, error = %e, "skipping passage that failed to embed");
                    None
                }
            });

        let index = VectorIndex::from_entries(self.embedder.dim(), self.config.metric, entries)?;
        if index.is_empty() {
            warn!(corpus = %self.corpus.path().display(), "corpus produced no indexable passages");
        }
        index.persist(&self.config.snapshot_path())?;
        Ok(index)
    }

    fn publish(&self, index: VectorIndex) {
        *self.index.write() = Some(Arc::new(index));
        self.set_phase(Phase::Ready);
    }

    fn set_phase(&self, phase: Phase) {
        *self.phase.write() = phase;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::sync::{Notify, Semaphore};

    const VOCABULARY: [&str; 11] = [
        "paris", "capital", "france", "rust", "compile", "native", "code", "bananas", "yellow",
        "sweet", "zebras",
    ];

    /// Bag-of-words embedder over a fixed vocabulary.
    struct Vocabulary {
        batches: AtomicUsize,
        armed: AtomicBool,
        entered: Notify,
        gate: Semaphore,
    }

    impl Default for Vocabulary {
        fn default() -> Self {
            Self {
                batches: AtomicUsize::new(0),
                armed: AtomicBool::new(false),
                entered: Notify::new(),
                gate: Semaphore::new(0),
            }
        }
    }

    fn bag_of_words(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; VOCABULARY.len()];
        for word in text.split(|c: char| !c.is_alphanumeric()) {
            let word = word.to_lowercase();
            if let Some(slot) = VOCABULARY.iter().position(|v| *v == word) {
                vector[slot] += 1.0;
            }
        }
        vector
    }

    impl EmbeddingModel for Vocabulary {
        fn dim(&self) -> usize {
            VOCABULARY.len()
        }

        async fn embed(&self, text: &str) -> lookout_core::Result<Vec<f32>> {
            if text.contains('\u{fffd}') {
                anyhow::bail!("cannot encode replacement character");
            }
            Ok(bag_of_words(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Vec<lookout_core::Result<Vec<f32>>> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            if self.armed.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                self.gate.acquire().await.unwrap().forget();
            }
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await);
            }
            out
        }
    }

    const CORPUS: &str = "Paris is the capital of France. \
                          Rust programs compile to native code. \
                          Bananas are yellow and taste sweet.";

    fn config(root: &Path) -> KnowledgeBaseConfig {
        KnowledgeBaseConfig::builder()
            .corpus_path(root.join("knowledge_base.txt"))
            .index_dir(root.join("index_dir"))
            .chunk_size(6)
            .build()
    }

    fn seeded(root: &Path) -> KnowledgeBaseConfig {
        let config = config(root);
        fs::write(&config.corpus_path, format!("{CORPUS}\n")).unwrap();
        config
    }

    #[tokio::test]
    async fn retrieves_the_matching_passage() {
        let dir = tempdir().unwrap();
        let kb = KnowledgeBase::new(Vocabulary::default(), seeded(dir.path()));

        assert_eq!(kb.initialize().await.unwrap(), 3);
        assert_eq!(kb.phase(), Phase::Ready);

        let answer = kb.query("What is the capital of France?").await.unwrap();
        assert_eq!(answer, "Paris is the capital of France.");

        let candidates = kb.retrieve("What is the capital of France?", 3).await.unwrap();
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].passage.ordinal, 0);
    }

    #[tokio::test]
    async fn query_before_initialize_is_not_ready() {
        let dir = tempdir().unwrap();
        let kb = KnowledgeBase::new(Vocabulary::default(), seeded(dir.path()));

        assert_eq!(kb.phase(), Phase::Uninitialized);
        assert!(matches!(
            kb.query("anything").await,
            Err(RagError::NotReady)
        ));
    }

    #[tokio::test]
    async fn missing_corpus_and_snapshot_is_fatal() {
        let dir = tempdir().unwrap();
        let kb = KnowledgeBase::new(Vocabulary::default(), config(dir.path()));

        assert!(matches!(
            kb.initialize().await,
            Err(RagError::CorpusMissing(_))
        ));
        assert_eq!(kb.phase(), Phase::Uninitialized);
    }

    #[tokio::test]
    async fn second_start_loads_snapshot_without_embedding() {
        let dir = tempdir().unwrap();
        let config = seeded(dir.path());

        let first = KnowledgeBase::new(Vocabulary::default(), config.clone());
        first.initialize().await.unwrap();
        assert!(config.snapshot_path().is_file());

        let second = KnowledgeBase::new(Vocabulary::default(), config);
        assert_eq!(second.initialize().await.unwrap(), 3);
        assert_eq!(second.embedder().batches.load(Ordering::SeqCst), 0);
        assert_eq!(
            second.query("bananas").await.unwrap(),
            "Bananas are yellow and taste sweet."
        );
    }

    #[tokio::test]
    async fn reset_index_forces_rebuild() {
        let dir = tempdir().unwrap();
        let config = seeded(dir.path());
        KnowledgeBase::new(Vocabulary::default(), config.clone())
            .initialize()
            .await
            .unwrap();

        let mut reset = config;
        reset.reset_index = true;
        let kb = KnowledgeBase::new(Vocabulary::default(), reset);
        kb.initialize().await.unwrap();

        assert_eq!(kb.embedder().batches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_reported() {
        let dir = tempdir().unwrap();
        let config = seeded(dir.path());
        fs::create_dir_all(&config.index_dir).unwrap();
        fs::write(config.snapshot_path(), "not json").unwrap();

        let kb = KnowledgeBase::new(Vocabulary::default(), config);
        assert!(matches!(
            kb.initialize().await,
            Err(RagError::CorruptIndex { .. })
        ));
        assert!(!kb.is_ready());
    }

    #[tokio::test]
    async fn failed_passages_are_skipped() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        fs::write(
            &config.corpus_path,
            "Paris is the capital of France. bad \u{fffd} text here ok ok",
        )
        .unwrap();

        let kb = KnowledgeBase::new(Vocabulary::default(), config);
        assert_eq!(kb.initialize().await.unwrap(), 1);
        assert_eq!(kb.snapshot().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn append_grows_the_index() {
        let dir = tempdir().unwrap();
        let config = seeded(dir.path());
        let kb = KnowledgeBase::new(Vocabulary::default(), config.clone());
        kb.initialize().await.unwrap();

        assert_eq!(kb.append("Zebras have black and white stripes.").await.unwrap(), 4);

        let corpus = fs::read_to_string(&config.corpus_path).unwrap();
        assert!(corpus.ends_with("Zebras have black and white stripes.\n"));
        assert_eq!(
            kb.query("Tell me about zebras").await.unwrap(),
            "Zebras have black and white stripes."
        );
    }

    #[tokio::test]
    async fn query_variants_average_phrasings() {
        let dir = tempdir().unwrap();
        let kb = KnowledgeBase::new(Vocabulary::default(), seeded(dir.path()));
        kb.initialize().await.unwrap();

        let variants = vec!["capital city".to_string(), "France".to_string()];
        let results = kb.query_variants(&variants, 1).await.unwrap();
        assert_eq!(results[0].passage.ordinal, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn queries_see_old_index_during_rebuild() {
        let dir = tempdir().unwrap();
        let embedder = Arc::new(Vocabulary::default());
        let kb = Arc::new(KnowledgeBase::new(embedder.clone(), seeded(dir.path())));
        kb.initialize().await.unwrap();

        embedder.armed.store(true, Ordering::SeqCst);
        let entered = embedder.entered.notified();
        let append = tokio::spawn({
            let kb = kb.clone();
            async move { kb.append("Zebras live in herds.").await }
        });
        entered.await;

        assert_eq!(kb.phase(), Phase::Building);
        for _ in 0..20 {
            let index = kb.snapshot().unwrap();
            assert_eq!(index.len(), 3);
            assert!(index.entries().iter().all(|e| e.embedding.len() == index.dimension()));
            assert_eq!(
                kb.query("capital of France").await.unwrap(),
                "Paris is the capital of France."
            );
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        embedder.gate.add_permits(1);
        assert_eq!(append.await.unwrap().unwrap(), 4);
        assert_eq!(kb.phase(), Phase::Ready);
        assert_eq!(kb.query("zebras").await.unwrap(), "Zebras live in herds.");
    }
}
