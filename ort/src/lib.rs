//! Local ONNX Runtime embedding models for lookout.
//!
//! This crate provides [`OrtEmbedding`], an implementation of [`lookout_core::EmbeddingModel`]
//! that runs ONNX sentence-embedding models locally using ONNX Runtime.
//!
//! # Features
//!
//! - **Fixed-length inputs**: every text is truncated or padded to `max_length` tokens, so
//!   a batch always runs as one `[batch, max_length]` tensor
//! - **Isolated failures**: a text that fails to tokenize yields an error in its own slot
//!   without affecting the rest of the batch
//! - **Auto-detect dimension**: embedding dimension is read from the model outputs
//! - **Pooling strategies**: `Mean` (default), `Cls`, `LastToken`
//!
//! # Example
//!
//! ```rust,no_run
//! use lookout_ort::OrtEmbedding;
//! use lookout_core::EmbeddingModel;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let embedder = OrtEmbedding::builder()
//!     .model_name("WhereIsAI/UAE-Large-V1")
//!     .directory("./models/UAE-Large-V1")?
//!     .max_length(512)
//!     .build()?;
//! println!("Embedding dimension: {}", embedder.dim());
//!
//! let embedding = embedder.embed("Hello, world!").await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod pooling;

pub use error::OrtError;
pub use pooling::PoolingStrategy;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use lookout_core::EmbeddingModel;
use ndarray::{Axis, Ix3};
use ort::session::{Session, SessionInputValue, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use tokenizers::{Encoding, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

/// Default token window, matching BERT-family encoders.
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// Default number of texts per inference call.
pub const DEFAULT_BATCH_SIZE: usize = 16;

/// An embedding model backed by ONNX Runtime.
///
/// # Example
///
/// ```rust,no_run
/// use lookout_ort::OrtEmbedding;
///
/// // Simple: load from directory
/// let embedder = OrtEmbedding::from_directory("./model")?;
///
/// // Custom: use builder
/// let embedder = OrtEmbedding::builder()
///     .model_path("./model/model.onnx")
///     .tokenizer_path("./model/tokenizer.json")
///     .max_length(256)
///     .build()?;
/// # Ok::<(), lookout_ort::OrtError>(())
/// ```
pub struct OrtEmbedding {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model_name: String,
    dimension: usize,
    max_length: usize,
    batch_size: usize,
    token_type_ids: bool,
    pooling: PoolingStrategy,
    normalize: bool,
}

impl std::fmt::Debug for OrtEmbedding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrtEmbedding")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("max_length", &self.max_length)
            .field("pooling", &self.pooling)
            .field("normalize", &self.normalize)
            .finish_non_exhaustive()
    }
}

impl OrtEmbedding {
    /// Load an embedding model from a directory.
    ///
    /// Locates `model.onnx` (or a file in the `onnx/` subdirectory) and `tokenizer.json`
    /// and uses default settings for everything else.
    ///
    /// # Errors
    /// Returns an error if the model or tokenizer cannot be found or loaded.
    pub fn from_directory(path: impl AsRef<Path>) -> Result<Self, OrtError> {
        Self::builder().directory(path)?.build()
    }

    /// Create a builder for custom configuration.
    #[must_use]
    pub fn builder() -> OrtEmbeddingBuilder {
        OrtEmbeddingBuilder::default()
    }

    /// Returns the model identifier this instance was built with.
    #[must_use]
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Returns the embedding dimension.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the fixed token length every input is truncated or padded to.
    #[must_use]
    pub const fn max_length(&self) -> usize {
        self.max_length
    }

    /// Returns the pooling strategy.
    #[must_use]
    pub const fn pooling(&self) -> PoolingStrategy {
        self.pooling
    }

    /// Returns whether L2 normalization is enabled.
    #[must_use]
    pub const fn normalize(&self) -> bool {
        self.normalize
    }

    /// Embeds `texts`, one result per input in input order.
    fn embed_many(&self, texts: &[&str]) -> Vec<Result<Vec<f32>, OrtError>> {
        let mut results: Vec<Option<Result<Vec<f32>, OrtError>>> =
            std::iter::repeat_with(|| None).take(texts.len()).collect();

        let mut encoded = Vec::with_capacity(texts.len());
        for (slot, text) in texts.iter().enumerate() {
            match self.tokenizer.encode(*text, true) {
                Ok(encoding) => encoded.push((slot, encoding)),
                Err(e) => results[slot] = Some(Err(OrtError::Tokenization(e.to_string()))),
            }
        }

        for group in encoded.chunks(self.batch_size) {
            let encodings: Vec<&Encoding> = group.iter().map(|(_, e)| e).collect();
            match self.run(&encodings) {
                Ok(vectors) => {
                    for ((slot, _), vector) in group.iter().zip(vectors) {
                        results[*slot] = Some(Ok(vector));
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    for (slot, _) in group {
                        results[*slot] = Some(Err(OrtError::Shape(message.clone())));
                    }
                }
            }
        }

        results
            .into_iter()
            .map(|r| r.unwrap_or_else(|| Err(OrtError::InvalidOutputShape(0))))
            .collect()
    }

    /// Runs one inference over pre-tokenized inputs of equal length.
    fn run(&self, encodings: &[&Encoding]) -> Result<Vec<Vec<f32>>, OrtError> {
        let batch = encodings.len();
        let seq_len = encodings.first().map_or(0, |e| e.get_ids().len());
        if encodings.iter().any(|e| e.get_ids().len() != seq_len) {
            return Err(OrtError::Shape(
                "encodings in one batch have different lengths".into(),
            ));
        }

        let flatten = |field: fn(&Encoding) -> &[u32]| -> Box<[i64]> {
            encodings
                .iter()
                .flat_map(|e| field(e).iter().map(|&v| i64::from(v)))
                .collect()
        };

        let mut inputs: Vec<(std::borrow::Cow<'_, str>, SessionInputValue<'_>)> = vec![
            (
                "input_ids".into(),
                Tensor::from_array(([batch, seq_len], flatten(Encoding::get_ids)))?.into(),
            ),
            (
                "attention_mask".into(),
                Tensor::from_array(([batch, seq_len], flatten(Encoding::get_attention_mask)))?
                    .into(),
            ),
        ];
        if self.token_type_ids {
            inputs.push((
                "token_type_ids".into(),
                Tensor::from_array(([batch, seq_len], flatten(Encoding::get_type_ids)))?.into(),
            ));
        }

        // Copy out before releasing the session lock
        let hidden_states = {
            let mut session = self.session.lock().map_err(|_| OrtError::SessionPoisoned)?;
            let outputs = session.run(inputs)?;

            let hidden_states = outputs
                .get("last_hidden_state")
                .or_else(|| outputs.get("hidden_states"))
                .or_else(|| outputs.get("output"))
                .ok_or(OrtError::InvalidOutputShape(0))?;

            hidden_states.try_extract_array::<f32>()?.to_owned()
        };

        let rank = hidden_states.ndim();
        if rank != 3 {
            return Err(OrtError::InvalidOutputShape(rank));
        }
        let hidden_states = hidden_states
            .into_dimensionality::<Ix3>()
            .map_err(|e| OrtError::Shape(e.to_string()))?;

        Ok(hidden_states
            .axis_iter(Axis(0))
            .zip(encodings)
            .map(|(row, encoding)| {
                let mut embedding = self.pooling.apply(&row, encoding.get_attention_mask());
                if self.normalize {
                    l2_normalize(&mut embedding);
                }
                embedding
            })
            .collect())
    }
}

impl EmbeddingModel for OrtEmbedding {
    fn dim(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> lookout_core::Result<Vec<f32>> {
        let embedding = self
            .embed_many(&[text])
            .pop()
            .ok_or(OrtError::InvalidOutputShape(0))??;
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[String]) -> Vec<lookout_core::Result<Vec<f32>>> {
        let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
        self.embed_many(&texts)
            .into_iter()
            .map(|r| r.map_err(lookout_core::Error::from))
            .collect()
    }
}

/// Builder for [`OrtEmbedding`].
#[derive(Debug)]
pub struct OrtEmbeddingBuilder {
    model_path: Option<PathBuf>,
    tokenizer_path: Option<PathBuf>,
    model_name: Option<String>,
    max_length: usize,
    batch_size: usize,
    pooling: PoolingStrategy,
    normalize: bool,
}

impl Default for OrtEmbeddingBuilder {
    fn default() -> Self {
        Self {
            model_path: None,
            tokenizer_path: None,
            model_name: None,
            max_length: DEFAULT_MAX_LENGTH,
            batch_size: DEFAULT_BATCH_SIZE,
            pooling: PoolingStrategy::default(),
            normalize: true,
        }
    }
}

impl OrtEmbeddingBuilder {
    /// Set the path to the ONNX model file.
    #[must_use]
    pub fn model_path(mut self, path: impl AsRef<Path>) -> Self {
        self.model_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the path to the tokenizer.json file.
    #[must_use]
    pub fn tokenizer_path(mut self, path: impl AsRef<Path>) -> Self {
        self.tokenizer_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Locate the model and tokenizer inside a downloaded model directory.
    ///
    /// # Errors
    /// Returns an error if either file cannot be found.
    pub fn directory(self, path: impl AsRef<Path>) -> Result<Self, OrtError> {
        let dir = path.as_ref();
        let model_path = find_model_file(dir)?;
        let tokenizer_path = find_tokenizer_file(dir)?;
        Ok(self.model_path(model_path).tokenizer_path(tokenizer_path))
    }

    /// Set the model identifier reported by [`OrtEmbedding::model_name`].
    ///
    /// Defaults to the model file's parent directory name.
    #[must_use]
    pub fn model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = Some(name.into());
        self
    }

    /// Set the fixed token length inputs are truncated or padded to.
    ///
    /// Default: 512. Zero is treated as one.
    #[must_use]
    pub const fn max_length(mut self, tokens: usize) -> Self {
        self.max_length = if tokens == 0 { 1 } else { tokens };
        self
    }

    /// Set how many texts are sent through the model per inference call.
    ///
    /// Default: 16. Zero is treated as one.
    #[must_use]
    pub const fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = if size == 0 { 1 } else { size };
        self
    }

    /// Set the pooling strategy.
    ///
    /// Default: [`PoolingStrategy::Mean`]
    #[must_use]
    pub const fn pooling(mut self, strategy: PoolingStrategy) -> Self {
        self.pooling = strategy;
        self
    }

    /// Enable or disable L2 normalization.
    ///
    /// Default: `true`
    #[must_use]
    pub const fn normalize(mut self, enabled: bool) -> Self {
        self.normalize = enabled;
        self
    }

    /// Build the [`OrtEmbedding`] instance.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Model path is not specified
    /// - Model file cannot be loaded
    /// - Tokenizer file cannot be loaded or configured
    /// - Model output dimension cannot be determined
    pub fn build(self) -> Result<OrtEmbedding, OrtError> {
        let model_path = self.model_path.ok_or(OrtError::MissingModelPath)?;

        if !model_path.exists() {
            return Err(OrtError::ModelNotFound(model_path));
        }

        let model_dir = model_path.parent().unwrap_or(&model_path).to_path_buf();
        let tokenizer_path = self
            .tokenizer_path
            .ok_or_else(|| OrtError::TokenizerNotFound(model_dir.clone()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| OrtError::tokenizer(&tokenizer_path, e))?;
        configure_tokenizer(&mut tokenizer, self.max_length)
            .map_err(|e| OrtError::tokenizer(&tokenizer_path, e))?;

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(num_cpus())?
            .commit_from_file(&model_path)?;

        let dimension = detect_embedding_dimension(&session)?;
        let token_type_ids = session
            .inputs()
            .iter()
            .any(|input| input.name() == "token_type_ids");

        let model_name = self.model_name.unwrap_or_else(|| {
            model_dir
                .file_name()
                .map_or_else(String::new, |n| n.to_string_lossy().into_owned())
        });

        Ok(OrtEmbedding {
            session: Mutex::new(session),
            tokenizer,
            model_name,
            dimension,
            max_length: self.max_length,
            batch_size: self.batch_size,
            token_type_ids,
            pooling: self.pooling,
            normalize: self.normalize,
        })
    }
}

/// Truncate and pad every encoding to exactly `max_length` tokens.
///
/// Keeps the tokenizer's own pad token when it defines one.
fn configure_tokenizer(tokenizer: &mut Tokenizer, max_length: usize) -> tokenizers::Result<()> {
    tokenizer.with_truncation(Some(TruncationParams {
        max_length,
        ..TruncationParams::default()
    }))?;

    let padding = tokenizer.get_padding().cloned().unwrap_or_default();
    tokenizer.with_padding(Some(PaddingParams {
        strategy: PaddingStrategy::Fixed(max_length),
        ..padding
    }));
    Ok(())
}

/// L2 normalize a vector in place.
fn l2_normalize(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vec.iter_mut() {
            *v /= norm;
        }
    }
}

/// Find the ONNX model file in a directory.
fn find_model_file(dir: &Path) -> Result<PathBuf, OrtError> {
    let candidates = [
        dir.join("model.onnx"),
        dir.join("onnx/model.onnx"),
        dir.join("onnx/model_fp32.onnx"),
        dir.join("onnx/model_quantized.onnx"),
    ];

    if let Some(found) = candidates.iter().find(|c| c.exists()) {
        return Ok(found.clone());
    }

    [dir.to_path_buf(), dir.join("onnx")]
        .iter()
        .filter_map(|d| std::fs::read_dir(d).ok())
        .flat_map(|entries| entries.flatten().map(|entry| entry.path()))
        .find(|path| path.extension().is_some_and(|ext| ext == "onnx"))
        .ok_or_else(|| OrtError::ModelNotFound(dir.to_path_buf()))
}

/// Find the tokenizer.json file in a directory.
fn find_tokenizer_file(dir: &Path) -> Result<PathBuf, OrtError> {
    [dir.join("tokenizer.json"), dir.join("onnx/tokenizer.json")]
        .into_iter()
        .find(|candidate| candidate.exists())
        .ok_or_else(|| OrtError::TokenizerNotFound(dir.to_path_buf()))
}

/// Detect the embedding dimension from model output metadata.
fn detect_embedding_dimension(session: &Session) -> Result<usize, OrtError> {
    for output in session.outputs() {
        // Expect [batch, seq_len, hidden_dim]; the last axis is the hidden size
        if let ort::value::ValueType::Tensor { shape, .. } = output.dtype() {
            if shape.len() >= 2 {
                if let Some(&dim) = shape.last() {
                    if dim > 0 {
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        return Ok(dim as usize);
                    }
                }
            }
        }
    }

    Err(OrtError::InvalidOutputShape(0))
}

/// Get number of CPU cores for parallelism.
fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZero::get)
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_model_path() {
        let result = OrtEmbeddingBuilder::default().build();
        assert!(matches!(result, Err(OrtError::MissingModelPath)));
    }

    #[test]
    fn builder_validates_model_exists() {
        let result = OrtEmbeddingBuilder::default()
            .model_path("/nonexistent/model.onnx")
            .tokenizer_path("/nonexistent/tokenizer.json")
            .build();
        assert!(matches!(result, Err(OrtError::ModelNotFound(_))));
    }

    #[test]
    fn builder_defaults() {
        let builder = OrtEmbedding::builder();
        assert_eq!(builder.max_length, DEFAULT_MAX_LENGTH);
        assert_eq!(builder.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(builder.pooling, PoolingStrategy::Mean);
        assert!(builder.normalize);
        assert_eq!(OrtEmbedding::builder().max_length(0).max_length, 1);
    }

    #[test]
    fn directory_without_model_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            OrtEmbedding::from_directory(dir.path()),
            Err(OrtError::ModelNotFound(_))
        ));
    }

    #[test]
    fn directory_finds_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("onnx")).unwrap();
        std::fs::write(dir.path().join("onnx/encoder.onnx"), b"").unwrap();
        std::fs::write(dir.path().join("tokenizer.json"), b"{}").unwrap();

        assert_eq!(
            find_model_file(dir.path()).unwrap(),
            dir.path().join("onnx/encoder.onnx")
        );
        assert_eq!(
            find_tokenizer_file(dir.path()).unwrap(),
            dir.path().join("tokenizer.json")
        );
    }

    #[test]
    fn l2_normalize_works() {
        let mut vec = vec![3.0, 4.0];
        l2_normalize(&mut vec);
        assert!((vec[0] - 0.6).abs() < 1e-6);
        assert!((vec[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_zero_vector() {
        let mut vec = vec![0.0, 0.0];
        l2_normalize(&mut vec);
        assert_eq!(vec, vec![0.0, 0.0]);
    }
}
