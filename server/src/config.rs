//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::builder::RangedU64ValueParser;
use lookout_agent::AgentConfig;
use lookout_browser::ChromeConfig;
use lookout_claude::{CLAUDE_3_HAIKU, CLAUDE_OPUS_4_1};
use lookout_rag::KnowledgeBaseConfig;

/// Chat service that answers from the web or from its own knowledge base.
#[derive(Parser, Debug, Clone)]
#[command(name = "lookout", version, about)]
pub struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Address to bind to.
    #[arg(long, env = "LOOKOUT_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Anthropic API key.
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub anthropic_api_key: String,

    /// Embedding model identifier.
    #[arg(long, env = "LOOKOUT_MODEL_NAME", default_value = "WhereIsAI/UAE-Large-V1")]
    pub model_name: String,

    /// Directory holding the ONNX model and `tokenizer.json`.
    /// Defaults to `models/<last segment of the model name>`.
    #[arg(long, env = "LOOKOUT_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// Token window of the embedding model.
    #[arg(long, env = "LOOKOUT_MAX_LENGTH", default_value_t = 512)]
    pub max_length: usize,

    /// Words per passage.
    #[arg(
        long,
        env = "LOOKOUT_CHUNK_SIZE",
        default_value_t = 75,
        value_parser = RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub chunk_size: usize,

    /// Passages retrieved per question.
    #[arg(long, env = "LOOKOUT_TOP_K", default_value_t = 3)]
    pub top_k: usize,

    /// Retrieved passages handed to the model.
    #[arg(long, env = "LOOKOUT_CONTEXT_PASSAGES", default_value_t = 1)]
    pub context_passages: usize,

    /// Upper bound on waiting for a page to load, in milliseconds.
    #[arg(long, env = "LOOKOUT_NAVIGATION_TIMEOUT_MS", default_value_t = 10_000)]
    pub navigation_timeout_ms: u64,

    /// Plain-text corpus file.
    #[arg(long, env = "LOOKOUT_CORPUS", default_value = "knowledge_base.txt")]
    pub corpus: PathBuf,

    /// Directory for the index snapshot.
    #[arg(long, env = "LOOKOUT_INDEX_DIR", default_value = "index_dir")]
    pub index_dir: PathBuf,

    /// Discard the persisted index and rebuild it from the corpus.
    #[arg(long, env = "LOOKOUT_RESET_INDEX")]
    pub reset_index: bool,

    /// Model answering from the knowledge base.
    #[arg(long, env = "LOOKOUT_TEXT_MODEL")]
    pub text_model: Option<String>,

    /// Model answering from screenshots.
    #[arg(long, env = "LOOKOUT_VISION_MODEL")]
    pub vision_model: Option<String>,

    /// Screenshot and answer rounds per browse request.
    #[arg(long, env = "LOOKOUT_MAX_BROWSE_STEPS", default_value_t = 1)]
    pub max_browse_steps: usize,

    /// Chrome binary. Auto-detected when unset.
    #[arg(long, env = "LOOKOUT_CHROME")]
    pub chrome: Option<PathBuf>,
}

impl Args {
    /// `host:port` to listen on.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Where the embedding model is loaded from.
    pub fn model_dir(&self) -> PathBuf {
        self.model_dir.clone().unwrap_or_else(|| {
            let name = self.model_name.rsplit('/').next().unwrap_or(&self.model_name);
            PathBuf::from("models").join(name)
        })
    }

    /// Model id for retrieval answers.
    pub fn text_model(&self) -> &str {
        self.text_model.as_deref().unwrap_or(CLAUDE_3_HAIKU)
    }

    /// Model id for browse answers.
    pub fn vision_model(&self) -> &str {
        self.vision_model.as_deref().unwrap_or(CLAUDE_OPUS_4_1)
    }

    /// Knowledge base settings.
    pub fn knowledge_config(&self) -> KnowledgeBaseConfig {
        KnowledgeBaseConfig::builder()
            .corpus_path(&self.corpus)
            .index_dir(&self.index_dir)
            .chunk_size(self.chunk_size)
            .top_k(self.top_k)
            .context_passages(self.context_passages)
            .reset_index(self.reset_index)
            .build()
    }

    /// Agent settings.
    pub fn agent_config(&self) -> AgentConfig {
        AgentConfig::new()
            .with_navigation_timeout(Duration::from_millis(self.navigation_timeout_ms))
            .with_max_browse_steps(self.max_browse_steps)
    }

    /// Browser launch settings.
    pub fn chrome_config(&self) -> ChromeConfig {
        ChromeConfig {
            executable: self.chrome.clone(),
            ..ChromeConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["lookout", "--anthropic-api-key", "test-key"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let args = parse(&[]);
        assert_eq!(args.chunk_size, 75);
        assert_eq!(args.model_dir(), PathBuf::from("models/UAE-Large-V1"));
        assert_eq!(args.text_model(), CLAUDE_3_HAIKU);
        assert_eq!(args.vision_model(), CLAUDE_OPUS_4_1);

        let knowledge = args.knowledge_config();
        assert_eq!(knowledge.corpus_path, PathBuf::from("knowledge_base.txt"));
        assert_eq!(knowledge.top_k, 3);
        assert!(!knowledge.reset_index);

        let agent = args.agent_config();
        assert_eq!(agent.navigation_timeout, Duration::from_secs(10));
        assert_eq!(agent.max_browse_steps, 1);
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse(&[
            "--port",
            "8080",
            "--chunk-size",
            "4",
            "--navigation-timeout-ms",
            "2500",
            "--reset-index",
            "--model-dir",
            "/opt/models/uae",
        ]);
        assert_eq!(args.bind_address(), "0.0.0.0:8080");
        assert_eq!(args.knowledge_config().chunk_size, 4);
        assert!(args.knowledge_config().reset_index);
        assert_eq!(
            args.agent_config().navigation_timeout,
            Duration::from_millis(2500)
        );
        assert_eq!(args.model_dir(), PathBuf::from("/opt/models/uae"));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let argv = ["lookout", "--anthropic-api-key", "test-key", "--chunk-size", "0"];
        let err = Args::try_parse_from(argv).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
