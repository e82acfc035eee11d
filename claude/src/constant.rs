//! Claude API constants and model identifiers.

/// Base URL for the Anthropic Messages API.
pub const CLAUDE_BASE_URL: &str = "https://api.anthropic.com";

/// Required API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

// =============================================================================
// Model Identifiers
// =============================================================================

/// Claude Sonnet 4.5 - Best model for real-world agents and coding.
pub const CLAUDE_SONNET_4_5: &str = "claude-sonnet-4-5";

/// Claude Opus 4.1 - Most capable model.
pub const CLAUDE_OPUS_4_1: &str = "claude-opus-4-1-20250805";

/// Claude Haiku 4.5 - Fast model with vision support.
pub const CLAUDE_HAIKU_4_5: &str = "claude-haiku-4-5";

/// Claude 3 Haiku - Small, fast text model.
pub const CLAUDE_3_HAIKU: &str = "claude-3-haiku-20240307";

// =============================================================================
// Defaults
// =============================================================================

/// Default model for chat completions.
pub const DEFAULT_MODEL: &str = CLAUDE_SONNET_4_5;

/// Default maximum tokens for responses.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
