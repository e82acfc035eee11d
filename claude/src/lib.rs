//! lookout-claude
//!
//! Anthropic Claude client for lookout.
//!
//! [`Claude`] implements [`lookout_core::LanguageModel`] over the non-streaming Messages API.
//! The same client answers plain text prompts and vision prompts: image attachments on a user
//! message (typically a `data:image/jpeg;base64,...` screenshot) are sent as image blocks.
//!
//! ## Getting Started
//!
//! ```ignore
//! use lookout_claude::Claude;
//! use lookout_core::{LanguageModel, llm::oneshot};
//!
//! let client = Claude::new(std::env::var("ANTHROPIC_API_KEY")?);
//!
//! let response = client.respond(oneshot(
//!     "You are a helpful assistant.",
//!     "Explain Rust ownership in one paragraph."
//! )).await?;
//! ```
//!
//! ## Custom Configuration
//!
//! ```no_run
//! use lookout_claude::{Claude, CLAUDE_HAIKU_4_5};
//!
//! let client = Claude::builder("your-api-key")
//!     .model(CLAUDE_HAIKU_4_5)
//!     .max_tokens(2048)
//!     .build();
//! ```

mod client;
mod constant;
mod error;
mod request;
mod response;

pub use client::{Builder, Claude};
pub use constant::*;
pub use error::ClaudeError;
