//! Message types for language model conversations.
//!
//! Messages are an enum with one variant per role. Only user messages carry attachments; the
//! browse flow uses them to hand a page screenshot to a vision-capable model.

use alloc::{string::String, vec::Vec};
use url::Url;

/// Conversation participant role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    /// User message - input from human user.
    User,
    /// AI assistant message - responses from the AI.
    Assistant,
    /// System message - context/instructions for the AI.
    System,
}

/// A message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "role", rename_all = "snake_case"))]
pub enum Message {
    /// User message with content and optional attachments.
    User {
        /// Text content of the message.
        content: String,
        /// Attachment URLs. Images are usually inlined as `data:` URLs.
        #[cfg_attr(
            feature = "serde",
            serde(default, skip_serializing_if = "Vec::is_empty")
        )]
        attachments: Vec<Url>,
    },
    /// Assistant message.
    Assistant {
        /// Text content of the message.
        content: String,
    },
    /// System message with instructions/context.
    System {
        /// Text content of the message.
        content: String,
    },
}

impl Message {
    /// Returns the message sender role.
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::User { .. } => Role::User,
            Self::Assistant { .. } => Role::Assistant,
            Self::System { .. } => Role::System,
        }
    }

    /// Returns the text content of the message.
    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            Self::User { content, .. } | Self::Assistant { content } | Self::System { content } => {
                content
            }
        }
    }

    /// Returns the attachment URLs (only for User messages).
    #[must_use]
    pub fn attachments(&self) -> &[Url] {
        match self {
            Self::User { attachments, .. } => attachments,
            _ => &[],
        }
    }

    /// Creates a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
            attachments: Vec::new(),
        }
    }

    /// Creates a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
        }
    }

    /// Creates a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    /// Adds an attachment URL to the message (only works for User messages).
    #[must_use]
    pub fn with_attachment(mut self, url: Url) -> Self {
        if let Self::User { attachments, .. } = &mut self {
            attachments.push(url);
        }
        self
    }
}
