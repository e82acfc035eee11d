//! Request building and message conversion for the Claude API.

use base64::Engine;
use lookout_core::llm::{Message, Role};
use serde::Serialize;

/// Claude Messages API request body.
#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    /// Model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Conversation messages.
    pub messages: Vec<MessagePayload>,
    /// System prompt (extracted from messages).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Individual message in Claude format.
#[derive(Debug, Clone, Serialize)]
pub struct MessagePayload {
    /// Role: "user" or "assistant".
    pub role: &'static str,
    /// Message content.
    pub content: ContentPayload,
}

/// Message content - either a simple string or array of content blocks.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ContentPayload {
    /// Simple text content.
    Text(String),
    /// Array of content blocks (for multimodal messages).
    Blocks(Vec<ContentBlock>),
}

/// Content block types for multimodal messages.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content block.
    Text {
        /// The text content.
        text: String,
    },
    /// Image content block.
    Image {
        /// Image source (base64 or URL).
        source: ImageSource,
    },
}

/// Image source for vision requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    /// Base64-encoded image data.
    Base64 {
        /// MIME type (image/jpeg, image/png, image/gif, image/webp).
        media_type: String,
        /// Base64-encoded image data.
        data: String,
    },
    /// URL-referenced image.
    Url {
        /// Full URL to the image.
        url: String,
    },
}

/// Convert lookout messages to Claude format, extracting system messages.
///
/// Returns (`system_prompt`, messages) where system messages are concatenated
/// into a single system prompt.
pub fn to_claude_messages(messages: &[Message]) -> (Option<String>, Vec<MessagePayload>) {
    let mut system_parts: Vec<&str> = Vec::new();
    let mut claude_messages: Vec<MessagePayload> = Vec::new();

    for message in messages {
        match message.role() {
            Role::System => system_parts.push(message.content()),
            Role::User => claude_messages.push(MessagePayload {
                role: "user",
                content: build_user_content(message),
            }),
            Role::Assistant => claude_messages.push(MessagePayload {
                role: "assistant",
                content: ContentPayload::Text(message.content().to_owned()),
            }),
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };

    (system, claude_messages)
}

/// Build content for a user message. Images go before the text, as Claude recommends.
fn build_user_content(message: &Message) -> ContentPayload {
    let mut blocks: Vec<ContentBlock> = message
        .attachments()
        .iter()
        .filter_map(|attachment| parse_image_source(attachment.as_str()))
        .map(|source| ContentBlock::Image { source })
        .collect();

    if blocks.is_empty() {
        return ContentPayload::Text(message.content().to_owned());
    }

    if !message.content().is_empty() {
        blocks.push(ContentBlock::Text {
            text: message.content().to_owned(),
        });
    }

    ContentPayload::Blocks(blocks)
}

/// Parse a URL string into an image source.
///
/// Handles:
/// - `data:image/...;base64,...` - already base64 encoded
/// - `file:///path/to/image.png` - read and encoded
/// - `http://` or `https://` image URLs - passed through as URL source
pub fn parse_image_source(url: &str) -> Option<ImageSource> {
    if url.starts_with("data:image/") {
        let after_data = url.strip_prefix("data:")?;
        let (header, data) = after_data.split_once(',')?;
        let media_type = header.strip_suffix(";base64")?;
        Some(ImageSource::Base64 {
            media_type: media_type.to_string(),
            data: data.to_string(),
        })
    } else if url.starts_with("file://") {
        read_file_to_base64_source(url)
    } else if is_image_url(url) {
        Some(ImageSource::Url {
            url: url.to_string(),
        })
    } else {
        None
    }
}

fn read_file_to_base64_source(file_url: &str) -> Option<ImageSource> {
    let path = url::Url::parse(file_url).ok()?.to_file_path().ok()?;
    let media_type = mime_from_path(&path)?;
    let data = std::fs::read(&path).ok()?;

    Some(ImageSource::Base64 {
        media_type: media_type.to_string(),
        data: base64::engine::general_purpose::STANDARD.encode(data),
    })
}

fn mime_from_path(path: &std::path::Path) -> Option<&'static str> {
    match path
        .extension()
        .and_then(|e| e.to_str())?
        .to_lowercase()
        .as_str()
    {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn is_image_url(url: &str) -> bool {
    let lower = url.to_lowercase();
    (lower.starts_with("http://") || lower.starts_with("https://"))
        && [".jpg", ".jpeg", ".png", ".gif", ".webp"]
            .iter()
            .any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn system_messages_are_hoisted() {
        let (system, messages) = to_claude_messages(&[
            Message::system("Be brief."),
            Message::user("Hi"),
            Message::system("Use English."),
        ]);

        assert_eq!(system.as_deref(), Some("Be brief.\n\nUse English."));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "user");
    }

    #[test]
    fn screenshot_attachment_becomes_image_block() {
        let screenshot = Url::parse("data:image/jpeg;base64,/9j/4AAQ").unwrap();
        let (_, messages) =
            to_claude_messages(&[Message::user("Describe the page").with_attachment(screenshot)]);

        let json = serde_json::to_value(&messages[0]).unwrap();
        assert_eq!(json["content"][0]["type"], "image");
        assert_eq!(json["content"][0]["source"]["type"], "base64");
        assert_eq!(json["content"][0]["source"]["media_type"], "image/jpeg");
        assert_eq!(json["content"][0]["source"]["data"], "/9j/4AAQ");
        assert_eq!(json["content"][1]["type"], "text");
        assert_eq!(json["content"][1]["text"], "Describe the page");
    }

    #[test]
    fn plain_user_message_is_a_string() {
        let (_, messages) = to_claude_messages(&[Message::user("hello")]);
        let json = serde_json::to_value(&messages[0]).unwrap();
        assert_eq!(json["content"], "hello");
    }

    #[test]
    fn image_sources() {
        assert_eq!(
            parse_image_source("https://example.com/cat.PNG"),
            Some(ImageSource::Url {
                url: "https://example.com/cat.PNG".into()
            })
        );
        assert_eq!(parse_image_source("https://example.com/page.html"), None);
        assert_eq!(parse_image_source("data:text/plain;base64,aGk="), None);
    }
}
