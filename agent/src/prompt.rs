//! Prompts sent to the language models.

use askama::Template;
use serde::Deserialize;

/// System prompt for answering from the knowledge base.
pub const RETRIEVE_SYSTEM_PROMPT: &str = "You are an intelligent assistant.";

/// System prompt for the vision model while browsing.
#[derive(Debug, Template)]
#[template(path = "browse_system.txt", escape = "none")]
pub struct BrowseSystemPrompt<'a> {
    /// Page the screenshot was taken from.
    pub url: &'a str,
}

/// User prompt combining retrieved context with the question.
#[derive(Debug, Template)]
#[template(path = "retrieve.txt", escape = "none")]
pub struct RetrievePrompt<'a> {
    /// Text retrieved from the knowledge base.
    pub context: &'a str,
    /// The user's message.
    pub question: &'a str,
}

/// A navigation request found in a vision reply.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowseDirective {
    /// Open another page.
    Url(String),
    /// Click the element labelled with this text.
    Click(String),
}

impl BrowseDirective {
    /// Reads a directive out of a reply. Anything else is a final answer.
    #[must_use]
    pub fn parse(reply: &str) -> Option<Self> {
        lookout_core::llm::parse_json_with_recovery(reply).ok()
    }
}

/// Turns literal `\n` escapes in a model reply into newlines.
#[must_use]
pub fn unescape_newlines(reply: &str) -> String {
    reply.replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieve_prompt_quotes_context_then_question() {
        let prompt = RetrievePrompt {
            context: "The price is $10",
            question: "What is the price?",
        }
        .render()
        .unwrap();
        assert_eq!(
            prompt.trim_end(),
            "The following is information from the knowledge base that might help answer the \
             question: \"The price is $10\". Now, answer the user's question based on this \
             information: \"What is the price?\""
        );
    }

    #[test]
    fn browse_prompt_lists_directives() {
        let prompt = BrowseSystemPrompt {
            url: "https://example.com/",
        }
        .render()
        .unwrap();
        assert!(prompt.starts_with("You are a website crawler."));
        assert!(prompt.contains(r#"{"url": "url goes here"}"#));
        assert!(prompt.contains(r#"{"click": "Text in link"}"#));
        assert!(prompt.contains("https://example.com/"));
    }

    #[test]
    fn directives_parse_from_fenced_replies() {
        assert_eq!(
            BrowseDirective::parse("```json\n{\"click\": \"Pricing\"}\n```"),
            Some(BrowseDirective::Click("Pricing".into()))
        );
        assert_eq!(
            BrowseDirective::parse(r#"{"url": "https://example.com/pricing"}"#),
            Some(BrowseDirective::Url("https://example.com/pricing".into()))
        );
        assert_eq!(BrowseDirective::parse("The price is $10"), None);
    }

    #[test]
    fn literal_newlines_are_unescaped() {
        assert_eq!(unescape_newlines(r"one\ntwo"), "one\ntwo");
    }
}
