//! Agent error types.

use core::fmt;

use lookout_browser::BrowserError;
use lookout_rag::RagError;

/// Errors that can occur while answering a message.
#[derive(Debug)]
pub enum AgentError {
    /// The browser could not be started, could not load the page, or a click failed.
    Navigation(String),

    /// The page could not be captured.
    Screenshot(String),

    /// A language model call failed or its prompt could not be rendered.
    Model(String),

    /// The knowledge base could not serve or absorb the request.
    KnowledgeBase(RagError),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigation(e) => write!(f, "navigation failed: {e}"),
            Self::Screenshot(e) => write!(f, "screenshot failed: {e}"),
            Self::Model(e) => write!(f, "model error: {e}"),
            Self::KnowledgeBase(e) => write!(f, "knowledge base error: {e}"),
        }
    }
}

impl std::error::Error for AgentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::KnowledgeBase(e) => Some(e),
            _ => None,
        }
    }
}

impl AgentError {
    /// Returns `true` if the knowledge base has not finished initializing.
    #[must_use]
    pub const fn is_not_ready(&self) -> bool {
        matches!(self, Self::KnowledgeBase(RagError::NotReady))
    }
}

impl From<RagError> for AgentError {
    fn from(err: RagError) -> Self {
        Self::KnowledgeBase(err)
    }
}

impl From<BrowserError> for AgentError {
    fn from(err: BrowserError) -> Self {
        match err {
            BrowserError::Screenshot(e) => Self::Screenshot(e),
            other => Self::Navigation(other.to_string()),
        }
    }
}

impl From<askama::Error> for AgentError {
    fn from(err: askama::Error) -> Self {
        Self::Model(format!("failed to render prompt: {err}"))
    }
}

/// Result alias for agent operations.
pub type Result<T, E = AgentError> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_errors_split_by_stage() {
        let shot: AgentError = BrowserError::Screenshot("blank".into()).into();
        assert!(matches!(shot, AgentError::Screenshot(ref e) if e == "blank"));

        let nav: AgentError = BrowserError::Launch("no chrome".into()).into();
        assert!(matches!(nav, AgentError::Navigation(ref e) if e.contains("no chrome")));
    }

    #[test]
    fn not_ready_is_detected() {
        assert!(AgentError::from(RagError::NotReady).is_not_ready());
        assert!(!AgentError::Model("boom".into()).is_not_ready());
    }
}
