//! Agent configuration.

use std::time::Duration;

/// Configuration for agent behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentConfig {
    /// Upper bound on waiting for a page to load.
    pub navigation_timeout: Duration,

    /// Number of screenshot and answer rounds a browse request may take.
    ///
    /// With one step the first vision reply is always the answer. Larger values let the
    /// model follow `{"url": ...}` and `{"click": ...}` directives before answering.
    pub max_browse_steps: usize,

    /// Token limit for vision replies.
    pub vision_max_tokens: u32,

    /// Token limit for retrieval replies.
    pub text_max_tokens: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(10),
            max_browse_steps: 1,
            vision_max_tokens: 1024,
            text_max_tokens: 1024,
        }
    }
}

impl AgentConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the navigation timeout.
    #[must_use]
    pub const fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    /// Sets the number of browse steps. Zero is treated as one.
    #[must_use]
    pub const fn with_max_browse_steps(mut self, steps: usize) -> Self {
        self.max_browse_steps = if steps == 0 { 1 } else { steps };
        self
    }

    /// Sets the token limit for vision replies.
    #[must_use]
    pub const fn with_vision_max_tokens(mut self, max_tokens: u32) -> Self {
        self.vision_max_tokens = max_tokens;
        self
    }

    /// Sets the token limit for retrieval replies.
    #[must_use]
    pub const fn with_text_max_tokens(mut self, max_tokens: u32) -> Self {
        self.text_max_tokens = max_tokens;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_single_step_browsing() {
        let config = AgentConfig::new();
        assert_eq!(config.navigation_timeout, Duration::from_secs(10));
        assert_eq!(config.max_browse_steps, 1);
        assert_eq!(config.vision_max_tokens, 1024);
    }

    #[test]
    fn zero_steps_still_browse_once() {
        assert_eq!(AgentConfig::new().with_max_browse_steps(0).max_browse_steps, 1);
    }
}
