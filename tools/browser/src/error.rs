use thiserror::Error;

/// Errors raised by a browser collaborator.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The browser process could not be started or a page could not be opened.
    #[error("failed to launch browser: {0}")]
    Launch(String),

    /// The page could not be loaded.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// A script could not be evaluated in the page.
    #[error("script evaluation failed: {0}")]
    Script(String),

    /// The page could not be captured.
    #[error("screenshot failed: {0}")]
    Screenshot(String),
}
