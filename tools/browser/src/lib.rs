//! Browser sessions for vision-driven browsing.
//!
//! A [`Browser`] hands out short-lived [`BrowserSession`]s. A session can load a page with a
//! bounded wait, outline the interactive elements a vision model may refer to, and capture a
//! JPEG screenshot. Sessions are never shared between requests and must be
//! [released](BrowserSession::release) when done.
//!
//! [`ChromeBrowser`] drives a local headless Chrome through the DevTools protocol.
//!
//! ```rust,ignore
//! use lookout_browser::{Browser, BrowserSession, ChromeBrowser};
//! use std::time::Duration;
//!
//! let browser = ChromeBrowser::default();
//! let session = browser.acquire().await?;
//! let state = session.navigate(&url, Duration::from_secs(10)).await;
//! let shot = state.and(session.screenshot().await);
//! session.release().await?;
//! ```

mod error;

#[cfg(feature = "chrome")]
mod chrome;

#[cfg(feature = "chrome")]
pub use chrome::{ChromeBrowser, ChromeConfig, ChromeSession};
pub use error::BrowserError;

use std::time::Duration;

use base64::Engine;
use url::Url;

/// Outlines visible interactive elements and labels them with their alphanumeric text.
///
/// Evaluates to the number of labelled elements.
pub const ANNOTATE_SCRIPT: &str = include_str!("annotate.js");

/// Attribute holding an element's label after annotation.
pub const LABEL_ATTRIBUTE: &str = "data-lookout-label";

const CLICK_SCRIPT: &str = include_str!("click.js");

/// Outcome of a bounded page load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    /// The page fired its load event before the deadline.
    Loaded,
    /// The deadline passed first. The page is usable but may still be loading.
    TimedOut,
}

/// An encoded page capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    /// Encoded image bytes.
    pub data: Vec<u8>,
    /// MIME type of `data`.
    pub media_type: &'static str,
}

impl Screenshot {
    /// Wraps JPEG bytes.
    #[must_use]
    pub const fn jpeg(data: Vec<u8>) -> Self {
        Self {
            data,
            media_type: "image/jpeg",
        }
    }

    /// Returns the image as base64 with no line breaks.
    #[must_use]
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }

    /// Returns the image as a `data:` URL suitable for a message attachment.
    ///
    /// # Errors
    /// Returns [`BrowserError::Screenshot`] if the URL cannot be built.
    pub fn to_data_url(&self) -> Result<Url, BrowserError> {
        Url::parse(&format!("data:{};base64,{}", self.media_type, self.to_base64()))
            .map_err(|e| BrowserError::Screenshot(e.to_string()))
    }
}

/// Source of browser sessions.
pub trait Browser: Send + Sync {
    /// Session type handed out by this browser.
    type Session: BrowserSession;

    /// Opens a fresh session with a blank page.
    fn acquire(&self) -> impl Future<Output = Result<Self::Session, BrowserError>> + Send;
}

/// A single page owned by one request.
pub trait BrowserSession: Send + Sync {
    /// Loads `url`, waiting for the load event or `timeout`, whichever comes first.
    ///
    /// A slow page is not an error: the call returns [`LoadState::TimedOut`] and the
    /// session stays usable.
    fn navigate(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> impl Future<Output = Result<LoadState, BrowserError>> + Send;

    /// Evaluates a script in the page and returns its JSON value.
    fn evaluate(
        &self,
        script: &str,
    ) -> impl Future<Output = Result<serde_json::Value, BrowserError>> + Send;

    /// Captures the current viewport.
    fn screenshot(&self) -> impl Future<Output = Result<Screenshot, BrowserError>> + Send;

    /// Closes the session and frees its resources.
    fn release(self) -> impl Future<Output = Result<(), BrowserError>> + Send;

    /// Outlines interactive elements and returns how many were labelled.
    fn annotate(&self) -> impl Future<Output = Result<usize, BrowserError>> + Send {
        async move {
            let value = self.evaluate(ANNOTATE_SCRIPT).await?;
            Ok(value
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or_default())
        }
    }

    /// Clicks the annotated element whose label matches `label`.
    ///
    /// Returns `false` when no element matches. `timeout` bounds any wait for the
    /// resulting navigation; the default implementation does not wait.
    fn click(
        &self,
        label: &str,
        _timeout: Duration,
    ) -> impl Future<Output = Result<bool, BrowserError>> + Send {
        let script = click_script(label);
        async move {
            let value = self.evaluate(&script).await?;
            Ok(value.as_bool().unwrap_or(false))
        }
    }
}

/// Builds the script that clicks the element labelled `label`.
#[must_use]
pub fn click_script(label: &str) -> String {
    let literal = serde_json::Value::String(label.to_owned()).to_string();
    format!("{}({literal})", CLICK_SCRIPT.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptRecorder {
        scripts: Mutex<Vec<String>>,
    }

    impl BrowserSession for ScriptRecorder {
        async fn navigate(&self, _url: &Url, _timeout: Duration) -> Result<LoadState, BrowserError> {
            Ok(LoadState::Loaded)
        }

        async fn evaluate(&self, script: &str) -> Result<serde_json::Value, BrowserError> {
            self.scripts.lock().unwrap().push(script.to_owned());
            if script == ANNOTATE_SCRIPT {
                Ok(serde_json::json!(7))
            } else {
                Ok(serde_json::json!(true))
            }
        }

        async fn screenshot(&self) -> Result<Screenshot, BrowserError> {
            Ok(Screenshot::jpeg(vec![0xff, 0xd8, 0xff]))
        }

        async fn release(self) -> Result<(), BrowserError> {
            Ok(())
        }
    }

    #[test]
    fn annotate_script_targets_interactive_elements() {
        assert!(ANNOTATE_SCRIPT.contains("a, button, input, textarea, [role=button], [role=treeitem]"));
        assert!(ANNOTATE_SCRIPT.contains(LABEL_ATTRIBUTE));
        assert!(ANNOTATE_SCRIPT.contains("1px solid red"));
    }

    #[test]
    fn click_script_escapes_label() {
        let script = click_script("Say \"hi\"");
        assert!(script.ends_with(r#"("Say \"hi\"")"#));
    }

    #[test]
    fn screenshot_data_url() {
        let shot = Screenshot::jpeg(vec![0xff, 0xd8, 0xff]);
        assert_eq!(shot.to_base64(), "/9j/");
        assert_eq!(
            shot.to_data_url().unwrap().as_str(),
            "data:image/jpeg;base64,/9j/"
        );
    }

    #[tokio::test]
    async fn default_annotate_and_click_use_evaluate() {
        let session = ScriptRecorder::default();

        assert_eq!(session.annotate().await.unwrap(), 7);
        assert!(session.click("About us", Duration::from_secs(1)).await.unwrap());

        let scripts = session.scripts.lock().unwrap();
        assert_eq!(scripts[0], ANNOTATE_SCRIPT);
        assert!(scripts[1].contains("\"About us\""));
    }
}
