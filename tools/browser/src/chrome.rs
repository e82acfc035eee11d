//! Headless Chrome via the DevTools protocol.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, EventDomContentEventFired, EventLoadEventFired, NavigateParams,
};
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures_lite::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};
use url::Url;

use crate::{Browser, BrowserError, BrowserSession, LoadState, Screenshot, click_script};

/// Launch settings for [`ChromeBrowser`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChromeConfig {
    /// Viewport width in CSS pixels.
    pub width: u32,
    /// Viewport height in CSS pixels.
    pub height: u32,
    /// Device pixel ratio.
    pub device_scale_factor: f64,
    /// JPEG quality, 0 to 100.
    pub jpeg_quality: i64,
    /// Chrome binary. Auto-detected when `None`.
    pub executable: Option<PathBuf>,
    /// Extra command-line switches.
    pub args: Vec<String>,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 1600,
            device_scale_factor: 1.75,
            jpeg_quality: 100,
            executable: None,
            args: [
                "--disable-blink-features=AutomationControlled",
                "--disable-infobars",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--no-sandbox",
                "--disable-extensions",
                "--disable-popup-blocking",
                "--disable-background-networking",
                "--disable-sync",
                "--no-first-run",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Launches a fresh headless Chrome for every session.
#[derive(Debug, Clone, Default)]
pub struct ChromeBrowser {
    config: ChromeConfig,
}

impl ChromeBrowser {
    /// Creates a browser with the given launch settings.
    #[must_use]
    pub const fn new(config: ChromeConfig) -> Self {
        Self { config }
    }

    /// Launch settings in use.
    #[must_use]
    pub const fn config(&self) -> &ChromeConfig {
        &self.config
    }

    fn browser_config(&self) -> Result<BrowserConfig, BrowserError> {
        let mut builder = BrowserConfig::builder()
            .viewport(Some(Viewport {
                width: self.config.width,
                height: self.config.height,
                device_scale_factor: Some(self.config.device_scale_factor),
                ..Default::default()
            }))
            .window_size(self.config.width, self.config.height)
            .args(self.config.args.iter().map(String::as_str));
        if let Some(executable) = &self.config.executable {
            builder = builder.chrome_executable(executable);
        }
        builder.build().map_err(BrowserError::Launch)
    }
}

impl Browser for ChromeBrowser {
    type Session = ChromeSession;

    async fn acquire(&self) -> Result<ChromeSession, BrowserError> {
        let config = self.browser_config()?;

        let (browser, mut handler) = CdpBrowser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(BrowserError::Launch(format!("failed to open page: {e}")));
            }
        };
        debug!("browser session acquired");

        Ok(ChromeSession {
            browser,
            page,
            handler,
            jpeg_quality: self.config.jpeg_quality,
        })
    }
}

/// One Chrome process with one page.
///
/// Dropping a session without [`release`](BrowserSession::release) still stops the
/// event loop, and the browser process is killed when its handle drops.
#[derive(Debug)]
pub struct ChromeSession {
    browser: CdpBrowser,
    page: Page,
    handler: JoinHandle<()>,
    jpeg_quality: i64,
}

impl ChromeSession {
    /// The underlying page.
    #[must_use]
    pub const fn page(&self) -> &Page {
        &self.page
    }
}

impl BrowserSession for ChromeSession {
    async fn navigate(&self, url: &Url, timeout: Duration) -> Result<LoadState, BrowserError> {
        let deadline = Instant::now() + timeout;
        let navigation = |e: chromiumoxide::error::CdpError| BrowserError::Navigation(e.to_string());

        // Subscribe before navigating so neither event can be missed
        let mut dom_ready = self
            .page
            .event_listener::<EventDomContentEventFired>()
            .await
            .map_err(navigation)?;
        let mut loaded = self
            .page
            .event_listener::<EventLoadEventFired>()
            .await
            .map_err(navigation)?;

        let Ok(response) = timeout_at(
            deadline,
            self.page.execute(NavigateParams::new(url.as_str())),
        )
        .await
        else {
            warn!(%url, "navigation did not commit before the deadline");
            return Ok(LoadState::TimedOut);
        };
        let response = response.map_err(navigation)?;
        if let Some(error) = response.result.error_text.as_deref().filter(|e| !e.is_empty()) {
            return Err(BrowserError::Navigation(format!("{url}: {error}")));
        }

        if timeout_at(deadline, dom_ready.next()).await.is_err() {
            warn!(%url, "DOM not ready before the deadline");
            return Ok(LoadState::TimedOut);
        }
        match self.annotate().await {
            Ok(count) => debug!(count, "annotated elements after DOM ready"),
            Err(e) => warn!(error = %e, "annotation after DOM ready failed"),
        }

        let state = match timeout_at(deadline, loaded.next()).await {
            Ok(_) => LoadState::Loaded,
            Err(_) => LoadState::TimedOut,
        };
        debug!(%url, ?state, "navigation finished");
        Ok(state)
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value, BrowserError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn screenshot(&self) -> Result<Screenshot, BrowserError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Jpeg)
            .quality(self.jpeg_quality)
            .build();
        let data = self
            .page
            .screenshot(params)
            .await
            .map_err(|e| BrowserError::Screenshot(e.to_string()))?;
        Ok(Screenshot::jpeg(data))
    }

    async fn click(&self, label: &str, timeout: Duration) -> Result<bool, BrowserError> {
        let deadline = Instant::now() + timeout;
        let mut loaded = self
            .page
            .event_listener::<EventLoadEventFired>()
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))?;

        let clicked = self
            .evaluate(&click_script(label))
            .await?
            .as_bool()
            .unwrap_or(false);
        if clicked {
            let state = match timeout_at(deadline, loaded.next()).await {
                Ok(_) => LoadState::Loaded,
                Err(_) => LoadState::TimedOut,
            };
            debug!(label, ?state, "clicked element");
        }
        Ok(clicked)
    }

    async fn release(mut self) -> Result<(), BrowserError> {
        let closed = self.browser.close().await.map(|_| ());
        if closed.is_ok() {
            let _ = self.browser.wait().await;
        }
        self.handler.abort();
        debug!("browser session released");
        closed.map_err(|e| BrowserError::Launch(format!("failed to close browser: {e}")))
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}
