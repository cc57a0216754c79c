//! Browser automation capabilities consumed by the capture pipeline.
//!
//! The pipeline only ever talks to a [`PageDriver`]: one live page that can be
//! navigated, queried, clicked and screenshotted. The production driver is
//! [`chromium::ChromiumPage`], backed by a headless Chromium through
//! chromiumoxide; tests use an in-memory page over canned HTML.
//!
//! # Example
//!
//! ```ignore
//! let session = ChromiumSession::launch(&BrowserSettings::default()).await?;
//! let page = session.page();
//!
//! page.goto("https://edition.cnn.com").await?;
//! page.wait_for_selector(".zn--idx-1", Duration::from_secs(10)).await?;
//! let headlines = page.extract_links(".zn--idx-1 .cd__headline a").await?;
//!
//! session.close().await?;
//! ```

pub mod chromium;
pub mod config;
#[cfg(test)]
pub mod testing;

pub use chromium::ChromiumSession;
pub use config::BrowserSettings;

use crate::models::Headline;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a [`PageDriver`].
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("selector `{selector}` did not appear within {timeout:?}")]
    SelectorTimeout {
        selector: String,
        timeout: Duration,
    },
    #[error("no element matches `{0}`")]
    ElementNotFound(String),
    #[error("frame is not available: {0}")]
    FrameUnavailable(String),
    #[error("script evaluation failed: {0}")]
    Evaluation(String),
    #[error("failed to write screenshot {path}: {reason}")]
    Screenshot { path: String, reason: String },
    #[error("browser protocol error: {0}")]
    Protocol(String),
}

/// One live browser page, shared by every source in a run.
///
/// Implementations may be navigated repeatedly; a capture never closes or
/// replaces the page.
#[allow(async_fn_in_trait)]
pub trait PageDriver {
    /// A resolved element that can be screenshotted later.
    type Element;
    /// An embedded frame attached to the page.
    type Frame;

    /// Load `url`, replacing the page's current content.
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    /// Wait until `selector` matches in the main document, or fail with
    /// [`BrowserError::SelectorTimeout`] after `timeout`.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
    -> Result<(), BrowserError>;

    /// Find a currently attached frame whose URL contains `url_fragment`.
    async fn find_frame(&self, url_fragment: &str) -> Result<Option<Self::Frame>, BrowserError>;

    /// Click the first element matching `selector` in the main document.
    async fn click(&self, selector: &str) -> Result<(), BrowserError>;

    /// Click the first element matching `selector` inside `frame`.
    async fn click_in_frame(&self, frame: &Self::Frame, selector: &str)
    -> Result<(), BrowserError>;

    /// Resolve the first element matching `selector`.
    async fn find_element(&self, selector: &str) -> Result<Self::Element, BrowserError>;

    /// Read the absolute link target and text content of every element
    /// matching `selector`, in document order.
    async fn extract_links(&self, selector: &str) -> Result<Vec<Headline>, BrowserError>;

    /// Render `element` to a PNG at `path`.
    async fn screenshot_element(
        &self,
        element: &Self::Element,
        path: &Path,
    ) -> Result<(), BrowserError>;
}
