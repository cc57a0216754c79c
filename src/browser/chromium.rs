//! Chromium-backed [`PageDriver`] using chromiumoxide.

use super::{BrowserError, BrowserSettings, PageDriver};
use crate::models::Headline;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::{
    CaptureScreenshotFormat, CreateIsolatedWorldParams, FrameId, FrameTree, GetFrameTreeParams,
};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

/// How often a selector wait re-queries the DOM.
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Isolated world used for clicks inside embedded frames.
const FRAME_WORLD_NAME: &str = "headline_capture";

impl From<CdpError> for BrowserError {
    fn from(e: CdpError) -> Self {
        BrowserError::Protocol(e.to_string())
    }
}

/// A launched Chromium with its CDP handler task and the run's single page.
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: ChromiumPage,
}

impl ChromiumSession {
    /// Launch Chromium and open the page every source will be captured on.
    #[instrument(level = "info", skip_all, fields(headless = settings.headless))]
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, BrowserError> {
        let (width, height) = settings.viewport;
        let mut builder = BrowserConfig::builder()
            .window_size(width, height)
            .viewport(Viewport {
                width,
                height,
                device_scale_factor: Some(settings.device_scale_factor),
                emulating_mobile: false,
                is_landscape: false,
                has_touch: false,
            });
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        for flag in &settings.chrome_flags {
            builder = builder.arg(flag);
        }
        let config = builder.build().map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler event error");
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        info!(width, height, "Browser launched");

        Ok(Self {
            browser,
            handler,
            page: ChromiumPage { page },
        })
    }

    pub fn page(&self) -> &ChromiumPage {
        &self.page
    }

    /// Close the browser and wait for the handler task to drain.
    #[instrument(level = "info", skip_all)]
    pub async fn close(mut self) -> Result<(), BrowserError> {
        self.browser.close().await?;
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Browser process did not exit cleanly");
        }
        if let Err(e) = self.handler.await {
            warn!(error = %e, "CDP handler task ended abnormally");
        }
        info!("Browser closed");
        Ok(())
    }
}

/// The shared Chromium page.
pub struct ChromiumPage {
    page: Page,
}

fn frame_with_url(tree: &FrameTree, url_fragment: &str) -> Option<FrameId> {
    if tree.frame.url.contains(url_fragment) {
        return Some(tree.frame.id.clone());
    }
    tree.child_frames
        .iter()
        .flatten()
        .find_map(|child| frame_with_url(child, url_fragment))
}

/// Quote `value` as a JavaScript string literal.
fn js_string(value: &str) -> Result<String, BrowserError> {
    serde_json::to_string(value).map_err(|e| BrowserError::Evaluation(e.to_string()))
}

/// `document.querySelector(selector).click()`, yielding whether an element matched.
fn click_script(selector: &str) -> Result<String, BrowserError> {
    let selector = js_string(selector)?;
    Ok(format!(
        "(() => {{ const el = document.querySelector({selector}); \
         if (!el) return false; el.click(); return true; }})()"
    ))
}

fn extract_links_script(selector: &str) -> Result<String, BrowserError> {
    let selector = js_string(selector)?;
    Ok(format!(
        "(() => Array.from(document.querySelectorAll({selector})).map(link => \
         ({{ href: link.href ?? \"\", text: link.textContent ?? \"\" }})))()"
    ))
}

impl PageDriver for ChromiumPage {
    type Element = Element;
    type Frame = FrameId;

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.page.goto(url).await.map_err(|e| BrowserError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        wait: Duration,
    ) -> Result<(), BrowserError> {
        let poll = async {
            loop {
                if self.page.find_element(selector).await.is_ok() {
                    return;
                }
                sleep(SELECTOR_POLL_INTERVAL).await;
            }
        };
        timeout(wait, poll).await.map_err(|_| BrowserError::SelectorTimeout {
            selector: selector.to_string(),
            timeout: wait,
        })
    }

    async fn find_frame(&self, url_fragment: &str) -> Result<Option<FrameId>, BrowserError> {
        let tree = self.page.execute(GetFrameTreeParams::default()).await?;
        Ok(frame_with_url(&tree.result.frame_tree, url_fragment))
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        let element = self.find_element(selector).await?;
        element.click().await?;
        Ok(())
    }

    async fn click_in_frame(
        &self,
        frame: &FrameId,
        selector: &str,
    ) -> Result<(), BrowserError> {
        let mut world = CreateIsolatedWorldParams::new(frame.clone());
        world.world_name = Some(FRAME_WORLD_NAME.to_string());
        let context = self
            .page
            .execute(world)
            .await
            .map_err(|e| BrowserError::FrameUnavailable(e.to_string()))?
            .result
            .execution_context_id;

        let params = EvaluateParams::builder()
            .expression(click_script(selector)?)
            .context_id(context)
            .return_by_value(true)
            .build()
            .map_err(BrowserError::Evaluation)?;
        let evaluation = self.page.execute(params).await?.result;
        if let Some(exception) = evaluation.exception_details {
            return Err(BrowserError::Evaluation(exception.text));
        }

        match evaluation.result.value.and_then(|v| v.as_bool()) {
            Some(true) => Ok(()),
            _ => Err(BrowserError::ElementNotFound(selector.to_string())),
        }
    }

    async fn find_element(&self, selector: &str) -> Result<Element, BrowserError> {
        self.page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))
    }

    async fn extract_links(&self, selector: &str) -> Result<Vec<Headline>, BrowserError> {
        self.page
            .evaluate(extract_links_script(selector)?)
            .await?
            .into_value()
            .map_err(|e| BrowserError::Evaluation(e.to_string()))
    }

    async fn screenshot_element(
        &self,
        element: &Element,
        path: &Path,
    ) -> Result<(), BrowserError> {
        element
            .save_screenshot(CaptureScreenshotFormat::Png, path)
            .await
            .map_err(|e| BrowserError::Screenshot {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(())
    }
}
