//! In-memory [`PageDriver`] over canned HTML, for exercising the pipeline
//! without a browser or network.

use super::{BrowserError, PageDriver};
use crate::models::Headline;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// Bytes written in place of a rendered PNG.
pub const FAKE_PNG: &[u8] = b"\x89PNG fake";

#[derive(Debug, Default)]
pub struct StaticPage {
    pages: HashMap<String, String>,
    /// Page URL to the `(frame_url, html)` frames attached to it.
    frames: HashMap<String, Vec<(String, String)>>,
    current: Mutex<Option<String>>,
    clicks: Mutex<Vec<String>>,
    visits: Mutex<Vec<String>>,
}

impl StaticPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` when `url` is navigated to.
    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    /// Attach a frame loaded from `frame_url` and rendering `html` to the
    /// page at `url`.
    pub fn with_frame(mut self, url: &str, frame_url: &str, html: &str) -> Self {
        self.frames
            .entry(url.to_string())
            .or_default()
            .push((frame_url.to_string(), html.to_string()));
        self
    }

    /// Every click so far, as `selector` or `frame_url >> selector`.
    pub fn clicks(&self) -> Vec<String> {
        self.clicks.lock().unwrap().clone()
    }

    /// Every URL navigated to so far, in order.
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }

    fn current_url(&self) -> Result<String, BrowserError> {
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| BrowserError::Protocol("no page loaded".to_string()))
    }

    fn document(&self) -> Result<(String, Html), BrowserError> {
        let url = self.current_url()?;
        let html = self.pages.get(&url).map(String::as_str).unwrap_or_default();
        Ok((url, Html::parse_document(html)))
    }

    fn frame_document(&self, frame_url: &str) -> Result<Html, BrowserError> {
        let url = self.current_url()?;
        self.frames
            .get(&url)
            .and_then(|frames| frames.iter().find(|(f, _)| f == frame_url))
            .map(|(_, html)| Html::parse_document(html))
            .ok_or_else(|| BrowserError::FrameUnavailable(frame_url.to_string()))
    }

    fn matches(&self, selector: &str) -> Result<bool, BrowserError> {
        let selector = parse(selector)?;
        let (_, document) = self.document()?;
        Ok(document.select(&selector).next().is_some())
    }
}

fn parse(selector: &str) -> Result<Selector, BrowserError> {
    Selector::parse(selector).map_err(|e| BrowserError::Evaluation(e.to_string()))
}

impl PageDriver for StaticPage {
    type Element = String;
    type Frame = String;

    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.visits.lock().unwrap().push(url.to_string());
        if !self.pages.contains_key(url) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        *self.current.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        if self.matches(selector)? {
            return Ok(());
        }
        tokio::time::sleep(timeout).await;
        Err(BrowserError::SelectorTimeout {
            selector: selector.to_string(),
            timeout,
        })
    }

    async fn find_frame(&self, url_fragment: &str) -> Result<Option<String>, BrowserError> {
        let url = self.current_url()?;
        Ok(self.frames.get(&url).and_then(|frames| {
            frames
                .iter()
                .find(|(frame_url, _)| frame_url.contains(url_fragment))
                .map(|(frame_url, _)| frame_url.clone())
        }))
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        if !self.matches(selector)? {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }
        self.clicks.lock().unwrap().push(selector.to_string());
        Ok(())
    }

    async fn click_in_frame(&self, frame: &String, selector: &str) -> Result<(), BrowserError> {
        let parsed = parse(selector)?;
        if self.frame_document(frame)?.select(&parsed).next().is_none() {
            return Err(BrowserError::ElementNotFound(selector.to_string()));
        }
        self.clicks.lock().unwrap().push(format!("{frame} >> {selector}"));
        Ok(())
    }

    async fn find_element(&self, selector: &str) -> Result<String, BrowserError> {
        if self.matches(selector)? {
            Ok(selector.to_string())
        } else {
            Err(BrowserError::ElementNotFound(selector.to_string()))
        }
    }

    async fn extract_links(&self, selector: &str) -> Result<Vec<Headline>, BrowserError> {
        let selector = parse(selector)?;
        let (url, document) = self.document()?;
        let base = Url::parse(&url).map_err(|e| BrowserError::Evaluation(e.to_string()))?;

        Ok(document
            .select(&selector)
            .map(|element| Headline {
                href: element
                    .value()
                    .attr("href")
                    .and_then(|href| base.join(href).ok())
                    .map(|u| u.to_string())
                    .unwrap_or_default(),
                text: element.text().collect(),
            })
            .collect())
    }

    async fn screenshot_element(
        &self,
        element: &String,
        path: &Path,
    ) -> Result<(), BrowserError> {
        if !self.matches(element)? {
            return Err(BrowserError::ElementNotFound(element.clone()));
        }
        tokio::fs::write(path, FAKE_PNG)
            .await
            .map_err(|e| BrowserError::Screenshot {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
    }
}
