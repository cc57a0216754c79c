//! Data models for monitored sources and the records captured from them.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SourceConfig`]: Static description of one monitored homepage
//! - [`CaptureMetadata`]: Run-wide date, timestamp and session, computed once
//! - [`Headline`]: A raw `{href, text}` pair read from the live page
//! - [`CaptureRecord`]: A headline merged with the run's metadata, one CSV row
//!
//! Records are written as soon as a source is extracted and are never held
//! across sources.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A monitored homepage and the selectors needed to capture its top section.
///
/// `link_selector` is expected to be scoped under the region matched by
/// `section_selector`; nothing enforces it, but extraction and the screenshot
/// only line up when it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// Short unique name, used as the output file key.
    pub id: String,
    /// Homepage to navigate to.
    pub url: String,
    /// The region treated as the top-headline block, waited on and screenshotted.
    pub section_selector: String,
    /// The headline anchors inside the section.
    pub link_selector: String,
    /// Control that dismisses a cookie/privacy consent dialog.
    pub consent_button_selector: Option<String>,
    /// Substring of the URL of the embedded frame that hosts the consent button.
    pub consent_frame_match: Option<String>,
}

impl SourceConfig {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        section_selector: impl Into<String>,
        link_selector: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            section_selector: section_selector.into(),
            link_selector: link_selector.into(),
            consent_button_selector: None,
            consent_frame_match: None,
        }
    }

    pub fn with_consent_button(mut self, selector: impl Into<String>) -> Self {
        self.consent_button_selector = Some(selector.into());
        self
    }

    pub fn with_consent_frame(mut self, url_fragment: impl Into<String>) -> Self {
        self.consent_frame_match = Some(url_fragment.into());
        self
    }
}

/// Coarse time-of-day bucket a run falls into.
///
/// Buckets are evaluated from the latest one down, first match wins:
/// - **Late**: 23
/// - **Evening**: 18 - 22
/// - **Midday**: 12 - 17
/// - **Morning**: 0 - 11
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Session {
    Morning,
    Midday,
    Evening,
    Late,
}

impl Session {
    pub fn as_str(&self) -> &'static str {
        match self {
            Session::Morning => "morning",
            Session::Midday => "midday",
            Session::Evening => "evening",
            Session::Late => "late",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata shared by every record produced during one run.
///
/// Computed once at process start and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureMetadata {
    /// Calendar day in `YYYY-MM-DD` format.
    pub date: String,
    /// Minute-resolution run identifier in `YYYYMMDDHHMM` format.
    ///
    /// Two runs started within the same minute share it, and therefore share
    /// their dated snapshot and screenshot files.
    pub timestamp: String,
    pub session: Session,
}

/// A headline link as read from the live document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Headline {
    /// The resolved, absolute link target.
    pub href: String,
    /// The element's text content, untrimmed.
    pub text: String,
}

/// One row of a cumulative or dated dataset.
///
/// Field order here is the column order on disk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CaptureRecord {
    pub date: String,
    pub timestamp: String,
    pub session: Session,
    pub href: String,
    pub text: String,
}

impl CaptureRecord {
    /// Column names, in the order [`CaptureRecord`] serializes its fields.
    pub const HEADER: [&'static str; 5] = ["date", "timestamp", "session", "href", "text"];

    pub fn new(metadata: &CaptureMetadata, headline: Headline) -> Self {
        Self {
            date: metadata.date.clone(),
            timestamp: metadata.timestamp.clone(),
            session: metadata.session,
            href: headline.href,
            text: headline.text,
        }
    }
}

/// Attach the run metadata to each headline, keeping extraction order.
pub fn merge_metadata(metadata: &CaptureMetadata, headlines: Vec<Headline>) -> Vec<CaptureRecord> {
    headlines
        .into_iter()
        .map(|headline| CaptureRecord::new(metadata, headline))
        .collect()
}
