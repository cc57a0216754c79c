//! The monitored homepages.
//!
//! | Source | Section | Consent |
//! |--------|---------|---------|
//! | `cnn-intl` | first zone of edition.cnn.com | OneTrust banner |
//! | `cnn-us` | first zone of us.cnn.com | OneTrust banner |
//! | `nyt` | Spotlight block | GDPR button |
//! | `guardian-uk` | `#headlines` | Sourcepoint frame |
//!
//! Sources run in list order. The list is passed to the orchestrator as a
//! slice so any other sequence can be substituted.

use crate::models::SourceConfig;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;
use thiserror::Error;
use url::Url;

/// Source ids become file names, so keep them to a safe alphabet.
static SOURCE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9_-]*$").expect("source id pattern compiles"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("source id `{0}` must match [a-z0-9][a-z0-9_-]*")]
    InvalidId(String),
    #[error("source `{id}` has an invalid url `{url}`: {reason}")]
    InvalidUrl {
        id: String,
        url: String,
        reason: String,
    },
    #[error("source `{id}` has an invalid {field} selector `{selector}`")]
    InvalidSelector {
        id: String,
        field: &'static str,
        selector: String,
    },
    #[error("source id `{0}` is configured more than once")]
    DuplicateId(String),
    #[error("unknown source id `{0}`")]
    UnknownId(String),
}

/// The homepages captured on every run, in capture order.
pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::new(
            "cnn-intl",
            "https://edition.cnn.com",
            ".zn--idx-1",
            ".zn--idx-1 .cd__headline a",
        )
        .with_consent_button("#onetrust-accept-btn-handler"),
        SourceConfig::new(
            "cnn-us",
            "https://us.cnn.com",
            ".zn--idx-1",
            ".zn--idx-1 .cd__headline a",
        )
        .with_consent_button("#onetrust-accept-btn-handler"),
        SourceConfig::new(
            "nyt",
            "https://www.nytimes.com",
            "section[data-block-tracking-id='Spotlight']",
            concat!(
                "section[data-block-tracking-id='Spotlight'] ",
                ".story-wrapper > a[data-story]:first-of-type",
            ),
        )
        .with_consent_button("button[data-testid='GDPR-accept']"),
        SourceConfig::new(
            "guardian-uk",
            "https://www.theguardian.com/uk",
            "#headlines",
            "#headlines .fc-item__link",
        )
        .with_consent_button(".message-button")
        .with_consent_frame("https://sourcepoint.theguardian.com/index.html?message_id=414203"),
    ]
}

/// Keep only the sources named in `only`, preserving the order of `sources`.
///
/// An empty `only` keeps everything.
pub fn select_sources(
    sources: Vec<SourceConfig>,
    only: &[String],
) -> Result<Vec<SourceConfig>, SourceError> {
    if only.is_empty() {
        return Ok(sources);
    }
    if let Some(unknown) = only.iter().find(|id| !sources.iter().any(|s| &s.id == *id)) {
        return Err(SourceError::UnknownId(unknown.clone()));
    }
    Ok(sources.into_iter().filter(|s| only.contains(&s.id)).collect())
}

fn check_selector(id: &str, field: &'static str, selector: &str) -> Result<(), SourceError> {
    Selector::parse(selector).map(|_| ()).map_err(|_| SourceError::InvalidSelector {
        id: id.to_string(),
        field,
        selector: selector.to_string(),
    })
}

/// Check one source: safe id, absolute http(s) URL, parsable selectors.
pub fn validate_source(source: &SourceConfig) -> Result<(), SourceError> {
    if !SOURCE_ID.is_match(&source.id) {
        return Err(SourceError::InvalidId(source.id.clone()));
    }

    let invalid_url = |reason: String| SourceError::InvalidUrl {
        id: source.id.clone(),
        url: source.url.clone(),
        reason,
    };
    let url = Url::parse(&source.url).map_err(|e| invalid_url(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid_url(format!("unsupported scheme `{}`", url.scheme())));
    }

    check_selector(&source.id, "section", &source.section_selector)?;
    check_selector(&source.id, "link", &source.link_selector)?;
    if let Some(selector) = &source.consent_button_selector {
        check_selector(&source.id, "consent button", selector)?;
    }
    Ok(())
}

/// Validate every source and reject duplicate ids.
pub fn validate_sources(sources: &[SourceConfig]) -> Result<(), SourceError> {
    sources.iter().try_for_each(validate_source)?;
    if let Some(id) = sources.iter().map(|s| &s.id).duplicates().next() {
        return Err(SourceError::DuplicateId(id.clone()));
    }
    Ok(())
}
