//! Sequential capture of every configured source.
//!
//! A run walks the source list strictly in order on one shared page. Each
//! source goes through the same stages:
//!
//! ```text
//! Navigating → AwaitingSection → DismissingConsent → Settling
//!            → Extracting → Persisting → Screenshotting → Done
//! ```
//!
//! Any stage except consent dismissal can fail. A failure is logged with the
//! source id and the stage, then the run moves on to the next source; nothing
//! is retried. Records and the screenshot for one source are on disk before
//! the next source is navigated to.
//!
//! # Submodules
//!
//! - [`consent`]: Best-effort consent dialog dismissal
//! - [`unit`]: The per-source capture

pub mod consent;
pub mod unit;

use crate::browser::{BrowserError, PageDriver};
use crate::models::{CaptureMetadata, SourceConfig};
use crate::outputs::OutputLayout;
use crate::outputs::dataset::StoreError;
use consent::ConsentReport;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// How long the section may take to appear before the source is skipped.
pub const SECTION_TIMEOUT: Duration = Duration::from_secs(10);
/// How long to wait for a consent button in the main document.
pub const CONSENT_TIMEOUT: Duration = Duration::from_secs(5);
/// Fixed pause before extraction so late content can render.
pub const SETTLE_DELAY: Duration = Duration::from_secs(5);

/// Waits applied while capturing a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureTimings {
    pub section_timeout: Duration,
    pub consent_timeout: Duration,
    pub settle: Duration,
}

impl Default for CaptureTimings {
    fn default() -> Self {
        Self {
            section_timeout: SECTION_TIMEOUT,
            consent_timeout: CONSENT_TIMEOUT,
            settle: SETTLE_DELAY,
        }
    }
}

/// A step of the per-source capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStage {
    Navigating,
    AwaitingSection,
    DismissingConsent,
    Settling,
    Extracting,
    Persisting,
    Screenshotting,
}

impl fmt::Display for CaptureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CaptureStage::Navigating => "navigating",
            CaptureStage::AwaitingSection => "awaiting_section",
            CaptureStage::DismissingConsent => "dismissing_consent",
            CaptureStage::Settling => "settling",
            CaptureStage::Extracting => "extracting",
            CaptureStage::Persisting => "persisting",
            CaptureStage::Screenshotting => "screenshotting",
        };
        f.write_str(name)
    }
}

/// Why a single source could not be captured.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("navigation failed: {0}")]
    Navigation(#[source] BrowserError),
    #[error("section never appeared: {0}")]
    SectionMissing(#[source] BrowserError),
    #[error("extraction failed: {0}")]
    Extraction(#[source] BrowserError),
    #[error("failed to persist records: {0}")]
    Persist(#[from] StoreError),
    #[error("screenshot failed: {0}")]
    Screenshot(#[source] BrowserError),
}

impl CaptureError {
    pub fn stage(&self) -> CaptureStage {
        match self {
            CaptureError::Navigation(_) => CaptureStage::Navigating,
            CaptureError::SectionMissing(_) => CaptureStage::AwaitingSection,
            CaptureError::Extraction(_) => CaptureStage::Extracting,
            CaptureError::Persist(_) => CaptureStage::Persisting,
            CaptureError::Screenshot(_) => CaptureStage::Screenshotting,
        }
    }
}

/// What a successful capture left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSummary {
    pub records: usize,
    pub consent: ConsentReport,
    pub screenshot: PathBuf,
}

#[derive(Debug)]
pub enum CaptureOutcome {
    Captured(CaptureSummary),
    Failed(CaptureError),
}

impl CaptureOutcome {
    pub fn is_captured(&self) -> bool {
        matches!(self, CaptureOutcome::Captured(_))
    }
}

#[derive(Debug)]
pub struct SourceReport {
    pub id: String,
    pub outcome: CaptureOutcome,
}

/// Total records written by the captured sources, and `id@stage` for each
/// failed one.
fn tally(reports: &[SourceReport]) -> (usize, Vec<String>) {
    let mut records = 0;
    let mut failed = Vec::new();
    for report in reports {
        match &report.outcome {
            CaptureOutcome::Captured(summary) => records += summary.records,
            CaptureOutcome::Failed(e) => failed.push(format!("{}@{}", report.id, e.stage())),
        }
    }
    (records, failed)
}

/// Everything shared by the sources of one run.
#[derive(Debug, Clone)]
pub struct CaptureRun {
    pub metadata: CaptureMetadata,
    pub layout: OutputLayout,
    pub timings: CaptureTimings,
}

impl CaptureRun {
    pub fn new(metadata: CaptureMetadata, layout: OutputLayout, timings: CaptureTimings) -> Self {
        Self {
            metadata,
            layout,
            timings,
        }
    }

    /// Capture every source in order on `page`, continuing past failures.
    ///
    /// Each source finishes (captured or failed) before the next begins.
    /// The returned reports follow the order of `sources`.
    #[instrument(
        level = "info",
        skip_all,
        fields(timestamp = %self.metadata.timestamp, session = %self.metadata.session)
    )]
    pub async fn run_all<P: PageDriver>(
        &self,
        page: &P,
        sources: &[SourceConfig],
    ) -> Vec<SourceReport> {
        let mut reports = Vec::with_capacity(sources.len());
        for source in sources {
            let report = SourceReport {
                id: source.id.clone(),
                outcome: self.capture_source(page, source).await,
            };
            debug!(
                source = %report.id,
                captured = report.outcome.is_captured(),
                "Source finished"
            );
            reports.push(report);
        }
        let (records, failed) = tally(&reports);
        info!(sources = reports.len(), records, ?failed, "done all.");
        reports
    }
}
