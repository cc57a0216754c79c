//! Capture of a single source on the shared page.

use super::consent::dismiss_consent;
use super::{CaptureError, CaptureOutcome, CaptureRun, CaptureStage, CaptureSummary};
use crate::browser::PageDriver;
use crate::models::{SourceConfig, merge_metadata};
use crate::outputs::dataset::append_records;
use crate::utils::truncate_for_log;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument};

impl CaptureRun {
    /// Capture one source: navigate, wait for the section, dismiss consent,
    /// settle, extract, persist to both datasets, then screenshot the section.
    ///
    /// Failures are logged with the source id and returned as
    /// [`CaptureOutcome::Failed`]; they never propagate.
    #[instrument(level = "info", skip_all, fields(source = %source.id))]
    pub async fn capture_source<P: PageDriver>(
        &self,
        page: &P,
        source: &SourceConfig,
    ) -> CaptureOutcome {
        info!("{} : capture {}", source.id, source.url);
        match self.try_capture(page, source).await {
            Ok(summary) => {
                debug!(consent = ?summary.consent, "Consent handling");
                info!(
                    records = summary.records,
                    screenshot = %summary.screenshot.display(),
                    "Done!"
                );
                CaptureOutcome::Captured(summary)
            }
            Err(e) => {
                error!(stage = %e.stage(), error = %e, "Problem with capture - {}", source.id);
                CaptureOutcome::Failed(e)
            }
        }
    }

    async fn try_capture<P: PageDriver>(
        &self,
        page: &P,
        source: &SourceConfig,
    ) -> Result<CaptureSummary, CaptureError> {
        debug!(stage = %CaptureStage::Navigating);
        page.goto(&source.url).await.map_err(CaptureError::Navigation)?;

        debug!(stage = %CaptureStage::AwaitingSection, selector = %source.section_selector);
        page.wait_for_selector(&source.section_selector, self.timings.section_timeout)
            .await
            .map_err(CaptureError::SectionMissing)?;

        debug!(stage = %CaptureStage::DismissingConsent);
        let consent = dismiss_consent(
            page,
            source.consent_button_selector.as_deref(),
            source.consent_frame_match.as_deref(),
            self.timings.consent_timeout,
        )
        .await;

        debug!(stage = %CaptureStage::Settling, delay = ?self.timings.settle);
        sleep(self.timings.settle).await;

        debug!(stage = %CaptureStage::Extracting, selector = %source.link_selector);
        let section = page
            .find_element(&source.section_selector)
            .await
            .map_err(CaptureError::Extraction)?;
        let headlines = page
            .extract_links(&source.link_selector)
            .await
            .map_err(CaptureError::Extraction)?;
        let records = merge_metadata(&self.metadata, headlines);
        for record in &records {
            let text = truncate_for_log(record.text.trim(), 80);
            debug!(href = %record.href, %text, "Extracted headline");
        }

        debug!(stage = %CaptureStage::Persisting);
        info!(count = records.len(), "writing csv");
        let timestamp = &self.metadata.timestamp;
        append_records(&self.layout.cumulative_dataset(&source.id), &records).await?;
        append_records(&self.layout.daily_dataset(&source.id, timestamp), &records).await?;

        debug!(stage = %CaptureStage::Screenshotting);
        info!("taking screenshot");
        let screenshot = self.layout.screenshot(&source.id, timestamp);
        page.screenshot_element(&section, &screenshot)
            .await
            .map_err(CaptureError::Screenshot)?;

        Ok(CaptureSummary {
            records: records.len(),
            consent,
            screenshot,
        })
    }
}
