//! Best-effort dismissal of cookie/privacy consent dialogs.
//!
//! Consent dialogs render or not depending on region and cookies, so nothing
//! here can fail a capture. Each of the two sub-steps reports a
//! [`ConsentOutcome`] instead:
//!
//! 1. **Frame**: when the source names a consent frame, find an attached
//!    frame whose URL contains it and click the button inside. No waiting.
//! 2. **Main document**: when the source names a consent button, wait a
//!    bounded time for it in the main document and click it.
//!
//! Both sub-steps run when both are configured.

use crate::browser::PageDriver;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsentOutcome {
    /// Not configured for this source.
    Skipped,
    Dismissed,
    /// Attempted and failed; the reason is kept for logs and tests.
    Contained(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentReport {
    pub frame: ConsentOutcome,
    pub main_document: ConsentOutcome,
}

/// Try to dismiss a consent dialog. Never fails the caller.
pub async fn dismiss_consent<P: PageDriver>(
    page: &P,
    button_selector: Option<&str>,
    frame_match: Option<&str>,
    timeout: Duration,
) -> ConsentReport {
    let frame = match (frame_match, button_selector) {
        (Some(fragment), Some(selector)) => {
            dismiss_in_frame(page, fragment, selector).await
        }
        (Some(fragment), None) => {
            debug!(%fragment, "Consent frame configured without a button; skipping");
            ConsentOutcome::Skipped
        }
        (None, _) => ConsentOutcome::Skipped,
    };

    let main_document = match button_selector {
        Some(selector) => dismiss_in_document(page, selector, timeout).await,
        None => ConsentOutcome::Skipped,
    };

    ConsentReport {
        frame,
        main_document,
    }
}

async fn dismiss_in_frame<P: PageDriver>(
    page: &P,
    fragment: &str,
    selector: &str,
) -> ConsentOutcome {
    let frame = match page.find_frame(fragment).await {
        Ok(Some(frame)) => frame,
        Ok(None) => {
            info!(%fragment, "The agree frame didn't appear.");
            return ConsentOutcome::Contained(format!("no frame matching `{fragment}`"));
        }
        Err(e) => {
            info!(%fragment, error = %e, "Could not list frames for the agree frame.");
            return ConsentOutcome::Contained(e.to_string());
        }
    };

    match page.click_in_frame(&frame, selector).await {
        Ok(()) => {
            info!(%fragment, %selector, "Dismissed consent inside frame");
            ConsentOutcome::Dismissed
        }
        Err(e) => {
            info!(
                %fragment,
                %selector,
                error = %e,
                "The agree frame button could not be clicked."
            );
            ConsentOutcome::Contained(e.to_string())
        }
    }
}

async fn dismiss_in_document<P: PageDriver>(
    page: &P,
    selector: &str,
    timeout: Duration,
) -> ConsentOutcome {
    let clicked = match page.wait_for_selector(selector, timeout).await {
        Ok(()) => page.click(selector).await,
        Err(e) => Err(e),
    };

    match clicked {
        Ok(()) => {
            info!(%selector, "Dismissed consent");
            ConsentOutcome::Dismissed
        }
        Err(e) => {
            info!(%selector, error = %e, "The agree button didn't appear.");
            ConsentOutcome::Contained(e.to_string())
        }
    }
}
