//! Command-line interface definitions for Headline Capture.
//!
//! Every option has a default, so running the binary with no arguments
//! captures all built-in sources into the current directory.

use crate::capture::{CONSENT_TIMEOUT, CaptureTimings, SECTION_TIMEOUT, SETTLE_DELAY};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for the Headline Capture application.
///
/// # Examples
///
/// ```sh
/// # Capture every source into ./data and ./img
/// headline_capture
///
/// # Capture two sources into /srv/headlines with a visible browser
/// headline_capture -o /srv/headlines --only cnn-intl --only nyt --headed
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory under which data/, data/daily/ and img/ are written
    #[arg(short, long, env = "CAPTURE_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Chrome/Chromium executable (auto-detected when omitted)
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Show the browser window instead of running headless
    #[arg(long)]
    pub headed: bool,

    /// Launch Chromium with its sandbox disabled (e.g. as root in a container)
    #[arg(long, env = "CAPTURE_NO_SANDBOX")]
    pub no_sandbox: bool,

    /// Capture only these source ids (repeatable); list order is kept
    #[arg(long = "only", value_name = "SOURCE_ID")]
    pub only: Vec<String>,

    /// Seconds to wait for a source's headline section to appear
    #[arg(long, default_value_t = SECTION_TIMEOUT.as_secs())]
    pub section_timeout_secs: u64,

    /// Seconds to wait for a consent button in the main document
    #[arg(long, default_value_t = CONSENT_TIMEOUT.as_secs())]
    pub consent_timeout_secs: u64,

    /// Seconds to let late content settle before extraction
    #[arg(long, default_value_t = SETTLE_DELAY.as_secs())]
    pub settle_secs: u64,
}

impl Cli {
    pub fn timings(&self) -> CaptureTimings {
        CaptureTimings {
            section_timeout: Duration::from_secs(self.section_timeout_secs),
            consent_timeout: Duration::from_secs(self.consent_timeout_secs),
            settle: Duration::from_secs(self.settle_secs),
        }
    }
}
