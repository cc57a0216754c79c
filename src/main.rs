//! # Headline Capture
//!
//! An unattended job that records the top-headline section of several news
//! homepages. Each run produces, per source, CSV rows of every headline link
//! plus a screenshot of the section, building time series across runs.
//!
//! ## Usage
//!
//! ```sh
//! headline_capture            # all sources, outputs under ./data and ./img
//! headline_capture --only nyt # one source
//! ```
//!
//! ## Architecture
//!
//! One run is a single sequential pass:
//! 1. **Partitioning**: Derive date, timestamp and session from the local clock
//! 2. **Capturing**: For each source in order, navigate the shared page, wait
//!    for the section, dismiss consent, settle, extract links
//! 3. **Output**: Append rows to the cumulative and dated datasets, then
//!    screenshot the section
//!
//! A source that fails at any step is logged and skipped; only browser launch
//! or output bootstrap failures end the process with an error.

use clap::Parser;
use std::error::Error;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod browser;
mod capture;
mod cli;
mod models;
mod outputs;
mod sources;
mod utils;

use browser::{BrowserSettings, ChromiumSession};
use capture::CaptureRun;
use cli::Cli;
use outputs::OutputLayout;
use sources::{default_sources, select_sources, validate_sources};
use utils::partition_now;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("headline_capture starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Sources ----
    let sources = select_sources(default_sources(), &args.only)?;
    validate_sources(&sources)?;
    let ids: Vec<&str> = sources.iter().map(|s| s.id.as_str()).collect();
    info!(count = sources.len(), ?ids, "Sources selected");

    // ---- Output directories ----
    let layout = OutputLayout::new(&args.output_dir);
    layout.ensure_dirs().await?;

    // ---- Run metadata ----
    let metadata = partition_now();
    info!(
        date = %metadata.date,
        timestamp = %metadata.timestamp,
        session = %metadata.session,
        "Run metadata computed"
    );

    // ---- Browser ----
    let mut settings = BrowserSettings::default().with_executable(args.chrome_path.clone());
    if args.headed {
        settings = settings.headed();
    }
    if args.no_sandbox {
        warn!("Chromium sandbox disabled");
        settings = settings.without_sandbox();
    }
    let session = ChromiumSession::launch(&settings).await?;

    // ---- Capture ----
    let run = CaptureRun::new(metadata, layout, args.timings());
    run.run_all(session.page(), &sources).await;

    session.close().await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
