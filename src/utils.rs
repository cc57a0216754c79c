//! Utility functions for time partitioning, string manipulation, and file system operations.
//!
//! This module provides helper functions used throughout the application:
//! - Time partitioning of a run into date, timestamp and session
//! - String truncation for logging scraped text
//! - File system validation for output directories

use crate::models::{CaptureMetadata, Session};
use chrono::{Local, NaiveDateTime, Timelike};
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Classify a local hour (0-23) into a [`Session`].
///
/// Buckets are checked from the latest one down, first match wins:
/// - **Late**: 23
/// - **Evening**: 18 - 22
/// - **Midday**: 12 - 17
/// - **Morning**: 0 - 11
pub fn session_for_hour(hour: u32) -> Session {
    if hour >= 23 {
        Session::Late
    } else if hour >= 18 {
        Session::Evening
    } else if hour >= 12 {
        Session::Midday
    } else {
        Session::Morning
    }
}

/// Derive the run's [`CaptureMetadata`] from a local wall-clock instant.
///
/// # Returns
///
/// - `date`: `YYYY-MM-DD`
/// - `timestamp`: `YYYYMMDDHHMM`, so runs within the same minute collide
/// - `session`: see [`session_for_hour`]
pub fn partition(now: NaiveDateTime) -> CaptureMetadata {
    let metadata = CaptureMetadata {
        date: now.format("%Y-%m-%d").to_string(),
        timestamp: now.format("%Y%m%d%H%M").to_string(),
        session: session_for_hour(now.hour()),
    };
    debug!(
        %now,
        date = %metadata.date,
        timestamp = %metadata.timestamp,
        session = %metadata.session,
        "Computed capture metadata"
    );
    metadata
}

/// Partition the current local time. See [`partition`].
#[instrument]
pub fn partition_now() -> CaptureMetadata {
    partition(Local::now().naive_local())
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (backing off to a char
/// boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory (and any parents) if it doesn't exist,
/// then performs a write test by creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
