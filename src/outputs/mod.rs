//! Output locations and writers for captured datasets and screenshots.
//!
//! # Submodules
//!
//! - [`dataset`]: Append-only CSV record store used for both dataset kinds
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── data/
//! │   ├── cnn-intl.csv                  # cumulative, grows across every run
//! │   └── daily/
//! │       └── cnn-intl-202505061430.csv # one per source per run
//! └── img/
//!     └── cnn-intl-202505061430.png     # section screenshot
//! ```

pub mod dataset;

use crate::utils::ensure_writable_dir;
use std::error::Error;
use std::path::PathBuf;
use tracing::instrument;

/// Resolves where each artifact of a run is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn daily_dir(&self) -> PathBuf {
        self.data_dir().join("daily")
    }

    pub fn img_dir(&self) -> PathBuf {
        self.root.join("img")
    }

    /// Cumulative dataset, keyed by source id only.
    pub fn cumulative_dataset(&self, source_id: &str) -> PathBuf {
        self.data_dir().join(format!("{source_id}.csv"))
    }

    /// Dated snapshot dataset, keyed by source id and run timestamp.
    pub fn daily_dataset(&self, source_id: &str, timestamp: &str) -> PathBuf {
        self.daily_dir().join(format!("{source_id}-{timestamp}.csv"))
    }

    pub fn screenshot(&self, source_id: &str, timestamp: &str) -> PathBuf {
        self.img_dir().join(format!("{source_id}-{timestamp}.png"))
    }

    /// Create `data/`, `data/daily/` and `img/` if absent and check they are writable.
    #[instrument(level = "info", skip_all, fields(root = %self.root.display()))]
    pub async fn ensure_dirs(&self) -> Result<(), Box<dyn Error>> {
        for dir in [self.data_dir(), self.daily_dir(), self.img_dir()] {
            ensure_writable_dir(&dir).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let layout = OutputLayout::new("/srv/capture");
        assert_eq!(layout.cumulative_dataset("nyt"), PathBuf::from("/srv/capture/data/nyt.csv"));
        assert_eq!(
            layout.daily_dataset("nyt", "202505061430"),
            PathBuf::from("/srv/capture/data/daily/nyt-202505061430.csv")
        );
        assert_eq!(
            layout.screenshot("nyt", "202505061430"),
            PathBuf::from("/srv/capture/img/nyt-202505061430.png")
        );
    }

    #[tokio::test]
    async fn test_ensure_dirs_creates_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(tmp.path());
        layout.ensure_dirs().await.unwrap();

        assert!(layout.data_dir().is_dir());
        assert!(layout.daily_dir().is_dir());
        assert!(layout.img_dir().is_dir());
    }

    #[tokio::test]
    async fn test_ensure_dirs_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = OutputLayout::new(tmp.path());
        layout.ensure_dirs().await.unwrap();
        layout.ensure_dirs().await.unwrap();
        assert!(layout.img_dir().is_dir());
    }
}
