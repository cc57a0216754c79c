//! Append-only CSV record store.
//!
//! Both the cumulative per-source dataset and the dated per-run snapshot go
//! through [`append_records`]. A target that does not exist yet gets a header
//! row; an existing target only gets rows. Either way the batch ends with one
//! line terminator, so consecutive runs simply concatenate.
//!
//! # Format
//!
//! Every field, header included, is double-quoted:
//!
//! ```text
//! "date","timestamp","session","href","text"
//! "2025-05-06","202505061430","midday","https://edition.cnn.com/a","Headline"
//! ```

use crate::models::CaptureRecord;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::path::Path;
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// Ends every batch, including an empty one.
pub const BATCH_TERMINATOR: &str = "\n";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize records: {0}")]
    Csv(#[from] csv::Error),
    #[error("serialized records were not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Append `records` to the CSV dataset at `target`.
///
/// Writes a header row only when `target` does not exist yet. An empty
/// `records` slice still writes: header plus terminator for a new target,
/// only the terminator for an existing one.
///
/// # Errors
///
/// Returns [`StoreError`] when the target cannot be inspected, opened or
/// written, or when a record fails to serialize.
#[instrument(level = "info", skip_all, fields(path = %target.display(), count = records.len()))]
pub async fn append_records(target: &Path, records: &[CaptureRecord]) -> Result<(), StoreError> {
    let exists = fs::try_exists(target)
        .await
        .map_err(|e| StoreError::io(target, e))?;

    let batch = render_batch(records, !exists)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(target)
        .await
        .map_err(|e| StoreError::io(target, e))?;
    file.write_all(batch.as_bytes())
        .await
        .map_err(|e| StoreError::io(target, e))?;
    file.flush().await.map_err(|e| StoreError::io(target, e))?;

    if exists {
        debug!("Appended rows to existing dataset");
    } else {
        info!("Created dataset with header");
    }
    Ok(())
}

/// Render one batch: optional header, the rows joined by `\n`, then [`BATCH_TERMINATOR`].
pub fn render_batch(records: &[CaptureRecord], with_header: bool) -> Result<String, StoreError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    if with_header {
        writer.write_record(CaptureRecord::HEADER)?;
    }
    for record in records {
        writer.serialize(record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| StoreError::Csv(e.into_error().into()))?;
    let mut rows = String::from_utf8(bytes)?;
    // The writer terminates every row; the batch terminator replaces the last one.
    if rows.ends_with('\n') {
        rows.pop();
    }
    rows.push_str(BATCH_TERMINATOR);
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Session;

    const HEADER_LINE: &str = r#""date","timestamp","session","href","text""#;

    fn record(href: &str, text: &str) -> CaptureRecord {
        CaptureRecord {
            date: "2025-05-06".to_string(),
            timestamp: "202505061430".to_string(),
            session: Session::Midday,
            href: href.to_string(),
            text: text.to_string(),
        }
    }

    fn two_records() -> [CaptureRecord; 2] {
        [record("https://a.example/1", "One"), record("https://a.example/2", "Two")]
    }

    fn row(href: &str, text: &str) -> String {
        format!(r#""2025-05-06","202505061430","midday","{href}","{text}""#)
    }

    #[tokio::test]
    async fn test_new_target_gets_header_then_rows() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("cnn.csv");

        append_records(&target, &two_records()).await.unwrap();

        let content = std::fs::read_to_string(&target).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], HEADER_LINE);
        assert_eq!(lines[1], row("https://a.example/1", "One"));
        assert_eq!(lines[2], row("https://a.example/2", "Two"));
        assert_eq!(lines.len(), 3);
        assert!(content.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_existing_target_never_repeats_header() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("cnn.csv");

        append_records(&target, &[record("https://a.example/1", "One")]).await.unwrap();
        let before = std::fs::read_to_string(&target).unwrap();

        append_records(&target, &[record("https://a.example/2", "Two")]).await.unwrap();
        let after = std::fs::read_to_string(&target).unwrap();

        assert!(after.starts_with(&before));
        assert_eq!(&after[before.len()..], format!("{}\n", row("https://a.example/2", "Two")));
        assert_eq!(after.matches(HEADER_LINE).count(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_on_new_target_is_header_only() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("empty.csv");

        append_records(&target, &[]).await.unwrap();

        let content = std::fs::read_to_string(&target).unwrap();
        assert_eq!(content, format!("{HEADER_LINE}\n"));
    }

    #[tokio::test]
    async fn test_empty_batch_on_existing_target_is_terminator_only() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("empty.csv");

        append_records(&target, &[record("https://a.example/1", "One")]).await.unwrap();
        let before = std::fs::read_to_string(&target).unwrap();
        append_records(&target, &[]).await.unwrap();
        let after = std::fs::read_to_string(&target).unwrap();

        assert_eq!(after, format!("{before}\n"));
    }

    #[tokio::test]
    async fn test_missing_parent_dir_propagates() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("no-such-dir").join("cnn.csv");

        let err = append_records(&target, &[record("https://a.example/1", "One")])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn test_render_batch_escapes_quotes_and_keeps_newlines() {
        let quoted = record("https://a.example/q", "Say \"hi\"\n now");
        let batch = render_batch(&[quoted], false).unwrap();
        assert_eq!(
            batch,
            concat!(
                r#""2025-05-06","202505061430","midday","https://a.example/q","#,
                "\"Say \"\"hi\"\"\n now\"\n",
            )
        );
    }

    #[test]
    fn test_rendered_batch_reads_back() {
        let batch = render_batch(&two_records(), true).unwrap();
        let mut reader = csv::Reader::from_reader(batch.as_bytes());
        let rows: Vec<CaptureRecord> = reader.deserialize().collect::<Result<_, _>>().unwrap();
        assert_eq!(rows, two_records());
    }
}
