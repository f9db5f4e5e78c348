//! Line-delimited JSON snapshot feed
//!
//! Each non-empty line is one [`Snapshot`]. Lines starting with `#` are
//! comments. A line that does not parse is logged and skipped.

use std::path::Path;

use anyhow::{Context as _, Result};
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

use crate::engine::Snapshot;

pub struct SnapshotFeed<R> {
    lines: Lines<R>,
    line_no: usize,
    skipped: usize,
}

impl SnapshotFeed<BufReader<File>> {
    pub async fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .await
            .with_context(|| format!("Failed to open snapshot feed: {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl SnapshotFeed<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> SnapshotFeed<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
            skipped: 0,
        }
    }

    /// Next snapshot, or `None` at end of input.
    pub async fn next_snapshot(&mut self) -> Result<Option<Snapshot>> {
        while let Some(line) = self
            .lines
            .next_line()
            .await
            .context("Failed to read snapshot feed")?
        {
            self.line_no += 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match serde_json::from_str::<Snapshot>(line) {
                Ok(snapshot) => return Ok(Some(snapshot)),
                Err(err) => {
                    self.skipped += 1;
                    warn!("skipping malformed snapshot on line {}: {}", self.line_no, err);
                }
            }
        }
        Ok(None)
    }

    /// Lines that were rejected so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_snapshots_and_skips_noise() {
        let input: &[u8] = br#"
# recorded run
{"started": false}

{"started": true, "timer_active": true, "elapsed_file_time": 1200, "previous_splits": [0, 0]}
not json
{"started": true, "elapsed_file_time": "soon"}
{"started": true, "timer_active": false, "elapsed_file_time": 1300, "previous_splits": [1]}
"#;
        let mut feed = SnapshotFeed::new(input);

        let first = feed.next_snapshot().await.unwrap().unwrap();
        assert!(!first.started);

        let second = feed.next_snapshot().await.unwrap().unwrap();
        assert!(second.timer_active);
        assert_eq!(second.elapsed_file_time, 1200);

        let third = feed.next_snapshot().await.unwrap().unwrap();
        assert_eq!(third.split_marker(), 1);
        assert_eq!(feed.skipped(), 2);

        assert!(feed.next_snapshot().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(SnapshotFeed::open(&dir.path().join("absent.jsonl")).await.is_err());
    }
}
