//! Metrics Log
//!
//! Append-only CSV of metrics snapshots: one header row, then one row per
//! snapshot.

use bevy_ecs::prelude::*;
use misinfo_events::{csv_header, MetricsSnapshot};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::warn;

use super::OutputError;

/// Resource for writing snapshots to a CSV file
#[derive(Resource)]
pub struct MetricsLog {
    writer: Option<BufWriter<File>>,
    rows: u64,
}

impl MetricsLog {
    /// Create the log at `path`, truncating any previous file, and write the header
    pub fn new(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", csv_header())?;

        Ok(Self {
            writer: Some(writer),
            rows: 0,
        })
    }

    /// Create a log that discards rows (for testing)
    pub fn null() -> Self {
        Self {
            writer: None,
            rows: 0,
        }
    }

    /// Rows written (or discarded) so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn write(&mut self, snapshot: &MetricsSnapshot) -> Result<(), OutputError> {
        self.rows += 1;
        if let Some(ref mut writer) = self.writer {
            writeln!(writer, "{}", snapshot.to_csv_row())?;
        }
        Ok(())
    }

    /// Stop writing after a failure; later rows are discarded
    pub fn disable(&mut self) {
        self.writer = None;
    }

    pub fn flush(&mut self) -> Result<(), OutputError> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for MetricsLog {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "failed to flush metrics log");
        }
    }
}

/// Read every snapshot back from a metrics log
pub fn read_metrics_log(path: impl AsRef<Path>) -> Result<Vec<MetricsSnapshot>, OutputError> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = reader.lines();

    let header = lines.next().ok_or(OutputError::MissingHeader)??;
    MetricsSnapshot::check_header(&header)
        .map_err(|source| OutputError::Snapshot { line: 1, source })?;

    let mut snapshots = Vec::new();
    for (i, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let snapshot = MetricsSnapshot::from_csv_row(&line)
            .map_err(|source| OutputError::Snapshot { line: i + 2, source })?;
        snapshots.push(snapshot);
    }
    Ok(snapshots)
}
