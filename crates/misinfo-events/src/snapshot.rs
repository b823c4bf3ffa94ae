//! Metrics Snapshot Record
//!
//! The compartment-count record produced every few simulated minutes and at
//! termination. This is the only durable output of the engine; it is written
//! as CSV with one header row followed by one row per snapshot.

use serde::{Deserialize, Serialize};

use crate::compartment::{Compartment, CompartmentCounts};
use crate::timestamp::{parse_clock_label, ParseTimeError, SimTime};

/// Column names of the metrics log, in order.
pub const CSV_COLUMNS: [&str; 8] = [
    "Time",
    "Susceptible",
    "Exposed",
    "Believer",
    "Doubter",
    "Recovered",
    "Disinformant",
    "Total_Misinformed",
];

/// Returns the CSV header row.
pub fn csv_header() -> String {
    CSV_COLUMNS.join(",")
}

/// Errors decoding a metrics log row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseSnapshotError {
    #[error("expected {expected} columns, found {found}")]
    ColumnCount { expected: usize, found: usize },
    #[error("invalid count in column {column}: '{value}'")]
    InvalidCount { column: &'static str, value: String },
    #[error(transparent)]
    Time(#[from] ParseTimeError),
    #[error("unexpected header: '{0}'")]
    Header(String),
}

/// One row of the metrics log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricsSnapshot {
    /// Clock label "HH:MM".
    #[serde(rename = "Time")]
    pub timestamp: String,
    pub susceptible: u32,
    pub exposed: u32,
    pub believer: u32,
    pub doubter: u32,
    pub recovered: u32,
    pub disinformant: u32,
    /// Believers plus Disinformants.
    #[serde(rename = "Total_Misinformed")]
    pub total_misinformed: u32,
}

impl MetricsSnapshot {
    /// Captures the counts at the given simulated time.
    pub fn capture(time: SimTime, counts: &CompartmentCounts) -> Self {
        Self {
            timestamp: time.label(),
            susceptible: counts.get(Compartment::Susceptible),
            exposed: counts.get(Compartment::Exposed),
            believer: counts.get(Compartment::Believer),
            doubter: counts.get(Compartment::Doubter),
            recovered: counts.get(Compartment::Recovered),
            disinformant: counts.get(Compartment::Disinformant),
            total_misinformed: counts.total_misinformed(),
        }
    }

    /// Rebuilds the compartment counts recorded in this snapshot.
    pub fn counts(&self) -> CompartmentCounts {
        CompartmentCounts::from_pairs([
            (Compartment::Susceptible, self.susceptible),
            (Compartment::Exposed, self.exposed),
            (Compartment::Believer, self.believer),
            (Compartment::Doubter, self.doubter),
            (Compartment::Recovered, self.recovered),
            (Compartment::Disinformant, self.disinformant),
        ])
    }

    /// Total agents recorded in this snapshot.
    pub fn population(&self) -> u32 {
        self.counts().total()
    }

    /// Encodes the snapshot as a CSV row (no trailing newline).
    pub fn to_csv_row(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{}",
            self.timestamp,
            self.susceptible,
            self.exposed,
            self.believer,
            self.doubter,
            self.recovered,
            self.disinformant,
            self.total_misinformed,
        )
    }

    /// Decodes a CSV row produced by [`MetricsSnapshot::to_csv_row`].
    pub fn from_csv_row(line: &str) -> Result<Self, ParseSnapshotError> {
        let fields: Vec<&str> = line.trim_end_matches(['\r', '\n']).split(',').collect();
        if fields.len() != CSV_COLUMNS.len() {
            return Err(ParseSnapshotError::ColumnCount {
                expected: CSV_COLUMNS.len(),
                found: fields.len(),
            });
        }

        let (hour, minute) = parse_clock_label(fields[0])?;

        let count = |i: usize| -> Result<u32, ParseSnapshotError> {
            fields[i].trim().parse::<u32>().map_err(|_| ParseSnapshotError::InvalidCount {
                column: CSV_COLUMNS[i],
                value: fields[i].to_string(),
            })
        };

        Ok(Self {
            timestamp: format!("{:02}:{:02}", hour, minute),
            susceptible: count(1)?,
            exposed: count(2)?,
            believer: count(3)?,
            doubter: count(4)?,
            recovered: count(5)?,
            disinformant: count(6)?,
            total_misinformed: count(7)?,
        })
    }

    /// Checks that a line is the metrics log header.
    pub fn check_header(line: &str) -> Result<(), ParseSnapshotError> {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == csv_header() {
            Ok(())
        } else {
            Err(ParseSnapshotError::Header(trimmed.to_string()))
        }
    }
}
