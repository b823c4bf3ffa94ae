//! Output
//!
//! Durable logs written during a run: the metrics CSV and the optional
//! transition audit log.

pub mod metrics_log;
pub mod transition_log;

pub use metrics_log::*;
pub use transition_log::*;

use misinfo_events::ParseSnapshotError;

/// Metrics log file name inside the output directory
pub const METRICS_LOG_FILE: &str = "simulation_log.csv";

/// Transition log file name inside the output directory
pub const TRANSITION_LOG_FILE: &str = "transitions.jsonl";

/// Errors writing or reading the output logs
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("line {line}: {source}")]
    Snapshot {
        line: usize,
        #[source]
        source: ParseSnapshotError,
    },
    #[error("metrics log is empty")]
    MissingHeader,
}
