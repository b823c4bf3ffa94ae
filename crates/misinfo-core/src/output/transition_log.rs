//! Transition Log
//!
//! Append-only JSONL audit log of applied compartment transitions.

use bevy_ecs::prelude::*;
use misinfo_events::TransitionEvent;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::warn;

use super::OutputError;
use crate::systems::TickTransitions;

/// Resource for logging transitions to a JSONL file
#[derive(Resource)]
pub struct TransitionLog {
    writer: Option<BufWriter<File>>,
    event_count: u64,
}

impl TransitionLog {
    /// Create a new transition log writing to the specified path
    pub fn new(path: impl AsRef<Path>) -> Result<Self, OutputError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            event_count: 0,
        })
    }

    /// Create a log that discards events (for testing)
    pub fn null() -> Self {
        Self {
            writer: None,
            event_count: 0,
        }
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    pub fn log(&mut self, event: &TransitionEvent) -> Result<(), OutputError> {
        self.event_count += 1;
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(event)?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    pub fn log_batch(&mut self, events: &[TransitionEvent]) -> Result<(), OutputError> {
        for event in events {
            self.log(event)?;
        }
        Ok(())
    }

    /// Stop writing after a failure; later events are only counted
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

impl Drop for TransitionLog {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(error = %e, "failed to flush transition log");
        }
    }
}

/// Read every event back from a transition log
pub fn read_transition_log(path: impl AsRef<Path>) -> Result<Vec<TransitionEvent>, OutputError> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        events.push(serde_json::from_str(&line)?);
    }
    Ok(events)
}

/// System: append this tick's transitions to the log, if one is attached
pub fn write_transition_log(
    transitions: Res<TickTransitions>,
    log: Option<ResMut<TransitionLog>>,
) {
    let Some(mut log) = log else {
        return;
    };
    if transitions.events.is_empty() {
        return;
    }
    if let Err(e) = log.log_batch(&transitions.events) {
        warn!(error = %e, "transition log write failed; further events are dropped");
        log.disable();
    }
}
