//! Metrics System
//!
//! Captures a compartment-count snapshot every reporting interval and once
//! more when the run ends.

use bevy_ecs::prelude::*;
use misinfo_events::{CompartmentCounts, MetricsSnapshot, MINUTES_PER_HOUR};
use tracing::{info, warn};

use crate::output::MetricsLog;
use crate::systems::clock::SimClock;

/// Resource holding the snapshots taken so far
#[derive(Resource, Debug)]
pub struct MetricsRecorder {
    interval_minutes: f64,
    next_due: f64,
    final_recorded: bool,
    last_reported_hour: Option<u64>,
    snapshots: Vec<MetricsSnapshot>,
}

impl MetricsRecorder {
    /// The first snapshot is due at `start_minute`.
    pub fn new(start_minute: f64, interval_minutes: f64) -> Self {
        Self {
            interval_minutes: interval_minutes.max(f64::EPSILON),
            next_due: start_minute,
            final_recorded: false,
            last_reported_hour: None,
            snapshots: Vec::new(),
        }
    }

    /// True once simulated time reaches the next reporting boundary.
    pub fn is_due(&self, minutes: f64) -> bool {
        minutes >= self.next_due
    }

    pub fn final_recorded(&self) -> bool {
        self.final_recorded
    }

    pub fn snapshots(&self) -> &[MetricsSnapshot] {
        &self.snapshots
    }

    pub fn latest(&self) -> Option<&MetricsSnapshot> {
        self.snapshots.last()
    }

    /// Stores a snapshot taken at `minutes` and schedules the next boundary.
    pub fn push(&mut self, snapshot: MetricsSnapshot, minutes: f64, is_final: bool) {
        self.snapshots.push(snapshot);
        self.next_due = ((minutes / self.interval_minutes).floor() + 1.0) * self.interval_minutes;
        self.final_recorded |= is_final;
    }

    /// Returns the hour number if `minutes` falls in an hour not yet reported.
    fn hour_to_report(&mut self, minutes: f64) -> Option<u64> {
        let hour = (minutes / MINUTES_PER_HOUR as f64).floor() as u64;
        if self.last_reported_hour == Some(hour) {
            return None;
        }
        self.last_reported_hour = Some(hour);
        Some(hour)
    }
}

/// System: record a metrics snapshot when an interval boundary is crossed
///
/// Exactly one final snapshot is taken on the tick the clock reaches its end
/// time; nothing is recorded after that.
pub fn record_metrics(
    clock: Res<SimClock>,
    counts: Res<CompartmentCounts>,
    mut recorder: ResMut<MetricsRecorder>,
    log: Option<ResMut<MetricsLog>>,
) {
    if recorder.final_recorded() {
        return;
    }

    let minutes = clock.minutes();
    if recorder.hour_to_report(minutes).is_some() {
        let current: CompartmentCounts = *counts;
        info!(time = %clock.time(), counts = %current, "progress");
    }

    let finished = clock.is_finished();
    if !finished && !recorder.is_due(minutes) {
        return;
    }

    let snapshot = MetricsSnapshot::capture(clock.time(), &counts);
    if let Some(mut log) = log {
        if let Err(e) = log.write(&snapshot) {
            warn!(error = %e, "metrics log write failed; further rows are dropped");
            log.disable();
        }
    }
    recorder.push(snapshot, minutes, finished);
}
