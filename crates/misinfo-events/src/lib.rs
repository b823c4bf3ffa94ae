//! Shared record types for the misinformation simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! The engine depends on it, and so can any renderer or offline analysis
//! tool that reads the engine's output.

pub mod compartment;
pub mod event;
pub mod snapshot;
pub mod timestamp;

pub use compartment::{Compartment, CompartmentCounts, UnknownCompartment};
pub use event::{TransitionCause, TransitionEvent};
pub use snapshot::{csv_header, MetricsSnapshot, ParseSnapshotError, CSV_COLUMNS};
pub use timestamp::{
    parse_clock_label, ParseTimeError, SimTime, MINUTES_PER_DAY, MINUTES_PER_HOUR,
    MINUTES_PER_WEEK,
};
