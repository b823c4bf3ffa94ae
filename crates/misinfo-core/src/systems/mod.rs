//! ECS Systems
//!
//! Clock, zone scheduling, movement, interaction resolution and metrics.

pub mod census;
pub mod clock;
pub mod interaction;
pub mod metrics;
pub mod movement;
pub mod zones;

// Re-export commonly used systems
pub use census::{age_compartments, CompartmentIndex};
pub use clock::{advance_clock, SimClock};
pub use interaction::{
    apply_transitions, beta22_cdf, change_probability, detect_interactions, passive_transitions,
    rules_for, ContactRule, Influencer, PendingTransition, RuleSubject, TickTransitions,
    TransitionQueue, CONTACT_RULES,
};
pub use metrics::{record_metrics, MetricsRecorder};
pub use movement::{contact_box, deflect_collisions, movement_bounds, step_movement};
pub use zones::{assign_zones, work_speed_factor, DayPhase};
