//! Misinformation Spread Simulation Engine
//!
//! Agents move between home, work and social zones on a simulated clock and
//! change belief compartment when they come into contact with one another.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod components;
pub mod config;
pub mod output;
pub mod setup;
pub mod simulation;
pub mod systems;

pub use components::*;
pub use config::{Config, ConfigError, PopulationConfig, SimDuration, SimParams};
pub use simulation::{AgentView, InvariantViolation, RunSummary, Simulation};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);
