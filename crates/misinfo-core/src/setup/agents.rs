//! Agent Spawning
//!
//! Spawns the initial population with traits drawn from each compartment's
//! profile and registers every agent in the compartment index.

use bevy_ecs::prelude::*;
use misinfo_events::{Compartment, CompartmentCounts};
use rand::Rng;
use std::fmt;

use crate::components::agent::{
    draw, AgentId, Belief, Exposure, Motion, TraitProfile, Traits, ZoneState,
};
use crate::components::world::{random_unit_vector, Vec2, ZoneKind, ZoneMap};
use crate::config::{PopulationConfig, SimParams, ValencePrior};
use crate::systems::CompartmentIndex;
use crate::SimRng;

/// Description of a single agent to spawn
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub compartment: Compartment,
    /// Defaults to a random point in the home zone
    pub position: Option<Vec2>,
    /// Defaults to a draw from the compartment profile
    pub traits: Option<Traits>,
    pub misinformant_exposures: u32,
}

impl AgentSpec {
    pub fn new(compartment: Compartment) -> Self {
        Self {
            compartment,
            position: None,
            traits: None,
            misinformant_exposures: 0,
        }
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_traits(mut self, traits: Traits) -> Self {
        self.traits = Some(traits);
        self
    }
}

/// Draw a full trait set for a new agent of the given compartment
pub fn random_traits(compartment: Compartment, prior: ValencePrior, rng: &mut impl Rng) -> Traits {
    let profile = TraitProfile::for_compartment(compartment);
    Traits {
        skepticism: draw(profile.skepticism, rng),
        emotional_valence: prior.sample(rng),
        influence: draw(profile.influence, rng),
        persuasiveness: draw(profile.persuasiveness, rng),
    }
}

/// Spawn one agent and register it with the compartment index and counters
///
/// Ids are handed out sequentially; agents are never despawned.
pub fn spawn_agent(world: &mut World, spec: AgentSpec) -> AgentId {
    world.resource_scope(|world, mut sim_rng: Mut<SimRng>| {
        let rng = &mut sim_rng.0;
        let prior = world.resource::<SimParams>().movement.valence_prior;
        let zones = world.resource::<ZoneMap>().clone();

        let traits = spec
            .traits
            .clone()
            .unwrap_or_else(|| random_traits(spec.compartment, prior, rng));
        let base_speed = draw(TraitProfile::for_compartment(spec.compartment).speed, rng);
        let position = spec
            .position
            .unwrap_or_else(|| zones.padded(ZoneKind::Home).random_point(rng));
        let motion = Motion::new(position, random_unit_vector(rng), base_speed);
        let state = ZoneState {
            current: zones.zone_at(position),
            ..Default::default()
        };

        let id = AgentId(world.resource::<CompartmentIndex>().total() as u32);
        let entity = world
            .spawn((
                id,
                Belief {
                    compartment: spec.compartment,
                },
                motion,
                traits,
                Exposure {
                    misinformant_exposures: spec.misinformant_exposures,
                    ticks_in_compartment: 0,
                },
                state,
            ))
            .id();

        world
            .resource_mut::<CompartmentIndex>()
            .insert(spec.compartment, id, entity);
        world
            .resource_mut::<CompartmentCounts>()
            .increment(spec.compartment);
        id
    })
}

/// Spawn the configured initial population, compartment by compartment
pub fn spawn_population(world: &mut World, population: &PopulationConfig) -> SpawnSummary {
    for (compartment, count) in population.iter() {
        for _ in 0..count {
            spawn_agent(world, AgentSpec::new(compartment));
        }
    }
    get_spawn_summary(world)
}

/// Get summary counts for spawned agents
pub fn get_spawn_summary(world: &mut World) -> SpawnSummary {
    let mut by_compartment = CompartmentCounts::new();
    let mut query = world.query::<&Belief>();
    for belief in query.iter(world) {
        by_compartment.increment(belief.compartment);
    }
    SpawnSummary {
        total_agents: by_compartment.total(),
        by_compartment,
    }
}

/// Summary of spawned agents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnSummary {
    pub total_agents: u32,
    pub by_compartment: CompartmentCounts,
}

impl fmt::Display for SpawnSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total agents: {}", self.total_agents)?;
        for (compartment, count) in self.by_compartment.iter() {
            writeln!(f, "  {}: {}", compartment, count)?;
        }
        Ok(())
    }
}
