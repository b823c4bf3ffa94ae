//! Simulation Driver
//!
//! Owns the ECS world and the per-tick schedule. Everything a run needs lives
//! in this one value; there is no global state.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use misinfo_events::{Compartment, CompartmentCounts, MetricsSnapshot, SimTime};
use serde::Serialize;
use tracing::info;

use crate::components::agent::{AgentId, Belief, Motion, Traits, ZoneState};
use crate::components::world::{HomeGrid, Vec2, ZoneKind};
use crate::config::{Config, ConfigError};
use crate::output::{write_transition_log, MetricsLog, OutputError, TransitionLog};
use crate::setup::{insert_resources, spawn_agent, spawn_population, AgentSpec, SpawnSummary};
use crate::systems::{
    advance_clock, age_compartments, apply_transitions, assign_zones, deflect_collisions,
    detect_interactions, passive_transitions, record_metrics, step_movement, CompartmentIndex,
    MetricsRecorder, SimClock, TickTransitions,
};

/// Consistency failures found by [`Simulation::check_invariants`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("agent {agent} is {actual} but indexed under {indexed:?}")]
    Membership {
        agent: u32,
        actual: Compartment,
        indexed: Vec<Compartment>,
    },
    #[error("{compartment} counter is {counted} but the index lists {indexed}")]
    Count {
        compartment: Compartment,
        counted: u32,
        indexed: usize,
    },
    #[error("agent {agent} has a non-unit heading ({x}, {y})")]
    Heading { agent: u32, x: f32, y: f32 },
    #[error("home cell {cell} holds {occupancy} agents")]
    Capacity { cell: usize, occupancy: u32 },
}

/// Read-only view of one agent, for renderers and tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentView {
    pub id: u32,
    pub compartment: Compartment,
    pub position: Vec2,
    pub direction: Vec2,
    pub zone: Option<ZoneKind>,
    pub home_cell: Option<usize>,
    pub asleep: bool,
    pub traits: Traits,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub final_time: SimTime,
    pub counts: CompartmentCounts,
    pub transitions: u64,
    pub snapshots: usize,
}

/// A configured simulation.
pub struct Simulation {
    world: World,
    schedule: Schedule,
    seed: u64,
}

impl Simulation {
    /// Validate the configuration, build the world and spawn the initial population.
    pub fn new(config: &Config, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut world = World::new();
        insert_resources(&mut world, config, seed);
        let summary = spawn_population(&mut world, &config.population);
        info!(seed, agents = summary.total_agents, "simulation created");

        Ok(Self {
            world,
            schedule: build_schedule(),
            seed,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Write snapshots to a metrics CSV as they are taken.
    pub fn attach_metrics_log(&mut self, log: MetricsLog) {
        self.world.insert_resource(log);
    }

    /// Append every applied transition to a JSONL log.
    pub fn attach_transition_log(&mut self, log: TransitionLog) {
        self.world.insert_resource(log);
    }

    /// Add one more agent; returns its id.
    pub fn spawn_agent(&mut self, spec: AgentSpec) -> AgentId {
        spawn_agent(&mut self.world, spec)
    }

    /// Run one tick. Returns false without doing anything once the run has ended.
    pub fn tick(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.schedule.run(&mut self.world);
        true
    }

    /// Run up to `n` ticks, stopping early at the end time.
    pub fn run_ticks(&mut self, n: u64) -> u64 {
        let mut ran = 0;
        while ran < n && self.tick() {
            ran += 1;
        }
        ran
    }

    /// Run until the clock reaches the configured end time.
    pub fn run(&mut self) -> RunSummary {
        while self.tick() {}
        let summary = self.summary();
        info!(
            ticks = summary.ticks,
            time = %summary.final_time,
            counts = %summary.counts,
            transitions = summary.transitions,
            "simulation finished"
        );
        summary
    }

    /// Flush any attached logs.
    pub fn flush(&mut self) -> Result<(), OutputError> {
        if let Some(mut log) = self.world.get_resource_mut::<MetricsLog>() {
            log.flush()?;
        }
        if let Some(mut log) = self.world.get_resource_mut::<TransitionLog>() {
            log.flush()?;
        }
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.clock().is_finished()
    }

    pub fn clock(&self) -> &SimClock {
        self.world.resource::<SimClock>()
    }

    pub fn counts(&self) -> CompartmentCounts {
        *self.world.resource::<CompartmentCounts>()
    }

    pub fn snapshots(&self) -> &[MetricsSnapshot] {
        self.world.resource::<MetricsRecorder>().snapshots()
    }

    /// Transitions applied during the most recent tick.
    pub fn last_transitions(&self) -> &TickTransitions {
        self.world.resource::<TickTransitions>()
    }

    pub fn home_grid(&self) -> &HomeGrid {
        self.world.resource::<HomeGrid>()
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            ticks: self.clock().tick(),
            final_time: self.clock().time(),
            counts: self.counts(),
            transitions: self.last_transitions().total,
            snapshots: self.snapshots().len(),
        }
    }

    /// All agents in ascending id order.
    pub fn agents(&mut self) -> Vec<AgentView> {
        let mut query = self
            .world
            .query::<(&AgentId, &Belief, &Motion, &ZoneState, &Traits)>();
        let mut agents: Vec<AgentView> = query
            .iter(&self.world)
            .map(|(id, belief, motion, state, traits)| AgentView {
                id: id.0,
                compartment: belief.compartment,
                position: motion.position,
                direction: motion.direction,
                zone: state.current,
                home_cell: state.home_cell,
                asleep: state.asleep,
                traits: traits.clone(),
            })
            .collect();
        agents.sort_by_key(|a| a.id);
        agents
    }

    /// Spawn summary of the current population.
    pub fn population(&mut self) -> SpawnSummary {
        crate::setup::get_spawn_summary(&mut self.world)
    }

    /// Check that membership, counters, headings and seating are consistent.
    pub fn check_invariants(&mut self) -> Result<(), InvariantViolation> {
        let index = self.world.resource::<CompartmentIndex>().clone();
        let counts = self.counts();

        for compartment in Compartment::ALL {
            if counts.get(compartment) as usize != index.len(compartment) {
                return Err(InvariantViolation::Count {
                    compartment,
                    counted: counts.get(compartment),
                    indexed: index.len(compartment),
                });
            }
        }

        let mut query = self.world.query::<(&AgentId, &Belief, &Motion)>();
        for (id, belief, motion) in query.iter(&self.world) {
            let indexed = index.compartments_of(*id);
            if indexed != [belief.compartment] {
                return Err(InvariantViolation::Membership {
                    agent: id.0,
                    actual: belief.compartment,
                    indexed,
                });
            }
            if !motion.direction.is_unit() {
                return Err(InvariantViolation::Heading {
                    agent: id.0,
                    x: motion.direction.x,
                    y: motion.direction.y,
                });
            }
        }

        let grid = self.home_grid();
        for cell in 0..grid.cell_count() {
            if grid.occupancy(cell) > grid.capacity() {
                return Err(InvariantViolation::Capacity {
                    cell,
                    occupancy: grid.occupancy(cell),
                });
            }
        }
        Ok(())
    }
}

/// Build the per-tick schedule
fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            advance_clock,
            assign_zones,
            step_movement,
            deflect_collisions,
            age_compartments,
            detect_interactions,
            passive_transitions,
            apply_transitions,
            record_metrics,
            write_transition_log,
        )
            .chain(),
    );
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PopulationConfig;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.population = "susceptible=20,believer=3,doubter=2,disinformant=1"
            .parse::<PopulationConfig>()
            .unwrap();
        config
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = small_config();
        config.simulation.ticks_per_second = 0.0;
        assert!(Simulation::new(&config, 1).is_err());
    }

    #[test]
    fn test_tick_keeps_invariants() {
        let mut sim = Simulation::new(&small_config(), 3).unwrap();
        assert!(sim.check_invariants().is_ok());
        for _ in 0..300 {
            assert!(sim.tick());
            if let Err(violation) = sim.check_invariants() {
                panic!("tick {}: {}", sim.clock().tick(), violation);
            }
        }
        assert_eq!(sim.counts().total(), 26);
    }

    #[test]
    fn test_run_ticks_stops_at_end() {
        let mut config = small_config();
        config.simulation.minutes_per_second = 600.0;
        let mut sim = Simulation::new(&config, 3).unwrap();

        let ran = sim.run_ticks(1_000);
        assert_eq!(ran, 144);
        assert!(sim.is_finished());
        assert!(!sim.tick());
        assert_eq!(sim.clock().tick(), 144);
    }

    #[test]
    fn test_agents_view_sorted() {
        let mut sim = Simulation::new(&small_config(), 5).unwrap();
        sim.run_ticks(5);
        let agents = sim.agents();
        assert_eq!(agents.len(), 26);
        assert!(agents.windows(2).all(|w| w[0].id < w[1].id));
        assert!(agents.iter().all(|a| a.asleep && a.zone == Some(ZoneKind::Home)));
    }

    #[test]
    fn test_spawn_agent_after_creation() {
        let mut sim = Simulation::new(&small_config(), 5).unwrap();
        let id = sim.spawn_agent(AgentSpec::new(Compartment::Recovered));
        assert_eq!(id, AgentId(26));
        assert_eq!(sim.counts().get(Compartment::Recovered), 1);
        assert_eq!(sim.population().total_agents, 27);
        assert!(sim.check_invariants().is_ok());
    }
}
