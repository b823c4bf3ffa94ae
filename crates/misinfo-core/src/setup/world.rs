//! World Setup
//!
//! Builds the zone layout and inserts every shared resource the systems need.

use bevy_ecs::prelude::*;
use misinfo_events::CompartmentCounts;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::components::world::{HomeGrid, ZoneKind, ZoneMap};
use crate::config::{Config, SimParams, ZoneConfig};
use crate::systems::{CompartmentIndex, MetricsRecorder, SimClock, TickTransitions, TransitionQueue};
use crate::SimRng;

/// Create the zone map from configuration
pub fn create_zone_map(zones: &ZoneConfig) -> ZoneMap {
    ZoneMap {
        world: zones.world(),
        home: zones.home,
        work: zones.work,
        social: zones.social,
        padding: zones.padding,
    }
}

/// Create the home seating grid over the padded home interior
pub fn create_home_grid(zone_map: &ZoneMap, zones: &ZoneConfig) -> HomeGrid {
    HomeGrid::new(
        zone_map.padded(ZoneKind::Home),
        zones.grid_rows,
        zones.grid_cols,
        zones.cell_capacity,
    )
}

/// Insert all simulation resources into a fresh world
pub fn insert_resources(world: &mut World, config: &Config, seed: u64) {
    let sim = &config.simulation;
    let zone_map = create_zone_map(&config.zones);
    let grid = create_home_grid(&zone_map, &config.zones);

    world.insert_resource(SimRng(SmallRng::seed_from_u64(seed)));
    world.insert_resource(SimClock::new(
        sim.start_minute,
        sim.minutes_per_tick(),
        sim.start_minute + sim.duration.minutes(),
    ));
    world.insert_resource(SimParams::from_config(config));
    world.insert_resource(zone_map);
    world.insert_resource(grid);
    world.insert_resource(CompartmentIndex::new());
    world.insert_resource(CompartmentCounts::new());
    world.insert_resource(TransitionQueue::new());
    world.insert_resource(TickTransitions::new());
    world.insert_resource(MetricsRecorder::new(sim.start_minute, sim.metrics_interval_minutes));
}
