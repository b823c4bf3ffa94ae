//! Movement System
//!
//! Moves agents along their headings, keeps them inside their zone or home
//! cell, and deflects agents that bump into others of their own compartment.

use bevy_ecs::prelude::*;
use misinfo_events::Compartment;

use crate::components::agent::{
    wander_probability, AgentId, Belief, Exposure, Motion, Traits, ZoneState,
};
use crate::components::world::{HomeGrid, Rect, Vec2, ZoneMap};
use crate::config::{MovementConfig, SimParams};
use crate::SimRng;

/// Region an agent must stay inside this tick.
pub fn movement_bounds(state: &ZoneState, zones: &ZoneMap, grid: &HomeGrid) -> Rect {
    match (state.home_cell, state.current) {
        (Some(cell), _) => grid.cell_rect(cell),
        (None, Some(zone)) => zones.rect(zone),
        (None, None) => zones.world,
    }
}

/// Axis-aligned contact box centred on the agent.
pub fn contact_box(position: Vec2, movement: &MovementConfig) -> Rect {
    Rect::centered(position, movement.contact_width, movement.contact_height)
}

/// System: advance every awake agent one step and bounce it off its bounds
pub fn step_movement(
    params: Res<SimParams>,
    zones: Res<ZoneMap>,
    grid: Res<HomeGrid>,
    mut rng: ResMut<SimRng>,
    mut query: Query<(&AgentId, &Belief, &Traits, &Exposure, &ZoneState, &mut Motion)>,
) {
    let rng = &mut rng.0;
    let mut agents: Vec<_> = query.iter_mut().collect();
    agents.sort_by_key(|(id, ..)| **id);

    for (_, belief, traits, exposure, state, mut motion) in agents {
        if state.asleep {
            continue;
        }
        let bounds = movement_bounds(state, &zones, &grid);
        let anchor = state.current.map(|_| bounds.center());
        let wander = wander_probability(belief.compartment, traits, exposure);

        motion.step_movement(wander, anchor, params.movement.centre_bias, rng);
        motion.bounce(&bounds, rng);
    }
}

/// System: deflect agents off the first overlapping agent of the same compartment
///
/// Pairs from different compartments are left to the interaction resolver.
pub fn deflect_collisions(
    params: Res<SimParams>,
    mut rng: ResMut<SimRng>,
    mut query: Query<(Entity, &AgentId, &Belief, &ZoneState, &mut Motion)>,
) {
    let mut awake: Vec<(AgentId, Entity, Compartment, Vec2)> = query
        .iter()
        .filter(|(_, _, _, state, _)| !state.asleep)
        .map(|(entity, id, belief, _, motion)| (*id, entity, belief.compartment, motion.position))
        .collect();
    awake.sort_by_key(|&(id, ..)| id);

    let rng = &mut rng.0;
    for &(id, entity, compartment, position) in &awake {
        let own_box = contact_box(position, &params.movement);
        let other = awake.iter().find(|&&(other_id, _, other_compartment, other_pos)| {
            other_id != id
                && other_compartment == compartment
                && own_box.intersects(&contact_box(other_pos, &params.movement))
        });
        if let Some(&(_, _, _, other_pos)) = other {
            if let Ok((_, _, _, _, mut motion)) = query.get_mut(entity) {
                motion.resolve_collision(other_pos, rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::world::ZoneKind;
    use crate::config::Config;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn movement_world() -> World {
        let config = Config::default();
        let zones = ZoneMap {
            world: config.zones.world(),
            home: config.zones.home,
            work: config.zones.work,
            social: config.zones.social,
            padding: config.zones.padding,
        };
        let grid = HomeGrid::new(zones.padded(ZoneKind::Home), 5, 6, 3);
        let mut world = World::new();
        world.insert_resource(SimParams::from_config(&config));
        world.insert_resource(SimRng(SmallRng::seed_from_u64(21)));
        world.insert_resource(zones);
        world.insert_resource(grid);
        world
    }

    fn traits() -> Traits {
        Traits {
            skepticism: 0.5,
            emotional_valence: 0.5,
            influence: 1.0,
            persuasiveness: 0.5,
        }
    }

    fn spawn(world: &mut World, id: u32, compartment: Compartment, state: ZoneState, position: Vec2) -> Entity {
        world
            .spawn((
                AgentId(id),
                Belief { compartment },
                traits(),
                Exposure::default(),
                state,
                Motion::new(position, Vec2::new(1.0, 0.0), 4.0),
            ))
            .id()
    }

    #[test]
    fn test_seated_agent_stays_in_cell() {
        let mut world = movement_world();
        let cell_rect = world.resource::<HomeGrid>().cell_rect(0);
        let state = ZoneState {
            current: Some(ZoneKind::Home),
            home_cell: Some(0),
            ..Default::default()
        };
        let agent = spawn(&mut world, 0, Compartment::Susceptible, state, cell_rect.center());

        let mut schedule = Schedule::default();
        schedule.add_systems(step_movement);
        for _ in 0..500 {
            schedule.run(&mut world);
            let motion = world.get::<Motion>(agent).unwrap();
            assert!(cell_rect.strictly_contains(motion.position));
            assert!(motion.direction.is_unit());
        }
    }

    #[test]
    fn test_sleeping_agent_does_not_move() {
        let mut world = movement_world();
        let state = ZoneState {
            current: Some(ZoneKind::Home),
            asleep: true,
            ..Default::default()
        };
        let start = Vec2::new(100.0, 100.0);
        let agent = spawn(&mut world, 0, Compartment::Believer, state, start);

        let mut schedule = Schedule::default();
        schedule.add_systems(step_movement);
        schedule.run(&mut world);

        assert_eq!(world.get::<Motion>(agent).unwrap().position, start);
    }

    #[test]
    fn test_same_compartment_agents_deflect() {
        let mut world = movement_world();
        let state = ZoneState {
            current: Some(ZoneKind::Social),
            ..Default::default()
        };
        let left = spawn(&mut world, 0, Compartment::Recovered, state.clone(), Vec2::new(300.0, 400.0));
        let right = spawn(&mut world, 1, Compartment::Recovered, state.clone(), Vec2::new(305.0, 400.0));
        let stranger = spawn(&mut world, 2, Compartment::Believer, state, Vec2::new(296.0, 400.0));

        let mut schedule = Schedule::default();
        schedule.add_systems(deflect_collisions);
        schedule.run(&mut world);

        assert!(world.get::<Motion>(left).unwrap().direction.x < 0.0);
        assert!(world.get::<Motion>(right).unwrap().direction.is_unit());
        assert_eq!(world.get::<Motion>(stranger).unwrap().direction, Vec2::new(1.0, 0.0));
    }
}
