//! Zone Scheduler
//!
//! Maps the time of day to a target zone for every agent, relocates agents
//! whose target changed, manages home seating and sets movement speed.

use bevy_ecs::prelude::*;
use rand::Rng;
use tracing::debug;

use crate::components::agent::{AgentId, Motion, ZoneState};
use crate::components::world::{HomeGrid, ZoneKind, ZoneMap};
use crate::config::SimParams;
use crate::systems::clock::SimClock;
use crate::SimRng;

/// Daily schedule boundaries, in minutes since midnight
pub mod schedule_constants {
    pub const WAKE: u32 = 6 * 60;
    pub const MORNING_TOGGLE: u32 = 7 * 60;
    pub const WORK_START: u32 = 8 * 60;
    pub const WORK_END: u32 = 16 * 60;
    pub const EVENING_TOGGLE: u32 = 19 * 60;
    pub const EVENING_END: u32 = 21 * 60;
    pub const LUNCH_START: u32 = 12 * 60;
    pub const LUNCH_END: u32 = 12 * 60 + 30;
    /// Minutes at the top of each hour when work-zone agents move at full speed
    pub const HOURLY_BURST: u32 = 10;
    /// Dwell range on social media during a toggle window
    pub const SOCIAL_DWELL: (f64, f64) = (20.0, 30.0);
    /// Dwell range at home during a toggle window
    pub const HOME_DWELL: (f64, f64) = (5.0, 15.0);
}

use schedule_constants::*;

/// What the schedule asks of every agent at a given time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPhase {
    /// Everyone at home, motionless
    Sleep,
    Home,
    /// Each agent alternates between social media and home on its own timer
    Toggle,
    Work,
}

impl DayPhase {
    pub fn at(minute_of_day: u32) -> Self {
        match minute_of_day {
            m if m < WAKE => DayPhase::Sleep,
            m if m < MORNING_TOGGLE => DayPhase::Home,
            m if m < WORK_START => DayPhase::Toggle,
            m if m < WORK_END => DayPhase::Work,
            m if m < EVENING_TOGGLE => DayPhase::Home,
            m if m < EVENING_END => DayPhase::Toggle,
            _ => DayPhase::Home,
        }
    }
}

/// Speed multiplier for agents in the work zone.
pub fn work_speed_factor(minute_of_day: u32, lunch_rush: f32, desk: f32) -> f32 {
    if (LUNCH_START..LUNCH_END).contains(&minute_of_day) {
        lunch_rush
    } else if minute_of_day % 60 < HOURLY_BURST {
        1.0
    } else {
        desk
    }
}

/// Updates the social/home toggle and returns the zone the agent should be in.
fn toggle_target(state: &mut ZoneState, now: f64, rng: &mut impl Rng) -> ZoneKind {
    let due = state.next_switch_minute.map_or(true, |at| now >= at);
    if due {
        state.in_social = state.next_switch_minute.is_none() || !state.in_social;
        let (low, high) = if state.in_social { SOCIAL_DWELL } else { HOME_DWELL };
        state.next_switch_minute = Some(now + rng.gen_range(low..high));
    }
    if state.in_social {
        ZoneKind::Social
    } else {
        ZoneKind::Home
    }
}

/// System: assign each agent its scheduled zone
///
/// Agents are processed one at a time in id order so that seating in the
/// home grid never exceeds a cell's capacity.
pub fn assign_zones(
    clock: Res<SimClock>,
    zones: Res<ZoneMap>,
    params: Res<SimParams>,
    mut grid: ResMut<HomeGrid>,
    mut rng: ResMut<SimRng>,
    mut query: Query<(&AgentId, &mut ZoneState, &mut Motion)>,
) {
    let now = clock.minutes();
    let minute_of_day = clock.minute_of_day() as u32;
    let phase = DayPhase::at(minute_of_day);
    let rng = &mut rng.0;

    let mut agents: Vec<_> = query.iter_mut().collect();
    agents.sort_by_key(|(id, _, _)| **id);

    for (id, mut state, mut motion) in agents {
        let target = match phase {
            DayPhase::Sleep | DayPhase::Home => ZoneKind::Home,
            DayPhase::Work => ZoneKind::Work,
            DayPhase::Toggle => toggle_target(&mut state, now, rng),
        };
        if phase != DayPhase::Toggle {
            state.in_social = false;
            state.next_switch_minute = None;
        }
        state.asleep = phase == DayPhase::Sleep;

        let current = zones.zone_at(motion.position);

        if target != ZoneKind::Home {
            if let Some(cell) = state.home_cell.take() {
                grid.release(cell);
            }
        }

        if target == ZoneKind::Home && state.home_cell.is_none() {
            match grid.assign(rng) {
                Some(cell) => {
                    state.home_cell = Some(cell);
                    let seat = grid.cell_rect(cell).random_point(rng);
                    motion.teleport(seat, rng);
                    debug!(agent = id.0, cell, "seated at home");
                }
                None if current != Some(ZoneKind::Home) => {
                    // Grid full: wait inside the home zone and retry next tick
                    let spot = zones.padded(ZoneKind::Home).random_point(rng);
                    motion.teleport(spot, rng);
                }
                None => {}
            }
        } else if current != Some(target) {
            let spot = zones.padded(target).random_point(rng);
            motion.teleport(spot, rng);
            debug!(agent = id.0, zone = %target, "relocated");
        }

        state.current = zones.zone_at(motion.position);

        motion.speed = if state.asleep {
            0.0
        } else if state.current == Some(ZoneKind::Work) {
            motion.base_speed
                * work_speed_factor(
                    minute_of_day,
                    params.movement.lunch_rush_multiplier,
                    params.movement.desk_multiplier,
                )
        } else {
            motion.base_speed
        };
    }
}
