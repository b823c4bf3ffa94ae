//! Clock System
//!
//! Advances simulated time by a fixed number of minutes per tick.

use bevy_ecs::prelude::*;
use misinfo_events::{SimTime, MINUTES_PER_DAY, MINUTES_PER_HOUR};

/// Simulated clock resource.
///
/// Time is held as fractional minutes since midnight of day 1 and only ever
/// moves forward.
#[derive(Resource, Debug, Clone)]
pub struct SimClock {
    minutes: f64,
    minutes_per_tick: f64,
    end_minutes: f64,
    tick: u64,
}

impl SimClock {
    pub fn new(start_minute: f64, minutes_per_tick: f64, end_minutes: f64) -> Self {
        Self {
            minutes: start_minute.max(0.0),
            minutes_per_tick: minutes_per_tick.max(0.0),
            end_minutes,
            tick: 0,
        }
    }

    /// Moves the clock forward one tick. Does nothing once the end time is reached.
    pub fn advance(&mut self) {
        if self.is_finished() {
            return;
        }
        self.tick += 1;
        self.minutes += self.minutes_per_tick;
    }

    /// Number of completed ticks.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Fractional minutes since midnight of day 1.
    pub fn minutes(&self) -> f64 {
        self.minutes
    }

    pub fn minutes_per_tick(&self) -> f64 {
        self.minutes_per_tick
    }

    pub fn end_minutes(&self) -> f64 {
        self.end_minutes
    }

    pub fn time(&self) -> SimTime {
        SimTime::from_minutes(self.minutes)
    }

    /// Fractional minutes since midnight of the current day.
    pub fn minute_of_day(&self) -> f64 {
        self.minutes.rem_euclid(MINUTES_PER_DAY as f64)
    }

    pub fn hour(&self) -> u32 {
        (self.minute_of_day() as u32) / MINUTES_PER_HOUR
    }

    pub fn minute(&self) -> u32 {
        (self.minute_of_day() as u32) % MINUTES_PER_HOUR
    }

    pub fn is_finished(&self) -> bool {
        self.minutes >= self.end_minutes
    }
}

/// System: advance the clock by one tick
pub fn advance_clock(mut clock: ResMut<SimClock>) {
    clock.advance();
}
