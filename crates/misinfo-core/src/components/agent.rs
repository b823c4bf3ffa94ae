//! Agent Components
//!
//! Components for individual agents: identity, belief state, motion, traits.

use bevy_ecs::prelude::*;
use misinfo_events::Compartment;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::world::{random_unit_vector, Rect, Vec2, ZoneKind, EDGE_MARGIN};

/// Unique identifier for an agent, stable across compartment changes.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

/// The agent's current belief state.
///
/// Only the interaction resolver writes this, together with the compartment
/// index and counters.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Belief {
    pub compartment: Compartment,
}

/// Position and heading.
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct Motion {
    pub position: Vec2,
    /// Unit heading; never the zero vector.
    pub direction: Vec2,
    /// Effective speed this tick, after schedule modulation.
    pub speed: f32,
    /// Speed drawn from the compartment profile.
    pub base_speed: f32,
}

impl Motion {
    pub fn new(position: Vec2, direction: Vec2, base_speed: f32) -> Self {
        Self {
            position,
            direction: direction.try_normalize().unwrap_or(Vec2::new(1.0, 0.0)),
            speed: base_speed,
            base_speed,
        }
    }

    /// Points the agent along `direction`, substituting a random heading if it is degenerate.
    pub fn steer(&mut self, direction: Vec2, rng: &mut impl Rng) {
        self.direction = direction
            .try_normalize()
            .unwrap_or_else(|| random_unit_vector(rng));
    }

    /// Advances one tick along the current heading.
    ///
    /// With probability `wander_probability` the heading is re-randomized
    /// afterwards. If `anchor` is given (the centre of the agent's zone) and the
    /// agent is more than 20 units away, the new heading leans toward it.
    pub fn step_movement(
        &mut self,
        wander_probability: f64,
        anchor: Option<Vec2>,
        centre_bias: f32,
        rng: &mut impl Rng,
    ) {
        self.position = self.position + self.direction * self.speed;

        if rng.gen_bool(wander_probability.clamp(0.0, 1.0)) {
            let random = Vec2::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0));
            let heading = match anchor.map(|a| a - self.position) {
                Some(to_anchor) if to_anchor.length() >= 20.0 => {
                    let pull = to_anchor.try_normalize().unwrap_or(Vec2::ZERO);
                    pull * centre_bias + random
                }
                _ => random,
            };
            self.steer(heading, rng);
        }
    }

    /// Keeps the agent strictly inside `bounds`.
    ///
    /// Crossing an edge clamps the position back inside and turns the matching
    /// heading component away from that edge. Returns true if a bounce occurred.
    pub fn bounce(&mut self, bounds: &Rect, rng: &mut impl Rng) -> bool {
        let inner = bounds.inset(EDGE_MARGIN);
        let mut bounced = false;

        if self.position.x <= inner.left() {
            self.position.x = inner.left();
            self.direction.x = self.direction.x.abs();
            bounced = true;
        } else if self.position.x >= inner.right() {
            self.position.x = inner.right();
            self.direction.x = -self.direction.x.abs();
            bounced = true;
        }

        if self.position.y <= inner.top() {
            self.position.y = inner.top();
            self.direction.y = self.direction.y.abs();
            bounced = true;
        } else if self.position.y >= inner.bottom() {
            self.position.y = inner.bottom();
            self.direction.y = -self.direction.y.abs();
            bounced = true;
        }

        if bounced {
            self.steer(self.direction, rng);
        }
        bounced
    }

    /// Deflects off another agent at `other`.
    ///
    /// The heading is reflected about the normal from `other` to this agent;
    /// coincident agents use a random normal instead.
    pub fn resolve_collision(&mut self, other: Vec2, rng: &mut impl Rng) {
        let mut normal = self.position - other;
        if normal.try_normalize().is_none() {
            normal = random_unit_vector(rng);
        }
        if self.direction.try_normalize().is_none() {
            self.direction = random_unit_vector(rng);
        }
        let reflected = self.direction.reflect(normal).unwrap_or(self.direction);
        self.steer(reflected, rng);
    }

    /// Moves to `position` with a fresh random heading.
    pub fn teleport(&mut self, position: Vec2, rng: &mut impl Rng) {
        self.position = position;
        self.direction = random_unit_vector(rng);
    }
}

/// Agent personality traits. All in [0, 1] except influence and persuasiveness.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traits {
    /// Resistance to adopting a belief
    pub skepticism: f32,
    /// Receptiveness to emotionally charged content
    pub emotional_valence: f32,
    /// Strength as an influencer, 0.4 to 3.0 depending on compartment
    pub influence: f32,
    /// Doubters' ability to talk Believers out of a belief
    pub persuasiveness: f32,
}

/// Per-agent exposure history.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exposure {
    /// Transitions caused by contact with a Disinformant
    pub misinformant_exposures: u32,
    /// Ticks spent in the current compartment
    pub ticks_in_compartment: u32,
}

impl Exposure {
    /// Internal conflict of an Exposed agent, ramping to 1.0 over 90 ticks.
    pub fn conflict_level(&self) -> f32 {
        (self.ticks_in_compartment as f32 / 90.0).min(1.0)
    }
}

/// Scheduling state for the diurnal zone rotation.
#[derive(Component, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoneState {
    /// Zone containing the agent after the last scheduling pass
    pub current: Option<ZoneKind>,
    /// Whether the agent is on social media during a toggle window
    pub in_social: bool,
    /// Simulated minute at which the social/home toggle flips next
    pub next_switch_minute: Option<f64>,
    /// Seat in the home grid, while at home
    pub home_cell: Option<usize>,
    /// True during the overnight sleep interval
    pub asleep: bool,
}

/// Trait ranges used when an agent enters a compartment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraitProfile {
    pub skepticism: (f32, f32),
    pub influence: (f32, f32),
    pub persuasiveness: (f32, f32),
    pub speed: (f32, f32),
}

impl TraitProfile {
    pub fn for_compartment(compartment: Compartment) -> Self {
        match compartment {
            Compartment::Susceptible => Self {
                skepticism: (0.2, 0.8),
                influence: (0.4, 1.0),
                persuasiveness: (0.3, 1.0),
                speed: (2.0, 4.0),
            },
            Compartment::Exposed => Self {
                skepticism: (0.2, 0.8),
                influence: (0.5, 1.5),
                persuasiveness: (0.3, 1.0),
                speed: (1.0, 3.0),
            },
            Compartment::Believer => Self {
                skepticism: (0.2, 0.8),
                influence: (0.5, 2.0),
                persuasiveness: (0.3, 1.0),
                speed: (2.0, 4.0),
            },
            Compartment::Doubter => Self {
                skepticism: (0.5, 0.9),
                influence: (0.5, 1.5),
                persuasiveness: (0.5, 1.5),
                speed: (1.0, 3.0),
            },
            Compartment::Recovered => Self {
                skepticism: (0.2, 0.8),
                influence: (0.4, 1.0),
                persuasiveness: (0.3, 1.0),
                speed: (1.0, 3.0),
            },
            Compartment::Disinformant => Self {
                skepticism: (0.0, 0.2),
                influence: (1.5, 3.0),
                persuasiveness: (0.3, 1.0),
                speed: (2.0, 4.0),
            },
        }
    }
}

/// Uniform draw from `(low, high)`; returns `low` for an empty range.
pub fn draw(range: (f32, f32), rng: &mut impl Rng) -> f32 {
    let (low, high) = range;
    if high > low {
        rng.gen_range(low..high)
    } else {
        low
    }
}

/// Probability per tick that an agent re-randomizes its heading.
///
/// More skeptical agents wander less; Exposed agents wander more as their
/// internal conflict grows.
pub fn wander_probability(compartment: Compartment, traits: &Traits, exposure: &Exposure) -> f64 {
    let skepticism = traits.skepticism.clamp(0.0, 1.0) as f64;
    match compartment {
        Compartment::Susceptible => 0.03 + 0.02 * (1.0 - skepticism),
        Compartment::Exposed => 0.02 + 0.03 * exposure.conflict_level() as f64,
        Compartment::Believer => 0.01,
        Compartment::Doubter => 0.01 + 0.02 * (1.0 - skepticism),
        Compartment::Recovered => 0.01,
        Compartment::Disinformant => 0.02,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn moving_right(position: Vec2) -> Motion {
        Motion::new(position, Vec2::new(1.0, 0.0), 3.0)
    }

    #[test]
    fn test_step_without_wander() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut motion = moving_right(Vec2::new(10.0, 10.0));
        motion.step_movement(0.0, None, 0.3, &mut rng);
        assert_eq!(motion.position, Vec2::new(13.0, 10.0));
        assert_eq!(motion.direction, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_step_with_wander_keeps_unit_heading() {
        let mut rng = SmallRng::seed_from_u64(2);
        let mut motion = moving_right(Vec2::new(10.0, 10.0));
        for _ in 0..100 {
            motion.step_movement(1.0, Some(Vec2::new(200.0, 200.0)), 0.3, &mut rng);
            assert!(motion.direction.is_unit());
        }
    }

    #[test]
    fn test_bounce_right_edge() {
        let mut rng = SmallRng::seed_from_u64(3);
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut motion = moving_right(Vec2::new(105.0, 50.0));

        assert!(motion.bounce(&bounds, &mut rng));
        assert!(bounds.strictly_contains(motion.position));
        assert!(motion.direction.x < 0.0);
        assert!(motion.direction.is_unit());
    }

    #[test]
    fn test_bounce_corner() {
        let mut rng = SmallRng::seed_from_u64(4);
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut motion = Motion::new(Vec2::new(-20.0, -20.0), Vec2::new(-1.0, -1.0), 2.0);

        assert!(motion.bounce(&bounds, &mut rng));
        assert!(bounds.strictly_contains(motion.position));
        assert!(motion.direction.x > 0.0 && motion.direction.y > 0.0);
        assert!(motion.direction.is_unit());
    }

    #[test]
    fn test_bounce_inside_is_noop() {
        let mut rng = SmallRng::seed_from_u64(5);
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut motion = moving_right(Vec2::new(50.0, 50.0));
        assert!(!motion.bounce(&bounds, &mut rng));
        assert_eq!(motion.position, Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_collision_reflects_away() {
        let mut rng = SmallRng::seed_from_u64(6);
        let mut motion = moving_right(Vec2::new(10.0, 0.0));
        motion.resolve_collision(Vec2::new(12.0, 0.0), &mut rng);
        assert!(motion.direction.x < 0.0);
        assert!(motion.direction.is_unit());
    }

    #[test]
    fn test_collision_coincident_positions() {
        let mut rng = SmallRng::seed_from_u64(8);
        for _ in 0..200 {
            let mut motion = moving_right(Vec2::new(5.0, 5.0));
            motion.resolve_collision(Vec2::new(5.0, 5.0), &mut rng);
            assert!(motion.direction.is_unit());
            assert!(motion.direction.try_normalize().is_some());
        }
    }

    #[test]
    fn test_collision_repairs_zero_heading() {
        let mut rng = SmallRng::seed_from_u64(9);
        let mut motion = moving_right(Vec2::new(0.0, 0.0));
        motion.direction = Vec2::ZERO;
        motion.resolve_collision(Vec2::new(0.0, 0.0), &mut rng);
        assert!(motion.direction.is_unit());
    }

    #[test]
    fn test_conflict_level_ramps() {
        let mut exposure = Exposure::default();
        assert_eq!(exposure.conflict_level(), 0.0);
        exposure.ticks_in_compartment = 45;
        assert!((exposure.conflict_level() - 0.5).abs() < 1e-6);
        exposure.ticks_in_compartment = 1000;
        assert_eq!(exposure.conflict_level(), 1.0);
    }

    #[test]
    fn test_wander_probability_range() {
        let exposure = Exposure { misinformant_exposures: 0, ticks_in_compartment: 90 };
        for skepticism in [0.0, 0.5, 1.0] {
            let traits = Traits {
                skepticism,
                emotional_valence: 0.5,
                influence: 1.0,
                persuasiveness: 1.0,
            };
            for c in Compartment::ALL {
                let p = wander_probability(c, &traits, &exposure);
                assert!((0.01..=0.050_001).contains(&p), "{c}: {p}");
            }
        }
    }

    #[test]
    fn test_skeptical_susceptibles_wander_less() {
        let exposure = Exposure::default();
        let mut traits = Traits {
            skepticism: 0.9,
            emotional_valence: 0.5,
            influence: 1.0,
            persuasiveness: 1.0,
        };
        let skeptical = wander_probability(Compartment::Susceptible, &traits, &exposure);
        traits.skepticism = 0.1;
        let credulous = wander_probability(Compartment::Susceptible, &traits, &exposure);
        assert!(skeptical < credulous);
    }

    #[test]
    fn test_profiles_are_well_formed() {
        for c in Compartment::ALL {
            let p = TraitProfile::for_compartment(c);
            assert!(p.influence.0 >= 0.4 && p.influence.1 <= 3.0);
            assert!(p.skepticism.0 >= 0.0 && p.skepticism.1 <= 1.0);
            assert!(p.speed.0 < p.speed.1);
        }
        let disinformant = TraitProfile::for_compartment(Compartment::Disinformant);
        let susceptible = TraitProfile::for_compartment(Compartment::Susceptible);
        assert!(disinformant.influence.0 > susceptible.influence.1);
    }
}
