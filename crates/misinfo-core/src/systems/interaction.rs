//! Interaction Resolver
//!
//! Detects contacts between agents of interacting compartments, runs the
//! transition trials, and applies the resulting compartment changes.
//!
//! Resolution is collect-then-apply:
//! 1. `detect_interactions` visits sources in ascending id order. For each
//!    source the contact rules are tried in table order, and per rule only the
//!    first overlapping partner is tried. The first successful trial ends the
//!    source's turn.
//! 2. `passive_transitions` runs recovery and forgetting trials for agents
//!    that were not already claimed by a contact transition.
//! 3. `apply_transitions` applies the queue in ascending subject id order.
//!
//! An agent is the subject of at most one transition per tick.

use bevy_ecs::prelude::*;
use misinfo_events::{Compartment, CompartmentCounts, TransitionCause, TransitionEvent};
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::components::agent::{draw, AgentId, Belief, Exposure, Motion, TraitProfile, Traits, ZoneState};
use crate::components::world::{Vec2, ZoneKind};
use crate::config::{SimParams, TransmissionConfig};
use crate::systems::census::CompartmentIndex;
use crate::systems::clock::SimClock;
use crate::systems::movement::contact_box;
use crate::SimRng;

/// CDF of the Beta(2, 2) distribution: 3x^2 - 2x^3 on [0, 1].
pub fn beta22_cdf(x: f32) -> f32 {
    let x = x.clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

/// The agent exerting influence in a contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Influencer {
    pub compartment: Compartment,
    /// Influence, or persuasiveness for a Doubter talking a Believer round
    pub strength: f32,
}

/// Probability that `subject` changes compartment in a single trial.
///
/// Always within [0, 1]; non-finite intermediate values yield 0.
pub fn change_probability(
    tuning: &TransmissionConfig,
    subject: Compartment,
    traits: &Traits,
    misinformant_exposures: u32,
    influencer: Option<Influencer>,
    environment_factor: f32,
) -> f32 {
    let valence_prob = beta22_cdf(traits.emotional_valence);
    let influence = influencer.map_or(1.0, |i| i.strength);
    let skepticism_factor = 1.0 - traits.skepticism.clamp(0.0, 1.0);
    let misinfo_bonus = (tuning.misinfo_bonus_per_exposure * misinformant_exposures as f32)
        .min(tuning.misinfo_bonus_cap);

    let mut probability =
        tuning.base_rate * influence * valence_prob * skepticism_factor * environment_factor
            + misinfo_bonus;

    let resisted = influencer.is_some_and(|i| i.compartment.spreads_misinformation());
    if subject == Compartment::Doubter && resisted {
        probability *= tuning.doubter_resistance;
    }

    if probability.is_finite() {
        probability.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Which side of a contact changes compartment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSubject {
    Source,
    Partner,
}

/// One row of the contact transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactRule {
    pub source: Compartment,
    pub partner: Compartment,
    pub subject: RuleSubject,
    pub outcome: Compartment,
}

impl ContactRule {
    const fn new(
        source: Compartment,
        partner: Compartment,
        subject: RuleSubject,
        outcome: Compartment,
    ) -> Self {
        Self {
            source,
            partner,
            subject,
            outcome,
        }
    }
}

/// Contact rules in the order they are tried.
pub const CONTACT_RULES: [ContactRule; 7] = [
    ContactRule::new(Compartment::Susceptible, Compartment::Believer, RuleSubject::Source, Compartment::Exposed),
    ContactRule::new(Compartment::Susceptible, Compartment::Disinformant, RuleSubject::Source, Compartment::Exposed),
    ContactRule::new(Compartment::Exposed, Compartment::Believer, RuleSubject::Source, Compartment::Believer),
    ContactRule::new(Compartment::Exposed, Compartment::Doubter, RuleSubject::Source, Compartment::Doubter),
    ContactRule::new(Compartment::Exposed, Compartment::Disinformant, RuleSubject::Source, Compartment::Believer),
    ContactRule::new(Compartment::Doubter, Compartment::Believer, RuleSubject::Partner, Compartment::Recovered),
    ContactRule::new(Compartment::Doubter, Compartment::Disinformant, RuleSubject::Source, Compartment::Exposed),
];

/// Rules whose source is `compartment`, in table order.
pub fn rules_for(compartment: Compartment) -> impl Iterator<Item = &'static ContactRule> {
    CONTACT_RULES.iter().filter(move |rule| rule.source == compartment)
}

/// A transition decided this tick but not yet applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTransition {
    pub entity: Entity,
    pub agent_id: AgentId,
    pub from: Compartment,
    pub to: Compartment,
    pub influencer: Option<(AgentId, Compartment)>,
    pub cause: TransitionCause,
    pub probability: f32,
}

/// Resource: transitions decided this tick and the agents they claim
#[derive(Resource, Debug, Default)]
pub struct TransitionQueue {
    pending: Vec<PendingTransition>,
    claimed: BTreeSet<AgentId>,
}

impl TransitionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_claimed(&self, id: AgentId) -> bool {
        self.claimed.contains(&id)
    }

    /// Queues a transition unless its subject is already claimed this tick.
    pub fn claim(&mut self, transition: PendingTransition) -> bool {
        if !self.claimed.insert(transition.agent_id) {
            return false;
        }
        self.pending.push(transition);
        true
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Empties the queue, returning transitions in ascending subject id.
    pub fn drain_sorted(&mut self) -> Vec<PendingTransition> {
        self.claimed.clear();
        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_by_key(|t| t.agent_id);
        pending
    }
}

/// Resource: transitions applied during the current tick
#[derive(Resource, Debug, Default)]
pub struct TickTransitions {
    pub events: Vec<TransitionEvent>,
    /// Transitions applied since the run started
    pub total: u64,
}

impl TickTransitions {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Snapshot of an agent used during contact detection.
struct Contact<'a> {
    entity: Entity,
    id: AgentId,
    compartment: Compartment,
    position: Vec2,
    zone: Option<ZoneKind>,
    traits: &'a Traits,
    exposures: u32,
}

type ContactQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static AgentId,
        &'static Belief,
        &'static Motion,
        &'static Traits,
        &'static Exposure,
        &'static ZoneState,
    ),
>;

fn contact<'a>(query: &'a ContactQuery<'_, '_>, entity: Entity) -> Option<Contact<'a>> {
    let (id, belief, motion, traits, exposure, state) = query.get(entity).ok()?;
    Some(Contact {
        entity,
        id: *id,
        compartment: belief.compartment,
        position: motion.position,
        zone: state.current,
        traits,
        exposures: exposure.misinformant_exposures,
    })
}

/// System: run contact trials for every overlapping interacting pair
pub fn detect_interactions(
    params: Res<SimParams>,
    index: Res<CompartmentIndex>,
    mut queue: ResMut<TransitionQueue>,
    mut rng: ResMut<SimRng>,
    query: ContactQuery,
) {
    let rng = &mut rng.0;
    let tuning = &params.transmission;
    let movement = &params.movement;

    let mut sources: Vec<(AgentId, Entity)> = [
        Compartment::Susceptible,
        Compartment::Exposed,
        Compartment::Doubter,
    ]
    .into_iter()
    .flat_map(|c| index.members(c).iter().copied())
    .collect();
    sources.sort_by_key(|&(id, _)| id);

    for (source_id, source_entity) in sources {
        if queue.is_claimed(source_id) {
            continue;
        }
        let Some(source) = contact(&query, source_entity) else {
            continue;
        };
        if source.zone.is_none() {
            continue;
        }
        let source_box = contact_box(source.position, movement);

        for rule in rules_for(source.compartment) {
            let partner = index
                .members(rule.partner)
                .iter()
                .filter_map(|&(_, entity)| contact(&query, entity))
                .find(|p| {
                    p.zone.is_some() && source_box.intersects(&contact_box(p.position, movement))
                });
            let Some(partner) = partner else {
                continue;
            };

            let (subject, actor) = match rule.subject {
                RuleSubject::Source => (&source, &partner),
                RuleSubject::Partner => (&partner, &source),
            };
            if queue.is_claimed(subject.id) {
                continue;
            }
            let Some(zone) = subject.zone else {
                continue;
            };

            // Doubters talk Believers round with persuasiveness, not influence
            let strength = if rule.subject == RuleSubject::Partner {
                actor.traits.persuasiveness
            } else {
                actor.traits.influence
            };
            let probability = change_probability(
                tuning,
                subject.compartment,
                subject.traits,
                subject.exposures,
                Some(Influencer {
                    compartment: actor.compartment,
                    strength,
                }),
                tuning.environment_factor(zone),
            );

            if rng.gen_bool(probability as f64) {
                queue.claim(PendingTransition {
                    entity: subject.entity,
                    agent_id: subject.id,
                    from: subject.compartment,
                    to: rule.outcome,
                    influencer: Some((actor.id, actor.compartment)),
                    cause: TransitionCause::Contact,
                    probability,
                });
                break;
            }
        }
    }
}

/// System: spontaneous recovery and forgetting for unclaimed agents
pub fn passive_transitions(
    params: Res<SimParams>,
    clock: Res<SimClock>,
    index: Res<CompartmentIndex>,
    mut queue: ResMut<TransitionQueue>,
    mut rng: ResMut<SimRng>,
) {
    let rng = &mut rng.0;
    let recovery = params.transmission.spontaneous_recovery.clamp(0.0, 1.0);
    let forgetting = (clock.minutes_per_tick() / params.forgetting_minutes()).clamp(0.0, 1.0) as f32;

    for &(id, entity) in index.members(Compartment::Believer) {
        if queue.is_claimed(id) {
            continue;
        }
        let passive = |to, cause, probability| PendingTransition {
            entity,
            agent_id: id,
            from: Compartment::Believer,
            to,
            influencer: None,
            cause,
            probability,
        };
        if rng.gen_bool(recovery as f64) {
            queue.claim(passive(Compartment::Recovered, TransitionCause::Recovery, recovery));
        } else if rng.gen_bool(forgetting as f64) {
            queue.claim(passive(Compartment::Susceptible, TransitionCause::Forgetting, forgetting));
        }
    }

    for &(id, entity) in index.members(Compartment::Exposed) {
        if queue.is_claimed(id) {
            continue;
        }
        if rng.gen_bool(forgetting as f64) {
            queue.claim(PendingTransition {
                entity,
                agent_id: id,
                from: Compartment::Exposed,
                to: Compartment::Susceptible,
                influencer: None,
                cause: TransitionCause::Forgetting,
                probability: forgetting,
            });
        }
    }
}

/// System: apply queued transitions
///
/// The only writer of `Belief`; keeps the compartment index and counters in
/// step with every change. Position, skepticism and emotional valence carry
/// over; influence, persuasiveness and base speed are redrawn for the new
/// compartment.
pub fn apply_transitions(
    clock: Res<SimClock>,
    mut queue: ResMut<TransitionQueue>,
    mut index: ResMut<CompartmentIndex>,
    mut counts: ResMut<CompartmentCounts>,
    mut applied: ResMut<TickTransitions>,
    mut rng: ResMut<SimRng>,
    mut query: Query<(&mut Belief, &mut Traits, &mut Motion, &mut Exposure)>,
) {
    applied.events.clear();
    let rng = &mut rng.0;
    let time = clock.time();

    for transition in queue.drain_sorted() {
        let Ok((mut belief, mut traits, mut motion, mut exposure)) = query.get_mut(transition.entity) else {
            warn!(agent = transition.agent_id.0, "transition for missing agent dropped");
            continue;
        };
        if belief.compartment != transition.from {
            warn!(
                agent = transition.agent_id.0,
                expected = %transition.from,
                actual = %belief.compartment,
                "stale transition dropped"
            );
            continue;
        }

        belief.compartment = transition.to;
        index.transfer(transition.agent_id, transition.entity, transition.from, transition.to);
        counts.transfer(transition.from, transition.to);

        let profile = TraitProfile::for_compartment(transition.to);
        traits.influence = draw(profile.influence, rng);
        traits.persuasiveness = draw(profile.persuasiveness, rng);
        motion.base_speed = draw(profile.speed, rng);
        motion.speed = motion.base_speed;

        exposure.ticks_in_compartment = 0;
        let influencer_compartment = transition.influencer.map(|(_, c)| c);
        if influencer_compartment == Some(Compartment::Disinformant) {
            exposure.misinformant_exposures += 1;
        }

        debug!(
            agent = transition.agent_id.0,
            from = %transition.from,
            to = %transition.to,
            cause = ?transition.cause,
            probability = transition.probability,
            "transition"
        );

        applied.events.push(TransitionEvent {
            tick: clock.tick(),
            time,
            agent_id: transition.agent_id.0,
            from: transition.from,
            to: transition.to,
            influencer_id: transition.influencer.map(|(id, _)| id.0),
            influencer_compartment,
            cause: transition.cause,
            probability: transition.probability,
        });
        applied.total += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::setup::{insert_resources, spawn_agent, AgentSpec};

    fn tuning() -> TransmissionConfig {
        TransmissionConfig::default()
    }

    fn traits(skepticism: f32, emotional_valence: f32, influence: f32) -> Traits {
        Traits {
            skepticism,
            emotional_valence,
            influence,
            persuasiveness: 1.0,
        }
    }

    fn believer(strength: f32) -> Option<Influencer> {
        Some(Influencer {
            compartment: Compartment::Believer,
            strength,
        })
    }

    #[test]
    fn test_beta22_cdf() {
        assert_eq!(beta22_cdf(0.0), 0.0);
        assert_eq!(beta22_cdf(1.0), 1.0);
        assert!((beta22_cdf(0.5) - 0.5).abs() < 1e-6);
        assert!(beta22_cdf(0.25) < beta22_cdf(0.75));
        assert_eq!(beta22_cdf(-3.0), 0.0);
        assert_eq!(beta22_cdf(2.0), 1.0);
    }

    #[test]
    fn test_probability_formula() {
        let p = change_probability(
            &tuning(),
            Compartment::Susceptible,
            &traits(0.0, 1.0, 0.0),
            0,
            believer(3.0),
            1.0,
        );
        assert!((p - 0.6).abs() < 1e-6);

        let halved = change_probability(
            &tuning(),
            Compartment::Susceptible,
            &traits(0.5, 1.0, 0.0),
            0,
            believer(3.0),
            0.5,
        );
        assert!((halved - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_probability_defaults_to_unit_influence() {
        let p = change_probability(&tuning(), Compartment::Exposed, &traits(0.0, 1.0, 2.0), 0, None, 1.0);
        assert!((p - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_misinformant_bonus_is_capped() {
        let t = traits(1.0, 0.0, 1.0);
        let one = change_probability(&tuning(), Compartment::Susceptible, &t, 1, believer(1.0), 1.0);
        let many = change_probability(&tuning(), Compartment::Susceptible, &t, 40, believer(1.0), 1.0);
        assert!((one - 0.05).abs() < 1e-6);
        assert!((many - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_doubters_resist_misinformation() {
        let t = traits(0.0, 1.0, 1.0);
        let disinformant = Some(Influencer {
            compartment: Compartment::Disinformant,
            strength: 3.0,
        });
        let doubter = change_probability(&tuning(), Compartment::Doubter, &t, 0, disinformant, 1.0);
        let susceptible = change_probability(&tuning(), Compartment::Susceptible, &t, 0, disinformant, 1.0);
        assert!((doubter - susceptible * 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_probability_bounds() {
        let mut tuning = tuning();
        tuning.base_rate = 5.0;
        let grid = [0.0, 0.25, 0.5, 0.75, 1.0];
        for &skepticism in &grid {
            for &valence in &grid {
                for strength in [0.4, 1.0, 3.0] {
                    for exposures in [0, 3, 100] {
                        for env in [0.5, 0.7, 1.0] {
                            for c in Compartment::ALL {
                                let p = change_probability(
                                    &tuning,
                                    c,
                                    &traits(skepticism, valence, strength),
                                    exposures,
                                    believer(strength),
                                    env,
                                );
                                assert!((0.0..=1.0).contains(&p), "{p}");
                            }
                        }
                    }
                }
            }
        }

        let nan = change_probability(&tuning, Compartment::Susceptible, &traits(0.0, 1.0, 1.0), 0, believer(f32::NAN), 1.0);
        assert_eq!(nan, 0.0);
    }

    #[test]
    fn test_rule_table_order() {
        let doubter: Vec<_> = rules_for(Compartment::Doubter).collect();
        assert_eq!(doubter.len(), 2);
        assert_eq!(doubter[0].partner, Compartment::Believer);
        assert_eq!(doubter[0].subject, RuleSubject::Partner);
        assert_eq!(doubter[1].outcome, Compartment::Exposed);
        assert_eq!(rules_for(Compartment::Believer).count(), 0);
        assert_eq!(rules_for(Compartment::Exposed).count(), 3);
    }

    #[test]
    fn test_queue_claims_each_subject_once() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let mut queue = TransitionQueue::new();
        let pending = |to| PendingTransition {
            entity,
            agent_id: AgentId(4),
            from: Compartment::Exposed,
            to,
            influencer: None,
            cause: TransitionCause::Forgetting,
            probability: 1.0,
        };
        assert!(queue.claim(pending(Compartment::Susceptible)));
        assert!(!queue.claim(pending(Compartment::Believer)));
        assert_eq!(queue.len(), 1);

        let drained = queue.drain_sorted();
        assert_eq!(drained[0].to, Compartment::Susceptible);
        assert!(queue.is_empty());
        assert!(!queue.is_claimed(AgentId(4)));
    }

    // In the social zone, away from the other zones
    const MEETING_POINT: Vec2 = Vec2::new(300.0, 400.0);

    fn resolver_world(config: &Config, seed: u64) -> World {
        let mut world = World::new();
        insert_resources(&mut world, config, seed);
        world
    }

    fn resolve(world: &mut World) {
        let mut schedule = Schedule::default();
        schedule.add_systems((detect_interactions, passive_transitions, apply_transitions).chain());
        schedule.run(world);
    }

    fn compartment_of(world: &mut World, id: AgentId) -> Compartment {
        let mut query = world.query::<(&AgentId, &Belief)>();
        query
            .iter(world)
            .find(|(agent, _)| **agent == id)
            .map(|(_, belief)| belief.compartment)
            .unwrap()
    }

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.transmission.spontaneous_recovery = 0.0;
        config.transmission.forgetting_base_minutes = 1e12;
        config
    }

    fn spawn_pair(world: &mut World, susceptible: Traits, believer: Traits) -> (AgentId, AgentId) {
        let s = spawn_agent(
            world,
            AgentSpec::new(Compartment::Susceptible).at(MEETING_POINT).with_traits(susceptible),
        );
        let b = spawn_agent(
            world,
            AgentSpec::new(Compartment::Believer).at(MEETING_POINT).with_traits(believer),
        );
        (s, b)
    }

    #[test]
    fn test_guaranteed_transition_when_probability_clamps_to_one() {
        let mut config = quiet_config();
        config.transmission.base_rate = 0.5;
        config.transmission.social_factor = 1.0;

        for seed in 0..1000 {
            let mut world = resolver_world(&config, seed);
            let (s, b) = spawn_pair(&mut world, traits(0.0, 1.0, 1.0), traits(0.5, 0.5, 3.0));
            resolve(&mut world);

            assert_eq!(compartment_of(&mut world, s), Compartment::Exposed, "seed {seed}");
            assert_eq!(compartment_of(&mut world, b), Compartment::Believer);
            let events = &world.resource::<TickTransitions>().events;
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].probability, 1.0);
            assert_eq!(events[0].influencer_id, Some(b.0));
        }
    }

    #[test]
    fn test_transition_rate_matches_probability() {
        let mut config = quiet_config();
        config.transmission.social_factor = 1.0;

        let mut converted = 0;
        for seed in 0..1000 {
            let mut world = resolver_world(&config, seed);
            let (s, _) = spawn_pair(&mut world, traits(0.0, 1.0, 1.0), traits(0.5, 0.5, 3.0));
            resolve(&mut world);
            if compartment_of(&mut world, s) == Compartment::Exposed {
                converted += 1;
            }
        }
        // p = 0.2 * 3.0 * 1.0 * 1.0 * 1.0 = 0.6
        assert!((520..=680).contains(&converted), "{converted}");
    }

    #[test]
    fn test_subject_changes_at_most_once_per_tick() {
        let mut config = quiet_config();
        config.transmission.base_rate = 100.0;
        config.transmission.social_factor = 1.0;
        let mut world = resolver_world(&config, 1);

        let open = traits(0.0, 1.0, 1.0);
        let believer = spawn_agent(
            &mut world,
            AgentSpec::new(Compartment::Believer).at(MEETING_POINT).with_traits(open.clone()),
        );
        let first = spawn_agent(
            &mut world,
            AgentSpec::new(Compartment::Doubter).at(MEETING_POINT).with_traits(open.clone()),
        );
        let second = spawn_agent(
            &mut world,
            AgentSpec::new(Compartment::Doubter).at(MEETING_POINT).with_traits(open),
        );
        resolve(&mut world);

        assert_eq!(compartment_of(&mut world, believer), Compartment::Recovered);
        assert_eq!(compartment_of(&mut world, first), Compartment::Doubter);
        assert_eq!(compartment_of(&mut world, second), Compartment::Doubter);

        let events = &world.resource::<TickTransitions>().events;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].influencer_id, Some(first.0));
        assert_eq!(world.resource::<CompartmentCounts>().get(Compartment::Recovered), 1);
        assert_eq!(world.resource::<CompartmentCounts>().get(Compartment::Believer), 0);
    }

    #[test]
    fn test_disinformant_contact_counts_exposure_and_keeps_traits() {
        let mut config = quiet_config();
        config.transmission.base_rate = 100.0;
        let mut world = resolver_world(&config, 2);

        let subject_traits = traits(0.1, 0.9, 0.7);
        let s = spawn_agent(
            &mut world,
            AgentSpec::new(Compartment::Susceptible)
                .at(MEETING_POINT)
                .with_traits(subject_traits.clone()),
        );
        spawn_agent(&mut world, AgentSpec::new(Compartment::Disinformant).at(MEETING_POINT));
        resolve(&mut world);

        let mut query = world.query::<(&AgentId, &Belief, &Traits, &Exposure, &Motion)>();
        let (_, belief, traits, exposure, motion) =
            query.iter(&world).find(|(id, ..)| **id == s).unwrap();
        assert_eq!(belief.compartment, Compartment::Exposed);
        assert_eq!(exposure.misinformant_exposures, 1);
        assert_eq!(exposure.ticks_in_compartment, 0);
        assert_eq!(traits.skepticism, subject_traits.skepticism);
        assert_eq!(traits.emotional_valence, subject_traits.emotional_valence);
        assert_eq!(motion.position, MEETING_POINT);

        let index = world.resource::<CompartmentIndex>();
        assert_eq!(index.compartments_of(s), vec![Compartment::Exposed]);
        assert!(world.resource::<TickTransitions>().events[0].caused_by_disinformant());
    }

    #[test]
    fn test_agents_outside_zones_do_not_interact() {
        let mut config = quiet_config();
        config.transmission.base_rate = 100.0;
        let mut world = resolver_world(&config, 3);

        // the gap between the home and work zones
        let gap = Vec2::new(460.0, 287.0);
        assert_eq!(world.resource::<crate::components::world::ZoneMap>().zone_at(gap), None);
        let s = spawn_agent(&mut world, AgentSpec::new(Compartment::Susceptible).at(gap));
        spawn_agent(&mut world, AgentSpec::new(Compartment::Believer).at(gap));
        resolve(&mut world);

        assert_eq!(compartment_of(&mut world, s), Compartment::Susceptible);
        assert!(world.resource::<TickTransitions>().events.is_empty());
    }

    #[test]
    fn test_distant_agents_do_not_interact() {
        let mut config = quiet_config();
        config.transmission.base_rate = 100.0;
        let mut world = resolver_world(&config, 4);

        let s = spawn_agent(&mut world, AgentSpec::new(Compartment::Susceptible).at(MEETING_POINT));
        spawn_agent(
            &mut world,
            AgentSpec::new(Compartment::Believer).at(Vec2::new(MEETING_POINT.x + 13.0, MEETING_POINT.y)),
        );
        resolve(&mut world);

        assert_eq!(compartment_of(&mut world, s), Compartment::Susceptible);
    }

    #[test]
    fn test_passive_recovery_and_forgetting() {
        let mut config = Config::default();
        config.transmission.spontaneous_recovery = 1.0;
        config.transmission.forgetting_base_minutes = 1e-9;
        config.transmission.forgetting_valence_minutes = 0.0;
        let mut world = resolver_world(&config, 5);

        let b = spawn_agent(&mut world, AgentSpec::new(Compartment::Believer).at(Vec2::new(100.0, 100.0)));
        let e = spawn_agent(&mut world, AgentSpec::new(Compartment::Exposed).at(Vec2::new(300.0, 200.0)));
        resolve(&mut world);

        assert_eq!(compartment_of(&mut world, b), Compartment::Recovered);
        assert_eq!(compartment_of(&mut world, e), Compartment::Susceptible);

        let events = &world.resource::<TickTransitions>().events;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].cause, TransitionCause::Recovery);
        assert_eq!(events[1].cause, TransitionCause::Forgetting);
        assert_eq!(events[1].influencer_id, None);
    }
}
