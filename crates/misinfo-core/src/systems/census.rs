//! Census
//!
//! Compartment-indexed membership lists and per-compartment dwell counters.

use bevy_ecs::prelude::*;
use misinfo_events::Compartment;

use crate::components::agent::{AgentId, Exposure};

/// Resource mapping each compartment to its members, sorted by agent id.
///
/// Built when agents are spawned and updated only by `apply_transitions`, so
/// it always agrees with every agent's `Belief`.
#[derive(Resource, Debug, Default, Clone)]
pub struct CompartmentIndex {
    members: [Vec<(AgentId, Entity)>; 6],
}

impl CompartmentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Members of a compartment in ascending id order.
    pub fn members(&self, compartment: Compartment) -> &[(AgentId, Entity)] {
        &self.members[compartment.index()]
    }

    pub fn len(&self, compartment: Compartment) -> usize {
        self.members[compartment.index()].len()
    }

    pub fn total(&self) -> usize {
        self.members.iter().map(Vec::len).sum()
    }

    pub fn contains(&self, compartment: Compartment, id: AgentId) -> bool {
        self.members[compartment.index()]
            .binary_search_by_key(&id, |&(member, _)| member)
            .is_ok()
    }

    /// Compartments listing this agent. Exactly one for a consistent index.
    pub fn compartments_of(&self, id: AgentId) -> Vec<Compartment> {
        Compartment::ALL
            .into_iter()
            .filter(|&c| self.contains(c, id))
            .collect()
    }

    /// Adds an agent, keeping the list sorted. Returns false if already present.
    pub fn insert(&mut self, compartment: Compartment, id: AgentId, entity: Entity) -> bool {
        let list = &mut self.members[compartment.index()];
        match list.binary_search_by_key(&id, |&(member, _)| member) {
            Ok(_) => false,
            Err(pos) => {
                list.insert(pos, (id, entity));
                true
            }
        }
    }

    /// Removes an agent. Returns false if it was not listed.
    pub fn remove(&mut self, compartment: Compartment, id: AgentId) -> bool {
        let list = &mut self.members[compartment.index()];
        match list.binary_search_by_key(&id, |&(member, _)| member) {
            Ok(pos) => {
                list.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Moves an agent between lists.
    pub fn transfer(&mut self, id: AgentId, entity: Entity, from: Compartment, to: Compartment) {
        self.remove(from, id);
        self.insert(to, id, entity);
    }
}

/// System: count ticks spent in the current compartment
pub fn age_compartments(mut query: Query<&mut Exposure>) {
    for mut exposure in query.iter_mut() {
        exposure.ticks_in_compartment = exposure.ticks_in_compartment.saturating_add(1);
    }
}
