//! Transition Events
//!
//! A record of one agent moving between compartments. Produced by the
//! interaction resolver and optionally appended to a JSON-lines audit log.

use serde::{Deserialize, Serialize};

use crate::compartment::Compartment;
use crate::timestamp::SimTime;

/// Why a transition happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    /// Pairwise contact with an influencing agent.
    Contact,
    /// Spontaneous recovery of a Believer.
    Recovery,
    /// Reverting to Susceptible after the belief fades.
    Forgetting,
}

/// One applied compartment change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEvent {
    /// Engine tick on which the change was applied.
    pub tick: u64,
    pub time: SimTime,
    /// The agent whose compartment changed.
    pub agent_id: u32,
    pub from: Compartment,
    pub to: Compartment,
    /// The agent whose contact caused the change, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influencer_id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub influencer_compartment: Option<Compartment>,
    pub cause: TransitionCause,
    /// Probability used for the Bernoulli trial.
    pub probability: f32,
}

impl TransitionEvent {
    /// Returns true if a Disinformant caused this change.
    pub fn caused_by_disinformant(&self) -> bool {
        self.influencer_compartment == Some(Compartment::Disinformant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_event() -> TransitionEvent {
        TransitionEvent {
            tick: 120,
            time: SimTime::new(1, 0, 20),
            agent_id: 7,
            from: Compartment::Susceptible,
            to: Compartment::Exposed,
            influencer_id: Some(3),
            influencer_compartment: Some(Compartment::Disinformant),
            cause: TransitionCause::Contact,
            probability: 0.5,
        }
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&contact_event()).unwrap();
        assert!(json.contains(r#""time":"day_1 00:20""#));
        assert!(json.contains(r#""cause":"contact""#));
        assert!(json.contains(r#""from":"Susceptible""#));

        let parsed: TransitionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, contact_event());
        assert!(parsed.caused_by_disinformant());
    }

    #[test]
    fn test_passive_event_omits_influencer() {
        let event = TransitionEvent {
            influencer_id: None,
            influencer_compartment: None,
            cause: TransitionCause::Forgetting,
            from: Compartment::Believer,
            to: Compartment::Susceptible,
            ..contact_event()
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("influencer_id"));
        assert!(!event.caused_by_disinformant());
    }
}
