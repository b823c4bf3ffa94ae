//! Belief Compartments
//!
//! The six mutually exclusive belief states an agent can occupy, and the
//! per-compartment counters reported in every metrics snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An agent's current belief-state category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Compartment {
    Susceptible,
    Exposed,
    Believer,
    Doubter,
    Recovered,
    Disinformant,
}

impl Compartment {
    /// All compartments in reporting order.
    pub const ALL: [Compartment; 6] = [
        Compartment::Susceptible,
        Compartment::Exposed,
        Compartment::Believer,
        Compartment::Doubter,
        Compartment::Recovered,
        Compartment::Disinformant,
    ];

    /// Position of this compartment in [`Compartment::ALL`].
    pub fn index(self) -> usize {
        match self {
            Compartment::Susceptible => 0,
            Compartment::Exposed => 1,
            Compartment::Believer => 2,
            Compartment::Doubter => 3,
            Compartment::Recovered => 4,
            Compartment::Disinformant => 5,
        }
    }

    /// Returns the canonical name used in logs and config files.
    pub fn name(self) -> &'static str {
        match self {
            Compartment::Susceptible => "Susceptible",
            Compartment::Exposed => "Exposed",
            Compartment::Believer => "Believer",
            Compartment::Doubter => "Doubter",
            Compartment::Recovered => "Recovered",
            Compartment::Disinformant => "Disinformant",
        }
    }

    /// Returns true for compartments that actively push misinformation.
    pub fn spreads_misinformation(self) -> bool {
        matches!(self, Compartment::Believer | Compartment::Disinformant)
    }
}

impl fmt::Display for Compartment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a compartment name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown compartment: '{0}'")]
pub struct UnknownCompartment(pub String);

impl FromStr for Compartment {
    type Err = UnknownCompartment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "susceptible" => Ok(Compartment::Susceptible),
            "exposed" => Ok(Compartment::Exposed),
            "believer" => Ok(Compartment::Believer),
            "doubter" => Ok(Compartment::Doubter),
            "recovered" => Ok(Compartment::Recovered),
            // older logs call them misinformants
            "disinformant" | "misinformant" => Ok(Compartment::Disinformant),
            _ => Err(UnknownCompartment(s.to_string())),
        }
    }
}

/// Number of agents currently in each compartment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ecs", derive(bevy_ecs::system::Resource))]
pub struct CompartmentCounts {
    counts: [u32; 6],
}

impl CompartmentCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds counts from `(compartment, count)` pairs. Repeated compartments accumulate.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Compartment, u32)>) -> Self {
        let mut counts = Self::new();
        for (compartment, count) in pairs {
            counts.counts[compartment.index()] += count;
        }
        counts
    }

    pub fn get(&self, compartment: Compartment) -> u32 {
        self.counts[compartment.index()]
    }

    pub fn set(&mut self, compartment: Compartment, count: u32) {
        self.counts[compartment.index()] = count;
    }

    pub fn increment(&mut self, compartment: Compartment) {
        self.counts[compartment.index()] += 1;
    }

    /// Decrements the counter, saturating at zero.
    pub fn decrement(&mut self, compartment: Compartment) {
        let slot = &mut self.counts[compartment.index()];
        *slot = slot.saturating_sub(1);
    }

    /// Moves one agent from `from` to `to`.
    pub fn transfer(&mut self, from: Compartment, to: Compartment) {
        self.decrement(from);
        self.increment(to);
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Believers plus Disinformants.
    pub fn total_misinformed(&self) -> u32 {
        self.get(Compartment::Believer) + self.get(Compartment::Disinformant)
    }

    /// Iterates `(compartment, count)` in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (Compartment, u32)> + '_ {
        Compartment::ALL.iter().map(move |&c| (c, self.get(c)))
    }
}

impl fmt::Display for CompartmentCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "S: {} | E: {} | B: {} | D: {} | R: {} | X: {}",
            self.get(Compartment::Susceptible),
            self.get(Compartment::Exposed),
            self.get(Compartment::Believer),
            self.get(Compartment::Doubter),
            self.get(Compartment::Recovered),
            self.get(Compartment::Disinformant),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compartment_parse() {
        assert_eq!("believer".parse::<Compartment>().unwrap(), Compartment::Believer);
        assert_eq!("Exposed".parse::<Compartment>().unwrap(), Compartment::Exposed);
        assert_eq!(" DOUBTER ".parse::<Compartment>().unwrap(), Compartment::Doubter);
        assert_eq!("misinformant".parse::<Compartment>().unwrap(), Compartment::Disinformant);
        assert!("zombie".parse::<Compartment>().is_err());
    }

    #[test]
    fn test_compartment_display_matches_parse() {
        for c in Compartment::ALL {
            assert_eq!(c.to_string().parse::<Compartment>().unwrap(), c);
        }
    }

    #[test]
    fn test_compartment_index_is_reporting_order() {
        for (i, c) in Compartment::ALL.iter().enumerate() {
            assert_eq!(c.index(), i);
        }
    }

    #[test]
    fn test_compartment_serialization() {
        assert_eq!(serde_json::to_string(&Compartment::Believer).unwrap(), r#""Believer""#);
        let parsed: Compartment = serde_json::from_str(r#""Disinformant""#).unwrap();
        assert_eq!(parsed, Compartment::Disinformant);
    }

    #[test]
    fn test_counts_transfer() {
        let mut counts = CompartmentCounts::from_pairs([
            (Compartment::Susceptible, 45),
            (Compartment::Believer, 5),
        ]);
        assert_eq!(counts.total(), 50);

        counts.transfer(Compartment::Susceptible, Compartment::Exposed);
        assert_eq!(counts.get(Compartment::Susceptible), 44);
        assert_eq!(counts.get(Compartment::Exposed), 1);
        assert_eq!(counts.total(), 50);
    }

    #[test]
    fn test_counts_decrement_saturates() {
        let mut counts = CompartmentCounts::new();
        counts.decrement(Compartment::Recovered);
        assert_eq!(counts.get(Compartment::Recovered), 0);
    }

    #[test]
    fn test_total_misinformed() {
        let counts = CompartmentCounts::from_pairs([
            (Compartment::Exposed, 7),
            (Compartment::Believer, 3),
            (Compartment::Disinformant, 2),
        ]);
        assert_eq!(counts.total_misinformed(), 5);
    }
}
