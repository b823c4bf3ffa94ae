//! Configuration System
//!
//! Loads the initial population and tuning parameters from a TOML file so the
//! model can be adjusted without recompiling. Every section has defaults, so a
//! file only needs the values it changes.

use bevy_ecs::prelude::*;
use misinfo_events::{Compartment, UnknownCompartment, MINUTES_PER_DAY, MINUTES_PER_WEEK};
use rand::Rng;
use rand_distr::{Beta, Distribution};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::components::world::{Rect, ZoneKind};

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "misinfo.toml";

/// Errors raised while loading or validating configuration.
///
/// All of these are fatal to startup; none can occur once a run has begun.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error(transparent)]
    UnknownCompartment(#[from] UnknownCompartment),
    #[error("negative initial count for {compartment}: {count}")]
    NegativeCount { compartment: Compartment, count: i64 },
    #[error("invalid population entry '{0}', expected name=count")]
    PopulationSyntax(String),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Top-level configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub population: PopulationConfig,
    pub simulation: SimulationConfig,
    pub transmission: TransmissionConfig,
    pub movement: MovementConfig,
    pub zones: ZoneConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from the default path, or use defaults if it is absent
    pub fn load_or_default() -> Result<Self, ConfigError> {
        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::load(DEFAULT_CONFIG_PATH)
        } else {
            Ok(Self::default())
        }
    }

    /// Render as a TOML document
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.transmission.validate()?;
        self.movement.validate()?;
        self.zones.validate()?;
        Ok(())
    }
}

/// Initial agent count per compartment.
///
/// Written in TOML as a table of compartment name to count:
///
/// ```toml
/// [population]
/// susceptible = 45
/// believer = 5
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, i64>", into = "BTreeMap<String, i64>")]
pub struct PopulationConfig {
    counts: BTreeMap<Compartment, u32>,
}

impl PopulationConfig {
    /// A population with no agents.
    pub fn empty() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }

    /// Validates raw `(name, count)` entries.
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = (&'a str, i64)>,
    ) -> Result<Self, ConfigError> {
        let mut population = Self::empty();
        for (name, count) in entries {
            let compartment: Compartment = name.parse()?;
            if count < 0 {
                return Err(ConfigError::NegativeCount { compartment, count });
            }
            let count = u32::try_from(count)
                .map_err(|_| invalid("population", format!("count for {compartment} is too large")))?;
            population.set(compartment, count);
        }
        Ok(population)
    }

    pub fn count(&self, compartment: Compartment) -> u32 {
        self.counts.get(&compartment).copied().unwrap_or(0)
    }

    pub fn set(&mut self, compartment: Compartment, count: u32) {
        self.counts.insert(compartment, count);
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// `(compartment, count)` in reporting order, including zero entries.
    pub fn iter(&self) -> impl Iterator<Item = (Compartment, u32)> + '_ {
        Compartment::ALL.into_iter().map(move |c| (c, self.count(c)))
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        let mut population = Self::empty();
        population.set(Compartment::Susceptible, 45);
        population.set(Compartment::Believer, 4);
        population.set(Compartment::Doubter, 3);
        population.set(Compartment::Disinformant, 1);
        population
    }
}

impl TryFrom<BTreeMap<String, i64>> for PopulationConfig {
    type Error = ConfigError;

    fn try_from(raw: BTreeMap<String, i64>) -> Result<Self, Self::Error> {
        Self::from_entries(raw.iter().map(|(name, &count)| (name.as_str(), count)))
    }
}

impl From<PopulationConfig> for BTreeMap<String, i64> {
    fn from(population: PopulationConfig) -> Self {
        population
            .counts
            .into_iter()
            .map(|(c, n)| (c.name().to_lowercase(), n as i64))
            .collect()
    }
}

impl FromStr for PopulationConfig {
    type Err = ConfigError;

    /// Parses `"susceptible=45,believer=5"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut entries = Vec::new();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, count) = part
                .split_once('=')
                .ok_or_else(|| ConfigError::PopulationSyntax(part.to_string()))?;
            let count = count
                .trim()
                .parse::<i64>()
                .map_err(|_| ConfigError::PopulationSyntax(part.to_string()))?;
            entries.push((name.trim(), count));
        }
        Self::from_entries(entries)
    }
}

/// Length of a run in simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SimDuration {
    #[default]
    Day,
    Week,
}

impl SimDuration {
    pub fn minutes(self) -> f64 {
        match self {
            SimDuration::Day => MINUTES_PER_DAY as f64,
            SimDuration::Week => MINUTES_PER_WEEK as f64,
        }
    }
}

/// Clock and reporting parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub duration: SimDuration,
    /// Engine ticks per real-time second
    pub ticks_per_second: f64,
    /// Simulated minutes per real-time second
    pub minutes_per_second: f64,
    /// Minute of day 1 at which the run starts
    pub start_minute: f64,
    /// Simulated minutes between metrics snapshots
    pub metrics_interval_minutes: f64,
    /// Global emotional valence setting, 0 to 10
    pub emotional_valence: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration: SimDuration::Day,
            ticks_per_second: 60.0,
            minutes_per_second: 10.0,
            start_minute: 0.0,
            metrics_interval_minutes: 10.0,
            emotional_valence: 5.0,
        }
    }
}

impl SimulationConfig {
    /// Simulated minutes added per tick.
    pub fn minutes_per_tick(&self) -> f64 {
        self.minutes_per_second / self.ticks_per_second
    }

    /// Global emotional valence scaled to [0, 1].
    pub fn valence_fraction(&self) -> f32 {
        (self.emotional_valence / 10.0).clamp(0.0, 1.0)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.ticks_per_second.is_finite() && self.ticks_per_second > 0.0) {
            return Err(invalid("simulation.ticks_per_second", "must be positive"));
        }
        if !(self.minutes_per_second.is_finite() && self.minutes_per_second > 0.0) {
            return Err(invalid("simulation.minutes_per_second", "must be positive"));
        }
        if !(0.0..MINUTES_PER_DAY as f64).contains(&self.start_minute) {
            return Err(invalid("simulation.start_minute", "must be within the first day"));
        }
        if !(self.metrics_interval_minutes.is_finite() && self.metrics_interval_minutes > 0.0) {
            return Err(invalid("simulation.metrics_interval_minutes", "must be positive"));
        }
        if !(0.0..=10.0).contains(&self.emotional_valence) {
            return Err(invalid("simulation.emotional_valence", "must be between 0 and 10"));
        }
        Ok(())
    }
}

/// Transition model parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransmissionConfig {
    /// Base transmission rate scaling every contact transition
    pub base_rate: f32,
    pub home_factor: f32,
    pub work_factor: f32,
    pub social_factor: f32,
    /// Bonus per prior Disinformant exposure
    pub misinfo_bonus_per_exposure: f32,
    pub misinfo_bonus_cap: f32,
    /// Multiplier applied when a Doubter faces a Believer or Disinformant
    pub doubter_resistance: f32,
    /// Per-tick probability that a Believer recovers on their own
    pub spontaneous_recovery: f32,
    /// Expected minutes before forgetting, at zero global valence
    pub forgetting_base_minutes: f64,
    /// Extra expected minutes at full global valence
    pub forgetting_valence_minutes: f64,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            base_rate: 0.2,
            home_factor: 1.0,
            work_factor: 0.5,
            social_factor: 0.7,
            misinfo_bonus_per_exposure: 0.05,
            misinfo_bonus_cap: 0.25,
            doubter_resistance: 0.05,
            spontaneous_recovery: 0.001,
            forgetting_base_minutes: 20.0,
            forgetting_valence_minutes: 20.0,
        }
    }
}

impl TransmissionConfig {
    /// Susceptibility to influence in the given zone.
    pub fn environment_factor(&self, zone: ZoneKind) -> f32 {
        match zone {
            ZoneKind::Home => self.home_factor,
            ZoneKind::Work => self.work_factor,
            ZoneKind::Social => self.social_factor,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("transmission.base_rate", self.base_rate),
            ("transmission.home_factor", self.home_factor),
            ("transmission.work_factor", self.work_factor),
            ("transmission.social_factor", self.social_factor),
            ("transmission.misinfo_bonus_per_exposure", self.misinfo_bonus_per_exposure),
            ("transmission.misinfo_bonus_cap", self.misinfo_bonus_cap),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(field, "must be a non-negative number"));
            }
        }
        let probabilities = [
            ("transmission.doubter_resistance", self.doubter_resistance),
            ("transmission.spontaneous_recovery", self.spontaneous_recovery),
        ];
        for (field, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(field, "must be a probability"));
            }
        }
        if !(self.forgetting_base_minutes.is_finite() && self.forgetting_base_minutes > 0.0) {
            return Err(invalid("transmission.forgetting_base_minutes", "must be positive"));
        }
        if !(self.forgetting_valence_minutes.is_finite() && self.forgetting_valence_minutes >= 0.0) {
            return Err(invalid("transmission.forgetting_valence_minutes", "must be non-negative"));
        }
        Ok(())
    }
}

/// Prior for the per-agent emotional valence trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValencePrior {
    /// Beta(2, 2): centred on 0.5, few extreme agents
    #[default]
    Beta,
    Uniform,
}

impl ValencePrior {
    pub fn sample(self, rng: &mut impl Rng) -> f32 {
        match self {
            ValencePrior::Beta => match Beta::new(2.0f64, 2.0f64) {
                Ok(beta) => beta.sample(rng) as f32,
                Err(_) => rng.gen(),
            },
            ValencePrior::Uniform => rng.gen(),
        }
    }
}

/// Movement and contact parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub valence_prior: ValencePrior,
    /// Contact box width, centred on the agent
    pub contact_width: f32,
    /// Contact box height, centred on the agent
    pub contact_height: f32,
    /// Pull toward the zone centre when wandering
    pub centre_bias: f32,
    /// Work-zone speed multiplier during the lunch rush
    pub lunch_rush_multiplier: f32,
    /// Work-zone speed multiplier outside the first ten minutes of each hour
    pub desk_multiplier: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            valence_prior: ValencePrior::Beta,
            contact_width: 12.0,
            contact_height: 20.0,
            centre_bias: 0.3,
            lunch_rush_multiplier: 2.5,
            desk_multiplier: 0.3,
        }
    }
}

impl MovementConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.contact_width > 0.0 && self.contact_height > 0.0) {
            return Err(invalid("movement.contact_width/height", "must be positive"));
        }
        if !(self.centre_bias.is_finite() && self.centre_bias >= 0.0) {
            return Err(invalid("movement.centre_bias", "must be non-negative"));
        }
        if !(self.lunch_rush_multiplier >= 0.0 && self.desk_multiplier >= 0.0) {
            return Err(invalid("movement multipliers", "must be non-negative"));
        }
        Ok(())
    }
}

/// World layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub world_width: f32,
    pub world_height: f32,
    pub home: Rect,
    pub work: Rect,
    pub social: Rect,
    /// Distance kept from zone edges
    pub padding: f32,
    pub grid_rows: usize,
    pub grid_cols: usize,
    /// Agents per home-grid cell
    pub cell_capacity: u32,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            world_width: 920.0,
            world_height: 575.0,
            home: Rect::new(10.0, 10.0, 440.0, 270.0),
            work: Rect::new(470.0, 10.0, 440.0, 270.0),
            social: Rect::new(10.0, 295.0, 900.0, 270.0),
            padding: 10.0,
            grid_rows: 5,
            grid_cols: 6,
            cell_capacity: 3,
        }
    }
}

impl ZoneConfig {
    pub fn world(&self) -> Rect {
        Rect::new(0.0, 0.0, self.world_width, self.world_height)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.world().is_empty() {
            return Err(invalid("zones.world", "must have positive size"));
        }
        if !(self.padding.is_finite() && self.padding >= 0.0) {
            return Err(invalid("zones.padding", "must be non-negative"));
        }
        for (field, rect) in [("zones.home", self.home), ("zones.work", self.work), ("zones.social", self.social)] {
            if rect.inset(self.padding).is_empty() {
                return Err(invalid(field, "must be larger than twice the padding"));
            }
        }
        if self.grid_rows == 0 || self.grid_cols == 0 || self.cell_capacity == 0 {
            return Err(invalid("zones.grid", "rows, columns and capacity must be at least 1"));
        }
        Ok(())
    }
}

/// Resource carrying the tuning the systems read each tick.
#[derive(Resource, Debug, Clone)]
pub struct SimParams {
    pub transmission: TransmissionConfig,
    pub movement: MovementConfig,
    /// Global emotional valence in [0, 1]
    pub emotional_valence: f32,
}

impl SimParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            transmission: config.transmission.clone(),
            movement: config.movement.clone(),
            emotional_valence: config.simulation.valence_fraction(),
        }
    }

    /// Expected minutes before an Exposed agent or Believer forgets.
    pub fn forgetting_minutes(&self) -> f64 {
        self.transmission.forgetting_base_minutes
            + self.transmission.forgetting_valence_minutes * self.emotional_valence as f64
    }
}
