//! Simulated Time Types
//!
//! Simulated time is tracked by the engine as fractional minutes since the
//! start of day 1. [`SimTime`] is the whole-minute view of that value used in
//! logs and snapshots.
//!
//! # Example
//!
//! ```
//! use misinfo_events::SimTime;
//!
//! let t = SimTime::from_minutes(1.0 * 1440.0 + 7.0 * 60.0 + 30.5);
//! assert_eq!(t.day, 2);
//! assert_eq!(t.label(), "07:30");
//! assert_eq!(t.to_string(), "day_2 07:30");
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Minutes in one simulated hour.
pub const MINUTES_PER_HOUR: u32 = 60;

/// Minutes in one simulated day.
pub const MINUTES_PER_DAY: u32 = 24 * MINUTES_PER_HOUR;

/// Minutes in one simulated week.
pub const MINUTES_PER_WEEK: u32 = 7 * MINUTES_PER_DAY;

/// Error type for parsing simulated times from strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseTimeError {
    #[error("invalid time format: '{0}', expected 'day_N HH:MM'")]
    InvalidFormat(String),
    #[error("invalid day: '{0}'")]
    InvalidDay(String),
    #[error("invalid clock label: '{0}', expected 'HH:MM'")]
    InvalidLabel(String),
}

/// A whole-minute point in simulated time.
///
/// Serializes to strings like "day_3 19:05".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimTime {
    /// Day number, starting at 1.
    pub day: u32,
    pub hour: u8,
    pub minute: u8,
}

impl SimTime {
    pub fn new(day: u32, hour: u8, minute: u8) -> Self {
        Self { day, hour, minute }
    }

    /// Midnight on day 1.
    pub fn start() -> Self {
        Self::new(1, 0, 0)
    }

    /// Converts fractional minutes since the start of day 1, rounding down.
    ///
    /// Negative or non-finite input is treated as the start of the simulation.
    pub fn from_minutes(total: f64) -> Self {
        let whole = if total.is_finite() && total > 0.0 {
            total.floor() as u64
        } else {
            0
        };
        let day = (whole / MINUTES_PER_DAY as u64) as u32 + 1;
        let of_day = (whole % MINUTES_PER_DAY as u64) as u32;
        Self {
            day,
            hour: (of_day / MINUTES_PER_HOUR) as u8,
            minute: (of_day % MINUTES_PER_HOUR) as u8,
        }
    }

    /// Whole minutes since the start of day 1.
    pub fn total_minutes(&self) -> u64 {
        (self.day.saturating_sub(1) as u64) * MINUTES_PER_DAY as u64 + self.minute_of_day() as u64
    }

    /// Minutes elapsed since midnight of the current day.
    pub fn minute_of_day(&self) -> u32 {
        self.hour as u32 * MINUTES_PER_HOUR + self.minute as u32
    }

    /// Clock label "HH:MM" used in the metrics log.
    pub fn label(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

/// Parses a clock label "HH:MM" into `(hour, minute)`.
pub fn parse_clock_label(label: &str) -> Result<(u8, u8), ParseTimeError> {
    let invalid = || ParseTimeError::InvalidLabel(label.to_string());
    let (h, m) = label.trim().split_once(':').ok_or_else(invalid)?;
    let hour = h.parse::<u8>().map_err(|_| invalid())?;
    let minute = m.parse::<u8>().map_err(|_| invalid())?;
    if hour >= 24 || minute >= 60 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "day_{} {:02}:{:02}", self.day, self.hour, self.minute)
    }
}

impl FromStr for SimTime {
    type Err = ParseTimeError;

    /// Parses a SimTime from a string like "day_3 19:05".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (day_part, label) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| ParseTimeError::InvalidFormat(s.to_string()))?;

        let day = day_part
            .strip_prefix("day_")
            .ok_or_else(|| ParseTimeError::InvalidFormat(s.to_string()))?
            .parse::<u32>()
            .map_err(|_| ParseTimeError::InvalidDay(day_part.to_string()))?;
        if day == 0 {
            return Err(ParseTimeError::InvalidDay(day_part.to_string()));
        }

        let (hour, minute) = parse_clock_label(label)?;
        Ok(SimTime { day, hour, minute })
    }
}

// Serialize as a plain string, not an object
impl Serialize for SimTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SimTime {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
