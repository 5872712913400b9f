pub mod config;
pub mod habit;
pub mod progress;
pub mod stats;

use chrono::NaiveDate;
use habitrack_core::{Clock, Config, FixedClock, HabitDb, HabitTracker, SystemClock};
use std::str::FromStr;

/// Per-invocation state shared by the command handlers.
pub struct Context {
    pub config: Config,
    pub today: NaiveDate,
}

impl Context {
    /// `today` is fixed once per invocation so every step of a command sees
    /// the same date.
    pub fn new(config: Config, today: Option<NaiveDate>) -> Self {
        Self {
            config,
            today: today.unwrap_or_else(|| SystemClock.today()),
        }
    }

    pub fn tracker(&self) -> Result<HabitTracker<HabitDb, FixedClock>, Box<dyn std::error::Error>> {
        tracing::debug!(today = %self.today, "opening habit database");
        Ok(HabitTracker::new(HabitDb::open()?, FixedClock(self.today)))
    }
}

/// Weekday indices given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Weekdays(pub Vec<u8>);

impl FromStr for Weekdays {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_days(s).map(Weekdays)
    }
}

/// Parse a comma-separated list of weekday indices ("1,3,5").
///
/// An empty string or "daily" means every day.
pub fn parse_days(value: &str) -> Result<Vec<u8>, String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("daily") {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<u8>()
                .map_err(|_| format!("invalid weekday '{}': expected 0-6", part.trim()))
        })
        .collect()
}
