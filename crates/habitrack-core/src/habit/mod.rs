//! Habit record and the engine that operates on it.
//!
//! A [`Habit`] carries its static configuration (title, schedule, target)
//! together with its history: the sparse per-day progress counters plus two
//! derived caches, the completed-date set and the current streak. The caches
//! are private and only ever produced by the engine:
//!
//! - [`schedule`]: whether a habit is due on a date
//! - [`progress`]: one "record progress" interaction (ring counter)
//! - [`streak`]: contiguous completion chain ending at a reference date
//! - [`stats`]: monthly completion rate and calendar cells

pub mod progress;
pub mod schedule;
pub mod stats;
pub mod streak;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use crate::error::ValidationError;

pub use progress::{recompute_completion, record_progress};
pub use schedule::{due_dates, is_due, weekday_index};
pub use stats::{monthly_stats, DayCell, DayStatus, Month, MonthlyStats};
pub use streak::{compute_streak, longest_streak};

/// Rejects any weekday index above 6 (Saturday).
pub(crate) fn check_weekdays(days: &BTreeSet<u8>) -> Result<(), ValidationError> {
    match days.iter().find(|&&d| d > 6) {
        Some(&bad) => Err(ValidationError::InvalidWeekday(bad)),
        None => Ok(()),
    }
}

fn deserialize_weekdays<'de, D>(deserializer: D) -> Result<BTreeSet<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let days = BTreeSet::<u8>::deserialize(deserializer)?;
    check_weekdays(&days).map_err(serde::de::Error::custom)?;
    Ok(days)
}

/// Time of day during which the habit is meant to be performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: String, // HH:MM
    pub end: String,   // HH:MM
}

impl TimeWindow {
    /// Build a window from two `HH:MM` strings.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidTimeWindow`] if either bound does not
    /// parse or `start` is not strictly before `end`.
    pub fn new(start: &str, end: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidTimeWindow {
            start: start.to_string(),
            end: end.to_string(),
        };
        let s = NaiveTime::parse_from_str(start.trim(), "%H:%M").map_err(|_| invalid())?;
        let e = NaiveTime::parse_from_str(end.trim(), "%H:%M").map_err(|_| invalid())?;
        if s >= e {
            return Err(invalid());
        }
        Ok(Self {
            start: s.format("%H:%M").to_string(),
            end: e.format("%H:%M").to_string(),
        })
    }
}

/// A recurring, user-defined tracked activity.
///
/// `completed_dates` and `streak` are caches over `daily_progress`; there are
/// no setters for them. Configuration edits through the `set_*` methods never
/// touch history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Weekday indices, 0 = Sunday ... 6 = Saturday. Empty means every day.
    #[serde(default, deserialize_with = "deserialize_weekdays")]
    recurrence_days: BTreeSet<u8>,
    target_count: u32,
    #[serde(default)]
    pub time_window: Option<TimeWindow>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub goal_id: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    daily_progress: BTreeMap<NaiveDate, u32>,
    #[serde(default)]
    completed_dates: BTreeSet<NaiveDate>,
    #[serde(default)]
    streak: u32,
    #[serde(default)]
    revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Habit {
    /// Create an every-day habit with a target of one and no history.
    pub fn new(title: impl Into<String>, start_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            description: None,
            recurrence_days: BTreeSet::new(),
            target_count: 1,
            time_window: None,
            project_id: None,
            goal_id: None,
            start_date,
            daily_progress: BTreeMap::new(),
            completed_dates: BTreeSet::new(),
            streak: 0,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder form of [`Habit::set_recurrence_days`].
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidWeekday`] for an index above 6.
    pub fn with_recurrence_days(
        mut self,
        days: impl IntoIterator<Item = u8>,
    ) -> Result<Self, ValidationError> {
        self.set_recurrence_days(days)?;
        Ok(self)
    }

    /// Builder form of [`Habit::set_target_count`].
    pub fn with_target_count(mut self, target: u32) -> Self {
        self.set_target_count(target);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn recurrence_days(&self) -> &BTreeSet<u8> {
        &self.recurrence_days
    }

    /// Effective per-day target. A stored zero normalizes to 1.
    pub fn target_count(&self) -> u32 {
        self.target_count.max(1)
    }

    pub fn daily_progress(&self) -> &BTreeMap<NaiveDate, u32> {
        &self.daily_progress
    }

    /// Progress recorded on `date`, 0 when nothing was logged.
    pub fn progress_on(&self, date: NaiveDate) -> u32 {
        self.daily_progress.get(&date).copied().unwrap_or(0)
    }

    pub fn completed_dates(&self) -> &BTreeSet<NaiveDate> {
        &self.completed_dates
    }

    pub fn is_completed_on(&self, date: NaiveDate) -> bool {
        self.completed_dates.contains(&date)
    }

    /// Streak as of the last progress write.
    pub fn streak(&self) -> u32 {
        self.streak
    }

    /// Store-managed version used for compare-and-swap updates.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the weekly schedule. History is left untouched.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidWeekday`] for an index above 6; the
    /// habit is unchanged in that case.
    pub fn set_recurrence_days(
        &mut self,
        days: impl IntoIterator<Item = u8>,
    ) -> Result<(), ValidationError> {
        let days: BTreeSet<u8> = days.into_iter().collect();
        check_weekdays(&days)?;
        self.recurrence_days = days;
        Ok(())
    }

    /// Change the per-day target.
    ///
    /// Completed dates recorded under the previous target stay completed;
    /// use [`recompute_completion`] to re-derive them under the new one.
    pub fn set_target_count(&mut self, target: u32) {
        self.target_count = target.max(1);
    }

    pub(crate) fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    /// Rebuild a habit from persisted columns. Caches are taken as stored.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn restore(
        id: String,
        title: String,
        description: Option<String>,
        recurrence_days: BTreeSet<u8>,
        target_count: u32,
        time_window: Option<TimeWindow>,
        project_id: Option<String>,
        goal_id: Option<String>,
        start_date: NaiveDate,
        daily_progress: BTreeMap<NaiveDate, u32>,
        completed_dates: BTreeSet<NaiveDate>,
        streak: u32,
        revision: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            recurrence_days,
            target_count,
            time_window,
            project_id,
            goal_id,
            start_date,
            daily_progress,
            completed_dates,
            streak,
            revision,
            created_at,
            updated_at,
        }
    }

    /// Raw stored target, before normalization. Used by the store.
    pub(crate) fn stored_target_count(&self) -> u32 {
        self.target_count
    }
}
