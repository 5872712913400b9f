//! Store-backed entry point for the engine.
//!
//! [`HabitTracker`] pairs a [`HabitStore`] with a [`Clock`] so that every
//! operation sees one authoritative "today". Mutations read the latest
//! snapshot, run the pure engine, and write back with compare-and-swap; a
//! concurrent writer makes the call fail instead of losing an increment.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CoreError, Result, ValidationError};
use crate::habit::{self, Habit, Month, MonthlyStats};
use crate::store::{Clock, HabitStore};

/// Current and best streak of one habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub habit_id: String,
    pub as_of: NaiveDate,
    pub current: u32,
    pub longest: u32,
}

pub struct HabitTracker<S, C> {
    store: S,
    clock: C,
}

impl<S: HabitStore, C: Clock> HabitTracker<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    fn load(&self, id: &str) -> Result<Habit> {
        self.store
            .get_habit(id)?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))
    }

    /// Persist a new habit.
    ///
    /// # Errors
    /// Returns an error if the store rejects the insert.
    pub fn create(&self, habit: Habit) -> Result<Habit> {
        self.store.create_habit(&habit)?;
        Ok(habit)
    }

    /// # Errors
    /// Returns [`CoreError::NotFound`] for an unknown id.
    pub fn get(&self, id: &str) -> Result<Habit> {
        self.load(id)
    }

    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn list(&self) -> Result<Vec<Habit>> {
        self.store.list_habits()
    }

    /// Habits scheduled on `date` (today when `None`).
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn due_on(&self, date: Option<NaiveDate>) -> Result<Vec<Habit>> {
        let date = date.unwrap_or_else(|| self.today());
        Ok(self
            .store
            .list_habits()?
            .into_iter()
            .filter(|h| habit::is_due(h, date))
            .collect())
    }

    /// Apply a configuration edit. History is never touched.
    ///
    /// # Errors
    /// Returns the edit's validation error (nothing is written), or a store
    /// error such as a revision conflict.
    pub fn edit<F>(&self, id: &str, edit: F) -> Result<Habit>
    where
        F: FnOnce(&mut Habit) -> Result<(), ValidationError>,
    {
        let mut habit = self.load(id)?;
        edit(&mut habit)?;
        habit.updated_at = chrono::Utc::now();
        self.store.update_habit(&habit)
    }

    /// One "record progress" interaction on `date` (today when `None`).
    ///
    /// # Errors
    /// Returns [`CoreError::NotFound`] for an unknown id, or the store's
    /// error when the write fails; the computed snapshot is discarded then.
    pub fn record_progress(&self, id: &str, date: Option<NaiveDate>) -> Result<Habit> {
        let today = self.today();
        let current = self.load(id)?;
        let updated = habit::record_progress(&current, date.unwrap_or(today), today);
        self.store.update_habit(&updated)
    }

    /// Re-derive completion for every logged day under the current target.
    ///
    /// # Errors
    /// Same as [`HabitTracker::record_progress`].
    pub fn recompute(&self, id: &str) -> Result<Habit> {
        let current = self.load(id)?;
        let updated = habit::recompute_completion(&current, self.today());
        info!(
            habit_id = id,
            completed = updated.completed_dates().len(),
            "recomputed completion history"
        );
        self.store.update_habit(&updated)
    }

    /// Streak evaluated against today rather than the last write.
    ///
    /// # Errors
    /// Returns [`CoreError::NotFound`] for an unknown id.
    pub fn streak(&self, id: &str) -> Result<StreakSummary> {
        let record = self.load(id)?;
        let as_of = self.today();
        Ok(StreakSummary {
            habit_id: record.id().to_string(),
            as_of,
            current: habit::compute_streak(record.completed_dates(), as_of),
            longest: habit::longest_streak(record.completed_dates()),
        })
    }

    /// Monthly statistics for `month` (the current month when `None`).
    ///
    /// # Errors
    /// Returns [`CoreError::NotFound`] for an unknown id.
    pub fn monthly_stats(&self, id: &str, month: Option<Month>) -> Result<MonthlyStats> {
        let record = self.load(id)?;
        let today = self.today();
        Ok(habit::monthly_stats(
            &record,
            month.unwrap_or_else(|| Month::of(today)),
            today,
        ))
    }

    /// # Errors
    /// Returns [`CoreError::NotFound`] when nothing was deleted.
    pub fn delete(&self, id: &str) -> Result<()> {
        if self.store.delete_habit(id)? {
            Ok(())
        } else {
            Err(CoreError::NotFound(id.to_string()))
        }
    }
}
