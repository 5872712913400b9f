//! Collaborators consumed by the engine: the habit store and the clock.

use chrono::{Local, NaiveDate};

use crate::error::Result;
use crate::habit::Habit;

/// Create/read/update/delete of habit records.
///
/// `update_habit` is a compare-and-swap: it only succeeds when the stored
/// revision equals `habit.revision()`, and returns the stored snapshot with
/// the bumped revision. A stale snapshot fails with
/// [`crate::error::DatabaseError::Conflict`] and nothing is written.
pub trait HabitStore {
    fn create_habit(&self, habit: &Habit) -> Result<()>;

    fn get_habit(&self, id: &str) -> Result<Option<Habit>>;

    fn list_habits(&self) -> Result<Vec<Habit>>;

    fn update_habit(&self, habit: &Habit) -> Result<Habit>;

    /// Returns whether a record was removed.
    fn delete_habit(&self, id: &str) -> Result<bool>;
}

/// Source of the authoritative current date.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local calendar date of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
