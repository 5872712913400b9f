//! # Habitrack Core Library
//!
//! Core logic for the Habitrack recurring-habit tracker. All operations are
//! available through the standalone `habitrack` CLI, which is a thin layer
//! over this library.
//!
//! ## Architecture
//!
//! - **Engine** ([`habit`]): pure functions over an immutable [`Habit`]
//!   snapshot. Whether a habit is due, the per-day ring counter, the streak
//!   walk and monthly statistics. "Today" is always passed in.
//! - **Storage**: SQLite habit store and TOML configuration
//! - **Tracker**: [`HabitTracker`] wires a [`HabitStore`] and a [`Clock`]
//!   together and writes snapshots back with compare-and-swap
//!
//! ## Key Components
//!
//! - [`record_progress`]: one progress interaction
//! - [`compute_streak`]: current streak as of a reference date
//! - [`monthly_stats`]: completion rate and calendar cells
//! - [`HabitDb`]: habit persistence
//! - [`Config`]: application configuration management

pub mod error;
pub mod habit;
pub mod storage;
pub mod store;
pub mod tracker;

pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use habit::{
    compute_streak, due_dates, is_due, longest_streak, monthly_stats, recompute_completion,
    record_progress, DayCell, DayStatus, Habit, Month, MonthlyStats, TimeWindow,
};
pub use storage::{Config, HabitDb, WeekStart};
pub use store::{Clock, FixedClock, HabitStore, SystemClock};
pub use tracker::{HabitTracker, StreakSummary};
