//! Per-day progress recording.
//!
//! A single "record progress" control drives a ring counter of size
//! `target_count + 1`: `0, 1, ..., target_count, 0, ...`. A day is completed
//! while its counter is at the target. Every write re-derives that day's
//! completion and recomputes the streak from scratch.

use chrono::{NaiveDate, Utc};
use tracing::debug;

use super::streak::compute_streak;
use super::Habit;

/// Apply one progress interaction for `habit` on `date`.
///
/// `today` is the caller's authoritative current date and is used as the
/// streak reference. Off-schedule and retroactive dates are accepted. The
/// input snapshot is left unchanged.
pub fn record_progress(habit: &Habit, date: NaiveDate, today: NaiveDate) -> Habit {
    let target = habit.target_count();
    let current = habit.progress_on(date);
    let next = if current < target { current + 1 } else { 0 };

    let mut updated = habit.clone();
    updated.daily_progress.insert(date, next);
    if next >= target {
        updated.completed_dates.insert(date);
    } else {
        updated.completed_dates.remove(&date);
    }
    updated.streak = compute_streak(&updated.completed_dates, today);
    updated.updated_at = Utc::now();

    debug!(
        habit_id = %updated.id,
        %date,
        from = current,
        to = next,
        target,
        streak = updated.streak,
        "recorded progress"
    );
    updated
}

/// Re-derive the completed-date set from `daily_progress` under the current
/// target, then refresh the streak.
///
/// Progress writes only re-derive the day they touch, so a target edit leaves
/// older days as they were. This is the explicit migration for callers that
/// want history re-evaluated.
pub fn recompute_completion(habit: &Habit, today: NaiveDate) -> Habit {
    let target = habit.target_count();
    let mut updated = habit.clone();
    updated.completed_dates = habit
        .daily_progress
        .iter()
        .filter(|(_, count)| **count >= target)
        .map(|(date, _)| *date)
        .collect();
    updated.streak = compute_streak(&updated.completed_dates, today);
    updated.updated_at = Utc::now();

    debug!(
        habit_id = %updated.id,
        before = habit.completed_dates.len(),
        after = updated.completed_dates.len(),
        streak = updated.streak,
        "recomputed completion"
    );
    updated
}
