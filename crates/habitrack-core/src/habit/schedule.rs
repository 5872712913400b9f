//! Weekly recurrence evaluation.

use chrono::{Datelike, NaiveDate};

use super::Habit;

/// Weekday index of `date`, 0 = Sunday ... 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Whether `habit` is scheduled on `date`.
///
/// An empty recurrence set means the habit is due every day.
pub fn is_due(habit: &Habit, date: NaiveDate) -> bool {
    let days = habit.recurrence_days();
    days.is_empty() || days.contains(&weekday_index(date))
}

/// Due days of `habit` in the inclusive range `from..=to`.
pub fn due_dates(habit: &Habit, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|d| *d <= to)
        .filter(|d| is_due(habit, *d))
        .collect()
}
