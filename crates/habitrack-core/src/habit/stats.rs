//! Monthly completion statistics and calendar cells.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::schedule::{due_dates, is_due};
use super::streak::longest_streak;
use super::Habit;
use crate::error::ValidationError;

/// A calendar month, `YYYY-MM` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    /// # Errors
    /// Returns [`ValidationError::InvalidMonth`] when `month` is outside 1-12
    /// or the year is outside the supported calendar.
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(ValidationError::InvalidMonth(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.days().last().unwrap_or_else(|| self.first_day())
    }

    pub fn days_in_month(&self) -> u32 {
        self.days().count() as u32
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Every date of the month in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.first_day()
            .iter_days()
            .take_while(move |d| self.contains(*d))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidMonth(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Month {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Month> for String {
    fn from(month: Month) -> Self {
        month.to_string()
    }
}

/// Calendar classification of a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// Target reached on this day
    Completed,
    /// The reference day, not yet completed
    TodayIncomplete,
    /// After the reference day; not actionable
    Future,
    /// Before the reference day and never completed
    PastIncomplete,
}

/// One cell of the month grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub status: DayStatus,
    /// Scheduled by the recurrence rule; display emphasis only
    pub due: bool,
    pub progress: u32,
}

/// Monthly roll-up for one habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyStats {
    pub month: Month,
    /// Lifetime completed-day count
    pub total: u32,
    pub month_completed: u32,
    /// `round(month_completed / days_in_month * 100)`
    pub rate_percent: u32,
    pub days_in_month: u32,
    /// Due days in the month. Reported only; the rate ignores it.
    pub scheduled_days: u32,
    pub longest_streak: u32,
    pub days: Vec<DayCell>,
}

fn classify(habit: &Habit, date: NaiveDate, today: NaiveDate) -> DayStatus {
    if habit.is_completed_on(date) {
        DayStatus::Completed
    } else if date == today {
        DayStatus::TodayIncomplete
    } else if date > today {
        DayStatus::Future
    } else {
        DayStatus::PastIncomplete
    }
}

/// Completion statistics of `habit` for `month`, classified against `today`.
///
/// The rate denominator is the full length of the month, whatever the
/// recurrence rule says.
pub fn monthly_stats(habit: &Habit, month: Month, today: NaiveDate) -> MonthlyStats {
    let days: Vec<DayCell> = month
        .days()
        .map(|date| DayCell {
            date,
            status: classify(habit, date, today),
            due: is_due(habit, date),
            progress: habit.progress_on(date),
        })
        .collect();

    let days_in_month = days.len() as u32;
    let month_completed = habit
        .completed_dates()
        .range(month.first_day()..)
        .take_while(|d| month.contains(**d))
        .count() as u32;
    let rate_percent = if days_in_month == 0 {
        0
    } else {
        (f64::from(month_completed) / f64::from(days_in_month) * 100.0).round() as u32
    };

    MonthlyStats {
        month,
        total: habit.completed_dates().len() as u32,
        month_completed,
        rate_percent,
        days_in_month,
        scheduled_days: due_dates(habit, month.first_day(), month.last_day()).len() as u32,
        longest_streak: longest_streak(habit.completed_dates()),
        days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habit::record_progress;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn completed_on(habit: Habit, days: &[NaiveDate], today: NaiveDate) -> Habit {
        days.iter()
            .fold(habit, |h, d| record_progress(&h, *d, today))
    }

    #[test]
    fn month_parses_and_displays() {
        let month: Month = "2024-04".parse().unwrap();
        assert_eq!(month.year(), 2024);
        assert_eq!(month.month(), 4);
        assert_eq!(month.to_string(), "2024-04");
        assert_eq!(month.days_in_month(), 30);
    }

    #[test]
    fn month_rejects_garbage() {
        assert!("2024-13".parse::<Month>().is_err());
        assert!("2024-00".parse::<Month>().is_err());
        assert!("April".parse::<Month>().is_err());
        assert!(Month::new(2024, 0).is_err());
    }

    #[test]
    fn leap_february_has_29_days() {
        assert_eq!(Month::new(2024, 2).unwrap().days_in_month(), 29);
        assert_eq!(Month::new(2023, 2).unwrap().days_in_month(), 28);
        assert_eq!(Month::new(2024, 12).unwrap().days_in_month(), 31);
        assert_eq!(Month::new(2024, 2).unwrap().last_day(), date(2024, 2, 29));
        assert_eq!(Month::new(2024, 12).unwrap().last_day(), date(2024, 12, 31));
    }

    #[test]
    fn month_serializes_as_string() {
        let month = Month::new(2024, 4).unwrap();
        assert_eq!(serde_json::to_value(month).unwrap(), "2024-04");
        let back: Month = serde_json::from_str("\"2024-04\"").unwrap();
        assert_eq!(back, month);
        assert!(serde_json::from_str::<Month>("\"2024-4x\"").is_err());
    }

    #[test]
    fn april_ten_of_thirty_is_33_percent() {
        let today = date(2024, 4, 30);
        let days: Vec<NaiveDate> = (1..=10).map(|d| date(2024, 4, d * 2)).collect();
        let habit = completed_on(Habit::new("Read", date(2024, 4, 1)), &days, today);

        let stats = monthly_stats(&habit, Month::new(2024, 4).unwrap(), today);
        assert_eq!(stats.month_completed, 10);
        assert_eq!(stats.days_in_month, 30);
        assert_eq!(stats.rate_percent, 33);
        assert_eq!(stats.total, 10);
        assert_eq!(stats.days.len(), 30);
    }

    #[test]
    fn total_counts_other_months_but_month_count_does_not() {
        let today = date(2024, 5, 2);
        let days = [date(2024, 3, 31), date(2024, 4, 1), date(2024, 4, 30), date(2024, 5, 1)];
        let habit = completed_on(Habit::new("Read", date(2024, 3, 1)), &days, today);

        let stats = monthly_stats(&habit, Month::new(2024, 4).unwrap(), today);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.month_completed, 2);
        assert_eq!(stats.rate_percent, 7); // 2/30 = 6.67%
    }

    #[test]
    fn rate_ignores_schedule() {
        // Mon/Wed/Fri, every scheduled day of April 2024 done: 13 of 30.
        let today = date(2024, 4, 30);
        let habit = Habit::new("Gym", date(2024, 4, 1))
            .with_recurrence_days([1, 3, 5])
            .unwrap();
        let month = Month::new(2024, 4).unwrap();
        let scheduled = due_dates(&habit, month.first_day(), month.last_day());
        let habit = completed_on(habit, &scheduled, today);

        let stats = monthly_stats(&habit, month, today);
        assert_eq!(stats.scheduled_days, 13);
        assert_eq!(stats.month_completed, 13);
        assert_eq!(stats.rate_percent, 43);
        assert!(stats.rate_percent < 100);
    }

    #[test]
    fn cells_are_classified_against_today() {
        let today = date(2024, 4, 10);
        let habit = completed_on(
            Habit::new("Read", date(2024, 4, 1)),
            &[date(2024, 4, 9)],
            today,
        );
        let stats = monthly_stats(&habit, Month::of(today), today);

        let status = |d: u32| stats.days[(d - 1) as usize].status;
        assert_eq!(status(8), DayStatus::PastIncomplete);
        assert_eq!(status(9), DayStatus::Completed);
        assert_eq!(status(10), DayStatus::TodayIncomplete);
        assert_eq!(status(11), DayStatus::Future);
        assert_eq!(stats.days[8].progress, 1);
    }

    #[test]
    fn completed_today_is_completed_not_pending() {
        let today = date(2024, 4, 10);
        let habit = completed_on(Habit::new("Read", date(2024, 4, 1)), &[today], today);
        let stats = monthly_stats(&habit, Month::of(today), today);
        assert_eq!(stats.days[9].status, DayStatus::Completed);
    }

    #[test]
    fn cells_mark_due_days() {
        let today = date(2024, 4, 10);
        let habit = Habit::new("Gym", date(2024, 4, 1))
            .with_recurrence_days([1])
            .unwrap();
        let stats = monthly_stats(&habit, Month::of(today), today);
        let due: Vec<u32> = stats
            .days
            .iter()
            .filter(|c| c.due)
            .map(|c| c.date.day())
            .collect();
        assert_eq!(due, vec![1, 8, 15, 22, 29]);
    }

    #[test]
    fn stats_serialize_snake_case_statuses() {
        let today = date(2024, 4, 10);
        let habit = Habit::new("Read", date(2024, 4, 1));
        let stats = monthly_stats(&habit, Month::of(today), today);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["month"], "2024-04");
        assert_eq!(json["days"][9]["status"], "today_incomplete");
        assert_eq!(json["days"][29]["status"], "future");
    }
}
