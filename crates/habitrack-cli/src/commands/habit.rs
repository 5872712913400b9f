//! Habit management commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;
use habitrack_core::{Habit, TimeWindow, ValidationError};

use super::{Context, Weekdays};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit
    Create {
        /// Habit title
        title: String,
        /// Habit description
        #[arg(long)]
        description: Option<String>,
        /// Comma-separated weekday indices, 0=Sun ... 6=Sat ("daily" for every day)
        #[arg(long)]
        days: Option<Weekdays>,
        /// Completions required per day
        #[arg(long)]
        target: Option<u32>,
        /// Start date (default: today)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Time window, e.g. 06:30-07:30
        #[arg(long)]
        window: Option<String>,
        /// Project ID to link
        #[arg(long)]
        project_id: Option<String>,
        /// Goal ID to link
        #[arg(long)]
        goal_id: Option<String>,
    },
    /// List habits
    List,
    /// Get habit details
    Get {
        /// Habit ID
        id: String,
    },
    /// Update a habit's configuration (history is kept as is)
    Update {
        /// Habit ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description ("none" to clear)
        #[arg(long)]
        description: Option<String>,
        /// New weekday indices
        #[arg(long)]
        days: Option<Weekdays>,
        /// New per-day target
        #[arg(long)]
        target: Option<u32>,
        /// New time window, e.g. 06:30-07:30 ("none" to clear)
        #[arg(long)]
        window: Option<String>,
        /// New project ID
        #[arg(long)]
        project_id: Option<String>,
        /// New goal ID
        #[arg(long)]
        goal_id: Option<String>,
    },
    /// Delete a habit
    Delete {
        /// Habit ID
        id: String,
    },
    /// List habits due on a date
    Due {
        /// Date to check (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn parse_window(value: &str) -> Result<Option<TimeWindow>, ValidationError> {
    if value.trim().eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let (start, end) = value
        .split_once('-')
        .ok_or_else(|| ValidationError::InvalidTimeWindow {
            start: value.to_string(),
            end: String::new(),
        })?;
    TimeWindow::new(start, end).map(Some)
}

fn parse_description(value: String) -> Option<String> {
    if value.trim().eq_ignore_ascii_case("none") {
        None
    } else {
        Some(value)
    }
}

pub fn run(ctx: &Context, action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = ctx.tracker()?;

    match action {
        HabitAction::Create {
            title,
            description,
            days,
            target,
            start,
            window,
            project_id,
            goal_id,
        } => {
            let defaults = &ctx.config.habits;
            let mut habit = Habit::new(title, start.unwrap_or(ctx.today))
                .with_recurrence_days(
                    days.map(|d| d.0)
                        .unwrap_or_else(|| defaults.default_recurrence_days.clone()),
                )?
                .with_target_count(target.unwrap_or(defaults.default_target_count));
            habit.description = description;
            habit.time_window = match window {
                Some(w) => parse_window(&w)?,
                None => None,
            };
            habit.project_id = project_id;
            habit.goal_id = goal_id;

            let habit = tracker.create(habit)?;
            eprintln!("Habit created: {}", habit.id());
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::List => {
            let habits = tracker.list()?;
            println!("{}", serde_json::to_string_pretty(&habits)?);
        }
        HabitAction::Get { id } => {
            let habit = tracker.get(&id)?;
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::Update {
            id,
            title,
            description,
            days,
            target,
            window,
            project_id,
            goal_id,
        } => {
            let window = window.map(|w| parse_window(&w)).transpose()?;
            let habit = tracker.edit(&id, |habit| {
                if let Some(title) = title {
                    habit.title = title;
                }
                if let Some(description) = description {
                    habit.description = parse_description(description);
                }
                if let Some(days) = days {
                    habit.set_recurrence_days(days.0)?;
                }
                if let Some(target) = target {
                    habit.set_target_count(target);
                }
                if let Some(window) = window {
                    habit.time_window = window;
                }
                if let Some(project_id) = project_id {
                    habit.project_id = Some(project_id);
                }
                if let Some(goal_id) = goal_id {
                    habit.goal_id = Some(goal_id);
                }
                Ok(())
            })?;
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        HabitAction::Delete { id } => {
            tracker.delete(&id)?;
            println!("Habit deleted: {id}");
        }
        HabitAction::Due { date } => {
            let habits = tracker.due_on(date)?;
            println!("{}", serde_json::to_string_pretty(&habits)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_window_variants() {
        let window = parse_window("06:30-07:30").unwrap().unwrap();
        assert_eq!(window.start, "06:30");
        assert_eq!(window.end, "07:30");
        assert!(parse_window("none").unwrap().is_none());
        assert!(parse_window("06:30").is_err());
        assert!(parse_window("08:00-07:00").is_err());
    }

    #[test]
    fn parse_description_clears_on_none() {
        assert_eq!(parse_description("None".to_string()), None);
        assert_eq!(
            parse_description("Before breakfast".to_string()).as_deref(),
            Some("Before breakfast")
        );
    }
}
