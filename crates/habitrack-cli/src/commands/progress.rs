//! Progress recording and streak commands for CLI.

use chrono::NaiveDate;
use clap::Subcommand;

use super::Context;

#[derive(Subcommand)]
pub enum ProgressAction {
    /// Record one completion (wraps to 0 after the daily target)
    Record {
        /// Habit ID
        id: String,
        /// Day to record on (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Re-derive completed days from logged progress under the current target
    Recompute {
        /// Habit ID
        id: String,
    },
}

pub fn run(ctx: &Context, action: ProgressAction) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = ctx.tracker()?;

    match action {
        ProgressAction::Record { id, date } => {
            let habit = tracker.record_progress(&id, date)?;
            let day = date.unwrap_or(ctx.today);
            eprintln!(
                "Progress {}/{} on {day}",
                habit.progress_on(day),
                habit.target_count()
            );
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
        ProgressAction::Recompute { id } => {
            let habit = tracker.recompute(&id)?;
            println!("{}", serde_json::to_string_pretty(&habit)?);
        }
    }
    Ok(())
}

pub fn streak(ctx: &Context, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let summary = ctx.tracker()?.streak(id)?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
