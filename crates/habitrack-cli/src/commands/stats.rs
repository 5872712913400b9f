//! Monthly statistics commands for CLI.

use chrono::Datelike;
use clap::Args;
use habitrack_core::{DayCell, DayStatus, Month, MonthlyStats, WeekStart};

use super::Context;

#[derive(Args)]
pub struct StatsArgs {
    /// Habit ID
    id: String,
    /// Month as YYYY-MM (default: current month)
    #[arg(long)]
    month: Option<Month>,
    /// Print a calendar grid instead of JSON
    #[arg(long)]
    grid: bool,
}

pub fn run(ctx: &Context, args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let stats = ctx.tracker()?.monthly_stats(&args.id, args.month)?;

    if args.grid {
        print!("{}", render_grid(&stats, ctx.config.calendar.week_starts_on));
    } else {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    }
    Ok(())
}

fn marker(status: DayStatus) -> char {
    match status {
        DayStatus::Completed => '*',
        DayStatus::TodayIncomplete => '!',
        DayStatus::PastIncomplete => '.',
        DayStatus::Future => ' ',
    }
}

/// Month grid, one week per line. `*` completed, `!` today pending,
/// `.` missed, blank for days not reached yet.
fn render_grid(stats: &MonthlyStats, week_start: WeekStart) -> String {
    let header = match week_start {
        WeekStart::Sunday => " Su  Mo  Tu  We  Th  Fr  Sa",
        WeekStart::Monday => " Mo  Tu  We  Th  Fr  Sa  Su",
    };
    let column = |cell: &DayCell| -> usize {
        let weekday = cell.date.weekday();
        let index = match week_start {
            WeekStart::Sunday => weekday.num_days_from_sunday(),
            WeekStart::Monday => weekday.num_days_from_monday(),
        };
        index as usize
    };

    let mut out = format!("{}\n{header}\n", stats.month);
    let mut line = String::new();
    if let Some(first) = stats.days.first() {
        line.push_str(&"    ".repeat(column(first)));
    }
    for cell in &stats.days {
        line.push_str(&format!(" {:>2}{}", cell.date.day(), marker(cell.status)));
        if column(cell) == 6 {
            out.push_str(line.trim_end());
            out.push('\n');
            line.clear();
        }
    }
    if !line.is_empty() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.push_str(&format!(
        "{}/{} days ({}%), {} total, longest streak {}\n",
        stats.month_completed,
        stats.days_in_month,
        stats.rate_percent,
        stats.total,
        stats.longest_streak
    ));
    out
}
