mod config;
pub mod habit_db;
pub mod migrations;

pub use config::{CalendarConfig, Config, HabitDefaults, LoggingConfig, WeekStart};
pub use habit_db::HabitDb;

use std::path::PathBuf;

use crate::error::Result;

/// Returns the Habitrack data directory, creating it if needed.
///
/// `HABITRACK_DATA_DIR` overrides the location entirely. Otherwise the
/// directory is `~/.config/habitrack[-dev]/`, with `HABITRACK_ENV=dev`
/// selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("HABITRACK_DATA_DIR") {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env =
                std::env::var("HABITRACK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("habitrack-dev")
            } else {
                base_dir.join("habitrack")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
