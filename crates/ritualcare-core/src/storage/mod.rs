mod config;
pub mod calendar_db;
pub mod migrations;

pub use calendar_db::CalendarDb;
pub use config::{Config, EducationConfig, GenerationConfig, TimeOfDayConfig, UpcomingConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the data directory, creating it if needed.
///
/// `RITUALCARE_HOME` wins when set. Otherwise `~/.config/ritualcare/`, or
/// `~/.config/ritualcare-dev/` when `RITUALCARE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("RITUALCARE_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("RITUALCARE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("ritualcare-dev")
            } else {
                base_dir.join("ritualcare")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
