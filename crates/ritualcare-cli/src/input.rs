//! Shared argument parsing and profile loading.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use ritualcare_core::rituals::ActivityType;
use ritualcare_core::{CoreError, Profile, ProfileSource};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Read a profile JSON file. Missing fields default.
pub fn read_profile(path: &Path) -> CliResult<Profile> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read profile {}: {e}", path.display()))?;
    Ok(Profile::from_json(&json)?)
}

pub fn parse_activity(value: &str) -> Result<ActivityType, String> {
    ActivityType::parse(&value.to_ascii_uppercase().replace('-', "_"))
        .ok_or_else(|| format!("unknown activity type: {value}"))
}

pub fn parse_instant(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{value}' (expected RFC 3339): {e}"))
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("invalid date '{value}' (expected YYYY-MM-DD): {e}"))
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Profiles stored as `<dir>/<user_id>.json`.
pub struct ProfileDir {
    dir: PathBuf,
}

impl ProfileDir {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl ProfileSource for ProfileDir {
    fn profile(&self, user_id: &str) -> Result<Option<Profile>, CoreError> {
        let path = self.dir.join(format!("{user_id}.json"));
        match std::fs::read_to_string(&path) {
            Ok(json) => Profile::from_json(&json).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
