//! TOML-based application configuration.
//!
//! Stores scheduling preferences:
//! - Calendar generation defaults
//! - Wall-clock hours for morning, afternoon and evening rituals
//! - Education prompt timing
//! - Upcoming-rituals horizon
//!
//! Configuration is stored at `~/.config/ritualcare/config.toml`.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::calendar::{GenerationOptions, MaterializerSettings};
use crate::error::ConfigError;

/// Calendar generation defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationConfig {
    #[serde(default = "default_weeks")]
    pub weeks: u8,
    #[serde(default)]
    pub replace_existing: bool,
    #[serde(default = "default_true")]
    pub include_rest_buffers: bool,
    #[serde(default = "default_true")]
    pub include_education_prompts: bool,
}

/// Hour of day (0-23) each time-of-day bucket starts at.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeOfDayConfig {
    #[serde(default = "default_morning_hour")]
    pub morning_hour: u32,
    #[serde(default = "default_afternoon_hour")]
    pub afternoon_hour: u32,
    #[serde(default = "default_evening_hour")]
    pub evening_hour: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EducationConfig {
    #[serde(default = "default_prompt_hour")]
    pub prompt_hour: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpcomingConfig {
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/ritualcare/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub time_of_day: TimeOfDayConfig,
    #[serde(default)]
    pub education: EducationConfig,
    #[serde(default)]
    pub upcoming: UpcomingConfig,
}

// Default functions
fn default_weeks() -> u8 {
    2
}
fn default_true() -> bool {
    true
}
fn default_morning_hour() -> u32 {
    9
}
fn default_afternoon_hour() -> u32 {
    14
}
fn default_evening_hour() -> u32 {
    19
}
fn default_prompt_hour() -> u32 {
    20
}
fn default_horizon_days() -> u32 {
    14
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            weeks: default_weeks(),
            replace_existing: false,
            include_rest_buffers: true,
            include_education_prompts: true,
        }
    }
}

impl Default for TimeOfDayConfig {
    fn default() -> Self {
        Self {
            morning_hour: default_morning_hour(),
            afternoon_hour: default_afternoon_hour(),
            evening_hour: default_evening_hour(),
        }
    }
}

impl Default for EducationConfig {
    fn default() -> Self {
        Self {
            prompt_hour: default_prompt_hour(),
        }
    }
}

impl Default for UpcomingConfig {
    fn default() -> Self {
        Self {
            horizon_days: default_horizon_days(),
        }
    }
}

fn hour(key: &str, value: u32) -> Result<NaiveTime, ConfigError> {
    NaiveTime::from_hms_opt(value, 0, 0).ok_or_else(|| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{value} is not an hour of the day"),
    })
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the default file on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Every leaf key with its value, in dot-path form.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let key = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&key, v, out);
                    }
                }
                serde_json::Value::String(s) => out.push((prefix.to_string(), s.clone())),
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }

    /// Set a value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.materializer_settings()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and save. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Materializer settings with validated hours.
    ///
    /// # Errors
    ///
    /// Returns an error if any configured hour is outside 0-23.
    pub fn materializer_settings(&self) -> Result<MaterializerSettings, ConfigError> {
        Ok(MaterializerSettings {
            morning: hour("time_of_day.morning_hour", self.time_of_day.morning_hour)?,
            afternoon: hour("time_of_day.afternoon_hour", self.time_of_day.afternoon_hour)?,
            evening: hour("time_of_day.evening_hour", self.time_of_day.evening_hour)?,
            education_prompt: hour("education.prompt_hour", self.education.prompt_hour)?,
            upcoming_horizon_days: self.upcoming.horizon_days,
            default_weeks: self.generation.weeks,
            include_rest_buffers: self.generation.include_rest_buffers,
            include_education_prompts: self.generation.include_education_prompts,
        })
    }

    /// Generation options starting on `start_date` with the configured defaults.
    pub fn generation_options(&self, start_date: NaiveDate) -> GenerationOptions {
        GenerationOptions {
            start_date,
            weeks_to_generate: self.generation.weeks,
            replace_existing: self.generation.replace_existing,
            include_rest_buffers: self.generation.include_rest_buffers,
            include_education_prompts: self.generation.include_education_prompts,
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
