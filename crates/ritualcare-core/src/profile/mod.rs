//! Read-only hair profile model.
//!
//! Profiles are owned by an external profile service; this crate only reads
//! them. Every field carries a serde default so partially filled profiles are
//! accepted and analysed with neutral values instead of being rejected.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;

/// Ordinal attribute value.
///
/// `Unknown` is the default for any attribute the profile owner never filled in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Low,
    Medium,
    High,
    #[default]
    Unknown,
}

impl Level {
    /// Score where a higher level is better (LOW=30, MEDIUM=60, HIGH=90).
    pub fn score(self) -> f64 {
        match self {
            Level::Low => 30.0,
            Level::Medium => 60.0,
            Level::High => 90.0,
            Level::Unknown => 50.0,
        }
    }

    /// Score for traits where HIGH is undesirable (LOW=90, MEDIUM=60, HIGH=30).
    pub fn inverted_score(self) -> f64 {
        match self {
            Level::Low => 90.0,
            Level::Medium => 60.0,
            Level::High => 30.0,
            Level::Unknown => 50.0,
        }
    }
}

/// Broad curl texture class.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TextureClass {
    Straight,
    Wavy,
    Curly,
    Coily,
}

/// Pattern family within a texture class (the A/B/C sub-type).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum PatternFamily {
    A,
    B,
    C,
}

/// How demanding a wash day is for this person.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoadFactor {
    Light,
    #[default]
    Standard,
    Heavy,
}

/// Declared routine style.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutineType {
    Minimal,
    Moderate,
    Intensive,
    GrowthFocused,
}

/// Structured hair profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Profile {
    pub texture_class: Option<TextureClass>,
    pub pattern_family: Option<PatternFamily>,
    #[serde(deserialize_with = "null_as_default")]
    pub strand_thickness: Level,
    #[serde(deserialize_with = "null_as_default")]
    pub density: Level,
    #[serde(deserialize_with = "null_as_default")]
    pub shrinkage_tendency: Level,
    #[serde(deserialize_with = "null_as_default")]
    pub porosity_level: Level,
    #[serde(deserialize_with = "null_as_default")]
    pub detangle_tolerance: Level,
    #[serde(deserialize_with = "null_as_default")]
    pub manipulation_tolerance: Level,
    #[serde(deserialize_with = "null_as_default")]
    pub tension_sensitivity: Level,
    #[serde(deserialize_with = "null_as_default")]
    pub scalp_sensitivity: Level,
    #[serde(deserialize_with = "null_as_default")]
    pub wash_day_load_factor: LoadFactor,
    pub routine_type: Option<RoutineType>,
    /// Learning nodes the user has already unlocked.
    #[serde(deserialize_with = "null_as_default")]
    pub unlocked_nodes: BTreeSet<String>,
}

impl Profile {
    pub fn is_texture(&self, texture: TextureClass) -> bool {
        self.texture_class == Some(texture)
    }

    pub fn has_unlocked(&self, node: &str) -> bool {
        self.unlocked_nodes.contains(node)
    }

    /// Parse a profile from JSON, defaulting any missing field.
    ///
    /// # Errors
    /// Returns an error if the input is not valid JSON or a present field has
    /// an unrecognised value.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Unset profile columns arrive as `null`; treat them like missing keys.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Source of read-only profiles, keyed by user id.
///
/// Implemented by whatever service owns profile persistence.
pub trait ProfileSource {
    /// Fetch the current profile for a user, or `None` if the user has none.
    ///
    /// # Errors
    /// Returns an error if the backing service fails.
    fn profile(&self, user_id: &str) -> Result<Option<Profile>, CoreError>;
}
