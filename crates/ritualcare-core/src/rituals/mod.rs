//! Ritual templates, the built-in catalog, and profile matching.

pub mod catalog;
pub mod matcher;

use serde::{Deserialize, Serialize};

pub use catalog::{Criteria, RitualCatalog, RitualTemplate};
pub use matcher::{Priority, RitualMatcher, RitualRecommendation};

/// Kind of care activity. Calendar-only kinds (`RestBuffer`,
/// `EducationPrompt`) never appear in ritual templates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    WashDay,
    DeepCondition,
    ProteinTreatment,
    ScalpTreatment,
    MoistureRefresh,
    StyleRefresh,
    Detangle,
    HotOilTreatment,
    ProtectiveInstall,
    ProtectiveTakedown,
    Trim,
    RestBuffer,
    EducationPrompt,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::WashDay => "WASH_DAY",
            ActivityType::DeepCondition => "DEEP_CONDITION",
            ActivityType::ProteinTreatment => "PROTEIN_TREATMENT",
            ActivityType::ScalpTreatment => "SCALP_TREATMENT",
            ActivityType::MoistureRefresh => "MOISTURE_REFRESH",
            ActivityType::StyleRefresh => "STYLE_REFRESH",
            ActivityType::Detangle => "DETANGLE",
            ActivityType::HotOilTreatment => "HOT_OIL_TREATMENT",
            ActivityType::ProtectiveInstall => "PROTECTIVE_INSTALL",
            ActivityType::ProtectiveTakedown => "PROTECTIVE_TAKEDOWN",
            ActivityType::Trim => "TRIM",
            ActivityType::RestBuffer => "REST_BUFFER",
            ActivityType::EducationPrompt => "EDUCATION_PROMPT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "WASH_DAY" => ActivityType::WashDay,
            "DEEP_CONDITION" => ActivityType::DeepCondition,
            "PROTEIN_TREATMENT" => ActivityType::ProteinTreatment,
            "SCALP_TREATMENT" => ActivityType::ScalpTreatment,
            "MOISTURE_REFRESH" => ActivityType::MoistureRefresh,
            "STYLE_REFRESH" => ActivityType::StyleRefresh,
            "DETANGLE" => ActivityType::Detangle,
            "HOT_OIL_TREATMENT" => ActivityType::HotOilTreatment,
            "PROTECTIVE_INSTALL" => ActivityType::ProtectiveInstall,
            "PROTECTIVE_TAKEDOWN" => ActivityType::ProtectiveTakedown,
            "TRIM" => ActivityType::Trim,
            "REST_BUFFER" => ActivityType::RestBuffer,
            "EDUCATION_PROMPT" => ActivityType::EducationPrompt,
            _ => return None,
        })
    }

    pub fn is_refresh(self) -> bool {
        matches!(self, ActivityType::MoistureRefresh | ActivityType::StyleRefresh)
    }
}

/// Coarse intensity of a ritual.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoadLevel {
    Light,
    Standard,
    Heavy,
}

impl LoadLevel {
    /// Load points a ritual of this level adds to its day.
    pub fn score(self) -> u8 {
        match self {
            LoadLevel::Light => 15,
            LoadLevel::Standard => 35,
            LoadLevel::Heavy => 60,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoadLevel::Light => "LIGHT",
            LoadLevel::Standard => "STANDARD",
            LoadLevel::Heavy => "HEAVY",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "LIGHT" => Some(LoadLevel::Light),
            "STANDARD" => Some(LoadLevel::Standard),
            "HEAVY" => Some(LoadLevel::Heavy),
            _ => None,
        }
    }
}

/// How often a ritual should recur.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrequencyCategory {
    TwiceWeekly,
    Weekly,
    BiWeekly,
    Monthly,
}

impl FrequencyCategory {
    /// One step more frequent, saturating at `TwiceWeekly`.
    pub fn more_frequent(self) -> Self {
        match self {
            FrequencyCategory::TwiceWeekly | FrequencyCategory::Weekly => {
                FrequencyCategory::TwiceWeekly
            }
            FrequencyCategory::BiWeekly => FrequencyCategory::Weekly,
            FrequencyCategory::Monthly => FrequencyCategory::BiWeekly,
        }
    }
}
