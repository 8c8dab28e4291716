//! Per-activity load scores and base rest hours.

use serde::{Deserialize, Serialize};

use crate::rituals::ActivityType;

/// Intensity tier of a load score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoadTier {
    None,    // <10
    Light,   // 10-29
    Medium,  // 30-59
    Heavy,   // 60-79
    Extreme, // 80+
}

impl LoadTier {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=9 => LoadTier::None,
            10..=29 => LoadTier::Light,
            30..=59 => LoadTier::Medium,
            60..=79 => LoadTier::Heavy,
            _ => LoadTier::Extreme,
        }
    }

    pub fn is_heavy_or_above(self) -> bool {
        self >= LoadTier::Heavy
    }
}

/// Load score (0-100) an activity imposes.
pub fn load_score(activity: ActivityType) -> u8 {
    match activity {
        ActivityType::WashDay => 60,
        ActivityType::DeepCondition => 40,
        ActivityType::ProteinTreatment => 65,
        ActivityType::ScalpTreatment => 20,
        ActivityType::MoistureRefresh => 10,
        ActivityType::StyleRefresh => 15,
        ActivityType::Detangle => 45,
        ActivityType::HotOilTreatment => 30,
        ActivityType::ProtectiveInstall => 85,
        ActivityType::ProtectiveTakedown => 70,
        ActivityType::Trim => 30,
        ActivityType::RestBuffer => 0,
        ActivityType::EducationPrompt => 0,
    }
}

/// Hours of rest an activity needs before the profile multiplier is applied.
pub fn base_rest_hours(activity: ActivityType) -> u32 {
    match activity {
        ActivityType::WashDay => 48,
        ActivityType::DeepCondition => 24,
        ActivityType::ProteinTreatment => 72,
        ActivityType::ScalpTreatment => 12,
        ActivityType::MoistureRefresh => 0,
        ActivityType::StyleRefresh => 4,
        ActivityType::Detangle => 24,
        ActivityType::HotOilTreatment => 12,
        ActivityType::ProtectiveInstall => 168,
        ActivityType::ProtectiveTakedown => 72,
        ActivityType::Trim => 24,
        ActivityType::RestBuffer => 0,
        ActivityType::EducationPrompt => 0,
    }
}

pub fn tier(activity: ActivityType) -> LoadTier {
    LoadTier::from_score(load_score(activity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries() {
        assert_eq!(LoadTier::from_score(9), LoadTier::None);
        assert_eq!(LoadTier::from_score(10), LoadTier::Light);
        assert_eq!(LoadTier::from_score(29), LoadTier::Light);
        assert_eq!(LoadTier::from_score(30), LoadTier::Medium);
        assert_eq!(LoadTier::from_score(60), LoadTier::Heavy);
        assert_eq!(LoadTier::from_score(79), LoadTier::Heavy);
        assert_eq!(LoadTier::from_score(80), LoadTier::Extreme);
        assert_eq!(LoadTier::from_score(100), LoadTier::Extreme);
    }

    #[test]
    fn calendar_only_activities_carry_no_load() {
        assert_eq!(tier(ActivityType::RestBuffer), LoadTier::None);
        assert_eq!(tier(ActivityType::EducationPrompt), LoadTier::None);
        assert_eq!(base_rest_hours(ActivityType::RestBuffer), 0);
    }

    #[test]
    fn protective_install_is_extreme() {
        assert_eq!(tier(ActivityType::ProtectiveInstall), LoadTier::Extreme);
        assert_eq!(base_rest_hours(ActivityType::ProtectiveInstall), 168);
        assert!(tier(ActivityType::WashDay).is_heavy_or_above());
        assert!(!tier(ActivityType::Detangle).is_heavy_or_above());
    }
}
