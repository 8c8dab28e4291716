//! Weekly load budget.

use serde::{Deserialize, Serialize};

use crate::profile::{Level, LoadFactor, Profile, TextureClass};
use crate::rituals::{FrequencyCategory, LoadLevel};

const MAX_REST_DAYS: u8 = 5;

/// Per-profile budget limiting heavy and medium activity days per week.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyLoadCapacity {
    pub max_heavy_days: u8,
    pub max_medium_days: u8,
    pub recommended_rest_days: u8,
    pub wash_frequency: FrequencyCategory,
}

impl WeeklyLoadCapacity {
    pub fn for_profile(profile: &Profile) -> Self {
        let (mut max_heavy_days, max_medium_days, mut recommended_rest_days): (u8, u8, u8) =
            match profile.manipulation_tolerance {
                Level::Low => (1, 2, 4),
                Level::High => (3, 4, 1),
                Level::Medium | Level::Unknown => (2, 3, 2),
            };

        if profile.wash_day_load_factor == LoadFactor::Heavy {
            recommended_rest_days = recommended_rest_days.max(3);
        }
        if profile.tension_sensitivity == Level::High {
            max_heavy_days = max_heavy_days.saturating_sub(1);
            recommended_rest_days = (recommended_rest_days + 1).min(MAX_REST_DAYS);
        }

        Self {
            max_heavy_days,
            max_medium_days,
            recommended_rest_days,
            wash_frequency: wash_frequency(profile),
        }
    }

    /// Upper bound on a week's summed load score.
    pub fn max_weekly_load(&self) -> u32 {
        u32::from(self.max_heavy_days) * u32::from(LoadLevel::Heavy.score())
            + u32::from(self.max_medium_days) * u32::from(LoadLevel::Standard.score())
    }
}

fn wash_frequency(profile: &Profile) -> FrequencyCategory {
    let loose =
        profile.is_texture(TextureClass::Straight) || profile.is_texture(TextureClass::Wavy);
    if loose || profile.scalp_sensitivity == Level::High {
        FrequencyCategory::TwiceWeekly
    } else if profile.is_texture(TextureClass::Coily) && profile.porosity_level == Level::Low {
        FrequencyCategory::BiWeekly
    } else {
        FrequencyCategory::Weekly
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_capacity() {
        let cap = WeeklyLoadCapacity::for_profile(&Profile::default());
        assert_eq!(
            (cap.max_heavy_days, cap.max_medium_days, cap.recommended_rest_days),
            (2, 3, 2)
        );
        assert_eq!(cap.max_weekly_load(), 2 * 60 + 3 * 35);
        assert_eq!(cap.wash_frequency, FrequencyCategory::Weekly);
    }

    #[test]
    fn manipulation_tolerance_sets_budget() {
        let low = WeeklyLoadCapacity::for_profile(&Profile {
            manipulation_tolerance: Level::Low,
            ..Profile::default()
        });
        assert_eq!(
            (low.max_heavy_days, low.max_medium_days, low.recommended_rest_days),
            (1, 2, 4)
        );

        let high = WeeklyLoadCapacity::for_profile(&Profile {
            manipulation_tolerance: Level::High,
            ..Profile::default()
        });
        assert_eq!(
            (high.max_heavy_days, high.max_medium_days, high.recommended_rest_days),
            (3, 4, 1)
        );
    }

    #[test]
    fn heavy_wash_day_forces_three_rest_days() {
        let cap = WeeklyLoadCapacity::for_profile(&Profile {
            manipulation_tolerance: Level::High,
            wash_day_load_factor: LoadFactor::Heavy,
            ..Profile::default()
        });
        assert_eq!(cap.recommended_rest_days, 3);
    }

    #[test]
    fn tension_sensitivity_floors_and_caps() {
        let cap = WeeklyLoadCapacity::for_profile(&Profile {
            manipulation_tolerance: Level::Low,
            tension_sensitivity: Level::High,
            ..Profile::default()
        });
        assert_eq!(cap.max_heavy_days, 0);
        assert_eq!(cap.recommended_rest_days, 5);

        let cap = WeeklyLoadCapacity::for_profile(&Profile {
            manipulation_tolerance: Level::Low,
            tension_sensitivity: Level::High,
            wash_day_load_factor: LoadFactor::Heavy,
            ..Profile::default()
        });
        assert_eq!(cap.recommended_rest_days, 5);
    }

    #[test]
    fn wash_frequency_by_texture() {
        let wavy = Profile {
            texture_class: Some(TextureClass::Wavy),
            ..Profile::default()
        };
        assert_eq!(
            WeeklyLoadCapacity::for_profile(&wavy).wash_frequency,
            FrequencyCategory::TwiceWeekly
        );

        let coily_low = Profile {
            texture_class: Some(TextureClass::Coily),
            porosity_level: Level::Low,
            ..Profile::default()
        };
        assert_eq!(
            WeeklyLoadCapacity::for_profile(&coily_low).wash_frequency,
            FrequencyCategory::BiWeekly
        );
    }
}
