//! Profile analysis: health score, risk, archetype, care needs and load budget.
//!
//! [`ProfileAnalyzer::analyze`] is pure and deterministic; identical profiles
//! always produce identical analyses.

pub mod archetype;
pub mod capacity;
pub mod health;
pub mod needs;
pub mod risk;

use serde::{Deserialize, Serialize};

use crate::profile::Profile;

pub use archetype::Archetype;
pub use capacity::WeeklyLoadCapacity;
pub use health::{Grade, HealthScore};
pub use needs::{CareNeed, CareNeedCategory, NeedLevel};
pub use risk::{RiskAssessment, RiskFactor, RiskLevel, RiskSeverity};

/// Complete analysis of one profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileAnalysis {
    pub health_score: HealthScore,
    pub risk_assessment: RiskAssessment,
    pub archetype: Archetype,
    pub care_needs: Vec<CareNeed>,
    pub weekly_load_capacity: WeeklyLoadCapacity,
}

impl ProfileAnalysis {
    pub fn need_level(&self, category: CareNeedCategory) -> Option<NeedLevel> {
        self.care_needs
            .iter()
            .find(|need| need.category == category)
            .map(|need| need.level)
    }
}

/// Stateless profile analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileAnalyzer;

impl ProfileAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, profile: &Profile) -> ProfileAnalysis {
        let health_score = HealthScore::compute(profile);
        let risk_assessment = RiskAssessment::assess(profile);
        let care_needs = needs::derive(profile, &health_score, &risk_assessment);

        ProfileAnalysis {
            archetype: archetype::detect(profile),
            weekly_load_capacity: WeeklyLoadCapacity::for_profile(profile),
            health_score,
            risk_assessment,
            care_needs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Level, TextureClass};

    #[test]
    fn analyze_is_referentially_transparent() {
        let profile = Profile {
            texture_class: Some(TextureClass::Curly),
            porosity_level: Level::High,
            scalp_sensitivity: Level::Medium,
            ..Profile::default()
        };
        let analyzer = ProfileAnalyzer::new();
        assert_eq!(analyzer.analyze(&profile), analyzer.analyze(&profile));
    }

    #[test]
    fn analysis_combines_components() {
        let profile = Profile {
            texture_class: Some(TextureClass::Curly),
            porosity_level: Level::High,
            ..Profile::default()
        };
        let analysis = ProfileAnalyzer::new().analyze(&profile);
        assert_eq!(analysis.archetype, Archetype::MoistureSeeker);
        assert_eq!(analysis.need_level(CareNeedCategory::Protein), Some(NeedLevel::Moderate));
        assert_eq!(analysis.weekly_load_capacity.max_heavy_days, 2);
        assert_eq!(analysis.risk_assessment.score, 25);
    }
}
