//! Care-need derivation.

use serde::{Deserialize, Serialize};

use super::health::HealthScore;
use super::risk::{RiskAssessment, RiskLevel};
use crate::profile::{Level, Profile, TextureClass};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CareNeedCategory {
    Moisture,
    Protein,
    Rest,
    Protection,
    ScalpCare,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum NeedLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl NeedLevel {
    /// HIGH and CRITICAL needs escalate matching rituals.
    pub fn is_urgent(self) -> bool {
        matches!(self, NeedLevel::High | NeedLevel::Critical)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CareNeed {
    pub category: CareNeedCategory,
    pub level: NeedLevel,
    pub reason: String,
}

impl CareNeed {
    fn new(category: CareNeedCategory, level: NeedLevel, reason: impl Into<String>) -> Self {
        Self {
            category,
            level,
            reason: reason.into(),
        }
    }
}

/// Derive care needs, most severe first (ties in category order).
pub fn derive(profile: &Profile, health: &HealthScore, risk: &RiskAssessment) -> Vec<CareNeed> {
    let mut needs = vec![moisture(health)];
    needs.extend(protein(profile, health));
    needs.extend(rest(profile, risk));
    needs.extend(protection(profile));
    needs.extend(scalp_care(profile, health));

    needs.sort_by(|a, b| b.level.cmp(&a.level).then(a.category.cmp(&b.category)));
    needs
}

fn moisture(health: &HealthScore) -> CareNeed {
    let level = if health.hydration < 40.0 {
        NeedLevel::Critical
    } else if health.hydration < 55.0 {
        NeedLevel::High
    } else if health.hydration < 70.0 {
        NeedLevel::Moderate
    } else {
        NeedLevel::Low
    };
    CareNeed::new(
        CareNeedCategory::Moisture,
        level,
        format!("hydration score {:.0}", health.hydration),
    )
}

fn protein(profile: &Profile, health: &HealthScore) -> Option<CareNeed> {
    let fine = profile.strand_thickness == Level::Low;
    let porous = profile.porosity_level == Level::High;
    if !fine && !porous {
        return None;
    }
    let level = if health.strength < 40.0 {
        NeedLevel::Critical
    } else if fine && porous {
        NeedLevel::High
    } else {
        NeedLevel::Moderate
    };
    let reason = match (fine, porous) {
        (true, true) => "fine, highly porous strands",
        (true, false) => "fine strands",
        _ => "highly porous strands",
    };
    Some(CareNeed::new(CareNeedCategory::Protein, level, reason))
}

fn rest(profile: &Profile, risk: &RiskAssessment) -> Option<CareNeed> {
    let fragile = profile.manipulation_tolerance == Level::Low;
    let tense = profile.tension_sensitivity == Level::High;
    let level = match (fragile, tense) {
        (true, true) => Some(NeedLevel::Critical),
        (true, false) | (false, true) => Some(NeedLevel::High),
        (false, false) if risk.level >= RiskLevel::High => Some(NeedLevel::Moderate),
        (false, false) => None,
    }?;
    let reason = if fragile || tense {
        "low manipulation tolerance or high tension sensitivity"
    } else {
        "elevated overall risk"
    };
    Some(CareNeed::new(CareNeedCategory::Rest, level, reason))
}

fn protection(profile: &Profile) -> Option<CareNeed> {
    let textured =
        profile.is_texture(TextureClass::Curly) || profile.is_texture(TextureClass::Coily);
    let tangles = profile.detangle_tolerance == Level::Low;
    if !textured && !tangles {
        return None;
    }
    let level = if tangles && profile.strand_thickness == Level::Low {
        NeedLevel::High
    } else {
        NeedLevel::Moderate
    };
    Some(CareNeed::new(
        CareNeedCategory::Protection,
        level,
        "ends and strands need protection from friction",
    ))
}

fn scalp_care(profile: &Profile, health: &HealthScore) -> Option<CareNeed> {
    let level = match profile.scalp_sensitivity {
        Level::High => NeedLevel::High,
        Level::Medium => NeedLevel::Moderate,
        Level::Low | Level::Unknown if health.scalp < 50.0 => NeedLevel::Moderate,
        Level::Low | Level::Unknown => return None,
    };
    Some(CareNeed::new(
        CareNeedCategory::ScalpCare,
        level,
        format!("scalp score {:.0}", health.scalp),
    ))
}
