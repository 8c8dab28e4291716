//! Risk assessment driven by an ordered rule table.
//!
//! Each rule that fires contributes its severity weight; the total is clipped
//! to 100 and bucketed into an overall level.

use serde::{Deserialize, Serialize};

use crate::profile::{Level, LoadFactor, Profile};

/// Severity of a single risk factor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskSeverity {
    Low,
    Medium,
    High,
}

impl RiskSeverity {
    pub fn weight(self) -> u8 {
        match self {
            RiskSeverity::Low => 10,
            RiskSeverity::Medium => 25,
            RiskSeverity::High => 40,
        }
    }
}

/// Overall risk level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => RiskLevel::Critical,
            50..=79 => RiskLevel::High,
            25..=49 => RiskLevel::Moderate,
            _ => RiskLevel::Low,
        }
    }
}

/// A risk factor that applied to the profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskFactor {
    pub key: String,
    pub description: String,
    pub severity: RiskSeverity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RiskAssessment {
    pub score: u8,
    pub level: RiskLevel,
    pub factors: Vec<RiskFactor>,
}

/// One row of the risk table.
pub struct RiskRule {
    pub key: &'static str,
    pub description: &'static str,
    pub severity: RiskSeverity,
    pub applies: fn(&Profile) -> bool,
}

/// Risk rules in evaluation order.
pub const RISK_RULES: &[RiskRule] = &[
    RiskRule {
        key: "traction_stress",
        description: "High tension sensitivity makes tight styles risky",
        severity: RiskSeverity::High,
        applies: |p| p.tension_sensitivity == Level::High,
    },
    RiskRule {
        key: "manipulation_damage",
        description: "Low manipulation tolerance; frequent handling causes breakage",
        severity: RiskSeverity::High,
        applies: |p| p.manipulation_tolerance == Level::Low,
    },
    RiskRule {
        key: "scalp_irritation",
        description: "Sensitive scalp reacts to harsh products and buildup",
        severity: RiskSeverity::Medium,
        applies: |p| p.scalp_sensitivity == Level::High,
    },
    RiskRule {
        key: "moisture_loss",
        description: "High porosity loses moisture quickly",
        severity: RiskSeverity::Medium,
        applies: |p| p.porosity_level == Level::High,
    },
    RiskRule {
        key: "fine_strand_breakage",
        description: "Fine strands snap under mechanical stress",
        severity: RiskSeverity::Medium,
        applies: |p| p.strand_thickness == Level::Low,
    },
    RiskRule {
        key: "detangling_breakage",
        description: "Low detangle tolerance turns wash day into breakage",
        severity: RiskSeverity::Medium,
        applies: |p| p.detangle_tolerance == Level::Low,
    },
    RiskRule {
        key: "single_strand_knots",
        description: "High shrinkage encourages knots and tangles",
        severity: RiskSeverity::Low,
        applies: |p| p.shrinkage_tendency == Level::High,
    },
    RiskRule {
        key: "product_buildup",
        description: "Low porosity lets product sit on the strand",
        severity: RiskSeverity::Low,
        applies: |p| p.porosity_level == Level::Low,
    },
    RiskRule {
        key: "wash_day_fatigue",
        description: "Heavy wash days tempt skipped steps",
        severity: RiskSeverity::Low,
        applies: |p| p.wash_day_load_factor == LoadFactor::Heavy,
    },
];

impl RiskAssessment {
    pub fn assess(profile: &Profile) -> Self {
        let factors: Vec<RiskFactor> = RISK_RULES
            .iter()
            .filter(|rule| (rule.applies)(profile))
            .map(|rule| RiskFactor {
                key: rule.key.to_string(),
                description: rule.description.to_string(),
                severity: rule.severity,
            })
            .collect();

        let total: u32 = factors.iter().map(|f| u32::from(f.severity.weight())).sum();
        let score = total.min(100) as u8;

        Self {
            score,
            level: RiskLevel::from_score(score),
            factors,
        }
    }
}
