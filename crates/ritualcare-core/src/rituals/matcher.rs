//! Ritual matching and priority escalation.
//!
//! A template is recommended when its criteria match. Its priority starts at
//! `Optional` and is escalated by [`ESCALATION_RULES`], an ordered table of
//! signal → escalation pairs.
//!
//! The `max_health_score` rule forces `Essential` even when no care need is
//! involved. It is kept deliberately for parity with existing schedules.

use serde::{Deserialize, Serialize};

use super::catalog::{RitualCatalog, RitualTemplate};
use super::FrequencyCategory;
use crate::analysis::{NeedLevel, ProfileAnalysis};
use crate::profile::Profile;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Essential,
    Recommended,
    Optional,
}

impl Priority {
    /// Sort rank, lowest first.
    pub fn rank(self) -> u8 {
        match self {
            Priority::Essential => 0,
            Priority::Recommended => 1,
            Priority::Optional => 2,
        }
    }
}

/// Facts about one template/profile match that escalation rules read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchSignals {
    pub porosity_matched: bool,
    pub urgent_need_matched: bool,
    pub critical_need_matched: bool,
    pub max_health_satisfied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Raise to at least this priority.
    RaiseTo(Priority),
    /// Override whatever the other rules decided.
    Force(Priority),
}

pub struct EscalationRule {
    pub key: &'static str,
    pub reason: &'static str,
    pub applies: fn(&MatchSignals) -> bool,
    pub escalation: Escalation,
}

pub const ESCALATION_RULES: &[EscalationRule] = &[
    EscalationRule {
        key: "porosity_match",
        reason: "suited to your porosity",
        applies: |s| s.porosity_matched,
        escalation: Escalation::RaiseTo(Priority::Recommended),
    },
    EscalationRule {
        key: "urgent_need",
        reason: "addresses a high-priority care need",
        applies: |s| s.urgent_need_matched,
        escalation: Escalation::RaiseTo(Priority::Essential),
    },
    EscalationRule {
        key: "max_health_bound",
        reason: "recommended while your health score is in its target range",
        applies: |s| s.max_health_satisfied,
        escalation: Escalation::Force(Priority::Essential),
    },
];

/// Apply [`ESCALATION_RULES`] to a set of signals.
///
/// Returns the final priority and the reasons of every rule that fired.
pub fn escalate(signals: &MatchSignals) -> (Priority, Vec<&'static str>) {
    let mut priority = Priority::Optional;
    let mut forced = None;
    let mut reasons = Vec::new();

    for rule in ESCALATION_RULES.iter().filter(|rule| (rule.applies)(signals)) {
        reasons.push(rule.reason);
        match rule.escalation {
            Escalation::RaiseTo(target) => {
                if target.rank() < priority.rank() {
                    priority = target;
                }
            }
            Escalation::Force(target) => forced = Some(target),
        }
    }

    (forced.unwrap_or(priority), reasons)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RitualRecommendation {
    pub template: RitualTemplate,
    pub priority: Priority,
    pub reasoning: Vec<String>,
    pub suggested_frequency: FrequencyCategory,
}

/// Matches catalog templates against an analysed profile.
#[derive(Debug, Clone, Copy)]
pub struct RitualMatcher<'c> {
    catalog: &'c RitualCatalog,
}

impl Default for RitualMatcher<'static> {
    fn default() -> Self {
        Self::new(RitualCatalog::builtin())
    }
}

impl<'c> RitualMatcher<'c> {
    pub fn new(catalog: &'c RitualCatalog) -> Self {
        Self { catalog }
    }

    /// Recommendations sorted Essential → Recommended → Optional, ties in catalog order.
    pub fn match_rituals(
        &self,
        profile: &Profile,
        analysis: &ProfileAnalysis,
    ) -> Vec<RitualRecommendation> {
        let mut recommendations: Vec<RitualRecommendation> = self
            .catalog
            .templates()
            .iter()
            .filter_map(|template| recommend(template, profile, analysis))
            .collect();

        // sort_by_key is stable, so ties keep catalog order.
        recommendations.sort_by_key(|rec| rec.priority.rank());
        recommendations
    }
}

fn recommend(
    template: &RitualTemplate,
    profile: &Profile,
    analysis: &ProfileAnalysis,
) -> Option<RitualRecommendation> {
    let eval = template.criteria.evaluate(profile, analysis);
    if !eval.matched {
        return None;
    }

    let signals = MatchSignals {
        porosity_matched: eval.porosity_matched,
        urgent_need_matched: eval.matched_needs.iter().any(|n| n.level.is_urgent()),
        critical_need_matched: eval
            .matched_needs
            .iter()
            .any(|n| n.level == NeedLevel::Critical),
        max_health_satisfied: eval.max_health_satisfied,
    };
    let (priority, reasons) = escalate(&signals);

    let mut reasoning: Vec<String> = eval
        .matched_needs
        .iter()
        .map(|need| format!("{:?} need is {:?}: {}", need.category, need.level, need.reason))
        .collect();
    reasoning.extend(reasons.into_iter().map(str::to_string));
    if reasoning.is_empty() {
        reasoning.push("matches your profile".to_string());
    }

    let suggested_frequency = if priority == Priority::Essential && signals.critical_need_matched {
        template.frequency.more_frequent()
    } else {
        template.frequency
    };

    Some(RitualRecommendation {
        template: template.clone(),
        priority,
        reasoning,
        suggested_frequency,
    })
}
