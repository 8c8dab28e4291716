//! Weighted health score.

use serde::{Deserialize, Serialize};

use crate::profile::{LoadFactor, Profile, RoutineType};

const HYDRATION_WEIGHT: f64 = 0.30;
const STRENGTH_WEIGHT: f64 = 0.25;
const SCALP_WEIGHT: f64 = 0.20;
const ROUTINE_WEIGHT: f64 = 0.25;

/// Points per unlocked learning node, and the cap on that bonus.
const LEARNING_BONUS_PER_NODE: f64 = 2.0;
const LEARNING_BONUS_CAP: f64 = 10.0;

/// Letter grade for the overall score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => Grade::A,
            80..=89 => Grade::B,
            70..=79 => Grade::C,
            60..=69 => Grade::D,
            _ => Grade::F,
        }
    }
}

/// Health score with its four weighted components.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthScore {
    pub hydration: f64,
    pub strength: f64,
    pub scalp: f64,
    pub routine: f64,
    pub overall: u8,
    pub grade: Grade,
}

impl HealthScore {
    pub fn compute(profile: &Profile) -> Self {
        let hydration = mean(&[
            profile.porosity_level.inverted_score(),
            profile.shrinkage_tendency.inverted_score(),
        ]);
        let strength = mean(&[
            profile.strand_thickness.score(),
            profile.detangle_tolerance.score(),
            profile.manipulation_tolerance.score(),
            profile.density.score(),
        ]);
        let scalp = mean(&[
            profile.scalp_sensitivity.inverted_score(),
            profile.tension_sensitivity.inverted_score(),
        ]);
        let routine = routine_score(profile);

        let weighted = HYDRATION_WEIGHT * hydration
            + STRENGTH_WEIGHT * strength
            + SCALP_WEIGHT * scalp
            + ROUTINE_WEIGHT * routine;
        let overall = weighted.round().clamp(0.0, 100.0) as u8;

        Self {
            hydration,
            strength,
            scalp,
            routine,
            overall,
            grade: Grade::from_score(overall),
        }
    }
}

fn routine_score(profile: &Profile) -> f64 {
    let base = match profile.routine_type {
        Some(RoutineType::Minimal) => 55.0,
        Some(RoutineType::Moderate) => 70.0,
        Some(RoutineType::Intensive) => 75.0,
        Some(RoutineType::GrowthFocused) => 85.0,
        None => 50.0,
    };
    let wash_penalty = match profile.wash_day_load_factor {
        LoadFactor::Heavy => 10.0,
        LoadFactor::Standard | LoadFactor::Light => 0.0,
    };
    let learning = (profile.unlocked_nodes.len() as f64 * LEARNING_BONUS_PER_NODE)
        .min(LEARNING_BONUS_CAP);

    (base - wash_penalty + learning).clamp(0.0, 100.0)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
