//! Archetype detection.
//!
//! The detector is an ordered decision table: the first rule whose condition
//! holds names the archetype, and `Explorer` is the fallback when none does.

use serde::{Deserialize, Serialize};

use crate::profile::{Level, Profile, RoutineType, TextureClass};

/// Named cluster summarising a profile's dominant care pattern.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Archetype {
    ScalpGuardian,
    LengthBuilder,
    BuildupBalancer,
    ShrinkageNavigator,
    FineStrandProtector,
    MoistureSeeker,
    WaveKeeper,
    Explorer,
}

impl Archetype {
    pub const ALL: [Archetype; 8] = [
        Archetype::ScalpGuardian,
        Archetype::LengthBuilder,
        Archetype::BuildupBalancer,
        Archetype::ShrinkageNavigator,
        Archetype::FineStrandProtector,
        Archetype::MoistureSeeker,
        Archetype::WaveKeeper,
        Archetype::Explorer,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Archetype::ScalpGuardian => "Scalp Guardian",
            Archetype::LengthBuilder => "Length Builder",
            Archetype::BuildupBalancer => "Buildup Balancer",
            Archetype::ShrinkageNavigator => "Shrinkage Navigator",
            Archetype::FineStrandProtector => "Fine Strand Protector",
            Archetype::MoistureSeeker => "Moisture Seeker",
            Archetype::WaveKeeper => "Wave Keeper",
            Archetype::Explorer => "Explorer",
        }
    }

    pub fn focus(self) -> &'static str {
        match self {
            Archetype::ScalpGuardian => "Soothe the scalp first; everything else follows",
            Archetype::LengthBuilder => "Retain length with low-manipulation routines",
            Archetype::BuildupBalancer => "Clarify regularly and use heat to open the cuticle",
            Archetype::ShrinkageNavigator => "Stretch gently and keep ends protected",
            Archetype::FineStrandProtector => "Light products, minimal tension, frequent protein",
            Archetype::MoistureSeeker => "Layer and seal moisture between wash days",
            Archetype::WaveKeeper => "Define waves without weighing them down",
            Archetype::Explorer => "Experiment and track what your hair responds to",
        }
    }
}

/// One row of the archetype table.
pub struct ArchetypeRule {
    pub archetype: Archetype,
    pub condition: fn(&Profile) -> bool,
}

/// Archetype rules in priority order. `Explorer` is not listed; it is the fallback.
pub const ARCHETYPE_RULES: &[ArchetypeRule] = &[
    ArchetypeRule {
        archetype: Archetype::ScalpGuardian,
        condition: |p| p.scalp_sensitivity == Level::High,
    },
    ArchetypeRule {
        archetype: Archetype::LengthBuilder,
        condition: |p| p.routine_type == Some(RoutineType::GrowthFocused),
    },
    ArchetypeRule {
        archetype: Archetype::BuildupBalancer,
        condition: |p| p.porosity_level == Level::Low,
    },
    ArchetypeRule {
        archetype: Archetype::ShrinkageNavigator,
        condition: |p| p.is_texture(TextureClass::Coily) && p.shrinkage_tendency == Level::High,
    },
    ArchetypeRule {
        archetype: Archetype::FineStrandProtector,
        condition: |p| p.strand_thickness == Level::Low,
    },
    ArchetypeRule {
        archetype: Archetype::MoistureSeeker,
        condition: |p| p.porosity_level == Level::High && p.is_texture(TextureClass::Curly),
    },
    ArchetypeRule {
        archetype: Archetype::WaveKeeper,
        condition: |p| p.is_texture(TextureClass::Wavy),
    },
];

/// First matching rule wins.
pub fn detect(profile: &Profile) -> Archetype {
    ARCHETYPE_RULES
        .iter()
        .find(|rule| (rule.condition)(profile))
        .map(|rule| rule.archetype)
        .unwrap_or(Archetype::Explorer)
}
