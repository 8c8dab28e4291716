//! Immutable ritual catalog.
//!
//! Criteria are keyed by the profile enums themselves, so an unknown texture
//! or need category cannot be expressed. The remaining shape errors (empty
//! groups, bad bounds, duplicate ids) are rejected when a catalog is built.

use std::collections::HashSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::{ActivityType, FrequencyCategory, LoadLevel};
use crate::analysis::{CareNeed, CareNeedCategory, ProfileAnalysis};
use crate::error::{CatalogError, CoreError};
use crate::profile::{Level, PatternFamily, Profile, TextureClass};

/// Applicability predicate for a template.
///
/// Each declared group is an OR over its values; every declared group must
/// hold for the template to apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Criteria {
    pub texture_classes: Option<Vec<TextureClass>>,
    pub pattern_families: Option<Vec<PatternFamily>>,
    pub porosity_levels: Option<Vec<Level>>,
    pub care_needs: Option<Vec<CareNeedCategory>>,
    pub min_health_score: Option<u8>,
    pub max_health_score: Option<u8>,
}

/// Outcome of checking a template's criteria against one analysed profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriteriaEvaluation<'a> {
    pub matched: bool,
    pub porosity_matched: bool,
    /// Profile needs named by the care-need group.
    pub matched_needs: Vec<&'a CareNeed>,
    /// A declared `max_health_score` bound was satisfied.
    pub max_health_satisfied: bool,
}

fn group_matches<T: PartialEq>(group: &Option<Vec<T>>, value: Option<T>) -> Option<bool> {
    group
        .as_ref()
        .map(|allowed| value.map_or(false, |v| allowed.contains(&v)))
}

impl Criteria {
    pub fn evaluate<'a>(
        &self,
        profile: &Profile,
        analysis: &'a ProfileAnalysis,
    ) -> CriteriaEvaluation<'a> {
        let texture = group_matches(&self.texture_classes, profile.texture_class);
        let pattern = group_matches(&self.pattern_families, profile.pattern_family);
        let porosity = group_matches(&self.porosity_levels, Some(profile.porosity_level));

        let matched_needs: Vec<&CareNeed> = match &self.care_needs {
            Some(categories) => analysis
                .care_needs
                .iter()
                .filter(|need| categories.contains(&need.category))
                .collect(),
            None => Vec::new(),
        };
        let needs = self.care_needs.as_ref().map(|_| !matched_needs.is_empty());

        let overall = analysis.health_score.overall;
        let min_ok = self.min_health_score.map_or(true, |min| overall >= min);
        let max_health_satisfied = self.max_health_score.map_or(false, |max| overall <= max);
        let max_ok = self.max_health_score.is_none() || max_health_satisfied;

        let matched = [texture, pattern, porosity, needs]
            .iter()
            .all(|group| group.unwrap_or(true))
            && min_ok
            && max_ok;

        CriteriaEvaluation {
            matched,
            porosity_matched: porosity == Some(true),
            matched_needs,
            max_health_satisfied,
        }
    }

    fn validate(&self, id: &str) -> Result<(), CatalogError> {
        let empty = |group: &'static str| CatalogError::EmptyGroup {
            id: id.to_string(),
            group,
        };
        if self.texture_classes.as_ref().is_some_and(Vec::is_empty) {
            return Err(empty("texture_classes"));
        }
        if self.pattern_families.as_ref().is_some_and(Vec::is_empty) {
            return Err(empty("pattern_families"));
        }
        if self.porosity_levels.as_ref().is_some_and(Vec::is_empty) {
            return Err(empty("porosity_levels"));
        }
        if self.care_needs.as_ref().is_some_and(Vec::is_empty) {
            return Err(empty("care_needs"));
        }
        for value in [self.min_health_score, self.max_health_score].into_iter().flatten() {
            if value > 100 {
                return Err(CatalogError::BoundOutOfRange {
                    id: id.to_string(),
                    value,
                });
            }
        }
        if let (Some(min), Some(max)) = (self.min_health_score, self.max_health_score) {
            if min > max {
                return Err(CatalogError::InvertedBounds {
                    id: id.to_string(),
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// A recurring care activity template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RitualTemplate {
    pub id: String,
    pub name: String,
    pub activity_type: ActivityType,
    pub load_level: LoadLevel,
    pub default_duration_minutes: u32,
    pub frequency: FrequencyCategory,
    pub steps: Vec<String>,
    #[serde(default)]
    pub criteria: Criteria,
}

impl RitualTemplate {
    fn validate(&self) -> Result<(), CatalogError> {
        if self.steps.is_empty() {
            return Err(CatalogError::NoSteps(self.id.clone()));
        }
        if self.default_duration_minutes == 0 {
            return Err(CatalogError::ZeroDuration(self.id.clone()));
        }
        self.criteria.validate(&self.id)
    }
}

/// Validated, read-only set of ritual templates.
#[derive(Debug, Clone)]
pub struct RitualCatalog {
    templates: Vec<RitualTemplate>,
}

impl RitualCatalog {
    /// Build a catalog, validating every template.
    ///
    /// # Errors
    /// Returns the first [`CatalogError`] found.
    pub fn new(templates: Vec<RitualTemplate>) -> Result<Self, CatalogError> {
        let mut ids = HashSet::new();
        for template in &templates {
            if !ids.insert(template.id.as_str()) {
                return Err(CatalogError::DuplicateId(template.id.clone()));
            }
            template.validate()?;
        }
        Ok(Self { templates })
    }

    /// Load a catalog from a JSON array of templates.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or a template is invalid.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let templates: Vec<RitualTemplate> = serde_json::from_str(json)?;
        Ok(Self::new(templates)?)
    }

    /// The built-in catalog, validated on first use.
    pub fn builtin() -> &'static RitualCatalog {
        static CATALOG: OnceLock<RitualCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            RitualCatalog::new(builtin_templates())
                .unwrap_or_else(|err| panic!("built-in ritual catalog is malformed: {err}"))
        })
    }

    /// Templates in catalog order.
    pub fn templates(&self) -> &[RitualTemplate] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&RitualTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[allow(clippy::too_many_arguments)]
fn template(
    id: &str,
    name: &str,
    activity_type: ActivityType,
    load_level: LoadLevel,
    default_duration_minutes: u32,
    frequency: FrequencyCategory,
    steps: &[&str],
    criteria: Criteria,
) -> RitualTemplate {
    RitualTemplate {
        id: id.to_string(),
        name: name.to_string(),
        activity_type,
        load_level,
        default_duration_minutes,
        frequency,
        steps: steps.iter().map(|s| s.to_string()).collect(),
        criteria,
    }
}

fn builtin_templates() -> Vec<RitualTemplate> {
    use ActivityType as A;
    use CareNeedCategory as N;
    use FrequencyCategory as F;
    use LoadLevel as L;

    vec![
        template(
            "wash-day-full",
            "Full Wash Day",
            A::WashDay,
            L::Heavy,
            150,
            F::Weekly,
            &[
                "Pre-poo with oil",
                "Shampoo scalp only",
                "Condition and finger detangle",
                "Deep condition under a cap",
                "Rinse cool and apply leave-in",
                "Style and air dry",
            ],
            Criteria {
                texture_classes: Some(vec![TextureClass::Curly, TextureClass::Coily]),
                ..Criteria::default()
            },
        ),
        template(
            "wash-day-quick",
            "Quick Wash",
            A::WashDay,
            L::Standard,
            45,
            F::TwiceWeekly,
            &["Shampoo", "Condition", "Light leave-in"],
            Criteria {
                texture_classes: Some(vec![TextureClass::Straight, TextureClass::Wavy]),
                ..Criteria::default()
            },
        ),
        template(
            "clarify-reset",
            "Clarifying Reset",
            A::WashDay,
            L::Heavy,
            120,
            F::BiWeekly,
            &["Clarifying shampoo", "Warm rinse", "Steam deep condition", "Seal"],
            Criteria {
                porosity_levels: Some(vec![Level::Low]),
                ..Criteria::default()
            },
        ),
        template(
            "protein-rebuild",
            "Protein Rebuild",
            A::ProteinTreatment,
            L::Heavy,
            60,
            F::BiWeekly,
            &[
                "Apply protein treatment",
                "Heat for 20 minutes",
                "Rinse",
                "Moisturising conditioner",
            ],
            Criteria {
                care_needs: Some(vec![N::Protein]),
                ..Criteria::default()
            },
        ),
        template(
            "protein-light",
            "Light Protein Boost",
            A::ProteinTreatment,
            L::Standard,
            30,
            F::Monthly,
            &["Protein leave-in on damp hair", "Seal with oil"],
            Criteria {
                porosity_levels: Some(vec![Level::Medium, Level::High]),
                ..Criteria::default()
            },
        ),
        template(
            "scalp-soothe",
            "Scalp Soothing Treatment",
            A::ScalpTreatment,
            L::Light,
            20,
            F::Weekly,
            &["Part hair in sections", "Apply soothing tonic", "Massage gently for 5 minutes"],
            Criteria {
                care_needs: Some(vec![N::ScalpCare]),
                ..Criteria::default()
            },
        ),
        template(
            "scalp-massage",
            "Stimulating Scalp Massage",
            A::ScalpTreatment,
            L::Light,
            15,
            F::TwiceWeekly,
            &["Warm a few drops of oil", "Massage in circles for 10 minutes"],
            Criteria {
                max_health_score: Some(70),
                ..Criteria::default()
            },
        ),
        template(
            "moisture-lco",
            "LCO Moisture Refresh",
            A::MoistureRefresh,
            L::Light,
            15,
            F::TwiceWeekly,
            &["Mist with water", "Leave-in", "Cream", "Seal with oil"],
            Criteria {
                care_needs: Some(vec![N::Moisture]),
                texture_classes: Some(vec![TextureClass::Curly, TextureClass::Coily]),
                ..Criteria::default()
            },
        ),
        template(
            "style-refresh",
            "Curl and Wave Refresh",
            A::StyleRefresh,
            L::Light,
            20,
            F::TwiceWeekly,
            &["Mist", "Scrunch in light gel", "Diffuse or air dry"],
            Criteria {
                texture_classes: Some(vec![TextureClass::Wavy, TextureClass::Curly]),
                ..Criteria::default()
            },
        ),
        template(
            "deep-condition",
            "Deep Conditioning",
            A::DeepCondition,
            L::Standard,
            45,
            F::Weekly,
            &["Apply deep conditioner", "Cover with cap", "Heat 20-30 minutes", "Rinse cool"],
            Criteria {
                porosity_levels: Some(vec![Level::High]),
                care_needs: Some(vec![N::Moisture]),
                ..Criteria::default()
            },
        ),
        template(
            "hot-oil",
            "Hot Oil Treatment",
            A::HotOilTreatment,
            L::Standard,
            40,
            F::BiWeekly,
            &["Warm oil", "Apply to lengths and ends", "Cover for 30 minutes", "Shampoo out"],
            Criteria {
                porosity_levels: Some(vec![Level::Low, Level::Medium]),
                ..Criteria::default()
            },
        ),
        template(
            "protective-install",
            "Protective Style Install",
            A::ProtectiveInstall,
            L::Heavy,
            240,
            F::Monthly,
            &["Stretch hair", "Section", "Install style with low tension", "Oil scalp"],
            Criteria {
                texture_classes: Some(vec![TextureClass::Curly, TextureClass::Coily]),
                care_needs: Some(vec![N::Protection]),
                ..Criteria::default()
            },
        ),
        template(
            "gentle-detangle",
            "Gentle Detangling Session",
            A::Detangle,
            L::Standard,
            40,
            F::Weekly,
            &[
                "Saturate with slip conditioner",
                "Finger detangle in sections",
                "Wide-tooth comb ends",
            ],
            Criteria {
                texture_classes: Some(vec![TextureClass::Coily]),
                pattern_families: Some(vec![PatternFamily::B, PatternFamily::C]),
                ..Criteria::default()
            },
        ),
        template(
            "trim-dusting",
            "Dusting Trim",
            A::Trim,
            L::Standard,
            30,
            F::Monthly,
            &["Stretch a small section", "Dust split ends", "Repeat around the head"],
            Criteria::default(),
        ),
    ]
}
