//! Weekly ritual timetable.
//!
//! Placement is a fixed greedy pass over the recommendations, in this order:
//!
//! 1. wash day on Saturday morning (Sunday becomes a rest day when it is heavy)
//! 2. protein treatment on Wednesday evening, unless monthly or over the heavy budget
//! 3. scalp treatment on Monday evening
//! 4. moisture/style refresh copies on Tuesday, Thursday and Friday mornings
//! 5. rest-day backfill on the lightest remaining days
//!
//! This is not an optimiser; the same recommendations always yield the same week.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::WeeklyLoadCapacity;
use crate::rituals::{
    ActivityType, FrequencyCategory, LoadLevel, Priority, RitualRecommendation,
};

pub const SUNDAY: usize = 0;
pub const MONDAY: usize = 1;
pub const TUESDAY: usize = 2;
pub const WEDNESDAY: usize = 3;
pub const THURSDAY: usize = 4;
pub const FRIDAY: usize = 5;
pub const SATURDAY: usize = 6;

const REFRESH_DAYS: [usize; 3] = [TUESDAY, THURSDAY, FRIDAY];
const OPTIMAL_LOAD_RATIO: f64 = 0.6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

/// One ritual placed on a weekday.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacedRitual {
    pub template_id: String,
    pub name: String,
    pub activity_type: ActivityType,
    pub load_level: LoadLevel,
    pub load_score: u8,
    pub duration_minutes: u32,
    pub time_of_day: TimeOfDay,
    pub priority: Priority,
}

impl PlacedRitual {
    fn from_recommendation(rec: &RitualRecommendation, time_of_day: TimeOfDay) -> Self {
        Self {
            template_id: rec.template.id.clone(),
            name: rec.template.name.clone(),
            activity_type: rec.template.activity_type,
            load_level: rec.template.load_level,
            load_score: rec.template.load_level.score(),
            duration_minutes: rec.template.default_duration_minutes,
            time_of_day,
            priority: rec.priority,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyRitualSlot {
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    pub rituals: Vec<PlacedRitual>,
    pub total_load: u8,
    pub is_rest_day: bool,
}

impl WeeklyRitualSlot {
    fn empty(day_of_week: u8) -> Self {
        Self {
            day_of_week,
            rituals: Vec::new(),
            total_load: 0,
            is_rest_day: false,
        }
    }

    fn place(&mut self, ritual: PlacedRitual) {
        self.rituals.push(ritual);
        let sum: u32 = self.rituals.iter().map(|r| u32::from(r.load_score)).sum();
        self.total_load = sum.min(100) as u8;
    }

    pub fn has_heavy(&self) -> bool {
        self.rituals.iter().any(|r| r.load_level == LoadLevel::Heavy)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LoadBalance {
    Under,
    Optimal,
    Over,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklyLoadSummary {
    pub total_weekly_load: u32,
    pub max_capacity: u32,
    pub balance: LoadBalance,
}

impl WeeklyLoadSummary {
    pub fn new(total_weekly_load: u32, capacity: &WeeklyLoadCapacity) -> Self {
        let max_capacity = capacity.max_weekly_load();
        let balance = if total_weekly_load > max_capacity {
            LoadBalance::Over
        } else if f64::from(total_weekly_load) >= OPTIMAL_LOAD_RATIO * f64::from(max_capacity) {
            LoadBalance::Optimal
        } else {
            LoadBalance::Under
        };
        Self {
            total_weekly_load,
            max_capacity,
            balance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeeklySchedule {
    /// Exactly seven slots, Sunday first.
    pub days: Vec<WeeklyRitualSlot>,
    pub summary: WeeklyLoadSummary,
}

impl WeeklySchedule {
    pub fn day(&self, day_of_week: usize) -> Option<&WeeklyRitualSlot> {
        self.days.get(day_of_week)
    }

    pub fn rest_days(&self) -> impl Iterator<Item = &WeeklyRitualSlot> {
        self.days.iter().filter(|d| d.is_rest_day)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WeeklyScheduleBuilder;

impl WeeklyScheduleBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(
        &self,
        recommendations: &[RitualRecommendation],
        capacity: &WeeklyLoadCapacity,
    ) -> WeeklySchedule {
        let mut days: Vec<WeeklyRitualSlot> = (0..7u8).map(WeeklyRitualSlot::empty).collect();
        let mut heavy_days = 0u8;
        let find = |activity: ActivityType| {
            recommendations
                .iter()
                .find(|rec| rec.template.activity_type == activity)
        };

        if let Some(wash) = find(ActivityType::WashDay) {
            days[SATURDAY].place(PlacedRitual::from_recommendation(wash, TimeOfDay::Morning));
            if wash.template.load_level == LoadLevel::Heavy {
                heavy_days += 1;
                days[SUNDAY].is_rest_day = true;
            }
            debug!(template = %wash.template.id, "placed wash day on Saturday");
        }

        if let Some(protein) = find(ActivityType::ProteinTreatment) {
            let heavy = protein.template.load_level == LoadLevel::Heavy;
            if protein.suggested_frequency == FrequencyCategory::Monthly {
                debug!(template = %protein.template.id, "monthly protein left off the weekly plan");
            } else if heavy && heavy_days >= capacity.max_heavy_days {
                debug!(
                    template = %protein.template.id,
                    max_heavy_days = capacity.max_heavy_days,
                    "heavy budget exhausted; protein not placed"
                );
            } else {
                days[WEDNESDAY]
                    .place(PlacedRitual::from_recommendation(protein, TimeOfDay::Evening));
            }
        }

        if let Some(scalp) = find(ActivityType::ScalpTreatment) {
            days[MONDAY].place(PlacedRitual::from_recommendation(scalp, TimeOfDay::Evening));
        }

        if let Some(refresh) = recommendations
            .iter()
            .find(|rec| rec.template.activity_type.is_refresh())
        {
            if refresh.suggested_frequency != FrequencyCategory::Weekly {
                for day in REFRESH_DAYS {
                    if days[day].rituals.is_empty() && !days[day].is_rest_day {
                        days[day]
                            .place(PlacedRitual::from_recommendation(refresh, TimeOfDay::Morning));
                    }
                }
            }
        }

        backfill_rest_days(&mut days, capacity.recommended_rest_days);

        let total: u32 = days.iter().map(|d| u32::from(d.total_load)).sum();
        WeeklySchedule {
            days,
            summary: WeeklyLoadSummary::new(total, capacity),
        }
    }
}

/// Mark the lightest non-rest days (ties by day index) as rest days until the
/// target count is met. Days carrying a heavy ritual are never chosen.
fn backfill_rest_days(days: &mut [WeeklyRitualSlot], target: u8) {
    let mut rest_count = days.iter().filter(|d| d.is_rest_day).count();
    while rest_count < usize::from(target) {
        let candidate = days
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.is_rest_day && !d.has_heavy())
            .min_by_key(|(index, d)| (d.total_load, *index))
            .map(|(index, _)| index);
        match candidate {
            Some(index) => {
                days[index].is_rest_day = true;
                rest_count += 1;
            }
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Level, Profile};
    use crate::rituals::{Criteria, RitualTemplate};

    fn rec(
        id: &str,
        activity: ActivityType,
        load: LoadLevel,
        frequency: FrequencyCategory,
    ) -> RitualRecommendation {
        RitualRecommendation {
            template: RitualTemplate {
                id: id.to_string(),
                name: id.to_string(),
                activity_type: activity,
                load_level: load,
                default_duration_minutes: 30,
                frequency,
                steps: vec!["step".into()],
                criteria: Criteria::default(),
            },
            priority: Priority::Essential,
            reasoning: vec![],
            suggested_frequency: frequency,
        }
    }

    fn capacity() -> WeeklyLoadCapacity {
        WeeklyLoadCapacity::for_profile(&Profile::default())
    }

    fn rest_indexes(schedule: &WeeklySchedule) -> Vec<u8> {
        schedule.rest_days().map(|d| d.day_of_week).collect()
    }

    #[test]
    fn single_heavy_wash_day() {
        let recs = vec![rec(
            "wash",
            ActivityType::WashDay,
            LoadLevel::Heavy,
            FrequencyCategory::Weekly,
        )];
        let schedule = WeeklyScheduleBuilder::new().build(&recs, &capacity());

        let saturday = schedule.day(SATURDAY).unwrap();
        assert_eq!(saturday.total_load, 60);
        assert!(!saturday.is_rest_day);
        let sunday = schedule.day(SUNDAY).unwrap();
        assert!(sunday.is_rest_day);
        assert_eq!(sunday.total_load, 0);
        // recommended_rest_days = 2: Sunday plus the lightest, earliest weekday.
        assert_eq!(rest_indexes(&schedule), vec![0, 1]);
        assert_eq!(schedule.summary.total_weekly_load, 60);
    }

    #[test]
    fn four_rest_days_fill_from_monday() {
        let low_tolerance = WeeklyLoadCapacity::for_profile(&Profile {
            manipulation_tolerance: Level::Low,
            ..Profile::default()
        });
        let recs = vec![rec(
            "wash",
            ActivityType::WashDay,
            LoadLevel::Heavy,
            FrequencyCategory::Weekly,
        )];
        let schedule = WeeklyScheduleBuilder::new().build(&recs, &low_tolerance);
        assert_eq!(rest_indexes(&schedule), vec![0, 1, 2, 3]);
    }

    #[test]
    fn full_week_topology() {
        let recs = vec![
            rec("wash", ActivityType::WashDay, LoadLevel::Heavy, FrequencyCategory::Weekly),
            rec(
                "protein",
                ActivityType::ProteinTreatment,
                LoadLevel::Heavy,
                FrequencyCategory::BiWeekly,
            ),
            rec("scalp", ActivityType::ScalpTreatment, LoadLevel::Light, FrequencyCategory::Weekly),
            rec(
                "refresh",
                ActivityType::MoistureRefresh,
                LoadLevel::Light,
                FrequencyCategory::TwiceWeekly,
            ),
        ];
        let schedule = WeeklyScheduleBuilder::new().build(&recs, &capacity());

        assert_eq!(schedule.days[SATURDAY].rituals[0].time_of_day, TimeOfDay::Morning);
        assert_eq!(schedule.days[WEDNESDAY].rituals[0].template_id, "protein");
        assert_eq!(schedule.days[WEDNESDAY].rituals[0].time_of_day, TimeOfDay::Evening);
        assert_eq!(schedule.days[MONDAY].rituals[0].template_id, "scalp");
        for day in REFRESH_DAYS {
            assert_eq!(schedule.days[day].rituals[0].template_id, "refresh");
        }
        // Sunday is the only empty day; a second rest day lands on the lightest
        // non-heavy day, Monday (15) before Tuesday (15) by index.
        assert_eq!(rest_indexes(&schedule), vec![0, 1]);
        assert_eq!(schedule.summary.total_weekly_load, 60 + 60 + 15 * 4);
        assert_eq!(schedule.summary.balance, LoadBalance::Optimal);
    }

    #[test]
    fn protein_respects_heavy_budget() {
        let one_heavy = WeeklyLoadCapacity {
            max_heavy_days: 1,
            ..capacity()
        };
        let recs = vec![
            rec("wash", ActivityType::WashDay, LoadLevel::Heavy, FrequencyCategory::Weekly),
            rec(
                "protein",
                ActivityType::ProteinTreatment,
                LoadLevel::Heavy,
                FrequencyCategory::BiWeekly,
            ),
        ];
        let schedule = WeeklyScheduleBuilder::new().build(&recs, &one_heavy);
        assert!(schedule.days[WEDNESDAY].rituals.is_empty());

        // A standard-load protein is not subject to the heavy budget.
        let recs = vec![
            rec("wash", ActivityType::WashDay, LoadLevel::Heavy, FrequencyCategory::Weekly),
            rec(
                "protein",
                ActivityType::ProteinTreatment,
                LoadLevel::Standard,
                FrequencyCategory::BiWeekly,
            ),
        ];
        let schedule = WeeklyScheduleBuilder::new().build(&recs, &one_heavy);
        assert_eq!(schedule.days[WEDNESDAY].total_load, 35);
    }

    #[test]
    fn monthly_protein_and_weekly_refresh_are_skipped() {
        let recs = vec![
            rec(
                "protein",
                ActivityType::ProteinTreatment,
                LoadLevel::Standard,
                FrequencyCategory::Monthly,
            ),
            rec("refresh", ActivityType::StyleRefresh, LoadLevel::Light, FrequencyCategory::Weekly),
        ];
        let schedule = WeeklyScheduleBuilder::new().build(&recs, &capacity());
        assert_eq!(schedule.summary.total_weekly_load, 0);
        assert_eq!(schedule.summary.balance, LoadBalance::Under);
    }

    #[test]
    fn standard_wash_day_leaves_sunday_open() {
        let recs = vec![rec(
            "wash",
            ActivityType::WashDay,
            LoadLevel::Standard,
            FrequencyCategory::TwiceWeekly,
        )];
        let schedule = WeeklyScheduleBuilder::new().build(&recs, &capacity());
        // Backfill picks the two emptiest days by index.
        assert_eq!(rest_indexes(&schedule), vec![0, 1]);
        assert!(!schedule.days[SATURDAY].is_rest_day);
    }

    #[test]
    fn rest_days_never_carry_heavy_rituals() {
        let capacity = WeeklyLoadCapacity {
            recommended_rest_days: 5,
            ..capacity()
        };
        let recs = vec![
            rec("wash", ActivityType::WashDay, LoadLevel::Heavy, FrequencyCategory::Weekly),
            rec(
                "protein",
                ActivityType::ProteinTreatment,
                LoadLevel::Heavy,
                FrequencyCategory::BiWeekly,
            ),
            rec("scalp", ActivityType::ScalpTreatment, LoadLevel::Light, FrequencyCategory::Weekly),
            rec(
                "refresh",
                ActivityType::MoistureRefresh,
                LoadLevel::Light,
                FrequencyCategory::TwiceWeekly,
            ),
        ];
        let schedule = WeeklyScheduleBuilder::new().build(&recs, &capacity);
        assert_eq!(schedule.rest_days().count(), 5);
        assert!(schedule.rest_days().all(|d| !d.has_heavy()));
    }

    #[test]
    fn over_budget_is_reported() {
        let tight = WeeklyLoadCapacity {
            max_heavy_days: 1,
            max_medium_days: 0,
            recommended_rest_days: 0,
            ..capacity()
        };
        let recs = vec![
            rec("wash", ActivityType::WashDay, LoadLevel::Heavy, FrequencyCategory::Weekly),
            rec("scalp", ActivityType::ScalpTreatment, LoadLevel::Light, FrequencyCategory::Weekly),
        ];
        let schedule = WeeklyScheduleBuilder::new().build(&recs, &tight);
        assert_eq!(schedule.summary.max_capacity, 60);
        assert_eq!(schedule.summary.total_weekly_load, 75);
        assert_eq!(schedule.summary.balance, LoadBalance::Over);
    }
}
