//! Load accounting: rest buffers and placement feasibility.
//!
//! All calculations are pure. Callers pass the reference time (`now`) and the
//! events to consider; SKIPPED events never count toward load.

pub mod tables;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::WeeklyLoadCapacity;
use crate::calendar::CalendarEvent;
use crate::profile::{Level, Profile};
use crate::rituals::ActivityType;

pub use tables::{base_rest_hours, load_score, LoadTier};

/// Window in which recent heavy load escalates rest.
const RECENT_LOAD_WINDOW_HOURS: i64 = 48;
const CRITICAL_RECENT_LOAD: u32 = 100;
const IMPORTANT_RECENT_LOAD: u32 = 60;
const DAILY_LOAD_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum RestUrgency {
    None,
    Suggested,
    Important,
    Critical,
}

/// Rest recommendation after one activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestBuffer {
    pub activity_type: ActivityType,
    pub base_hours: u32,
    pub multiplier: f64,
    pub required_hours: u32,
    pub recommended_hours: u32,
    /// Summed load of heavy-or-above events that ended in the last 48 hours.
    pub recent_heavy_load: u32,
    pub urgency: RestUrgency,
}

/// Reason a placement is blocked or flagged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadIssue {
    HeavyBudgetExhausted {
        heavy_events_this_week: u32,
        max_heavy_days: u8,
    },
    InsufficientRest {
        prior_event_id: String,
        hours_since: f64,
        required_hours: u32,
    },
    DailyLoadExceeded {
        same_day_load: u32,
    },
}

/// Feasibility of placing one activity at a proposed time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoadAssessment {
    pub can_schedule: bool,
    pub activity_load: u8,
    pub same_day_load: u32,
    pub heavy_events_this_week: u32,
    pub medium_events_this_week: u32,
    pub hours_since_last_event: Option<f64>,
    pub blocking: Vec<LoadIssue>,
    pub warnings: Vec<LoadIssue>,
}

/// Stateless load calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadAccountant;

impl LoadAccountant {
    pub fn new() -> Self {
        Self
    }

    /// Product of the profile's rest factors, rounded to two decimals.
    pub fn profile_multiplier(&self, profile: &Profile) -> f64 {
        let manipulation = match profile.manipulation_tolerance {
            Level::Low => 1.5,
            Level::High => 0.8,
            Level::Medium | Level::Unknown => 1.0,
        };
        let tension = if profile.tension_sensitivity == Level::High { 1.3 } else { 1.0 };
        let scalp = if profile.scalp_sensitivity == Level::High { 1.2 } else { 1.0 };
        let strand = match profile.strand_thickness {
            Level::Low => 1.25,
            Level::High => 0.9,
            Level::Medium | Level::Unknown => 1.0,
        };
        let porosity = if profile.porosity_level == Level::High { 1.15 } else { 1.0 };

        let product: f64 = manipulation * tension * scalp * strand * porosity;
        (product * 100.0).round() / 100.0
    }

    /// Rest hours required (half base) and recommended (full base) after an activity.
    fn rest_hours(&self, multiplier: f64, activity: ActivityType) -> (u32, u32) {
        let base = f64::from(base_rest_hours(activity));
        let required = (base * 0.5 * multiplier).round() as u32;
        let recommended = (base * multiplier).round() as u32;
        (required, recommended)
    }

    pub fn calculate_rest_buffer(
        &self,
        profile: &Profile,
        activity: ActivityType,
        recent_events: &[CalendarEvent],
        now: DateTime<Utc>,
    ) -> RestBuffer {
        let multiplier = self.profile_multiplier(profile);
        let (required_hours, mut recommended_hours) = self.rest_hours(multiplier, activity);

        let window_start = now - Duration::hours(RECENT_LOAD_WINDOW_HOURS);
        let recent_heavy_load: u32 = recent_events
            .iter()
            .filter(|e| e.counts_toward_load())
            .filter(|e| e.end_time > window_start && e.end_time <= now)
            .map(|e| load_score(e.activity_type))
            .filter(|score| LoadTier::from_score(*score).is_heavy_or_above())
            .map(u32::from)
            .sum();

        let urgency = if recent_heavy_load > CRITICAL_RECENT_LOAD {
            recommended_hours = (f64::from(recommended_hours) * 1.5).round() as u32;
            RestUrgency::Critical
        } else if recent_heavy_load > IMPORTANT_RECENT_LOAD {
            recommended_hours = (f64::from(recommended_hours) * 1.25).round() as u32;
            RestUrgency::Important
        } else if required_hours > 0 {
            RestUrgency::Suggested
        } else {
            RestUrgency::None
        };

        RestBuffer {
            activity_type: activity,
            base_hours: base_rest_hours(activity),
            multiplier,
            required_hours,
            recommended_hours,
            recent_heavy_load,
            urgency,
        }
    }

    pub fn assess_event_load(
        &self,
        profile: &Profile,
        activity: ActivityType,
        proposed_start: DateTime<Utc>,
        existing_events: &[CalendarEvent],
    ) -> LoadAssessment {
        let capacity = WeeklyLoadCapacity::for_profile(profile);
        let multiplier = self.profile_multiplier(profile);
        let activity_load = load_score(activity);
        let active: Vec<&CalendarEvent> = existing_events
            .iter()
            .filter(|e| e.counts_toward_load())
            .collect();

        let proposed_day = proposed_start.date_naive();
        let same_day_load = u32::from(activity_load)
            + active
                .iter()
                .filter(|e| e.start_time.date_naive() == proposed_day)
                .map(|e| u32::from(load_score(e.activity_type)))
                .sum::<u32>();

        let week_start = (proposed_day
            - Duration::days(i64::from(proposed_day.weekday().num_days_from_sunday())))
        .and_time(NaiveTime::MIN)
        .and_utc();
        let week_end = week_start + Duration::days(7);
        let (mut heavy_events_this_week, mut medium_events_this_week) = (0u32, 0u32);
        for event in active
            .iter()
            .filter(|e| e.start_time >= week_start && e.start_time < week_end)
        {
            match tables::tier(event.activity_type) {
                LoadTier::Heavy | LoadTier::Extreme => heavy_events_this_week += 1,
                LoadTier::Medium => medium_events_this_week += 1,
                LoadTier::None | LoadTier::Light => {}
            }
        }

        let mut blocking = Vec::new();
        let mut warnings = Vec::new();

        if heavy_events_this_week >= u32::from(capacity.max_heavy_days)
            && LoadTier::from_score(activity_load).is_heavy_or_above()
        {
            blocking.push(LoadIssue::HeavyBudgetExhausted {
                heavy_events_this_week,
                max_heavy_days: capacity.max_heavy_days,
            });
        }

        let prior = active
            .iter()
            .filter(|e| e.end_time <= proposed_start)
            .max_by_key(|e| e.end_time);
        let hours_since_last_event = prior.map(|event| {
            (proposed_start - event.end_time).num_minutes() as f64 / 60.0
        });
        if let (Some(event), Some(hours_since)) = (prior, hours_since_last_event) {
            let (required_hours, _) = self.rest_hours(multiplier, event.activity_type);
            let issue = LoadIssue::InsufficientRest {
                prior_event_id: event.id.clone(),
                hours_since,
                required_hours,
            };
            if hours_since < f64::from(required_hours) / 2.0 {
                blocking.push(issue.clone());
            }
            if hours_since < f64::from(required_hours) {
                warnings.push(issue);
            }
        }

        if same_day_load > DAILY_LOAD_LIMIT {
            warnings.push(LoadIssue::DailyLoadExceeded { same_day_load });
        }

        LoadAssessment {
            can_schedule: blocking.is_empty(),
            activity_load,
            same_day_load,
            heavy_events_this_week,
            medium_events_this_week,
            hours_since_last_event,
            blocking,
            warnings,
        }
    }
}
