//! Turns a weekly plan into dated calendar events and drives their lifecycle.
//!
//! Every public operation runs its read-decide-write sequence inside a single
//! [`CalendarStore::atomically`] scope, and calls for the same user are
//! serialized through a per-user lock.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::status::{EventStatus, EventStatusKind, StatusAction};
use super::store::{CalendarStore, EventQuery, EventRepository};
use super::{CalendarEvent, EventCategory, TimeWindow};
use crate::analysis::{ProfileAnalyzer, WeeklyLoadCapacity};
use crate::error::DatabaseError;
use crate::load::{load_score, LoadAccountant, LoadIssue};
use crate::profile::{Profile, ProfileSource};
use crate::rituals::{ActivityType, LoadLevel, RitualCatalog, RitualMatcher};
use crate::weekly::{PlacedRitual, TimeOfDay, WeeklyLoadSummary, WeeklyScheduleBuilder};

pub const MIN_WEEKS: u8 = 1;
pub const MAX_WEEKS: u8 = 4;
pub const DEFAULT_WEEKS: u8 = 2;

const REST_BUFFER_GAP_HOURS: i64 = 1;
const REST_BUFFER_HOURS: i64 = 24;
const PROMPT_MINUTES: i64 = 15;
const MAKEUP_DELAY_DAYS: i64 = 2;

/// Learning prompts offered in the first generated week: (weekday, node id, title).
const EDUCATION_PROMPTS: [(chrono::Weekday, &str, &str); 3] = [
    (chrono::Weekday::Tue, "porosity-basics", "Learn: how porosity shapes your routine"),
    (chrono::Weekday::Thu, "low-tension-styling", "Learn: low-tension styling"),
    (chrono::Weekday::Sat, "wash-day-planning", "Learn: planning a calmer wash day"),
];

// === Options and settings ===

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationOptions {
    pub start_date: NaiveDate,
    /// Clamped to 1..=4.
    pub weeks_to_generate: u8,
    pub replace_existing: bool,
    pub include_rest_buffers: bool,
    pub include_education_prompts: bool,
}

impl GenerationOptions {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            start_date,
            weeks_to_generate: DEFAULT_WEEKS,
            replace_existing: false,
            include_rest_buffers: true,
            include_education_prompts: true,
        }
    }

    pub fn weeks(&self) -> u8 {
        self.weeks_to_generate.clamp(MIN_WEEKS, MAX_WEEKS)
    }
}

/// Wall-clock placement of rituals and generation defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaterializerSettings {
    pub morning: NaiveTime,
    pub afternoon: NaiveTime,
    pub evening: NaiveTime,
    pub education_prompt: NaiveTime,
    pub upcoming_horizon_days: u32,
    pub default_weeks: u8,
    pub include_rest_buffers: bool,
    pub include_education_prompts: bool,
}

impl Default for MaterializerSettings {
    fn default() -> Self {
        Self {
            morning: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            afternoon: NaiveTime::from_hms_opt(14, 0, 0).unwrap_or(NaiveTime::MIN),
            evening: NaiveTime::from_hms_opt(19, 0, 0).unwrap_or(NaiveTime::MIN),
            education_prompt: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN),
            upcoming_horizon_days: 14,
            default_weeks: DEFAULT_WEEKS,
            include_rest_buffers: true,
            include_education_prompts: true,
        }
    }
}

impl MaterializerSettings {
    fn time_of(&self, time_of_day: TimeOfDay) -> NaiveTime {
        match time_of_day {
            TimeOfDay::Morning => self.morning,
            TimeOfDay::Afternoon => self.afternoon,
            TimeOfDay::Evening => self.evening,
        }
    }

    /// Options for a full regeneration starting on `start_date`.
    pub fn regeneration_options(&self, start_date: NaiveDate) -> GenerationOptions {
        GenerationOptions {
            start_date,
            weeks_to_generate: self.default_weeks,
            replace_existing: true,
            include_rest_buffers: self.include_rest_buffers,
            include_education_prompts: self.include_education_prompts,
        }
    }
}

// === Results ===

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConflictResolution {
    Skipped,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleConflict {
    pub date: NaiveDate,
    pub ritual_id: String,
    pub title: String,
    pub proposed_start: DateTime<Utc>,
    pub proposed_end: DateTime<Utc>,
    pub conflicting_event_id: String,
    pub conflicting_title: String,
    pub resolution: ConflictResolution,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleGenerationResult {
    pub events_created: u32,
    pub events_skipped: u32,
    pub events_removed: u32,
    pub conflicts: Vec<ScheduleConflict>,
    pub next_scheduled_date: Option<DateTime<Utc>>,
    pub weekly_load_score: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkipOutcome {
    pub event: CalendarEvent,
    pub suggested_makeup_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RescheduleOutcome {
    pub event: CalendarEvent,
    /// Load concerns at the new slot. Never prevent the move.
    pub load_warnings: Vec<LoadIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpcomingRitualsResponse {
    pub rituals: Vec<CalendarEvent>,
    pub total_upcoming: u32,
    pub next_wash_day: Option<DateTime<Utc>>,
    pub weekly_load_status: WeeklyLoadSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarSummary {
    pub next_ritual: Option<CalendarEvent>,
    pub this_week_load: u32,
    pub max_week_load: u32,
    pub overdue_count: u32,
    pub completed_this_week: u32,
    pub streak_days: u32,
}

/// Why a calendar operation did not happen.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationFailure {
    #[error("invalid {field}: '{value}'")]
    InvalidIdentifier { field: String, value: String },

    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    #[error("cannot {action} an event that is {from:?}")]
    InvalidTransition { from: EventStatusKind, action: String },

    #[error("storage failure: {message}")]
    Storage { message: String },
}

impl From<DatabaseError> for OperationFailure {
    fn from(err: DatabaseError) -> Self {
        OperationFailure::Storage {
            message: err.to_string(),
        }
    }
}

/// Result envelope for caller-facing operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub failure: Option<OperationFailure>,
}

impl<T> OperationResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            failure: None,
        }
    }

    pub fn failed(failure: OperationFailure) -> Self {
        Self {
            success: false,
            data: None,
            failure: Some(failure),
        }
    }

    pub fn into_result(self) -> Result<T, OperationFailure> {
        match (self.data, self.failure) {
            (Some(data), None) => Ok(data),
            (_, Some(failure)) => Err(failure),
            (None, None) => Err(OperationFailure::Storage {
                message: "operation returned no data".to_string(),
            }),
        }
    }
}

impl<T> From<Result<T, OperationFailure>> for OperationResult<T> {
    fn from(result: Result<T, OperationFailure>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(failure) => Self::failed(failure),
        }
    }
}

// === Materializer ===

pub struct CalendarMaterializer<S: CalendarStore> {
    store: S,
    settings: MaterializerSettings,
    catalog: &'static RitualCatalog,
    analyzer: ProfileAnalyzer,
    builder: WeeklyScheduleBuilder,
    accountant: LoadAccountant,
    clock: fn() -> DateTime<Utc>,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: CalendarStore> CalendarMaterializer<S> {
    pub fn new(store: S) -> Self {
        Self::with_settings(store, MaterializerSettings::default())
    }

    pub fn with_settings(store: S, settings: MaterializerSettings) -> Self {
        Self {
            store,
            settings,
            catalog: RitualCatalog::builtin(),
            analyzer: ProfileAnalyzer::new(),
            builder: WeeklyScheduleBuilder::new(),
            accountant: LoadAccountant::new(),
            clock: Utc::now,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_catalog(mut self, catalog: &'static RitualCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the wall clock, mainly for tests.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &MaterializerSettings {
        &self.settings
    }

    fn user_lock(&self, user_id: &str) -> Result<Arc<Mutex<()>>, OperationFailure> {
        let mut locks = self.user_locks.lock().map_err(|e| OperationFailure::Storage {
            message: format!("user lock map poisoned: {e}"),
        })?;
        Ok(locks.entry(user_id.to_string()).or_default().clone())
    }

    /// Run `f` while holding the user's lock.
    fn serialized<T>(
        &self,
        user_id: &str,
        f: impl FnOnce() -> Result<T, OperationFailure>,
    ) -> Result<T, OperationFailure> {
        let lock = self.user_lock(user_id)?;
        let result = match lock.lock() {
            Ok(_guard) => f(),
            Err(e) => Err(OperationFailure::Storage {
                message: format!("lock for user '{user_id}' poisoned: {e}"),
            }),
        };
        self.release_user_lock(user_id, &lock);
        result
    }

    /// Drop the user's entry once no other caller holds or waits on it.
    fn release_user_lock(&self, user_id: &str, lock: &Arc<Mutex<()>>) {
        let Ok(mut locks) = self.user_locks.lock() else {
            return;
        };
        let ours = locks.get(user_id).is_some_and(|held| Arc::ptr_eq(held, lock));
        if ours && Arc::strong_count(lock) == 2 {
            locks.remove(user_id);
        }
    }

    // === Generation ===

    pub fn generate(
        &self,
        user_id: &str,
        profile: &Profile,
        options: GenerationOptions,
    ) -> OperationResult<ScheduleGenerationResult> {
        if let Err(failure) = validate_user_id(user_id) {
            return OperationResult::failed(failure);
        }
        self.serialized(user_id, || self.generate_locked(user_id, profile, options))
            .into()
    }

    fn generate_locked(
        &self,
        user_id: &str,
        profile: &Profile,
        options: GenerationOptions,
    ) -> Result<ScheduleGenerationResult, OperationFailure> {
        let analysis = self.analyzer.analyze(profile);
        let recommendations =
            RitualMatcher::new(self.catalog).match_rituals(profile, &analysis);
        let schedule = self
            .builder
            .build(&recommendations, &analysis.weekly_load_capacity);

        let weeks = options.weeks();
        let range_start = midnight(options.start_date);
        let range = TimeWindow {
            start: range_start,
            end: range_start + Duration::weeks(i64::from(weeks)),
        };
        let now = (self.clock)();

        let result = self.store.atomically(|repo| {
            let events_removed = if options.replace_existing {
                remove_future_rituals(repo, user_id, range, now)?
            } else {
                0
            };

            let existing =
                repo.find_events(&EventQuery::for_user(user_id).active().overlapping(range))?;
            let mut recent = existing.clone();
            let mut result = ScheduleGenerationResult {
                events_created: 0,
                events_skipped: 0,
                events_removed: events_removed as u32,
                conflicts: Vec::new(),
                next_scheduled_date: None,
                weekly_load_score: schedule.summary.total_weekly_load,
            };

            for week in 0..weeks {
                let week_start = options.start_date + Duration::weeks(i64::from(week));
                for slot in schedule.days.iter().filter(|d| !d.is_rest_day) {
                    let date = date_for_weekday(week_start, slot.day_of_week);
                    for ritual in &slot.rituals {
                        let event = self.ritual_event(user_id, profile, ritual, date, &recent);
                        if let Some(conflict) = find_conflict(&event, &existing) {
                            debug!(
                                ritual = %ritual.template_id,
                                %date,
                                conflicting = %conflict.conflicting_event_id,
                                "placement conflicts with an existing event"
                            );
                            result.conflicts.push(conflict);
                            continue;
                        }
                        if !persist(repo, &event, &mut result) {
                            continue;
                        }
                        result.next_scheduled_date = Some(
                            result
                                .next_scheduled_date
                                .map_or(event.start_time, |d| d.min(event.start_time)),
                        );
                        if options.include_rest_buffers && event.requires_rest_buffer {
                            persist(repo, &rest_buffer_for(&event), &mut result);
                        }
                        recent.push(event);
                    }
                }
            }

            if options.include_education_prompts {
                self.insert_education_prompts(
                    repo,
                    user_id,
                    profile,
                    options.start_date,
                    &mut result,
                )?;
            }
            Ok(result)
        })?;

        info!(
            user_id,
            weeks,
            created = result.events_created,
            skipped = result.events_skipped,
            conflicts = result.conflicts.len(),
            "generated calendar"
        );
        Ok(result)
    }

    fn ritual_event(
        &self,
        user_id: &str,
        profile: &Profile,
        ritual: &PlacedRitual,
        date: NaiveDate,
        recent: &[CalendarEvent],
    ) -> CalendarEvent {
        let start = date.and_time(self.settings.time_of(ritual.time_of_day)).and_utc();
        let end = start + Duration::minutes(i64::from(ritual.duration_minutes));
        let mut event = CalendarEvent::new(
            user_id,
            EventCategory::HairRitual,
            ritual.activity_type,
            &ritual.name,
            start,
            end,
            ritual.load_level,
        );
        event.ritual_id = Some(ritual.template_id.clone());
        event.description = self
            .catalog
            .get(&ritual.template_id)
            .map(|template| template.steps.join("; "));
        event.recommended_rest_hours_after = self
            .accountant
            .calculate_rest_buffer(profile, ritual.activity_type, recent, end)
            .recommended_hours;
        event
    }

    fn insert_education_prompts(
        &self,
        repo: &mut dyn EventRepository,
        user_id: &str,
        profile: &Profile,
        start_date: NaiveDate,
        result: &mut ScheduleGenerationResult,
    ) -> Result<(), DatabaseError> {
        let scheduled: HashSet<String> = repo
            .find_events(
                &EventQuery::for_user(user_id)
                    .active()
                    .in_category(EventCategory::EducationPrompt),
            )?
            .into_iter()
            .filter_map(|e| e.ritual_id)
            .collect();

        for (weekday, node, title) in EDUCATION_PROMPTS {
            if profile.has_unlocked(node) || scheduled.contains(node) {
                continue;
            }
            let date = date_for_weekday(start_date, weekday.num_days_from_sunday() as u8);
            let start = date.and_time(self.settings.education_prompt).and_utc();
            let mut prompt = CalendarEvent::new(
                user_id,
                EventCategory::EducationPrompt,
                ActivityType::EducationPrompt,
                title,
                start,
                start + Duration::minutes(PROMPT_MINUTES),
                LoadLevel::Light,
            );
            prompt.ritual_id = Some(node.to_string());
            persist(repo, &prompt, result);
        }
        Ok(())
    }

    // === Lifecycle ===

    pub fn complete(
        &self,
        user_id: &str,
        event_id: &str,
        quality: Option<u8>,
    ) -> OperationResult<CalendarEvent> {
        let now = (self.clock)();
        self.transition(user_id, event_id, |_| StatusAction::Complete { at: now, quality })
            .into()
    }

    /// Skip an event. The suggested makeup date is two days after its start.
    pub fn skip(
        &self,
        user_id: &str,
        event_id: &str,
        reason: Option<String>,
    ) -> OperationResult<SkipOutcome> {
        let now = (self.clock)();
        self.transition(user_id, event_id, |_| StatusAction::Skip { at: now, reason })
            .map(|event| SkipOutcome {
                suggested_makeup_date: event.start_time + Duration::days(MAKEUP_DELAY_DAYS),
                event,
            })
            .into()
    }

    fn transition(
        &self,
        user_id: &str,
        event_id: &str,
        action: impl FnOnce(&CalendarEvent) -> StatusAction,
    ) -> Result<CalendarEvent, OperationFailure> {
        validate_user_id(user_id)?;
        validate_event_id(event_id)?;
        let now = (self.clock)();

        self.serialized(user_id, || {
            self.store.atomically(|repo| {
                let mut event = match owned_event(repo, user_id, event_id)? {
                    Ok(event) => event,
                    Err(failure) => return Ok(Err(failure)),
                };
                let from = event.status.kind();
                let action = action(&event);
                let name = action.name();
                event.status = match event.status.apply(action) {
                    Ok(status) => status,
                    Err(err) => {
                        return Ok(Err(OperationFailure::InvalidTransition {
                            from: err.from,
                            action: err.action.to_string(),
                        }))
                    }
                };
                event.updated_at = now;
                repo.update_event(&event)?;
                if let EventStatus::Skipped { skipped_at, .. } = event.status {
                    skip_rest_buffers(repo, &event, skipped_at)?;
                }
                debug!(event_id, ?from, action = name, "event status changed");
                Ok(Ok(event))
            })?
        })
    }

    /// Move an event to `new_start`, keeping its duration.
    ///
    /// Load is re-assessed at the new slot; any issue found is returned as a
    /// warning and never blocks the move.
    pub fn reschedule(
        &self,
        user_id: &str,
        event_id: &str,
        new_start: DateTime<Utc>,
        profile: &Profile,
    ) -> OperationResult<RescheduleOutcome> {
        let result = validate_user_id(user_id)
            .and_then(|_| validate_event_id(event_id))
            .and_then(|_| {
                self.serialized(user_id, || {
                    self.reschedule_locked(user_id, event_id, new_start, profile)
                })
            });
        result.into()
    }

    fn reschedule_locked(
        &self,
        user_id: &str,
        event_id: &str,
        new_start: DateTime<Utc>,
        profile: &Profile,
    ) -> Result<RescheduleOutcome, OperationFailure> {
        let now = (self.clock)();
        self.store.atomically(|repo| {
            let mut event = match owned_event(repo, user_id, event_id)? {
                Ok(event) => event,
                Err(failure) => return Ok(Err(failure)),
            };
            let duration = event.duration();
            let status = match event.status.apply(StatusAction::Reschedule {
                previous_start: event.start_time,
            }) {
                Ok(status) => status,
                Err(err) => {
                    return Ok(Err(OperationFailure::InvalidTransition {
                        from: err.from,
                        action: err.action.to_string(),
                    }))
                }
            };

            let neighbourhood = TimeWindow {
                start: new_start - Duration::days(8),
                end: new_start + Duration::days(8),
            };
            let others: Vec<CalendarEvent> = repo
                .find_events(&EventQuery::for_user(user_id).active().overlapping(neighbourhood))?
                .into_iter()
                .filter(|e| e.id != event.id)
                .collect();
            let assessment =
                self.accountant
                    .assess_event_load(profile, event.activity_type, new_start, &others);
            let mut load_warnings: Vec<LoadIssue> = Vec::new();
            for issue in assessment.blocking.into_iter().chain(assessment.warnings) {
                if !load_warnings.contains(&issue) {
                    load_warnings.push(issue);
                }
            }

            event.status = status;
            event.start_time = new_start;
            event.end_time = new_start + duration;
            event.updated_at = now;
            repo.update_event(&event)?;
            follow_with_rest_buffers(repo, &event, now)?;
            if !load_warnings.is_empty() {
                debug!(event_id, warnings = load_warnings.len(), "rescheduled with load warnings");
            }
            Ok(Ok(RescheduleOutcome {
                event,
                load_warnings,
            }))
        })?
    }

    // === Views ===

    /// Planned or rescheduled rituals from now through the configured horizon.
    pub fn list_upcoming(
        &self,
        user_id: &str,
        profile: &Profile,
    ) -> OperationResult<UpcomingRitualsResponse> {
        if let Err(failure) = validate_user_id(user_id) {
            return OperationResult::failed(failure);
        }
        let now = (self.clock)();
        let horizon = TimeWindow {
            start: now,
            end: now + Duration::days(i64::from(self.settings.upcoming_horizon_days)),
        };
        let week = week_containing(now);
        let capacity = WeeklyLoadCapacity::for_profile(profile);

        let result = self.store.atomically(|repo| {
            let rituals: Vec<CalendarEvent> = repo
                .find_events(
                    &EventQuery::for_user(user_id)
                        .in_category(EventCategory::HairRitual)
                        .with_statuses(&[EventStatusKind::Planned, EventStatusKind::Rescheduled])
                        .overlapping(horizon),
                )?
                .into_iter()
                .filter(|e| e.start_time >= now)
                .collect();
            let week_load = ritual_load(repo, user_id, week)?;
            Ok(UpcomingRitualsResponse {
                total_upcoming: rituals.len() as u32,
                next_wash_day: rituals
                    .iter()
                    .find(|e| e.activity_type == ActivityType::WashDay)
                    .map(|e| e.start_time),
                weekly_load_status: WeeklyLoadSummary::new(week_load, &capacity),
                rituals,
            })
        });
        result.map_err(OperationFailure::from).into()
    }

    pub fn summary(&self, user_id: &str, profile: &Profile) -> OperationResult<CalendarSummary> {
        if let Err(failure) = validate_user_id(user_id) {
            return OperationResult::failed(failure);
        }
        let now = (self.clock)();
        let week = week_containing(now);
        let capacity = WeeklyLoadCapacity::for_profile(profile);

        let result = self.store.atomically(|repo| {
            let rituals = repo.find_events(
                &EventQuery::for_user(user_id).in_category(EventCategory::HairRitual),
            )?;
            let open = |e: &&CalendarEvent| {
                matches!(e.status, EventStatus::Planned | EventStatus::Rescheduled { .. })
            };
            let completed_days: Vec<NaiveDate> = rituals
                .iter()
                .filter_map(|e| match e.status {
                    EventStatus::Completed { completed_at, .. } => Some(completed_at.date_naive()),
                    _ => None,
                })
                .collect();

            Ok(CalendarSummary {
                next_ritual: rituals
                    .iter()
                    .filter(open)
                    .find(|e| e.start_time >= now)
                    .cloned(),
                this_week_load: ritual_load(repo, user_id, week)?,
                max_week_load: capacity.max_weekly_load(),
                overdue_count: rituals
                    .iter()
                    .filter(open)
                    .filter(|e| e.end_time < now)
                    .count() as u32,
                completed_this_week: rituals
                    .iter()
                    .filter(|e| e.status.kind() == EventStatusKind::Completed)
                    .filter(|e| e.overlaps(&week))
                    .count() as u32,
                streak_days: streak_days(&completed_days, now.date_naive()),
            })
        });
        result.map_err(OperationFailure::from).into()
    }

    /// Rebuild the calendar from `today` after the user's profile changed.
    pub fn regenerate_for_profile_change(
        &self,
        user_id: &str,
        profiles: &dyn ProfileSource,
        today: NaiveDate,
    ) -> OperationResult<ScheduleGenerationResult> {
        if let Err(failure) = validate_user_id(user_id) {
            return OperationResult::failed(failure);
        }
        let profile = match profiles.profile(user_id) {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                return OperationResult::failed(OperationFailure::NotFound {
                    entity: "profile".to_string(),
                    id: user_id.to_string(),
                })
            }
            Err(err) => {
                return OperationResult::failed(OperationFailure::Storage {
                    message: err.to_string(),
                })
            }
        };
        self.generate(user_id, &profile, self.settings.regeneration_options(today))
    }
}

// === Helpers ===

fn validate_user_id(user_id: &str) -> Result<(), OperationFailure> {
    if user_id.trim().is_empty() {
        return Err(OperationFailure::InvalidIdentifier {
            field: "user_id".to_string(),
            value: user_id.to_string(),
        });
    }
    Ok(())
}

fn validate_event_id(event_id: &str) -> Result<(), OperationFailure> {
    Uuid::parse_str(event_id)
        .map(|_| ())
        .map_err(|_| OperationFailure::InvalidIdentifier {
            field: "event_id".to_string(),
            value: event_id.to_string(),
        })
}

/// Load the event if it exists and belongs to `user_id`.
fn owned_event(
    repo: &dyn EventRepository,
    user_id: &str,
    event_id: &str,
) -> Result<Result<CalendarEvent, OperationFailure>, DatabaseError> {
    Ok(match repo.get_event(event_id)? {
        Some(event) if event.user_id == user_id => Ok(event),
        _ => Err(OperationFailure::NotFound {
            entity: "event".to_string(),
            id: event_id.to_string(),
        }),
    })
}

/// Delete future, non-booked rituals in `range` together with their rest buffers.
fn remove_future_rituals(
    repo: &mut dyn EventRepository,
    user_id: &str,
    range: TimeWindow,
    now: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let doomed: HashSet<String> = repo
        .find_events(
            &EventQuery::for_user(user_id)
                .in_category(EventCategory::HairRitual)
                .overlapping(range),
        )?
        .into_iter()
        .filter(|e| e.start_time >= now && e.booking_id.is_none())
        .map(|e| e.id)
        .collect();
    if doomed.is_empty() {
        return Ok(0);
    }

    let buffers = repo
        .find_events(&EventQuery::for_user(user_id).in_category(EventCategory::RestBuffer))?
        .into_iter()
        .filter(|e| e.parent_event_id.as_ref().is_some_and(|p| doomed.contains(p)))
        .map(|e| e.id);
    let ids: Vec<String> = doomed.iter().cloned().chain(buffers).collect();
    let removed = repo.delete_events(&ids)?;
    debug!(user_id, removed, "removed future rituals before regeneration");
    Ok(removed)
}

fn find_conflict(event: &CalendarEvent, existing: &[CalendarEvent]) -> Option<ScheduleConflict> {
    let window = event.window();
    existing
        .iter()
        .find(|other| other.counts_toward_load() && other.overlaps(&window))
        .map(|other| ScheduleConflict {
            date: event.start_time.date_naive(),
            ritual_id: event.ritual_id.clone().unwrap_or_default(),
            title: event.title.clone(),
            proposed_start: event.start_time,
            proposed_end: event.end_time,
            conflicting_event_id: other.id.clone(),
            conflicting_title: other.title.clone(),
            resolution: ConflictResolution::Skipped,
        })
}

/// Insert one event, counting it as created or skipped.
fn persist(
    repo: &mut dyn EventRepository,
    event: &CalendarEvent,
    result: &mut ScheduleGenerationResult,
) -> bool {
    match repo.create_event(event) {
        Ok(()) => {
            result.events_created += 1;
            true
        }
        Err(err) => {
            warn!(
                event_id = %event.id,
                title = %event.title,
                error = %err,
                "failed to persist event"
            );
            result.events_skipped += 1;
            false
        }
    }
}

fn rest_buffer_for(ritual: &CalendarEvent) -> CalendarEvent {
    let start = ritual.end_time + Duration::hours(REST_BUFFER_GAP_HOURS);
    let mut buffer = CalendarEvent::new(
        &ritual.user_id,
        EventCategory::RestBuffer,
        ActivityType::RestBuffer,
        "Rest & recovery",
        start,
        start + Duration::hours(REST_BUFFER_HOURS),
        LoadLevel::Light,
    );
    buffer.description = Some(format!("Low-manipulation day after {}", ritual.title));
    buffer.parent_event_id = Some(ritual.id.clone());
    buffer
}

/// Open rest buffers hanging off `ritual`.
fn open_rest_buffers(
    repo: &dyn EventRepository,
    ritual: &CalendarEvent,
) -> Result<Vec<CalendarEvent>, DatabaseError> {
    Ok(repo
        .find_events(
            &EventQuery::for_user(&ritual.user_id)
                .in_category(EventCategory::RestBuffer)
                .with_statuses(&[EventStatusKind::Planned, EventStatusKind::Rescheduled]),
        )?
        .into_iter()
        .filter(|e| e.parent_event_id.as_deref() == Some(ritual.id.as_str()))
        .collect())
}

/// Move a ritual's rest buffers so they start again one gap after its end.
fn follow_with_rest_buffers(
    repo: &mut dyn EventRepository,
    ritual: &CalendarEvent,
    now: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    for mut buffer in open_rest_buffers(repo, ritual)? {
        let length = buffer.duration();
        let start = ritual.end_time + Duration::hours(REST_BUFFER_GAP_HOURS);
        if let Ok(status) = buffer.status.apply(StatusAction::Reschedule {
            previous_start: buffer.start_time,
        }) {
            buffer.status = status;
        }
        buffer.start_time = start;
        buffer.end_time = start + length;
        buffer.updated_at = now;
        repo.update_event(&buffer)?;
    }
    Ok(())
}

/// A skipped ritual needs no recovery time.
fn skip_rest_buffers(
    repo: &mut dyn EventRepository,
    ritual: &CalendarEvent,
    at: DateTime<Utc>,
) -> Result<(), DatabaseError> {
    for mut buffer in open_rest_buffers(repo, ritual)? {
        let reason = Some(format!("{} was skipped", ritual.title));
        if let Ok(status) = buffer.status.apply(StatusAction::Skip { at, reason }) {
            buffer.status = status;
            buffer.updated_at = at;
            repo.update_event(&buffer)?;
        }
    }
    Ok(())
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// First date on or after `from` that falls on `day_of_week` (0 = Sunday).
fn date_for_weekday(from: NaiveDate, day_of_week: u8) -> NaiveDate {
    let current = from.weekday().num_days_from_sunday();
    let offset = (u32::from(day_of_week) + 7 - current) % 7;
    from + Duration::days(i64::from(offset))
}

/// Sunday-start week containing `at`.
fn week_containing(at: DateTime<Utc>) -> TimeWindow {
    let day = at.date_naive();
    let sunday = day - Duration::days(i64::from(day.weekday().num_days_from_sunday()));
    let start = midnight(sunday);
    TimeWindow {
        start,
        end: start + Duration::weeks(1),
    }
}

/// Summed load score of non-skipped rituals starting inside `week`.
fn ritual_load(
    repo: &dyn EventRepository,
    user_id: &str,
    week: TimeWindow,
) -> Result<u32, DatabaseError> {
    Ok(repo
        .find_events(
            &EventQuery::for_user(user_id)
                .active()
                .in_category(EventCategory::HairRitual)
                .overlapping(week),
        )?
        .iter()
        .filter(|e| e.start_time >= week.start)
        .map(|e| u32::from(load_score(e.activity_type)))
        .sum())
}

/// Consecutive days with a completed ritual, counting back from today.
/// A streak that ended yesterday is still alive.
fn streak_days(completed_days: &[NaiveDate], today: NaiveDate) -> u32 {
    let days: HashSet<NaiveDate> = completed_days.iter().copied().collect();
    let mut cursor = if days.contains(&today) {
        today
    } else {
        today - Duration::days(1)
    };
    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}
