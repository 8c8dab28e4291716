//! Dated calendar entries and their materialization.
//!
//! Windows are half-open: `[start, end)`. An event that ends exactly when
//! another begins does not overlap it.

pub mod materializer;
pub mod status;
pub mod store;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::rituals::{ActivityType, LoadLevel};

pub use materializer::{
    CalendarMaterializer, CalendarSummary, ConflictResolution, GenerationOptions,
    MaterializerSettings, OperationFailure, OperationResult, RescheduleOutcome,
    ScheduleConflict, ScheduleGenerationResult, SkipOutcome, UpcomingRitualsResponse,
};
pub use status::{EventStatus, EventStatusKind, StatusAction, StatusTransitionError};
pub use store::{CalendarStore, EventQuery, EventRepository, MemoryCalendarStore};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCategory {
    HairRitual,
    RestBuffer,
    EducationPrompt,
}

impl EventCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            EventCategory::HairRitual => "HAIR_RITUAL",
            EventCategory::RestBuffer => "REST_BUFFER",
            EventCategory::EducationPrompt => "EDUCATION_PROMPT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "HAIR_RITUAL" => Some(EventCategory::HairRitual),
            "REST_BUFFER" => Some(EventCategory::RestBuffer),
            "EDUCATION_PROMPT" => Some(EventCategory::EducationPrompt),
            _ => None,
        }
    }
}

/// Half-open time window `[start, end)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CalendarEvent {
    pub id: String,
    pub user_id: String,
    pub category: EventCategory,
    pub activity_type: ActivityType,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub load_level: LoadLevel,
    pub requires_rest_buffer: bool,
    pub recommended_rest_hours_after: u32,
    pub status: EventStatus,
    /// Catalog template this event was generated from.
    pub ritual_id: Option<String>,
    /// Set when an external booking owns the slot; such events survive regeneration.
    pub booking_id: Option<String>,
    /// Ritual event a rest buffer belongs to.
    pub parent_event_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CalendarEvent {
    /// A new PLANNED event with a fresh id.
    pub fn new(
        user_id: &str,
        category: EventCategory,
        activity_type: ActivityType,
        title: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        load_level: LoadLevel,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            category,
            activity_type,
            title: title.to_string(),
            description: None,
            start_time,
            end_time,
            load_level,
            requires_rest_buffer: load_level == LoadLevel::Heavy,
            recommended_rest_hours_after: 0,
            status: EventStatus::Planned,
            ritual_id: None,
            booking_id: None,
            parent_event_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_time,
            end: self.end_time,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    pub fn overlaps(&self, window: &TimeWindow) -> bool {
        self.window().overlaps(window)
    }

    /// Whether this event contributes to load and blocks its window.
    pub fn counts_toward_load(&self) -> bool {
        !matches!(self.status, EventStatus::Skipped { .. })
    }

    pub fn is_ritual(&self) -> bool {
        self.category == EventCategory::HairRitual
    }
}
