//! Calendar event lifecycle.
//!
//! ```text
//!              reschedule
//!   PLANNED ─────────────> RESCHEDULED ──┐ reschedule
//!     │  │                    │  │  <────┘
//!     │  └──── complete ──────┼──┴──> COMPLETED
//!     └─────── skip ──────────┴─────> SKIPPED
//! ```
//!
//! COMPLETED and SKIPPED are terminal. RESCHEDULED never returns to PLANNED.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MIN_QUALITY: u8 = 1;
pub const MAX_QUALITY: u8 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    #[default]
    Planned,
    Rescheduled {
        previous_start: DateTime<Utc>,
    },
    Completed {
        completed_at: DateTime<Utc>,
        quality: Option<u8>,
    },
    Skipped {
        skipped_at: DateTime<Utc>,
        reason: Option<String>,
    },
}

/// Payload-free discriminant of [`EventStatus`], used for queries and storage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatusKind {
    Planned,
    Rescheduled,
    Completed,
    Skipped,
}

impl EventStatusKind {
    pub const ALL: [EventStatusKind; 4] = [
        EventStatusKind::Planned,
        EventStatusKind::Rescheduled,
        EventStatusKind::Completed,
        EventStatusKind::Skipped,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventStatusKind::Planned => "PLANNED",
            EventStatusKind::Rescheduled => "RESCHEDULED",
            EventStatusKind::Completed => "COMPLETED",
            EventStatusKind::Skipped => "SKIPPED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, EventStatusKind::Completed | EventStatusKind::Skipped)
    }
}

/// A requested lifecycle change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusAction {
    Reschedule { previous_start: DateTime<Utc> },
    Complete { at: DateTime<Utc>, quality: Option<u8> },
    Skip { at: DateTime<Utc>, reason: Option<String> },
}

impl StatusAction {
    pub fn name(&self) -> &'static str {
        match self {
            StatusAction::Reschedule { .. } => "reschedule",
            StatusAction::Complete { .. } => "complete",
            StatusAction::Skip { .. } => "skip",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransitionError {
    pub from: EventStatusKind,
    pub action: &'static str,
}

impl std::fmt::Display for StatusTransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "cannot {} an event that is {}",
            self.action,
            self.from.as_str()
        )
    }
}

impl std::error::Error for StatusTransitionError {}

impl EventStatus {
    pub fn kind(&self) -> EventStatusKind {
        match self {
            EventStatus::Planned => EventStatusKind::Planned,
            EventStatus::Rescheduled { .. } => EventStatusKind::Rescheduled,
            EventStatus::Completed { .. } => EventStatusKind::Completed,
            EventStatus::Skipped { .. } => EventStatusKind::Skipped,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.kind().is_terminal()
    }

    /// Compute the status that results from `action`.
    ///
    /// A repeated reschedule keeps the first `previous_start`, so the field
    /// always records where the event was originally planned. Quality is
    /// clamped to 1..=5.
    pub fn apply(&self, action: StatusAction) -> Result<EventStatus, StatusTransitionError> {
        let rejected = |from: EventStatusKind, action: &StatusAction| StatusTransitionError {
            from,
            action: action.name(),
        };

        match (self, action) {
            (EventStatus::Completed { .. }, action) => {
                Err(rejected(EventStatusKind::Completed, &action))
            }
            (EventStatus::Skipped { .. }, action) => {
                Err(rejected(EventStatusKind::Skipped, &action))
            }

            (EventStatus::Planned, StatusAction::Reschedule { previous_start }) => {
                Ok(EventStatus::Rescheduled { previous_start })
            }
            (EventStatus::Rescheduled { previous_start }, StatusAction::Reschedule { .. }) => {
                Ok(EventStatus::Rescheduled {
                    previous_start: *previous_start,
                })
            }

            (
                EventStatus::Planned | EventStatus::Rescheduled { .. },
                StatusAction::Complete { at, quality },
            ) => Ok(EventStatus::Completed {
                completed_at: at,
                quality: quality.map(|q| q.clamp(MIN_QUALITY, MAX_QUALITY)),
            }),

            (
                EventStatus::Planned | EventStatus::Rescheduled { .. },
                StatusAction::Skip { at, reason },
            ) => Ok(EventStatus::Skipped {
                skipped_at: at,
                reason,
            }),
        }
    }
}
