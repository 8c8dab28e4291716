//! # Ritualcare Core Library
//!
//! Core logic for the ritualcare care-scheduling engine. Every operation is
//! available through the standalone CLI binary, which is a thin shell over
//! this library.
//!
//! ## Architecture
//!
//! - **Analysis**: scores a [`Profile`] into health, risk, archetype, care needs
//!   and a weekly load budget
//! - **Rituals**: a validated catalog of ritual templates and the matcher that
//!   ranks them against an analysed profile
//! - **Weekly**: greedy placement of recommendations into a seven-day plan
//! - **Load**: rest-buffer and placement-feasibility calculations
//! - **Calendar**: dated events, conflict detection and the event lifecycle
//! - **Storage**: SQLite event storage and TOML configuration
//!
//! ## Key Components
//!
//! - [`ProfileAnalyzer`]: profile scoring and classification
//! - [`RitualMatcher`]: prioritized ritual recommendations
//! - [`WeeklyScheduleBuilder`]: seven-slot weekly timetable
//! - [`LoadAccountant`]: rest buffers and load assessments
//! - [`CalendarMaterializer`]: calendar generation and mutations
//! - [`CalendarDb`]: persistent event storage
//! - [`Config`]: application configuration management

pub mod analysis;
pub mod calendar;
pub mod error;
pub mod load;
pub mod profile;
pub mod rituals;
pub mod storage;
pub mod weekly;

pub use analysis::{ProfileAnalysis, ProfileAnalyzer, WeeklyLoadCapacity};
pub use calendar::{
    CalendarEvent, CalendarMaterializer, CalendarStore, EventCategory, EventStatus,
    GenerationOptions, MemoryCalendarStore, OperationFailure, OperationResult,
};
pub use error::{CatalogError, ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use load::{LoadAccountant, LoadAssessment, RestBuffer};
pub use profile::{Profile, ProfileSource};
pub use rituals::{RitualCatalog, RitualMatcher, RitualRecommendation};
pub use storage::{CalendarDb, Config};
pub use weekly::{WeeklySchedule, WeeklyScheduleBuilder};
