use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use clap::Args;
use ritualcare_core::calendar::{CalendarStore, EventQuery, TimeWindow};
use ritualcare_core::rituals::ActivityType;
use ritualcare_core::{CalendarDb, CalendarEvent, LoadAccountant};
use tracing::debug;

use crate::input::{parse_activity, parse_instant, print_json, read_profile, CliResult};

/// Days of calendar history considered around the activity.
const CONTEXT_DAYS: i64 = 8;

#[derive(Args)]
pub struct RestArgs {
    /// Path to the profile JSON file
    #[arg(long)]
    pub profile: PathBuf,
    /// Activity type (e.g. wash-day, protein-treatment)
    #[arg(long, value_parser = parse_activity)]
    pub activity: ActivityType,
    /// Include this user's recent calendar events
    #[arg(long)]
    pub user: Option<String>,
}

#[derive(Args)]
pub struct LoadArgs {
    /// Path to the profile JSON file
    #[arg(long)]
    pub profile: PathBuf,
    /// Activity type (e.g. wash-day, protein-treatment)
    #[arg(long, value_parser = parse_activity)]
    pub activity: ActivityType,
    /// Proposed start (RFC 3339)
    #[arg(long, value_parser = parse_instant)]
    pub at: DateTime<Utc>,
    /// Check against this user's calendar
    #[arg(long)]
    pub user: Option<String>,
}

pub fn rest(args: RestArgs) -> CliResult {
    let profile = read_profile(&args.profile)?;
    let now = Utc::now();
    let events = calendar_context(args.user.as_deref(), now)?;
    let buffer = LoadAccountant::new().calculate_rest_buffer(&profile, args.activity, &events, now);
    print_json(&buffer)
}

pub fn run(args: LoadArgs) -> CliResult {
    let profile = read_profile(&args.profile)?;
    let events = calendar_context(args.user.as_deref(), args.at)?;
    let assessment =
        LoadAccountant::new().assess_event_load(&profile, args.activity, args.at, &events);
    print_json(&assessment)
}

/// The user's events within a few days of `around`; empty without a user.
fn calendar_context(user: Option<&str>, around: DateTime<Utc>) -> CliResult<Vec<CalendarEvent>> {
    let Some(user) = user else {
        return Ok(Vec::new());
    };
    let window = TimeWindow::new(
        around - Duration::days(CONTEXT_DAYS),
        around + Duration::days(CONTEXT_DAYS),
    )?;
    let db = CalendarDb::open()?;
    let query = EventQuery::for_user(user).overlapping(window);
    let events = db.atomically(|repo| repo.find_events(&query))?;
    debug!(user, count = events.len(), "loaded calendar context");
    Ok(events)
}
