use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::Subcommand;
use ritualcare_core::{CalendarDb, CalendarMaterializer, Config};

use crate::input::{parse_date, parse_instant, print_json, read_profile, CliResult, ProfileDir};

#[derive(Subcommand)]
pub enum CalendarAction {
    /// Materialize the weekly plan into dated events
    Generate {
        #[arg(long)]
        user: String,
        /// Path to the profile JSON file
        #[arg(long)]
        profile: PathBuf,
        /// First day to schedule (YYYY-MM-DD, default today)
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,
        /// Weeks to generate (1-4)
        #[arg(long)]
        weeks: Option<u8>,
        /// Remove future unbooked rituals before generating
        #[arg(long)]
        replace: bool,
        #[arg(long)]
        no_rest_buffers: bool,
        #[arg(long)]
        no_prompts: bool,
    },
    /// Upcoming planned rituals
    Upcoming {
        #[arg(long)]
        user: String,
        #[arg(long)]
        profile: PathBuf,
    },
    /// Mark a ritual completed
    Complete {
        #[arg(long)]
        user: String,
        #[arg(long)]
        event: String,
        /// Quality rating 1-5
        #[arg(long)]
        quality: Option<u8>,
    },
    /// Skip a ritual
    Skip {
        #[arg(long)]
        user: String,
        #[arg(long)]
        event: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Move a ritual to a new start time
    Reschedule {
        #[arg(long)]
        user: String,
        #[arg(long)]
        event: String,
        /// New start (RFC 3339)
        #[arg(long, value_parser = parse_instant)]
        start: DateTime<Utc>,
        #[arg(long)]
        profile: PathBuf,
    },
    /// Dashboard summary
    Summary {
        #[arg(long)]
        user: String,
        #[arg(long)]
        profile: PathBuf,
    },
    /// Rebuild the calendar after a profile change
    Regenerate {
        #[arg(long)]
        user: String,
        /// Directory of `<user>.json` profiles
        #[arg(long)]
        profile_dir: PathBuf,
        /// First day to rebuild from (YYYY-MM-DD, default today)
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,
    },
}

pub fn run(action: CalendarAction) -> CliResult {
    let config = Config::load()?;
    let materializer =
        CalendarMaterializer::with_settings(CalendarDb::open()?, config.materializer_settings()?);
    let today = Utc::now().date_naive();

    match action {
        CalendarAction::Generate {
            user,
            profile,
            start,
            weeks,
            replace,
            no_rest_buffers,
            no_prompts,
        } => {
            let profile = read_profile(&profile)?;
            let mut options = config.generation_options(start.unwrap_or(today));
            if let Some(weeks) = weeks {
                options.weeks_to_generate = weeks;
            }
            options.replace_existing |= replace;
            options.include_rest_buffers &= !no_rest_buffers;
            options.include_education_prompts &= !no_prompts;
            print_json(&materializer.generate(&user, &profile, options).into_result()?)
        }
        CalendarAction::Upcoming { user, profile } => {
            let profile = read_profile(&profile)?;
            print_json(&materializer.list_upcoming(&user, &profile).into_result()?)
        }
        CalendarAction::Complete {
            user,
            event,
            quality,
        } => print_json(&materializer.complete(&user, &event, quality).into_result()?),
        CalendarAction::Skip {
            user,
            event,
            reason,
        } => print_json(&materializer.skip(&user, &event, reason).into_result()?),
        CalendarAction::Reschedule {
            user,
            event,
            start,
            profile,
        } => {
            let profile = read_profile(&profile)?;
            let outcome = materializer
                .reschedule(&user, &event, start, &profile)
                .into_result()?;
            print_json(&outcome)
        }
        CalendarAction::Summary { user, profile } => {
            let profile = read_profile(&profile)?;
            print_json(&materializer.summary(&user, &profile).into_result()?)
        }
        CalendarAction::Regenerate {
            user,
            profile_dir,
            start,
        } => {
            let profiles = ProfileDir::new(profile_dir);
            let result = materializer
                .regenerate_for_profile_change(&user, &profiles, start.unwrap_or(today))
                .into_result()?;
            print_json(&result)
        }
    }
}
