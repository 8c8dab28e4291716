use std::path::PathBuf;

use clap::Args;
use ritualcare_core::{ProfileAnalyzer, RitualCatalog, RitualMatcher, WeeklyScheduleBuilder};

use crate::input::{print_json, read_profile, CliResult};

#[derive(Args)]
pub struct RitualsArgs {
    /// Path to the profile JSON file
    #[arg(long)]
    pub profile: PathBuf,
    /// Replace the built-in catalog with templates from a JSON file
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

#[derive(Args)]
pub struct PlanArgs {
    /// Path to the profile JSON file
    #[arg(long)]
    pub profile: PathBuf,
}

pub fn run(args: RitualsArgs) -> CliResult {
    let profile = read_profile(&args.profile)?;
    let analysis = ProfileAnalyzer::new().analyze(&profile);

    let custom = match &args.catalog {
        Some(path) => Some(RitualCatalog::from_json(&std::fs::read_to_string(path)?)?),
        None => None,
    };
    let matcher = match &custom {
        Some(catalog) => RitualMatcher::new(catalog),
        None => RitualMatcher::default(),
    };
    print_json(&matcher.match_rituals(&profile, &analysis))
}

pub fn plan(args: PlanArgs) -> CliResult {
    let profile = read_profile(&args.profile)?;
    let analysis = ProfileAnalyzer::new().analyze(&profile);
    let recommendations = RitualMatcher::default().match_rituals(&profile, &analysis);
    let schedule =
        WeeklyScheduleBuilder::new().build(&recommendations, &analysis.weekly_load_capacity);
    print_json(&schedule)
}
