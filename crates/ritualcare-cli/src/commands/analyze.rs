use std::path::PathBuf;

use clap::Args;
use ritualcare_core::ProfileAnalyzer;

use crate::input::{print_json, read_profile, CliResult};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to the profile JSON file
    #[arg(long)]
    pub profile: PathBuf,
}

pub fn run(args: AnalyzeArgs) -> CliResult {
    let profile = read_profile(&args.profile)?;
    let analysis = ProfileAnalyzer::new().analyze(&profile);
    print_json(&analysis)
}
