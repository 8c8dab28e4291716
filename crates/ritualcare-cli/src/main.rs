use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod input;

#[derive(Parser)]
#[command(name = "ritualcare-cli", version, about = "Ritualcare CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a profile: health grade, risks, archetype, needs, load budget
    Analyze(commands::analyze::AnalyzeArgs),
    /// Recommended rituals for a profile
    Rituals(commands::rituals::RitualsArgs),
    /// Weekly ritual plan for a profile
    Plan(commands::rituals::PlanArgs),
    /// Rest needed after an activity
    Rest(commands::load::RestArgs),
    /// Check whether an activity fits at a given time
    Load(commands::load::LoadArgs),
    /// Calendar generation and event lifecycle
    Calendar {
        #[command(subcommand)]
        action: commands::calendar::CalendarAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("RITUALCARE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Rituals(args) => commands::rituals::run(args),
        Commands::Plan(args) => commands::rituals::plan(args),
        Commands::Rest(args) => commands::load::rest(args),
        Commands::Load(args) => commands::load::run(args),
        Commands::Calendar { action } => commands::calendar::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
