use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "wellspring-cli", version, about = "Wellspring adaptive duration CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recommend a duration for an activity
    Recommend(commands::recommend::RecommendArgs),
    /// Quick / recommended / extended options for an activity
    Suggest(commands::suggest::SuggestArgs),
    /// Report an activity outcome
    Record {
        #[command(subcommand)]
        action: commands::record::RecordAction,
    },
    /// Run pattern analysis, preference learning and cleanup
    Maintain {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    #[command(flatten)]
    State(commands::state::StateAction),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Inspect activity profiles
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("WELLSPRING_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Recommend(args) => commands::recommend::run(args),
        Commands::Suggest(args) => commands::suggest::run(args),
        Commands::Record { action } => commands::record::run(action),
        Commands::Maintain { json } => commands::maintain::run(json),
        Commands::State(action) => commands::state::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Profile { action } => commands::profile::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
