use clap::{Parser, Subcommand};
use studybuilder_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "studybuilder", version, about = "Study Builder CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Duration tokens
    Duration {
        #[command(subcommand)]
        action: commands::duration::DurationAction,
    },
    /// Study records
    Study {
        #[command(subcommand)]
        action: commands::study::StudyAction,
    },
    /// Schedule and session timing
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Log to stderr. `RUST_LOG` wins over the configured level.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config);
    tracing::debug!(base_url = %config.api.base_url, "configuration loaded");

    let result = match cli.command {
        Commands::Duration { action } => commands::duration::run(action),
        Commands::Study { action } => commands::study::run(action, &config),
        Commands::Schedule { action } => commands::schedule::run(action, &config),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
