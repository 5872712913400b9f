use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use habitrack_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "habitrack", version, about = "Habitrack CLI")]
struct Cli {
    /// Override today's date (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Habit management
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Record daily progress
    Progress {
        #[command(subcommand)]
        action: commands::progress::ProgressAction,
    },
    /// Current and longest streak of a habit
    Streak {
        /// Habit ID
        id: String,
    },
    /// Monthly completion statistics
    Stats(commands::stats::StatsArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    // The log level comes from the config, so a load failure is reported
    // before any subscriber exists.
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("warning: using default configuration: {e}");
        Config::default()
    });
    init_tracing(&config);

    let ctx = commands::Context::new(config, cli.today);
    let result = match cli.command {
        Commands::Habit { action } => commands::habit::run(&ctx, action),
        Commands::Progress { action } => commands::progress::run(&ctx, action),
        Commands::Streak { id } => commands::progress::streak(&ctx, &id),
        Commands::Stats(args) => commands::stats::run(&ctx, args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
