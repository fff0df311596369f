use clap::{Parser, Subcommand, ValueEnum};
use lickrun_core::{GamePreset, PlayerStrategy};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "lickrun", version, about = "Lick It & Run: lick the candy, don't get caught")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a session in the terminal (Enter toggles licking)
    Play(commands::play::PlayArgs),
    /// Run a seeded session with a scripted player
    Simulate(commands::simulate::SimulateArgs),
    /// Leaderboard management
    Leaderboard {
        #[command(subcommand)]
        action: commands::leaderboard::LeaderboardAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Named timing presets.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PresetArg {
    Classic,
    Extended,
}

impl From<PresetArg> for GamePreset {
    fn from(arg: PresetArg) -> Self {
        match arg {
            PresetArg::Classic => GamePreset::Classic,
            PresetArg::Extended => GamePreset::Extended,
        }
    }
}

/// Scripted player behavior for simulations.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    Reckless,
    Cautious,
    Idle,
}

impl From<StrategyArg> for PlayerStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Reckless => PlayerStrategy::Reckless,
            StrategyArg::Cautious => PlayerStrategy::Cautious,
            StrategyArg::Idle => PlayerStrategy::Idle,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let result = match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Leaderboard { action } => commands::leaderboard::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
