use clap::Args;
use lickrun_core::{Config, Simulation, SimulationSeed};

use crate::render;
use crate::{PresetArg, StrategyArg};

#[derive(Args)]
pub struct SimulateArgs {
    /// Simulated player name
    #[arg(long, default_value = "Simulated")]
    name: String,
    /// Numeric seed (default: 42)
    #[arg(long, conflicts_with = "seed_name")]
    seed: Option<u64>,
    /// Derive the seed from a scenario name
    #[arg(long)]
    seed_name: Option<String>,
    /// Scripted player behavior
    #[arg(long, value_enum, default_value = "cautious")]
    strategy: StrategyArg,
    /// Virtual frame length in milliseconds
    #[arg(long, default_value = "16")]
    frame_ms: u64,
    /// Use a timing preset instead of the configured game settings
    #[arg(long, value_enum)]
    preset: Option<PresetArg>,
    /// Print the event timeline
    #[arg(long)]
    events: bool,
    /// Output the full report as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let game = config.game_config(args.preset.map(Into::into));
    let seed = match (args.seed, args.seed_name.as_deref()) {
        (Some(seed), _) => SimulationSeed::new(seed),
        (None, Some(name)) => SimulationSeed::from_string(name),
        (None, None) => SimulationSeed::default(),
    };

    let report = Simulation::new(game, seed)
        .with_strategy(args.strategy.into())
        .with_frame_ms(args.frame_ms)
        .with_player(args.name)
        .run()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.events {
        for timed in &report.events {
            if let Some(line) = render::event_line(&timed.event) {
                println!("{:>7}ms  {line}", timed.at_ms);
            }
        }
    }

    let outcome = report
        .outcome
        .map_or_else(|| "none".to_string(), |o| o.to_string());
    println!("seed:     {}", report.seed.0);
    println!("strategy: {:?}", report.strategy);
    println!("outcome:  {outcome}");
    if let Some(stats) = &report.stats {
        println!(
            "licked:   {:.1}s ({:.0}%)",
            stats.action_ms as f64 / 1000.0,
            stats.progress_pct
        );
        println!("time:     {}s", stats.completion_secs);
    }
    println!(
        "threats:  {} stares, {} fake alerts over {} frames",
        report.count("StareStarted"),
        report.count("FakeAlertStarted"),
        report.frames
    );
    Ok(())
}
