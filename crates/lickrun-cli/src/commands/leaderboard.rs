use clap::Subcommand;
use lickrun_core::{Config, Leaderboard};

use crate::render;

#[derive(Subcommand)]
pub enum LeaderboardAction {
    /// Show the fastest wins
    List {
        /// Number of entries (default: leaderboard.display_count)
        #[arg(long)]
        count: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every entry
    Clear,
}

pub fn run(action: LeaderboardAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let board = Leaderboard::open(config.leaderboard.max_entries)?;

    match action {
        LeaderboardAction::List { count, json } => {
            let count = count.unwrap_or(config.leaderboard.display_count as usize);
            let entries = board.top(count)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No wins recorded yet.");
            } else {
                for (i, entry) in entries.iter().enumerate() {
                    println!("{}", render::leaderboard_line(i + 1, entry));
                }
            }
        }
        LeaderboardAction::Clear => {
            let removed = board.clear()?;
            println!("removed {removed} entries");
        }
    }
    Ok(())
}
