mod config;
pub mod leaderboard;

pub use config::{Config, LeaderboardConfig};
pub use leaderboard::Leaderboard;

use std::path::PathBuf;

/// Returns `~/.config/lickrun[-dev]/` based on LICKRUN_ENV.
///
/// Set LICKRUN_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("LICKRUN_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("lickrun-dev")
    } else {
        base_dir.join("lickrun")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
