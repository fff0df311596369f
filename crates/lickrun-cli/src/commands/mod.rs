pub mod config;
pub mod leaderboard;
pub mod play;
pub mod simulate;
