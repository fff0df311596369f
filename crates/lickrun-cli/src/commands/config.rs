//! `lickrun config`: inspect and edit `config.toml`.
//!
//! Keys are dot paths into the two sections, `game.*` and `leaderboard.*`.
//! Every edit is validated as a whole before it is written back.

use clap::{Subcommand, ValueEnum};
use lickrun_core::storage::LeaderboardConfig;
use lickrun_core::{Config, ConfigError, GameConfig};

use crate::PresetArg;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value (e.g. "game.action_goal")
    Get { key: String },
    /// Change one value; the whole config must still validate
    Set { key: String, value: String },
    /// Print the effective config as TOML
    List {
        /// Show the game settings a preset would play with
        #[arg(long, value_enum)]
        preset: Option<PresetArg>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print every settable key with its current value
    Keys,
    /// Restore defaults, for one section or everything
    Reset {
        #[arg(value_enum)]
        section: Option<Section>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Section {
    Game,
    Leaderboard,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let value = leaf_keys(&Config::load()?)?
                .into_iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v)
                .ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            let stored = config.get(&key).unwrap_or(value);
            println!("{key} = {stored}");
        }
        ConfigAction::List { preset, json } => {
            let config = Config::load()?;
            let effective = Config {
                game: config.game_config(preset.map(Into::into)),
                ..config
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&effective)?);
            } else {
                print!("{}", toml::to_string_pretty(&effective)?);
            }
        }
        ConfigAction::Keys => {
            for (key, value) in leaf_keys(&Config::load()?)? {
                println!("{key:<32} {value}");
            }
        }
        ConfigAction::Reset { section } => {
            // A full reset must also recover from a file that no longer parses.
            let config = match section {
                Some(Section::Game) => Config {
                    game: GameConfig::default(),
                    ..Config::load()?
                },
                Some(Section::Leaderboard) => Config {
                    leaderboard: LeaderboardConfig::default(),
                    ..Config::load()?
                },
                None => Config::default(),
            };
            config.save()?;
            match section {
                Some(section) => println!("{section:?} settings reset to defaults"),
                None => println!("config reset to defaults"),
            }
        }
    }
    Ok(())
}

/// `(dot.path, value)` for every scalar in the config.
fn leaf_keys(config: &Config) -> Result<Vec<(String, String)>, serde_json::Error> {
    fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
        match value {
            serde_json::Value::Object(map) => {
                for (name, child) in map {
                    let path = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{prefix}.{name}")
                    };
                    walk(&path, child, out);
                }
            }
            leaf => out.push((prefix.to_string(), leaf.to_string())),
        }
    }

    let mut out = Vec::new();
    walk("", &serde_json::to_value(config)?, &mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_keys_cover_both_sections() {
        let keys = leaf_keys(&Config::default()).unwrap();
        let names: Vec<_> = keys.iter().map(|(k, _)| k.as_str()).collect();
        assert!(names.contains(&"game.action_goal"));
        assert!(names.contains(&"game.countdown_duration"));
        assert!(names.contains(&"leaderboard.max_entries"));
        assert!(!names.contains(&"game"));

        let goal = keys.iter().find(|(k, _)| k == "game.action_goal").unwrap();
        assert_eq!(goal.1, "15.0");
    }
}
