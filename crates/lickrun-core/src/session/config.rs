use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunable game constants. Durations are in seconds.
///
/// Every component of a session is built from this struct; nothing in the
/// session core hard-codes timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_session_duration")]
    pub session_duration: f64,
    /// Cumulative acting time needed to win.
    #[serde(default = "default_action_goal")]
    pub action_goal: f64,
    /// Gap between the warning flash and the event it announces.
    #[serde(default = "default_warning_lead_time")]
    pub warning_lead_time: f64,
    #[serde(default = "default_min_threat_interval")]
    pub min_threat_interval: f64,
    #[serde(default = "default_max_threat_interval")]
    pub max_threat_interval: f64,
    #[serde(default = "default_stare_duration")]
    pub min_stare_duration: f64,
    #[serde(default = "default_stare_duration")]
    pub max_stare_duration: f64,
    #[serde(default = "default_fake_alert_probability")]
    pub fake_alert_probability: f64,
    #[serde(default = "default_fake_alert_duration")]
    pub fake_alert_duration: f64,
    /// Whole seconds; one countdown tick per second.
    #[serde(default = "default_countdown_duration")]
    pub countdown_duration: u32,
    /// Remaining time at which the final-stretch cue fires.
    #[serde(default = "default_final_stretch_duration")]
    pub final_stretch_duration: f64,
}

fn default_session_duration() -> f64 {
    60.0
}
fn default_action_goal() -> f64 {
    15.0
}
fn default_warning_lead_time() -> f64 {
    0.2
}
fn default_min_threat_interval() -> f64 {
    3.0
}
fn default_max_threat_interval() -> f64 {
    8.0
}
fn default_stare_duration() -> f64 {
    2.0
}
fn default_fake_alert_probability() -> f64 {
    0.4
}
fn default_fake_alert_duration() -> f64 {
    1.0
}
fn default_countdown_duration() -> u32 {
    3
}
fn default_final_stretch_duration() -> f64 {
    3.0
}

impl Default for GameConfig {
    fn default() -> Self {
        GamePreset::Classic.config()
    }
}

/// Named constant sets that earlier revisions of the game shipped with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePreset {
    /// One minute, 15 second goal, short fixed stares.
    Classic,
    /// Longer session with a bigger goal and variable stares.
    Extended,
}

impl GamePreset {
    pub fn config(self) -> GameConfig {
        match self {
            GamePreset::Classic => GameConfig {
                session_duration: default_session_duration(),
                action_goal: default_action_goal(),
                warning_lead_time: default_warning_lead_time(),
                min_threat_interval: default_min_threat_interval(),
                max_threat_interval: default_max_threat_interval(),
                min_stare_duration: default_stare_duration(),
                max_stare_duration: default_stare_duration(),
                fake_alert_probability: default_fake_alert_probability(),
                fake_alert_duration: default_fake_alert_duration(),
                countdown_duration: default_countdown_duration(),
                final_stretch_duration: default_final_stretch_duration(),
            },
            GamePreset::Extended => GameConfig {
                session_duration: 90.0,
                action_goal: 20.0,
                warning_lead_time: 0.5,
                min_threat_interval: 4.0,
                max_threat_interval: 9.0,
                min_stare_duration: 1.5,
                max_stare_duration: 3.0,
                fake_alert_probability: 0.3,
                fake_alert_duration: 1.0,
                countdown_duration: 3,
                final_stretch_duration: 5.0,
            },
        }
    }
}

/// Scheduler timing resolved to milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThreatTiming {
    pub warning_lead_ms: u64,
    pub min_interval_ms: u64,
    pub max_interval_ms: u64,
    pub min_stare_ms: u64,
    pub max_stare_ms: u64,
    pub fake_alert_ms: u64,
    pub fake_alert_probability: f64,
}

/// Upper bound for any configured duration: one hour.
pub const MAX_DURATION_SECS: f64 = 3_600.0;

/// Upper bound for the pre-play countdown, in whole seconds.
pub const MAX_COUNTDOWN_SECS: u32 = 60;

pub fn secs_to_ms(secs: f64) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}

impl GameConfig {
    pub fn session_duration_ms(&self) -> u64 {
        secs_to_ms(self.session_duration)
    }

    pub fn action_goal_ms(&self) -> u64 {
        secs_to_ms(self.action_goal)
    }

    pub fn final_stretch_ms(&self) -> u64 {
        secs_to_ms(self.final_stretch_duration)
    }

    pub fn threat_timing(&self) -> ThreatTiming {
        ThreatTiming {
            warning_lead_ms: secs_to_ms(self.warning_lead_time),
            min_interval_ms: secs_to_ms(self.min_threat_interval),
            max_interval_ms: secs_to_ms(self.max_threat_interval),
            min_stare_ms: secs_to_ms(self.min_stare_duration),
            max_stare_ms: secs_to_ms(self.max_stare_duration),
            fake_alert_ms: secs_to_ms(self.fake_alert_duration),
            fake_alert_probability: self.fake_alert_probability,
        }
    }

    /// Check every option is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let durations = [
            ("session_duration", self.session_duration),
            ("action_goal", self.action_goal),
            ("warning_lead_time", self.warning_lead_time),
            ("min_threat_interval", self.min_threat_interval),
            ("max_threat_interval", self.max_threat_interval),
            ("min_stare_duration", self.min_stare_duration),
            ("max_stare_duration", self.max_stare_duration),
            ("fake_alert_duration", self.fake_alert_duration),
            ("final_stretch_duration", self.final_stretch_duration),
        ];
        for (key, value) in durations {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(key, format!("must be a positive number, got {value}")));
            }
            // Play runs on whole milliseconds, so the rounded value is what counts.
            if secs_to_ms(value) == 0 {
                return Err(invalid(key, format!("must be at least 1ms, got {value}s")));
            }
            if value > MAX_DURATION_SECS {
                return Err(invalid(
                    key,
                    format!("must not exceed {MAX_DURATION_SECS}s, got {value}s"),
                ));
            }
        }
        if self.min_threat_interval > self.max_threat_interval {
            return Err(invalid(
                "min_threat_interval",
                "must not exceed max_threat_interval".into(),
            ));
        }
        if self.min_stare_duration > self.max_stare_duration {
            return Err(invalid(
                "min_stare_duration",
                "must not exceed max_stare_duration".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.fake_alert_probability) {
            return Err(invalid(
                "fake_alert_probability",
                format!("must be within 0..=1, got {}", self.fake_alert_probability),
            ));
        }
        if !(1..=MAX_COUNTDOWN_SECS).contains(&self.countdown_duration) {
            return Err(invalid(
                "countdown_duration",
                format!("must be within 1..={MAX_COUNTDOWN_SECS}"),
            ));
        }
        Ok(())
    }
}

fn invalid(key: &str, message: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: format!("game.{key}"),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_classic() {
        let cfg = GameConfig::default();
        assert_eq!(cfg, GamePreset::Classic.config());
        assert_eq!(cfg.session_duration_ms(), 60_000);
        assert_eq!(cfg.action_goal_ms(), 15_000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn presets_validate() {
        assert!(GamePreset::Extended.config().validate().is_ok());
    }

    #[test]
    fn threat_timing_converts_to_ms() {
        let timing = GameConfig::default().threat_timing();
        assert_eq!(timing.warning_lead_ms, 200);
        assert_eq!(timing.min_interval_ms, 3_000);
        assert_eq!(timing.max_interval_ms, 8_000);
        assert_eq!(timing.min_stare_ms, 2_000);
        assert_eq!(timing.fake_alert_ms, 1_000);
    }

    #[test]
    fn rejects_non_positive_duration() {
        let cfg = GameConfig {
            action_goal: 0.0,
            ..GameConfig::default()
        };
        match cfg.validate() {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "game.action_goal"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rejects_inverted_ranges() {
        let cfg = GameConfig {
            min_threat_interval: 9.0,
            ..GameConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = GameConfig {
            min_stare_duration: 5.0,
            max_stare_duration: 1.0,
            ..GameConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_durations_that_round_to_zero_ms() {
        let cfg = GameConfig {
            action_goal: 0.0004,
            ..GameConfig::default()
        };
        match cfg.validate() {
            Err(ConfigError::InvalidValue { key, .. }) => assert_eq!(key, "game.action_goal"),
            other => panic!("unexpected: {other:?}"),
        }

        let cfg = GameConfig {
            warning_lead_time: 0.0001,
            ..GameConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = GameConfig {
            action_goal: 0.001,
            ..GameConfig::default()
        };
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.action_goal_ms(), 1);
    }

    #[test]
    fn rejects_oversized_durations() {
        let cfg = GameConfig {
            min_stare_duration: 1e17,
            max_stare_duration: 1e17,
            ..GameConfig::default()
        };
        match cfg.validate() {
            Err(ConfigError::InvalidValue { key, .. }) => {
                assert_eq!(key, "game.min_stare_duration")
            }
            other => panic!("unexpected: {other:?}"),
        }

        let cfg = GameConfig {
            session_duration: MAX_DURATION_SECS,
            ..GameConfig::default()
        };
        assert!(cfg.validate().is_ok());

        let cfg = GameConfig {
            countdown_duration: MAX_COUNTDOWN_SECS + 1,
            ..GameConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_probability_out_of_range() {
        let cfg = GameConfig {
            fake_alert_probability: 1.5,
            ..GameConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: GameConfig = toml::from_str("action_goal = 20.0\nsession_duration = 90.0").unwrap();
        assert_eq!(cfg.action_goal, 20.0);
        assert_eq!(cfg.session_duration, 90.0);
        assert_eq!(cfg.countdown_duration, 3);
    }
}
