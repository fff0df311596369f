//! Deterministic simulation harness for the session core.
//!
//! Drives a [`SessionController`] on virtual time with a seeded random
//! source and a scripted player. Given the same seed, strategy, frame length
//! and configuration, a run reproduces the same outcome and event timeline
//! (session ids and wall-clock timestamps aside). Useful for:
//! - Regression tests of the frame evaluation order
//! - Tuning presets without playing them by hand

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::events::GameEvent;
use crate::input::ActionInput;
use crate::random::SeededRandom;
use crate::session::{GameConfig, Outcome, Player, SessionController, SessionState, SessionStats};

/// Seed for deterministic random number generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimulationSeed(pub u64);

impl SimulationSeed {
    /// Create a new simulation seed
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Generate a seed from a string (for named scenarios)
    pub fn from_string(s: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        Self(hasher.finish())
    }
}

impl Default for SimulationSeed {
    fn default() -> Self {
        Self(42)
    }
}

/// Scripted player behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStrategy {
    /// Acts from the first frame and never stops.
    Reckless,
    /// Stops on every warning and resumes once the event is over.
    Cautious,
    /// Never acts.
    Idle,
}

/// Event stamped with the virtual time it was produced at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub at_ms: u64,
    pub event: GameEvent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub seed: SimulationSeed,
    pub strategy: PlayerStrategy,
    pub outcome: Option<Outcome>,
    pub stats: Option<SessionStats>,
    pub frames: u64,
    pub events: Vec<TimedEvent>,
}

impl SimulationReport {
    /// `(time, kind)` pairs, stable across runs with the same inputs.
    pub fn timeline(&self) -> Vec<(u64, &'static str)> {
        self.events
            .iter()
            .map(|e| (e.at_ms, e.event.kind()))
            .collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.events.iter().filter(|e| e.event.kind() == kind).count()
    }
}

#[derive(Debug, Clone)]
pub struct Simulation {
    config: GameConfig,
    seed: SimulationSeed,
    strategy: PlayerStrategy,
    frame_ms: u64,
    player: String,
}

impl Simulation {
    pub fn new(config: GameConfig, seed: SimulationSeed) -> Self {
        Self {
            config,
            seed,
            strategy: PlayerStrategy::Cautious,
            frame_ms: 16,
            player: "Simulated".into(),
        }
    }

    pub fn with_strategy(mut self, strategy: PlayerStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Frame length in milliseconds; clamped to at least 1.
    pub fn with_frame_ms(mut self, frame_ms: u64) -> Self {
        self.frame_ms = frame_ms.max(1);
        self
    }

    pub fn with_player(mut self, name: impl Into<String>) -> Self {
        self.player = name.into();
        self
    }

    /// Run one session to its end.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the player name
    /// is blank.
    pub fn run(&self) -> Result<SimulationReport> {
        let mut controller = SessionController::with_random(
            self.config.clone(),
            Box::new(SeededRandom::new(self.seed.0)),
        )?;
        let mut input = ActionInput::new();
        let mut events = Vec::new();
        let mut now = 0u64;
        let mut frames = 0u64;

        stamp(&mut events, now, controller.start(Player::new(self.player.clone()), now)?);

        // The controller always ends on its own by timeout; the horizon only
        // bounds the loop if it somehow doesn't.
        let horizon = (u64::from(self.config.countdown_duration) * 1_000)
            .saturating_add(self.config.session_duration_ms())
            .saturating_add(self.frame_ms.saturating_mul(4));
        let mut wary = false;

        while controller.state() != SessionState::Ended && now <= horizon {
            now = now.saturating_add(self.frame_ms);
            frames += 1;

            let tick = controller.tick(now);
            for event in &tick {
                match event {
                    GameEvent::Warning { .. } => wary = true,
                    GameEvent::StareEnded | GameEvent::FakeAlertEnded => wary = false,
                    _ => {}
                }
            }
            stamp(&mut events, now, tick);
            if controller.state() == SessionState::Ended {
                break;
            }

            let wants_to_act = match self.strategy {
                PlayerStrategy::Reckless => true,
                PlayerStrategy::Cautious => !wary,
                PlayerStrategy::Idle => false,
            };
            let intent = if wants_to_act {
                input.press(controller.state())
            } else {
                input.release()
            };
            if let Some(intent) = intent {
                stamp(&mut events, now, controller.apply(intent, now));
            }
        }
        input.clear();

        Ok(SimulationReport {
            seed: self.seed,
            strategy: self.strategy,
            outcome: controller.outcome(),
            stats: controller.session().map(|s| s.stats()),
            frames,
            events,
        })
    }
}

fn stamp(out: &mut Vec<TimedEvent>, at_ms: u64, events: Vec<GameEvent>) {
    out.extend(events.into_iter().map(|event| TimedEvent { at_ms, event }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_from_string_is_stable() {
        assert_eq!(
            SimulationSeed::from_string("arcade"),
            SimulationSeed::from_string("arcade")
        );
        assert_ne!(
            SimulationSeed::from_string("arcade"),
            SimulationSeed::from_string("arcade2")
        );
    }

    #[test]
    fn idle_player_times_out() {
        let report = Simulation::new(GameConfig::default(), SimulationSeed::new(7))
            .with_strategy(PlayerStrategy::Idle)
            .run()
            .unwrap();
        assert_eq!(report.outcome, Some(Outcome::Timeout));
        assert_eq!(report.stats.unwrap().action_ms, 0);
    }

    #[test]
    fn cautious_player_is_never_caught() {
        for seed in 0..20 {
            let report = Simulation::new(GameConfig::default(), SimulationSeed::new(seed))
                .with_strategy(PlayerStrategy::Cautious)
                .run()
                .unwrap();
            assert_ne!(report.outcome, Some(Outcome::Caught), "seed {seed}");
        }
    }

    #[test]
    fn same_seed_same_timeline() {
        let sim = Simulation::new(GameConfig::default(), SimulationSeed::new(1234))
            .with_strategy(PlayerStrategy::Cautious)
            .with_frame_ms(20);
        let a = sim.run().unwrap();
        let b = sim.run().unwrap();
        assert_eq!(a.outcome, b.outcome);
        assert_eq!(a.frames, b.frames);
        assert_eq!(a.timeline(), b.timeline());
    }

    #[test]
    fn blank_player_is_rejected() {
        let result = Simulation::new(GameConfig::default(), SimulationSeed::default())
            .with_player("  ")
            .run();
        assert!(result.is_err());
    }
}
