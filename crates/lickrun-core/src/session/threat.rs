//! Threat scheduler: decides when the watcher turns around.
//!
//! The scheduler is a pure state machine. It never owns timers; instead it
//! tells the controller what to schedule and is told when those timers fire.
//!
//! ```text
//! Idle --update(elapsed >= next - lead)--> Warning
//! Warning --resolve()--> Staring | FakeAlert
//! Staring | FakeAlert --clear()--> Idle   (next_event += fresh interval)
//! ```
//!
//! `next_event_ms` only advances in `clear()`, after the current event is
//! fully over, so events can never overlap or back up.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::config::ThreatTiming;
use crate::random::RandomSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatPhase {
    Idle,
    /// Warning delivered, event not yet resolved.
    Warning,
    Staring,
    FakeAlert,
}

/// Instruction to the controller after an arming update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreatWarning {
    /// Delay after which [`ThreatScheduler::resolve`] must be called.
    pub resolve_in_ms: u64,
    /// Scheduled event time, in elapsed playing milliseconds.
    pub event_at_ms: u64,
}

/// What a resolved warning turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ThreatEvent {
    Stare { duration_ms: u64 },
    FakeAlert { duration_ms: u64 },
}

impl ThreatEvent {
    pub fn duration_ms(&self) -> u64 {
        match *self {
            ThreatEvent::Stare { duration_ms } | ThreatEvent::FakeAlert { duration_ms } => {
                duration_ms
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatScheduler {
    timing: ThreatTiming,
    elapsed_ms: u64,
    next_event_ms: u64,
    phase: ThreatPhase,
    events_resolved: u32,
}

impl ThreatScheduler {
    /// The first event is one interval draw after play begins.
    pub fn new(timing: ThreatTiming, rng: &mut dyn RandomSource) -> Self {
        let next_event_ms = rng.uniform_ms(timing.min_interval_ms, timing.max_interval_ms);
        Self {
            timing,
            elapsed_ms: 0,
            next_event_ms,
            phase: ThreatPhase::Idle,
            events_resolved: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> ThreatPhase {
        self.phase
    }

    pub fn is_staring(&self) -> bool {
        self.phase == ThreatPhase::Staring
    }

    pub fn is_fake_alert(&self) -> bool {
        self.phase == ThreatPhase::FakeAlert
    }

    /// True from the warning until the event is cleared.
    pub fn is_armed(&self) -> bool {
        self.phase != ThreatPhase::Idle
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn next_event_ms(&self) -> u64 {
        self.next_event_ms
    }

    pub fn events_resolved(&self) -> u32 {
        self.events_resolved
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Feed the session's elapsed playing time. Returns a warning when this
    /// update arms the next event.
    pub fn update(&mut self, elapsed_ms: u64) -> Option<ThreatWarning> {
        self.elapsed_ms = self.elapsed_ms.max(elapsed_ms);
        if self.is_armed() {
            return None;
        }
        let arm_at = self
            .next_event_ms
            .saturating_sub(self.timing.warning_lead_ms);
        if self.elapsed_ms < arm_at {
            return None;
        }
        self.phase = ThreatPhase::Warning;
        trace!(
            elapsed_ms = self.elapsed_ms,
            event_at_ms = self.next_event_ms,
            "threat armed"
        );
        Some(ThreatWarning {
            resolve_in_ms: self.timing.warning_lead_ms,
            event_at_ms: self.next_event_ms,
        })
    }

    /// Flip the coin for the armed event. Returns `None` unless a warning is
    /// outstanding, so the event body can never precede its warning.
    pub fn resolve(&mut self, rng: &mut dyn RandomSource) -> Option<ThreatEvent> {
        if self.phase != ThreatPhase::Warning {
            return None;
        }
        let event = if rng.chance(self.timing.fake_alert_probability) {
            self.phase = ThreatPhase::FakeAlert;
            ThreatEvent::FakeAlert {
                duration_ms: self.timing.fake_alert_ms,
            }
        } else {
            self.phase = ThreatPhase::Staring;
            ThreatEvent::Stare {
                duration_ms: rng.uniform_ms(self.timing.min_stare_ms, self.timing.max_stare_ms),
            }
        };
        Some(event)
    }

    /// End the active stare or fake alert, draw the next interval and disarm.
    /// Returns the phase that ended, or `None` if nothing was active.
    pub fn clear(&mut self, rng: &mut dyn RandomSource) -> Option<ThreatPhase> {
        let ended = match self.phase {
            ThreatPhase::Staring | ThreatPhase::FakeAlert => self.phase,
            ThreatPhase::Idle | ThreatPhase::Warning => return None,
        };
        self.next_event_ms += rng.uniform_ms(self.timing.min_interval_ms, self.timing.max_interval_ms);
        self.phase = ThreatPhase::Idle;
        self.events_resolved += 1;
        Some(ended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SequenceRandom;
    use crate::session::config::GameConfig;

    fn timing() -> ThreatTiming {
        GameConfig {
            min_stare_duration: 1.0,
            max_stare_duration: 3.0,
            ..GameConfig::default()
        }
        .threat_timing()
    }

    #[test]
    fn first_event_drawn_from_interval() {
        let mut rng = SequenceRandom::new([0.4]);
        let threat = ThreatScheduler::new(timing(), &mut rng);
        assert_eq!(threat.next_event_ms(), 5_000);
        assert_eq!(threat.phase(), ThreatPhase::Idle);
    }

    #[test]
    fn arms_at_lead_time_before_event() {
        let mut rng = SequenceRandom::new([0.4]);
        let mut threat = ThreatScheduler::new(timing(), &mut rng);
        assert!(threat.update(4_700).is_none());
        let warning = threat.update(4_800).unwrap();
        assert_eq!(warning.resolve_in_ms, 200);
        assert_eq!(warning.event_at_ms, 5_000);
        assert!(threat.is_armed());
        // Already armed: no second warning.
        assert!(threat.update(4_900).is_none());
    }

    #[test]
    fn resolve_without_warning_does_nothing() {
        let mut rng = SequenceRandom::new([0.0]);
        let mut threat = ThreatScheduler::new(timing(), &mut rng);
        assert!(threat.resolve(&mut rng).is_none());
        assert!(!threat.is_staring());
    }

    #[test]
    fn coin_flip_picks_stare_with_drawn_duration() {
        // interval 0.0 -> 3000ms; coin 0.9 -> stare; stare draw 0.5 -> 2000ms
        let mut rng = SequenceRandom::new([0.0, 0.9, 0.5]);
        let mut threat = ThreatScheduler::new(timing(), &mut rng);
        threat.update(3_000);
        let event = threat.resolve(&mut rng).unwrap();
        assert_eq!(event, ThreatEvent::Stare { duration_ms: 2_000 });
        assert!(threat.is_staring());
        assert!(!threat.is_fake_alert());
    }

    #[test]
    fn coin_flip_picks_fake_alert() {
        let mut rng = SequenceRandom::new([0.0, 0.1]);
        let mut threat = ThreatScheduler::new(timing(), &mut rng);
        threat.update(3_000);
        let event = threat.resolve(&mut rng).unwrap();
        assert_eq!(event, ThreatEvent::FakeAlert { duration_ms: 1_000 });
        assert!(threat.is_fake_alert());
        assert!(!threat.is_staring());
    }

    #[test]
    fn clear_advances_next_event_and_disarms() {
        // interval 0.0 -> 3000; coin 0.9 -> stare; stare 0.0 -> 1000; next interval 1.0 -> ~8000
        let mut rng = SequenceRandom::new([0.0, 0.9, 0.0, 1.0]);
        let mut threat = ThreatScheduler::new(timing(), &mut rng);
        threat.update(3_000);
        threat.resolve(&mut rng);
        assert_eq!(threat.clear(&mut rng), Some(ThreatPhase::Staring));
        assert_eq!(threat.phase(), ThreatPhase::Idle);
        assert_eq!(threat.next_event_ms(), 3_000 + 8_000);
        assert_eq!(threat.events_resolved(), 1);
        assert!(threat.clear(&mut rng).is_none());
    }

    #[test]
    fn clear_during_warning_is_ignored() {
        let mut rng = SequenceRandom::new([0.0]);
        let mut threat = ThreatScheduler::new(timing(), &mut rng);
        threat.update(3_000);
        assert!(threat.clear(&mut rng).is_none());
        assert_eq!(threat.phase(), ThreatPhase::Warning);
        assert_eq!(threat.next_event_ms(), 3_000);
    }

    #[test]
    fn certain_fake_alert_never_stares() {
        let timing = ThreatTiming {
            fake_alert_probability: 1.0,
            ..timing()
        };
        let mut rng = SequenceRandom::new([0.0, 0.3, 0.99, 0.6]);
        let mut threat = ThreatScheduler::new(timing, &mut rng);
        let mut elapsed = 0;
        for _ in 0..10 {
            elapsed = threat.next_event_ms();
            assert!(threat.update(elapsed).is_some());
            let event = threat.resolve(&mut rng).unwrap();
            assert!(matches!(event, ThreatEvent::FakeAlert { .. }));
            assert!(!threat.is_staring());
            threat.clear(&mut rng);
        }
        assert!(threat.next_event_ms() > elapsed);
    }
}
