//! Session controller: the only writer of session state and outcome.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Countdown -> Playing -> Ended(Win | Caught | Timeout)
//! ```
//!
//! `Ended` is terminal for a session. Playing again creates a new session
//! with a new [`SessionId`]; the old one is dropped with its clock, threat
//! scheduler and progress tracker.
//!
//! ## Driving the controller
//!
//! The host calls [`SessionController::tick`] from its frame loop and
//! forwards input intents as they arrive. Delayed work (countdown steps,
//! threat resolution, stare and fake-alert expiry) is queued as plain
//! [`Callback`] records tagged with the scheduling session's id. A callback
//! whose id no longer matches the live session is dropped when it fires, so
//! a reset never has to hunt down outstanding timers.
//!
//! ## Frame evaluation order
//!
//! 1. due callbacks, each at its own due time
//! 2. clock sample
//! 3. threat scheduler update (may arm a warning)
//! 4. catch check: stare active while acting
//! 5. accrual when acting and not stared at
//! 6. win check
//! 7. timeout, only if the clock completed on this sample
//!
//! Win is checked before timeout, so reaching the goal on the same frame the
//! clock runs out is a win.
//!
//! ```ignore
//! let mut controller = SessionController::new(GameConfig::default())?;
//! controller.start(Player::new("Ada"), now_ms())?;
//! loop {
//!     for event in controller.tick(now_ms()) { render(event); }
//! }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::clock::Clock;
use super::config::GameConfig;
use super::model::{LeaderboardEntry, Outcome, Player, Session, SessionId, SessionState};
use super::progress::ProgressTracker;
use super::threat::{ThreatEvent, ThreatPhase, ThreatScheduler};
use super::timers::TimerQueue;
use crate::error::{ConfigError, SessionError};
use crate::events::GameEvent;
use crate::input::ActionIntent;
use crate::random::{RandomSource, ThreadRandom};

const COUNTDOWN_STEP_MS: u64 = 1_000;

/// Work deferred to a later instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TimedAction {
    /// Countdown step; `remaining == 0` starts play.
    CountdownTick { remaining: u32 },
    /// Warning lead time elapsed: flip the stare/fake coin.
    ResolveThreat,
    EndStare,
    EndFakeAlert,
}

/// A deferred action bound to the session that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Callback {
    pub session: SessionId,
    pub action: TimedAction,
}

pub struct SessionController {
    config: GameConfig,
    rng: Box<dyn RandomSource>,
    timers: TimerQueue<Callback>,
    session: Option<Session>,
}

impl SessionController {
    /// Controller with a non-reproducible random source.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        Self::with_random(config, Box::new(ThreadRandom))
    }

    /// Controller with an injected random source.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn with_random(
        config: GameConfig,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            rng,
            timers: TimerQueue::new(),
            session: None,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn state(&self) -> SessionState {
        self.session
            .as_ref()
            .map(|s| s.state)
            .unwrap_or(SessionState::Idle)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.session.as_ref().and_then(|s| s.outcome)
    }

    pub fn next_timer_due(&self) -> Option<u64> {
        self.timers.next_due()
    }

    /// Queued callbacks in due order, including stale ones not yet fired.
    pub fn pending_callbacks(&self) -> Vec<(u64, Callback)> {
        let mut pending: Vec<_> = self.timers.iter().map(|(due, cb)| (due, *cb)).collect();
        pending.sort_by_key(|(due, _)| *due);
        pending
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Create a session and begin its countdown.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidStartRequest`] for a blank player name and
    /// [`SessionError::SessionInProgress`] while another session is live.
    /// The controller is left untouched in both cases.
    pub fn start(&mut self, player: Player, now_ms: u64) -> Result<Vec<GameEvent>, SessionError> {
        let name = player.name.trim();
        if name.is_empty() {
            debug!("rejected start request with blank player name");
            return Err(SessionError::InvalidStartRequest);
        }
        if let Some(current) = self.session.as_ref().filter(|s| s.is_live()) {
            return Err(SessionError::SessionInProgress {
                state: current.state,
            });
        }

        let player = Player {
            name: name.to_string(),
            ..player
        };
        let session = Session {
            id: SessionId::new(),
            player,
            state: SessionState::Countdown,
            outcome: None,
            started_at: Utc::now(),
            clock: Clock::new(self.config.session_duration_ms()),
            threat: ThreatScheduler::new(self.config.threat_timing(), self.rng.as_mut()),
            progress: ProgressTracker::new(self.config.action_goal_ms()),
            acting: false,
            final_stretch_announced: false,
            completion_ms: None,
        };
        info!(session_id = %session.id, player = %session.player.name, "session created");

        let countdown = self.config.countdown_duration;
        let events = vec![
            GameEvent::SessionCreated {
                session_id: session.id,
                player: session.player.clone(),
                started_at: session.started_at,
            },
            GameEvent::CountdownTick {
                remaining: countdown,
            },
        ];
        self.timers.schedule(
            now_ms.saturating_add(COUNTDOWN_STEP_MS),
            Callback {
                session: session.id,
                action: TimedAction::CountdownTick {
                    remaining: countdown - 1,
                },
            },
        );
        self.session = Some(session);
        Ok(events)
    }

    /// Drop the current session. Outstanding callbacks stay queued and are
    /// discarded when they fire.
    pub fn reset(&mut self) -> Vec<GameEvent> {
        if let Some(old) = self.session.take() {
            info!(
                session_id = %old.id,
                state = ?old.state,
                pending = self.timers.len(),
                "session reset"
            );
        }
        vec![GameEvent::SessionReset]
    }

    pub fn apply(&mut self, intent: ActionIntent, now_ms: u64) -> Vec<GameEvent> {
        match intent {
            ActionIntent::Begin => self.begin_action(now_ms),
            ActionIntent::End => self.end_action(now_ms),
        }
    }

    /// Player starts acting. Starting while stared at is an immediate catch.
    pub fn begin_action(&mut self, now_ms: u64) -> Vec<GameEvent> {
        let mut out = Vec::new();
        let Some(session) = self.playing_session() else {
            debug!("begin action ignored outside play");
            return out;
        };
        if session.acting {
            return out;
        }
        if session.threat.is_staring() {
            end_game(session, Outcome::Caught, now_ms, &mut out);
            return out;
        }
        session.acting = true;
        out.push(GameEvent::ActionChanged { acting: true });
        out
    }

    pub fn end_action(&mut self, _now_ms: u64) -> Vec<GameEvent> {
        let mut out = Vec::new();
        if let Some(session) = self.playing_session() {
            if session.acting {
                session.acting = false;
                out.push(GameEvent::ActionChanged { acting: false });
            }
        }
        out
    }

    /// End the live session with `outcome`. No-op unless playing, so a
    /// second call never overwrites the first outcome.
    pub fn end_game(&mut self, outcome: Outcome, now_ms: u64) -> Vec<GameEvent> {
        let mut out = Vec::new();
        match self.playing_session() {
            Some(session) => end_game(session, outcome, now_ms, &mut out),
            None => debug!(?outcome, "end_game ignored: no session in play"),
        }
        out
    }

    /// Advance to `now_ms`: fire due callbacks, then run one frame.
    ///
    /// A callback due after the clock would have run out is preceded by a
    /// frame at the expiry instant, so the timeout lands first and the late
    /// callback finds the session already ended.
    pub fn tick(&mut self, now_ms: u64) -> Vec<GameEvent> {
        let mut out = Vec::new();
        while let Some((due_ms, callback)) = self.timers.pop_due(now_ms) {
            if let Some(expiry) = self.clock_expiry().filter(|&at| at < due_ms) {
                self.frame(expiry, &mut out);
            }
            self.fire(callback, due_ms, &mut out);
        }
        self.frame(now_ms, &mut out);
        out
    }

    /// Deliver one callback at `at_ms`, for hosts that run their own timer
    /// facility. Stale callbacks are discarded.
    pub fn dispatch(&mut self, callback: Callback, at_ms: u64) -> Vec<GameEvent> {
        let mut out = Vec::new();
        self.fire(callback, at_ms, &mut out);
        out
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn clock_expiry(&self) -> Option<u64> {
        self.session
            .as_ref()
            .filter(|s| s.state == SessionState::Playing)
            .and_then(|s| s.clock.expires_at())
    }

    fn playing_session(&mut self) -> Option<&mut Session> {
        self.session
            .as_mut()
            .filter(|s| s.state == SessionState::Playing)
    }

    fn fire(&mut self, callback: Callback, at_ms: u64, out: &mut Vec<GameEvent>) {
        let Some(session) = self.session.as_mut().filter(|s| s.id == callback.session) else {
            debug!(
                session_id = %callback.session,
                action = ?callback.action,
                "discarding stale callback"
            );
            return;
        };

        match callback.action {
            TimedAction::CountdownTick { remaining } => {
                if session.state != SessionState::Countdown {
                    return;
                }
                if remaining > 0 {
                    out.push(GameEvent::CountdownTick { remaining });
                    self.timers.schedule(
                        at_ms.saturating_add(COUNTDOWN_STEP_MS),
                        Callback {
                            session: session.id,
                            action: TimedAction::CountdownTick {
                                remaining: remaining - 1,
                            },
                        },
                    );
                } else {
                    session.state = SessionState::Playing;
                    session.clock.start(at_ms);
                    info!(session_id = %session.id, "play started");
                    out.push(GameEvent::PlayStarted {
                        duration_ms: session.clock.total_ms(),
                        goal_ms: session.progress.goal_ms(),
                    });
                }
            }
            TimedAction::ResolveThreat => {
                if session.state != SessionState::Playing {
                    return;
                }
                match session.threat.resolve(self.rng.as_mut()) {
                    Some(ThreatEvent::Stare { duration_ms }) => {
                        out.push(GameEvent::StareStarted { duration_ms });
                        self.timers.schedule(
                            at_ms.saturating_add(duration_ms),
                            Callback {
                                session: session.id,
                                action: TimedAction::EndStare,
                            },
                        );
                        if session.acting {
                            end_game(session, Outcome::Caught, at_ms, out);
                        }
                    }
                    Some(ThreatEvent::FakeAlert { duration_ms }) => {
                        out.push(GameEvent::FakeAlertStarted { duration_ms });
                        self.timers.schedule(
                            at_ms.saturating_add(duration_ms),
                            Callback {
                                session: session.id,
                                action: TimedAction::EndFakeAlert,
                            },
                        );
                    }
                    None => {}
                }
            }
            TimedAction::EndStare | TimedAction::EndFakeAlert => {
                if session.state != SessionState::Playing {
                    return;
                }
                match session.threat.clear(self.rng.as_mut()) {
                    Some(ThreatPhase::Staring) => out.push(GameEvent::StareEnded),
                    Some(ThreatPhase::FakeAlert) => out.push(GameEvent::FakeAlertEnded),
                    _ => {}
                }
            }
        }
    }

    fn frame(&mut self, now_ms: u64, out: &mut Vec<GameEvent>) {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.state == SessionState::Playing)
        else {
            return;
        };
        let Some(tick) = session.clock.tick(now_ms) else {
            return;
        };

        out.push(GameEvent::TimeChanged {
            remaining_ms: tick.remaining_ms,
        });
        if !session.final_stretch_announced && tick.remaining_ms <= self.config.final_stretch_ms() {
            session.final_stretch_announced = true;
            out.push(GameEvent::FinalStretch {
                remaining_ms: tick.remaining_ms,
            });
        }

        if let Some(warning) = session.threat.update(session.clock.elapsed_ms()) {
            out.push(GameEvent::Warning {
                event_at_ms: warning.event_at_ms,
            });
            self.timers.schedule(
                now_ms.saturating_add(warning.resolve_in_ms),
                Callback {
                    session: session.id,
                    action: TimedAction::ResolveThreat,
                },
            );
        }

        if session.acting && session.threat.is_staring() {
            end_game(session, Outcome::Caught, now_ms, out);
            return;
        }

        if session.acting && !session.threat.is_staring() && tick.delta_ms > 0 {
            session.progress.accrue(tick.delta_ms);
            out.push(GameEvent::ProgressChanged {
                percent: session.progress.progress_pct(),
            });
        }

        if session.progress.has_reached_goal() {
            end_game(session, Outcome::Win, now_ms, out);
            return;
        }

        if tick.completed {
            end_game(session, Outcome::Timeout, now_ms, out);
        }
    }
}

/// Terminal transition. Idempotent: an ended session is never touched again.
fn end_game(session: &mut Session, outcome: Outcome, at_ms: u64, out: &mut Vec<GameEvent>) {
    if session.state == SessionState::Ended {
        debug!(session_id = %session.id, ?outcome, "session already ended");
        return;
    }
    session.completion_ms = Some(session.clock.elapsed_at(at_ms));
    session.clock.stop();
    session.acting = false;
    session.state = SessionState::Ended;
    session.outcome = Some(outcome);

    let stats = session.stats();
    info!(
        session_id = %session.id,
        %outcome,
        completion_ms = stats.completion_ms,
        action_ms = stats.action_ms,
        "session ended"
    );
    out.push(GameEvent::SessionEnded {
        outcome,
        stats: stats.clone(),
    });
    if outcome == Outcome::Win {
        out.push(GameEvent::LeaderboardRecord {
            entry: LeaderboardEntry {
                name: stats.player.name,
                completion_ms: stats.completion_ms,
                action_ms: stats.action_ms,
                timestamp: Utc::now(),
            },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SequenceRandom;

    const FRAME: u64 = 100;

    fn config() -> GameConfig {
        GameConfig {
            session_duration: 10.0,
            action_goal: 2.0,
            warning_lead_time: 0.2,
            min_threat_interval: 3.0,
            max_threat_interval: 8.0,
            min_stare_duration: 1.0,
            max_stare_duration: 1.0,
            fake_alert_probability: 0.5,
            fake_alert_duration: 1.0,
            countdown_duration: 3,
            final_stretch_duration: 3.0,
        }
    }

    /// Draws: first interval, then (coin, next interval) per event.
    fn controller(draws: &[f64]) -> SessionController {
        SessionController::with_random(config(), Box::new(SequenceRandom::new(draws.to_vec())))
            .unwrap()
    }

    /// Start at t=0 and run the countdown; play begins at t=3000.
    fn playing(controller: &mut SessionController) -> u64 {
        controller.start(Player::new("Ada"), 0).unwrap();
        let events = controller.tick(3_000);
        assert!(events.iter().any(|e| matches!(e, GameEvent::PlayStarted { .. })));
        3_000
    }

    fn run_until(controller: &mut SessionController, from: u64, to: u64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        let mut now = from;
        while now < to {
            now += FRAME;
            events.extend(controller.tick(now));
        }
        events
    }

    #[test]
    fn blank_name_is_rejected_and_state_stays_idle() {
        let mut c = controller(&[0.0]);
        assert_eq!(
            c.start(Player::new("   "), 0),
            Err(SessionError::InvalidStartRequest)
        );
        assert_eq!(c.state(), SessionState::Idle);
        assert!(c.next_timer_due().is_none());
    }

    #[test]
    fn start_while_live_is_rejected() {
        let mut c = controller(&[0.0]);
        c.start(Player::new("Ada"), 0).unwrap();
        let err = c.start(Player::new("Bob"), 10).unwrap_err();
        assert_eq!(
            err,
            SessionError::SessionInProgress {
                state: SessionState::Countdown
            }
        );
        assert_eq!(c.session().unwrap().player().name, "Ada");
    }

    #[test]
    fn countdown_ticks_once_per_second() {
        let mut c = controller(&[0.0]);
        let events = c.start(Player::new(" Ada "), 0).unwrap();
        assert!(matches!(events[1], GameEvent::CountdownTick { remaining: 3 }));
        assert_eq!(c.session().unwrap().player().name, "Ada");

        assert!(c.tick(999).is_empty());
        assert_eq!(c.tick(1_000), vec![GameEvent::CountdownTick { remaining: 2 }]);
        assert_eq!(c.tick(2_000), vec![GameEvent::CountdownTick { remaining: 1 }]);
        let events = c.tick(3_000);
        assert_eq!(
            events[0],
            GameEvent::PlayStarted {
                duration_ms: 10_000,
                goal_ms: 2_000
            }
        );
        assert_eq!(c.state(), SessionState::Playing);
    }

    #[test]
    fn actions_ignored_outside_play() {
        let mut c = controller(&[0.0]);
        assert!(c.begin_action(0).is_empty());
        c.start(Player::new("Ada"), 0).unwrap();
        assert!(c.begin_action(500).is_empty());
        assert!(!c.session().unwrap().is_acting());
    }

    #[test]
    fn repeated_begin_is_deduplicated() {
        let mut c = controller(&[1.0]);
        let now = playing(&mut c);
        assert_eq!(c.begin_action(now).len(), 1);
        assert!(c.begin_action(now).is_empty());
        assert_eq!(c.end_action(now).len(), 1);
        assert!(c.end_action(now).is_empty());
    }

    #[test]
    fn continuous_action_wins() {
        // First event at 8s; goal of 2s comes first.
        let mut c = controller(&[1.0]);
        let now = playing(&mut c);
        c.begin_action(now);
        let events = run_until(&mut c, now, now + 2_500);
        assert_eq!(c.outcome(), Some(Outcome::Win));
        let session = c.session().unwrap();
        assert!(session.progress().accumulated_ms() >= 2_000);
        assert_eq!(session.completion_ms(), Some(2_000));
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::LeaderboardRecord { entry } if entry.name == "Ada")));
    }

    #[test]
    fn idle_player_times_out() {
        let mut c = controller(&[1.0, 0.0, 1.0]);
        let now = playing(&mut c);
        let events = run_until(&mut c, now, now + 11_000);
        assert_eq!(c.outcome(), Some(Outcome::Timeout));
        assert!(events.iter().any(|e| matches!(e, GameEvent::FinalStretch { .. })));
        assert!(!events
            .iter()
            .any(|e| matches!(e, GameEvent::LeaderboardRecord { .. })));
        assert_eq!(c.session().unwrap().stats().completion_secs, 10);
    }

    #[test]
    fn stare_while_acting_is_caught() {
        // interval 0.0 -> 3000ms, coin 0.9 -> stare
        let mut c = controller(&[0.0, 0.9, 0.0]);
        let now = playing(&mut c);
        let events = run_until(&mut c, now, now + 2_800);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Warning { event_at_ms: 3_000 })));
        c.begin_action(now + 2_800);
        let events = run_until(&mut c, now + 2_800, now + 3_100);
        assert!(events.iter().any(|e| matches!(e, GameEvent::StareStarted { .. })));
        assert_eq!(c.outcome(), Some(Outcome::Caught));
        assert_eq!(c.session().unwrap().completion_ms(), Some(3_000));
    }

    #[test]
    fn beginning_during_stare_is_caught() {
        let mut c = controller(&[0.0, 0.9, 0.0]);
        let now = playing(&mut c);
        run_until(&mut c, now, now + 3_100);
        assert!(c.session().unwrap().threat().is_staring());
        assert_eq!(c.state(), SessionState::Playing);

        let events = c.begin_action(now + 3_150);
        assert_eq!(events[0].outcome(), Some(Outcome::Caught));
        assert_eq!(c.outcome(), Some(Outcome::Caught));
    }

    #[test]
    fn fake_alert_is_harmless() {
        let mut c = controller(&[0.0, 0.1, 1.0]);
        let now = playing(&mut c);
        c.begin_action(now);
        let events = run_until(&mut c, now, now + 1_500);
        assert_eq!(c.state(), SessionState::Playing);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::FakeAlertStarted { .. })));

        // Goal is 2s so acting to the alert would win first; stop and resume.
        c.end_action(now + 1_500);
        let events = run_until(&mut c, now + 1_500, now + 4_500);
        assert!(events.iter().any(|e| matches!(e, GameEvent::FakeAlertStarted { .. })));
        assert!(events.iter().any(|e| matches!(e, GameEvent::FakeAlertEnded)));
        assert_eq!(c.state(), SessionState::Playing);
    }

    #[test]
    fn no_accrual_after_end() {
        let mut c = controller(&[1.0]);
        let now = playing(&mut c);
        c.begin_action(now);
        run_until(&mut c, now, now + 2_500);
        let accumulated = c.session().unwrap().progress().accumulated_ms();
        let events = run_until(&mut c, now + 2_500, now + 5_000);
        assert!(events.is_empty());
        assert_eq!(c.session().unwrap().progress().accumulated_ms(), accumulated);
    }

    #[test]
    fn end_game_is_idempotent() {
        let mut c = controller(&[1.0]);
        let now = playing(&mut c);
        let first = c.end_game(Outcome::Caught, now + 100);
        assert_eq!(first.len(), 1);
        assert!(c.end_game(Outcome::Win, now + 200).is_empty());
        assert_eq!(c.outcome(), Some(Outcome::Caught));
    }

    #[test]
    fn stale_callback_is_discarded_after_reset() {
        let mut c = controller(&[0.0, 0.9, 0.0, 0.0, 0.9, 0.0]);
        let now = playing(&mut c);
        run_until(&mut c, now, now + 2_800);
        let old_id = c.session_id().unwrap();
        let stale = c
            .pending_callbacks()
            .into_iter()
            .find(|(_, cb)| cb.action == TimedAction::ResolveThreat)
            .unwrap();
        assert_eq!(stale.1.session, old_id);

        c.reset();
        assert_eq!(c.state(), SessionState::Idle);
        c.start(Player::new("Bob"), now + 2_800).unwrap();
        assert!(c.dispatch(stale.1, stale.0).is_empty());
        assert!(!c.session().unwrap().threat().is_armed());
        assert_eq!(c.state(), SessionState::Countdown);
    }

    #[test]
    fn restart_after_end_replaces_session() {
        let mut c = controller(&[1.0]);
        let now = playing(&mut c);
        c.end_game(Outcome::Timeout, now);
        let old = c.session_id().unwrap();
        c.start(Player::new("Ada"), now + 100).unwrap();
        assert_ne!(c.session_id(), Some(old));
        assert_eq!(c.outcome(), None);
    }
}
