use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::clock::Clock;
use super::progress::ProgressTracker;
use super::threat::ThreatScheduler;

/// Opaque per-play-through token. Every delayed callback carries the id of
/// the session that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Countdown,
    Playing,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Caught,
    Timeout,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Win => "win",
            Outcome::Caught => "caught",
            Outcome::Timeout => "timeout",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        let email = email.into();
        let trimmed = email.trim();
        self.email = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }
}

/// Summary handed to observers when a session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub player: Player,
    pub action_ms: u64,
    pub progress_pct: f64,
    /// Elapsed playing time when the session ended.
    pub completion_ms: u64,
    /// `completion_ms` floored to whole seconds.
    pub completion_secs: u64,
}

/// Record emitted for the leaderboard on a win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub completion_ms: u64,
    pub action_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl LeaderboardEntry {
    pub fn completion_secs(&self) -> u64 {
        self.completion_ms / 1000
    }
}

/// One play-through. Owned exclusively by the controller; a reset discards
/// it together with its clock, scheduler and tracker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub(crate) id: SessionId,
    pub(crate) player: Player,
    pub(crate) state: SessionState,
    pub(crate) outcome: Option<Outcome>,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) clock: Clock,
    pub(crate) threat: ThreatScheduler,
    pub(crate) progress: ProgressTracker,
    /// Player's current intent, toggled by begin/end action.
    pub(crate) acting: bool,
    pub(crate) final_stretch_announced: bool,
    pub(crate) completion_ms: Option<u64>,
}

impl Session {
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn threat(&self) -> &ThreatScheduler {
        &self.threat
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn is_acting(&self) -> bool {
        self.acting
    }

    pub fn completion_ms(&self) -> Option<u64> {
        self.completion_ms
    }

    pub fn is_live(&self) -> bool {
        matches!(self.state, SessionState::Countdown | SessionState::Playing)
    }

    pub fn stats(&self) -> SessionStats {
        let completion_ms = self.completion_ms.unwrap_or_else(|| self.clock.elapsed_ms());
        SessionStats {
            player: self.player.clone(),
            action_ms: self.progress.accumulated_ms(),
            progress_pct: self.progress.progress_pct(),
            completion_ms,
            completion_secs: completion_ms / 1000,
        }
    }
}
