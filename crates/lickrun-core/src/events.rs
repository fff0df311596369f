use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::{LeaderboardEntry, Outcome, Player, SessionId, SessionStats};

/// Every observable change in a session produces an Event.
/// Rendering, audio and leaderboard adapters consume them; nothing the core
/// does depends on how they are handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    SessionCreated {
        session_id: SessionId,
        player: Player,
        started_at: DateTime<Utc>,
    },
    CountdownTick {
        remaining: u32,
    },
    PlayStarted {
        duration_ms: u64,
        goal_ms: u64,
    },
    TimeChanged {
        remaining_ms: u64,
    },
    /// Remaining time dropped into the final stretch. Fires once.
    FinalStretch {
        remaining_ms: u64,
    },
    /// The watcher is about to turn; `event_at_ms` is in elapsed play time.
    Warning {
        event_at_ms: u64,
    },
    StareStarted {
        duration_ms: u64,
    },
    StareEnded,
    FakeAlertStarted {
        duration_ms: u64,
    },
    FakeAlertEnded,
    ActionChanged {
        acting: bool,
    },
    ProgressChanged {
        percent: f64,
    },
    SessionEnded {
        outcome: Outcome,
        stats: SessionStats,
    },
    /// Emitted right after `SessionEnded` for winning sessions only.
    LeaderboardRecord {
        entry: LeaderboardEntry,
    },
    SessionReset,
}

impl GameEvent {
    /// Variant name, matching the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            GameEvent::SessionCreated { .. } => "SessionCreated",
            GameEvent::CountdownTick { .. } => "CountdownTick",
            GameEvent::PlayStarted { .. } => "PlayStarted",
            GameEvent::TimeChanged { .. } => "TimeChanged",
            GameEvent::FinalStretch { .. } => "FinalStretch",
            GameEvent::Warning { .. } => "Warning",
            GameEvent::StareStarted { .. } => "StareStarted",
            GameEvent::StareEnded => "StareEnded",
            GameEvent::FakeAlertStarted { .. } => "FakeAlertStarted",
            GameEvent::FakeAlertEnded => "FakeAlertEnded",
            GameEvent::ActionChanged { .. } => "ActionChanged",
            GameEvent::ProgressChanged { .. } => "ProgressChanged",
            GameEvent::SessionEnded { .. } => "SessionEnded",
            GameEvent::LeaderboardRecord { .. } => "LeaderboardRecord",
            GameEvent::SessionReset => "SessionReset",
        }
    }

    /// The terminal outcome carried by this event, if any.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            GameEvent::SessionEnded { outcome, .. } => Some(*outcome),
            _ => None,
        }
    }
}
