//! # Lick It & Run Core Library
//!
//! This library provides the core logic for Lick It & Run, a short reflex
//! game: act (lick the candy) for a cumulative target time before the
//! session clock runs out, and never while the watcher is staring.
//! The CLI is a thin host over the same library.
//!
//! ## Architecture
//!
//! - **Session core**: a wall-clock-driven state machine that requires the
//!   caller to periodically invoke `tick()`; no internal threads
//! - **Threat scheduler**: randomized warn-then-stare/fake-alert cadence with
//!   an injectable random source
//! - **Storage**: TOML configuration and a SQLite leaderboard
//! - **Simulation**: seeded, virtual-time runs with scripted players
//!
//! ## Key Components
//!
//! - [`SessionController`]: owns the session and resolves its outcome
//! - [`ThreatScheduler`]: decides when the watcher turns around
//! - [`Clock`] and [`ProgressTracker`]: time remaining and time acted
//! - [`Config`] and [`Leaderboard`]: persistence at the edges

pub mod error;
pub mod events;
pub mod input;
pub mod random;
pub mod session;
pub mod simulation;
pub mod storage;

pub use error::{ConfigError, CoreError, DatabaseError, SessionError};
pub use events::GameEvent;
pub use input::{ActionInput, ActionIntent};
pub use random::{RandomSource, SeededRandom, SequenceRandom, ThreadRandom};
pub use session::{
    Callback, Clock, GameConfig, GamePreset, LeaderboardEntry, Outcome, Player, ProgressTracker,
    Session, SessionController, SessionId, SessionState, SessionStats, ThreatPhase,
    ThreatScheduler, TimedAction,
};
pub use simulation::{PlayerStrategy, Simulation, SimulationReport, SimulationSeed, TimedEvent};
pub use storage::{Config, Leaderboard};
