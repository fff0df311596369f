mod clock;
mod config;
mod controller;
mod model;
mod progress;
mod threat;
mod timers;

pub use clock::{Clock, ClockTick};
pub use config::{secs_to_ms, GameConfig, GamePreset, ThreatTiming};
pub use controller::{Callback, SessionController, TimedAction};
pub use model::{
    LeaderboardEntry, Outcome, Player, Session, SessionId, SessionState, SessionStats,
};
pub use progress::ProgressTracker;
pub use threat::{ThreatEvent, ThreatPhase, ThreatScheduler, ThreatWarning};
pub use timers::TimerQueue;
