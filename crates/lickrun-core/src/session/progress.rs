use serde::{Deserialize, Serialize};

/// Gated accumulator of acting time.
///
/// The tracker has no opinion on when accrual is allowed; the controller
/// decides that and only calls [`ProgressTracker::accrue`] when it is safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressTracker {
    accumulated_ms: u64,
    goal_ms: u64,
}

impl ProgressTracker {
    pub fn new(goal_ms: u64) -> Self {
        Self {
            accumulated_ms: 0,
            goal_ms,
        }
    }

    pub fn accrue(&mut self, delta_ms: u64) {
        self.accumulated_ms = self.accumulated_ms.saturating_add(delta_ms);
    }

    pub fn accumulated_ms(&self) -> u64 {
        self.accumulated_ms
    }

    pub fn goal_ms(&self) -> u64 {
        self.goal_ms
    }

    /// 0.0 .. 100.0
    pub fn progress_pct(&self) -> f64 {
        if self.goal_ms == 0 {
            return 100.0;
        }
        (self.accumulated_ms as f64 / self.goal_ms as f64 * 100.0).min(100.0)
    }

    pub fn has_reached_goal(&self) -> bool {
        self.accumulated_ms >= self.goal_ms
    }
}
