//! Session countdown clock.
//!
//! The clock owns no thread. The host samples it by calling [`Clock::tick`]
//! from its frame loop, passing a monotonic millisecond timestamp. Each
//! sample folds the elapsed delta into `remaining_ms`; the sample that
//! reaches zero stops the clock and reports completion. Completion is
//! reported exactly once per clock.

use serde::{Deserialize, Serialize};

/// Result of one clock sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockTick {
    pub remaining_ms: u64,
    /// Time credited by this sample. Never negative and never more than
    /// what was left on the clock.
    pub delta_ms: u64,
    /// True only on the sample that drove `remaining_ms` to zero.
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clock {
    total_ms: u64,
    remaining_ms: u64,
    running: bool,
    /// Host timestamp of the previous sample while running.
    #[serde(default)]
    last_sample_ms: Option<u64>,
    #[serde(default)]
    completed: bool,
}

impl Clock {
    pub fn new(total_ms: u64) -> Self {
        Self {
            total_ms,
            remaining_ms: total_ms,
            running: false,
            last_sample_ms: None,
            completed: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn total_ms(&self) -> u64 {
        self.total_ms
    }

    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.total_ms - self.remaining_ms
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    /// Elapsed time as it would read if the clock were sampled at `now_ms`,
    /// without actually sampling it.
    pub fn elapsed_at(&self, now_ms: u64) -> u64 {
        match (self.running, self.last_sample_ms) {
            (true, Some(last)) => {
                let pending = now_ms.saturating_sub(last).min(self.remaining_ms);
                self.elapsed_ms() + pending
            }
            _ => self.elapsed_ms(),
        }
    }

    /// Host instant at which the clock will run out if nothing stops it.
    /// `None` while stopped.
    pub fn expires_at(&self) -> Option<u64> {
        match (self.running, self.last_sample_ms) {
            (true, Some(last)) => Some(last.saturating_add(self.remaining_ms)),
            _ => None,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin sampling from `now_ms`. No-op if already running or completed.
    pub fn start(&mut self, now_ms: u64) {
        if self.running || self.completed {
            return;
        }
        self.running = true;
        self.last_sample_ms = Some(now_ms);
    }

    /// Halt sampling. `remaining_ms` is kept.
    pub fn stop(&mut self) {
        self.running = false;
        self.last_sample_ms = None;
    }

    /// Sample the clock. Returns `None` when the clock is not running.
    pub fn tick(&mut self, now_ms: u64) -> Option<ClockTick> {
        if !self.running {
            return None;
        }
        let last = self.last_sample_ms?;
        let delta_ms = now_ms.saturating_sub(last).min(self.remaining_ms);
        // A sample from the past must not rewind the sampling point, or the
        // same interval would be counted twice.
        self.last_sample_ms = Some(last.max(now_ms));
        self.remaining_ms = self.remaining_ms.saturating_sub(delta_ms);

        let completed = self.remaining_ms == 0;
        if completed {
            self.stop();
            self.completed = true;
        }
        Some(ClockTick {
            remaining_ms: self.remaining_ms,
            delta_ms,
            completed,
        })
    }
}
