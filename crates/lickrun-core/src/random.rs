//! Random draw capability for the threat scheduler.
//!
//! The scheduler never touches a global RNG. It asks a [`RandomSource`] for
//! unit-interval samples, so tests can script exact draws and simulations
//! can replay a seed.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

pub trait RandomSource {
    /// Next sample in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Uniform draw in `[min_ms, max_ms]`, rounded to whole milliseconds.
    fn uniform_ms(&mut self, min_ms: u64, max_ms: u64) -> u64 {
        if max_ms <= min_ms {
            return min_ms;
        }
        let span = (max_ms - min_ms) as f64;
        min_ms + (self.next_unit() * span).round() as u64
    }

    /// Bernoulli trial: `true` with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_unit() < p
    }
}

/// Non-reproducible source backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Reproducible source for simulations.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: Pcg64,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of samples, cycling when exhausted.
#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceRandom {
    /// Values are clamped into `[0, 1)`. An empty list always yields 0.
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let values = values
            .into()
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self { values, cursor: 0 }
    }

    /// Number of samples handed out so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for SequenceRandom {
    fn next_unit(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}
