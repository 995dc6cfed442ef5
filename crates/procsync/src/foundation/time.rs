//! Time measurement utilities
//!
//! The rate limiter measures two things: how long each generation request
//! has been outstanding, and how long since the last dispatch. Both are
//! one-shot elapsed measurements, so [`Stopwatch`] has no pause state; it
//! either hasn't started or is running since its last restart.

use std::time::{Duration, Instant};

/// One-shot elapsed-time measurement
#[derive(Debug, Clone, Copy, Default)]
pub struct Stopwatch {
    started: Option<Instant>,
}

impl Stopwatch {
    /// Create a stopwatch that has not started
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stopwatch running from now
    pub fn start_new() -> Self {
        Self {
            started: Some(Instant::now()),
        }
    }

    /// Restart measurement from now
    pub fn restart(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Clear the stopwatch back to the not-started state
    pub fn reset(&mut self) {
        self.started = None;
    }

    /// True once the stopwatch has been started
    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Time since the last restart, or zero if never started
    pub fn elapsed(&self) -> Duration {
        self.started.map_or(Duration::ZERO, |start| start.elapsed())
    }

    /// Elapsed time in seconds as a float
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }
}
