//! Timer

use std::time::{Duration, Instant};

/// Measures elapsed time excluding the periods it was stopped.
#[derive(Clone, Debug, Default)]
pub struct Timer {
    /// Start of the current running period.
    started: Option<Instant>,

    /// Time accumulated by previous running periods.
    accumulated: Duration,
}

impl Timer {
    /// Start (or continue) measuring. No-op when already running.
    pub fn start(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    /// Stop measuring. No-op when already stopped.
    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.accumulated += started.elapsed();
        }
    }

    /// Reset to zero and stop.
    pub fn reset(&mut self) {
        self.started = None;
        self.accumulated = Duration::ZERO;
    }

    /// Returns true while measuring.
    pub fn is_running(&self) -> bool {
        self.started.is_some()
    }

    /// Returns the elapsed running time.
    pub fn time(&self) -> Duration {
        self.accumulated + self.started.map_or(Duration::ZERO, |s| s.elapsed())
    }
}
