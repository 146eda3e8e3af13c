//! SPPM Statistics

use sppm_core::stats::*;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Minimum time between two drains of the per-thread counters.
const DRAIN_INTERVAL: Duration = Duration::from_millis(500);

/// Counters a worker thread accumulates between drains.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ThreadCounters {
    /// Photon paths traced.
    pub photons: u64,

    /// Eye paths traced.
    pub eye_samples: u64,
}

/// Per-thread statistics. Only the owning thread adds; the renderer drains.
#[derive(Debug, Default)]
pub struct ThreadStats {
    counters: Mutex<ThreadCounters>,
}

impl ThreadStats {
    /// Count traced photon paths.
    ///
    /// * `n` - Number of paths.
    pub fn add_photons(&self, n: u64) {
        self.lock().photons += n;
    }

    /// Count traced eye paths.
    ///
    /// * `n` - Number of paths.
    pub fn add_eye_samples(&self, n: u64) {
        self.lock().eye_samples += n;
    }

    /// Returns the counters and resets them.
    pub fn drain(&self) -> ThreadCounters {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, ThreadCounters> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Collected totals.
#[derive(Debug, Default)]
struct Totals {
    /// Sum of all drained counters.
    counters: ThreadCounters,

    /// Time of the last drain.
    last_drain: Option<Instant>,
}

/// Gathers the per-thread statistics of a render.
#[derive(Debug, Default)]
pub struct StatsCollector {
    /// Statistics of the running threads.
    threads: Mutex<Vec<Arc<ThreadStats>>>,

    /// Totals.
    totals: Mutex<Totals>,
}

impl StatsCollector {
    /// Reset the totals and create statistics for a new set of threads.
    ///
    /// * `n` - Number of threads.
    pub fn reset(&self, n: usize) -> Vec<Arc<ThreadStats>> {
        let stats: Vec<Arc<ThreadStats>> = (0..n).map(|_| Arc::new(ThreadStats::default())).collect();
        *self.lock_threads() = stats.clone();
        *self.lock_totals() = Totals::default();
        stats
    }

    /// Move the per-thread counters into the totals. Unless forced, this
    /// happens at most every `DRAIN_INTERVAL`.
    ///
    /// * `force` - Drain regardless of the interval.
    pub fn drain(&self, force: bool) {
        let mut totals = self.lock_totals();
        let now = Instant::now();
        if !force && totals.last_drain.is_some_and(|t| now.duration_since(t) < DRAIN_INTERVAL) {
            return;
        }
        for stats in self.lock_threads().iter() {
            let c = stats.drain();
            totals.counters.photons += c.photons;
            totals.counters.eye_samples += c.eye_samples;
        }
        totals.last_drain = Some(now);
    }

    /// Returns the drained totals.
    pub fn totals(&self) -> ThreadCounters {
        self.lock_totals().counters
    }

    fn lock_threads(&self) -> MutexGuard<'_, Vec<Arc<ThreadStats>>> {
        self.threads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_totals(&self) -> MutexGuard<'_, Totals> {
        self.totals.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Snapshot the statistics attributes are computed from.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SPPMStats {
    /// Completed passes.
    pub pass_count: u32,

    /// Photon paths traced.
    pub photon_count: u64,

    /// Eye paths traced.
    pub eye_sample_count: u64,

    /// Rendering time in seconds.
    pub elapsed: f64,

    /// Pass limit; 0 if none.
    pub halt_passes: u32,

    /// Time limit in seconds; 0 if none.
    pub halt_time: f64,

    /// Number of worker threads.
    pub thread_count: usize,

    /// Barrier arrivals of the last render.
    pub barrier_arrivals: u64,

    /// Barrier crossings of the last render.
    pub barrier_crossings: u64,
}

/// Returns `a / b`, or 0 when `b` is 0.
fn ratio(a: f64, b: f64) -> f64 {
    if b > 0.0 {
        a / b
    } else {
        0.0
    }
}

/// Returns the SPPM statistics attributes.
pub fn sppm_statistics() -> StatsRegistry<SPPMStats> {
    StatsRegistry::<SPPMStats>::new()
        .add_double_attribute("passCount", "Passes completed", |s| s.pass_count as f64)
        .add_double_attribute("photonCount", "Photon paths traced", |s| s.photon_count as f64)
        .add_double_attribute("eyeSampleCount", "Eye paths traced", |s| {
            s.eye_sample_count as f64
        })
        .add_double_attribute("photonsPerSecond", "Photon paths per second", |s| {
            ratio(s.photon_count as f64, s.elapsed)
        })
        .add_double_attribute("passesPerSecond", "Passes per second", |s| {
            ratio(s.pass_count as f64, s.elapsed)
        })
        .add_double_attribute("secElapsed", "Rendering time (s)", |s| s.elapsed)
        .add_double_attribute("haltPass", "Pass limit", |s| s.halt_passes as f64)
        .add_double_attribute("remainingPasses", "Passes remaining", |s| {
            s.halt_passes.saturating_sub(s.pass_count) as f64
        })
        .add_double_attribute("percentHaltPassesComplete", "Pass limit reached (%)", |s| {
            100.0 * ratio(s.pass_count as f64, s.halt_passes as f64)
        })
        .add_double_attribute("percentHaltTimeComplete", "Time limit reached (%)", |s| {
            100.0 * ratio(s.elapsed, s.halt_time)
        })
        .add_double_attribute("threadCount", "Render threads", |s| s.thread_count as f64)
        .add_double_attribute("barrierArrivals", "Barrier arrivals", |s| {
            s.barrier_arrivals as f64
        })
        .add_double_attribute("barrierCrossings", "Barrier crossings", |s| {
            s.barrier_crossings as f64
        })
}
