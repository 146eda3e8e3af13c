//! Pass Barrier

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Barrier;

/// A reusable barrier shared by every worker of a render. Arrivals and
/// crossings are counted so a finished render can be checked for workers
/// that skipped a phase.
#[derive(Debug)]
pub struct PassBarrier {
    /// Underlying barrier.
    barrier: Barrier,

    /// Number of participating threads.
    parties: NonZeroUsize,

    /// Total number of `wait()` calls.
    arrivals: AtomicU64,

    /// Number of times the barrier released all parties.
    crossings: AtomicU64,
}

impl PassBarrier {
    /// Create a new barrier for a fixed set of threads.
    ///
    /// * `parties` - Number of threads that must arrive before any leaves.
    pub fn new(parties: NonZeroUsize) -> Self {
        Self {
            barrier: Barrier::new(parties.get()),
            parties,
            arrivals: AtomicU64::new(0),
            crossings: AtomicU64::new(0),
        }
    }

    /// Returns the number of participating threads.
    pub fn parties(&self) -> usize {
        self.parties.get()
    }

    /// Block until every party has arrived. Exactly one caller per crossing
    /// gets `true`.
    pub fn wait(&self) -> bool {
        self.arrivals.fetch_add(1, Ordering::AcqRel);
        let leader = self.barrier.wait().is_leader();
        if leader {
            self.crossings.fetch_add(1, Ordering::AcqRel);
        }
        leader
    }

    /// Returns the total number of arrivals so far.
    pub fn arrivals(&self) -> u64 {
        self.arrivals.load(Ordering::Acquire)
    }

    /// Returns the number of completed crossings.
    pub fn crossings(&self) -> u64 {
        self.crossings.load(Ordering::Acquire)
    }
}
