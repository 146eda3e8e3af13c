//! Stochastic Progressive Photon Mapping
//!
//! A fixed pool of worker threads repeatedly runs the same pass pipeline:
//! eye pass, index rebuild, photon pass, flux accumulation and halt check,
//! each phase separated by a barrier crossed by every worker.

mod barrier;
mod config;
mod coordinator;
mod hitpoints;
mod lookup_accel;
mod photon_sampler;
mod renderer;
mod statistics;

// Re-export.
pub use barrier::*;
pub use config::*;
pub use coordinator::{Phase, PassObserver};
pub use hitpoints::*;
pub use lookup_accel::*;
pub use photon_sampler::*;
pub use renderer::*;
pub use statistics::*;
