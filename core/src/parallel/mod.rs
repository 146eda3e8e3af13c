//! Parallel

mod atomic_float;
mod atomic_spectrum;

// Re-export
pub use atomic_float::*;
pub use atomic_spectrum::*;
