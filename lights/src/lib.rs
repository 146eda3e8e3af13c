//! Lights

mod point;
mod quad;

// Re-export.
pub use point::*;
pub use quad::*;
