//! Statistics

mod registry;

pub use registry::*;
