//! Core

extern crate bitflags;
#[macro_use]
extern crate hexf;
#[macro_use]
extern crate log;

// Re-export.
pub mod app;
pub mod camera;
pub mod error;
pub mod film;
pub mod geometry;
pub mod interaction;
pub mod light;
pub mod low_discrepancy;
pub mod material;
pub mod parallel;
pub mod paramset;
pub mod pbrt;
pub mod primitive;
pub mod primitives;
pub mod renderer;
pub mod rng;
pub mod sampling;
pub mod scene;
pub mod shape;
pub mod spectrum;
pub mod stats;
