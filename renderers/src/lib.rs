//! Renderers

#[macro_use]
extern crate log;

pub mod sampler;
pub mod sppm;

#[cfg(test)]
mod test_scene;
