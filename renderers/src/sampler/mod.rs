//! Sampler Renderer
//!
//! Renders the image one pixel sample at a time with a path tracer. Worker
//! threads claim batches of sample positions from a shared counter and send
//! their contributions to the rendering thread, which averages them into
//! the film. Threads can be added and removed while rendering.

mod config;
mod path;
mod renderer;

// Re-export.
pub use config::*;
pub use path::*;
pub use renderer::*;
