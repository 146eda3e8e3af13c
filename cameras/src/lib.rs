//! Camera

mod perspective_camera;

// Re-export
pub use perspective_camera::*;
