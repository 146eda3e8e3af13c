//! Camera

use crate::geometry::*;
use crate::pbrt::*;
use std::sync::Arc;

/// Holds the sample values needed to generate a camera ray.
#[derive(Copy, Clone, Debug, Default)]
pub struct CameraSample {
    /// Point on the film in raster space.
    pub p_film: Point2f,
}

impl CameraSample {
    /// Create a camera sample at a raster position.
    ///
    /// * `p_film` - Point on the film.
    pub fn new(p_film: Point2f) -> Self {
        Self { p_film }
    }
}

/// Camera trait provides common behavior for cameras.
pub trait Camera: Send + Sync {
    /// Returns a ray for the sample and a weight for how much the radiance
    /// arriving along it contributes to the image.
    ///
    /// * `sample` - The camera sample.
    fn generate_ray(&self, sample: &CameraSample) -> (Ray, Float);
}

/// Atomic reference counted `Camera`.
pub type ArcCamera = Arc<dyn Camera>;
