//! Shapes

use crate::geometry::*;
use crate::interaction::*;
use crate::pbrt::*;
use std::sync::Arc;

/// Shape trait provides common behavior for geometric shapes.
pub trait Shape: Send + Sync {
    /// Returns the bounding box of the shape in world space.
    fn world_bound(&self) -> Bounds3f;

    /// Returns the nearest intersection with a ray in (0, ray.t_max).
    ///
    /// * `r` - The ray.
    fn intersect(&self, r: &Ray) -> Option<SurfaceInteraction>;

    /// Returns true if the ray hits the shape in (0, ray.t_max).
    ///
    /// * `r` - The ray.
    fn intersect_p(&self, r: &Ray) -> bool {
        self.intersect(r).is_some()
    }

    /// Returns the surface area of the shape.
    fn area(&self) -> Float;
}

/// Atomic reference counted `Shape`.
pub type ArcShape = Arc<dyn Shape>;
