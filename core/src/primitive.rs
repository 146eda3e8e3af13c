//! Primitive

use crate::geometry::*;
use crate::interaction::*;
use std::sync::Arc;

/// Primitive is the bridge between the geometry processing and shading
/// subsystems. Aggregates implement it too.
pub trait Primitive: Send + Sync {
    /// Returns a bounding box in the world space.
    fn world_bound(&self) -> Bounds3f;

    /// Returns the nearest intersection and shortens `r.t_max` to it.
    ///
    /// * `r` - The ray.
    fn intersect(&self, r: &mut Ray) -> Option<SurfaceInteraction>;

    /// Returns true if anything is hit along the ray segment.
    ///
    /// * `r` - The ray.
    fn intersect_p(&self, r: &Ray) -> bool;
}

/// Atomic reference counted `Primitive`.
pub type ArcPrimitive = Arc<dyn Primitive>;
