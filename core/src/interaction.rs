//! Surface Interactions

use crate::geometry::*;
use crate::material::*;
use crate::pbrt::*;

/// Geometry of a ray-surface intersection together with the material
/// bound to the surface.
#[derive(Clone)]
pub struct SurfaceInteraction {
    /// Point of interaction.
    pub p: Point3f,

    /// Geometric surface normal, flipped to face the incoming ray.
    pub n: Normal3f,

    /// The negative ray direction.
    pub wo: Vector3f,

    /// Parametric distance along the ray.
    pub t: Float,

    /// Material at the surface. `None` marks an interface that only
    /// bounds a region and does not scatter light.
    pub material: Option<ArcMaterial>,
}

impl SurfaceInteraction {
    /// Create a new surface interaction. The normal is flipped to the side
    /// of the incoming ray.
    ///
    /// * `p`  - Point of interaction.
    /// * `n`  - Unit surface normal.
    /// * `wo` - Negative ray direction.
    /// * `t`  - Parametric distance along the ray.
    pub fn new(p: Point3f, n: Normal3f, wo: Vector3f, t: Float) -> Self {
        Self {
            p,
            n: n.face_forward(&wo),
            wo,
            t,
            material: None,
        }
    }

    /// Spawn a ray leaving the surface in direction `d`. The origin is
    /// offset along the normal to avoid self-intersection.
    ///
    /// * `d` - Direction.
    pub fn spawn_ray(&self, d: &Vector3f) -> Ray {
        let offset = if d.dot(&self.n) >= 0.0 {
            self.n * RAY_EPSILON
        } else {
            -(self.n * RAY_EPSILON)
        };
        Ray::new(self.p + offset, *d)
    }

    /// Spawn a segment from this surface to a point. The segment stops just
    /// short of the target.
    ///
    /// * `p` - Target point.
    pub fn spawn_ray_to(&self, p: &Point3f) -> Ray {
        let d = *p - self.p;
        let ray = self.spawn_ray(&d);
        Ray::segment(ray.o, d, 1.0 - SHADOW_EPSILON)
    }
}
