//! Sphere

use sppm_core::geometry::*;
use sppm_core::interaction::*;
use sppm_core::pbrt::*;
use sppm_core::shape::*;

/// A sphere in world space.
#[derive(Clone, Debug)]
pub struct Sphere {
    /// Centre.
    pub center: Point3f,

    /// Radius.
    pub radius: Float,
}

impl Sphere {
    /// Create a new sphere.
    ///
    /// * `center` - Centre.
    /// * `radius` - Radius.
    pub fn new(center: Point3f, radius: Float) -> Self {
        assert!(radius > 0.0, "sphere radius must be positive");
        Self { center, radius }
    }
}

impl Shape for Sphere {
    fn world_bound(&self) -> Bounds3f {
        let r = Vector3f::new(self.radius, self.radius, self.radius);
        Bounds3f::new(self.center - r, self.center + r)
    }

    fn intersect(&self, r: &Ray) -> Option<SurfaceInteraction> {
        // Solve |o + t d - c|^2 = radius^2 for t.
        let oc = r.o - self.center;
        let a = r.d.length_squared();
        let half_b = oc.dot(&r.d);
        let c = oc.length_squared() - self.radius * self.radius;
        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 || a == 0.0 {
            return None;
        }

        let sqrt_d = discriminant.sqrt();
        let t0 = (-half_b - sqrt_d) / a;
        let t1 = (-half_b + sqrt_d) / a;
        let t = if t0 > 0.0 && t0 < r.t_max {
            t0
        } else if t1 > 0.0 && t1 < r.t_max {
            t1
        } else {
            return None;
        };

        let p = r.at(t);
        let n = (p - self.center) / self.radius;
        Some(SurfaceInteraction::new(p, n, -r.d, t))
    }

    fn area(&self) -> Float {
        FOUR_PI * self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn ray_hits_front_of_sphere() {
        let s = Sphere::new(Point3f::new(0.0, 0.0, 5.0), 1.0);
        let r = Ray::new(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0));
        let isect = s.intersect(&r).expect("hit");
        assert!(approx_eq!(Float, isect.t, 4.0, epsilon = 1e-5));
        assert!(approx_eq!(Float, isect.n.z, -1.0, epsilon = 1e-5));
    }

    #[test]
    fn ray_from_inside_hits_far_side() {
        let s = Sphere::new(Point3f::zero(), 2.0);
        let r = Ray::new(Point3f::zero(), Vector3f::new(1.0, 0.0, 0.0));
        let isect = s.intersect(&r).expect("hit");
        assert!(approx_eq!(Float, isect.t, 2.0, epsilon = 1e-5));
        // Normal faces the ray origin.
        assert!(isect.n.x < 0.0);
    }

    #[test]
    fn t_max_limits_hits() {
        let s = Sphere::new(Point3f::new(0.0, 0.0, 5.0), 1.0);
        let r = Ray::segment(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0), 3.0);
        assert!(s.intersect(&r).is_none());
        assert!(!s.intersect_p(&r));
    }
}
