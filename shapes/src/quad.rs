//! Quad

use sppm_core::geometry::*;
use sppm_core::interaction::*;
use sppm_core::pbrt::*;
use sppm_core::shape::*;

/// A parallelogram spanned by two edges from a corner.
#[derive(Clone, Debug)]
pub struct Quad {
    /// Corner.
    pub p0: Point3f,

    /// First edge.
    pub u: Vector3f,

    /// Second edge.
    pub v: Vector3f,

    /// Unit normal `u x v`.
    pub n: Normal3f,
}

impl Quad {
    /// Create a new quad.
    ///
    /// * `p0` - Corner.
    /// * `u`  - First edge.
    /// * `v`  - Second edge.
    pub fn new(p0: Point3f, u: Vector3f, v: Vector3f) -> Self {
        let c = u.cross(&v);
        assert!(c.length_squared() > 0.0, "quad edges must not be parallel");
        Self {
            p0,
            u,
            v,
            n: c.normalize(),
        }
    }

    /// Returns the point at parametric coordinates (s, t) in [0, 1]^2.
    ///
    /// * `s` - Coordinate along `u`.
    /// * `t` - Coordinate along `v`.
    pub fn point_at(&self, s: Float, t: Float) -> Point3f {
        self.p0 + self.u * s + self.v * t
    }
}

impl Shape for Quad {
    fn world_bound(&self) -> Bounds3f {
        Bounds3f::new(self.p0, self.point_at(1.0, 1.0))
            .union_point(&self.point_at(1.0, 0.0))
            .union_point(&self.point_at(0.0, 1.0))
    }

    fn intersect(&self, r: &Ray) -> Option<SurfaceInteraction> {
        let denom = self.n.dot(&r.d);
        if denom.abs() < 1e-8 {
            return None;
        }

        let t = self.n.dot(&(self.p0 - r.o)) / denom;
        if t <= 0.0 || t >= r.t_max {
            return None;
        }

        // Express the hit point in the (u, v) basis.
        let p = r.at(t);
        let w = self.u.cross(&self.v);
        let inv = 1.0 / w.length_squared();
        let d = p - self.p0;
        let s = d.cross(&self.v).dot(&w) * inv;
        let q = self.u.cross(&d).dot(&w) * inv;
        if !(0.0..=1.0).contains(&s) || !(0.0..=1.0).contains(&q) {
            return None;
        }

        Some(SurfaceInteraction::new(p, self.n, -r.d, t))
    }

    fn area(&self) -> Float {
        self.u.cross(&self.v).length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    fn floor() -> Quad {
        Quad::new(
            Point3f::new(-1.0, 0.0, -1.0),
            Vector3f::new(0.0, 0.0, 2.0),
            Vector3f::new(2.0, 0.0, 0.0),
        )
    }

    #[test]
    fn normal_follows_edge_order() {
        assert!(approx_eq!(Float, floor().n.y, 1.0, epsilon = 1e-6));
        assert!(approx_eq!(Float, floor().area(), 4.0, epsilon = 1e-6));
    }

    #[test]
    fn misses_outside_edges() {
        let r = Ray::new(Point3f::new(1.5, 1.0, 0.0), Vector3f::new(0.0, -1.0, 0.0));
        assert!(floor().intersect(&r).is_none());
    }

    #[test]
    fn hit_from_below_flips_normal() {
        let r = Ray::new(Point3f::new(0.0, -1.0, 0.0), Vector3f::new(0.0, 1.0, 0.0));
        let isect = floor().intersect(&r).expect("hit");
        assert!(isect.n.y < 0.0);
    }

    proptest! {
        #[test]
        fn vertical_rays_inside_hit(x in -0.99f32..0.99, z in -0.99f32..0.99) {
            let r = Ray::new(Point3f::new(x, 2.0, z), Vector3f::new(0.0, -1.0, 0.0));
            let isect = floor().intersect(&r);
            prop_assert!(isect.is_some());
            let isect = isect.unwrap();
            prop_assert!((isect.t - 2.0).abs() < 1e-4);
            prop_assert!((isect.p.x - x).abs() < 1e-4);
        }
    }
}
