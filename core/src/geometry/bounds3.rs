//! 3-D Axis Aligned Bounding Boxes

use super::{Point3f, Vector3f};
use crate::pbrt::{Float, INFINITY};

/// 3-D axis aligned bounding box of `Float` values.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds3f {
    /// Minimum bounds.
    pub p_min: Point3f,

    /// Maximum bounds.
    pub p_max: Point3f,
}

impl Default for Bounds3f {
    /// Returns an empty bounding box.
    fn default() -> Self {
        Self::empty()
    }
}

impl Bounds3f {
    /// Creates a new bounding box from two corner points.
    ///
    /// * `p1` - First corner.
    /// * `p2` - Second corner.
    pub fn new(p1: Point3f, p2: Point3f) -> Self {
        Self {
            p_min: p1.min(&p2),
            p_max: p1.max(&p2),
        }
    }

    /// Returns an empty bounding box that any union will replace.
    pub fn empty() -> Self {
        Self {
            p_min: Point3f::new(INFINITY, INFINITY, INFINITY),
            p_max: Point3f::new(-INFINITY, -INFINITY, -INFINITY),
        }
    }

    /// Returns true if the box contains no points.
    pub fn is_empty(&self) -> bool {
        self.p_min.x > self.p_max.x || self.p_min.y > self.p_max.y || self.p_min.z > self.p_max.z
    }

    /// Returns the union with a point.
    ///
    /// * `p` - The point.
    pub fn union_point(&self, p: &Point3f) -> Self {
        Self {
            p_min: self.p_min.min(p),
            p_max: self.p_max.max(p),
        }
    }

    /// Returns the union with another bounding box.
    ///
    /// * `other` - The other bounding box.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            p_min: self.p_min.min(&other.p_min),
            p_max: self.p_max.max(&other.p_max),
        }
    }

    /// Returns the box padded by `delta` on all sides.
    ///
    /// * `delta` - Padding amount.
    pub fn expand(&self, delta: Float) -> Self {
        let d = Vector3f::new(delta, delta, delta);
        Self {
            p_min: self.p_min - d,
            p_max: self.p_max + d,
        }
    }

    /// Returns the vector from the minimum to the maximum corner.
    pub fn diagonal(&self) -> Vector3f {
        self.p_max - self.p_min
    }

    /// Returns the index of the longest axis.
    pub fn maximum_extent(&self) -> usize {
        let d = self.diagonal();
        if d.x > d.y && d.x > d.z {
            0
        } else if d.y > d.z {
            1
        } else {
            2
        }
    }

    /// Returns true if a point lies inside the box (inclusive).
    ///
    /// * `p` - The point.
    pub fn inside(&self, p: &Point3f) -> bool {
        p.x >= self.p_min.x
            && p.x <= self.p_max.x
            && p.y >= self.p_min.y
            && p.y <= self.p_max.y
            && p.z >= self.p_min.z
            && p.z <= self.p_max.z
    }

    /// Returns the bounding sphere as a centre and radius.
    pub fn bounding_sphere(&self) -> (Point3f, Float) {
        let center = self.p_min + self.diagonal() * 0.5;
        let radius = if self.inside(&center) {
            center.distance(&self.p_max)
        } else {
            0.0
        };
        (center, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_grows_with_points() {
        let b = Bounds3f::empty();
        assert!(b.is_empty());

        let b = b
            .union_point(&Point3f::new(1.0, -2.0, 0.5))
            .union_point(&Point3f::new(-1.0, 3.0, 0.0));
        assert!(!b.is_empty());
        assert_eq!(b.p_min, Point3f::new(-1.0, -2.0, 0.0));
        assert_eq!(b.p_max, Point3f::new(1.0, 3.0, 0.5));
        assert_eq!(b.maximum_extent(), 1);
        assert!(b.inside(&Point3f::new(0.0, 0.0, 0.25)));
    }

    #[test]
    fn bounding_sphere_of_empty_box_is_degenerate() {
        let (_, radius) = Bounds3f::empty().bounding_sphere();
        assert_eq!(radius, 0.0);
    }
}
