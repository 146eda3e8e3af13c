//! Rays

use super::{Point3f, Vector3f};
use crate::pbrt::{Float, INFINITY};

/// A semi-infinite line specified by its origin and direction.
#[derive(Copy, Clone, Debug)]
pub struct Ray {
    /// Origin.
    pub o: Point3f,

    /// Direction.
    pub d: Vector3f,

    /// Restricts the ray to segment [0, t_max].
    pub t_max: Float,
}

impl Ray {
    /// Create a new ray with an unbounded segment.
    ///
    /// * `o` - Origin.
    /// * `d` - Direction.
    pub fn new(o: Point3f, d: Vector3f) -> Self {
        Self { o, d, t_max: INFINITY }
    }

    /// Create a new ray restricted to the segment [0, t_max].
    ///
    /// * `o`     - Origin.
    /// * `d`     - Direction.
    /// * `t_max` - Maximum extent.
    pub fn segment(o: Point3f, d: Vector3f, t_max: Float) -> Self {
        Self { o, d, t_max }
    }

    /// Returns the point at a parametric distance along the ray.
    ///
    /// * `t` - Parametric distance.
    pub fn at(&self, t: Float) -> Point3f {
        self.o + self.d * t
    }
}
