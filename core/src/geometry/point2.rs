//! 2-D Points

use crate::pbrt::{Float, Int};

/// A 2-D point containing numeric values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point2<T> {
    /// X-coordinate.
    pub x: T,

    /// Y-coordinate.
    pub y: T,
}

/// 2-D point containing `Float` values.
pub type Point2f = Point2<Float>;

/// 2-D point containing `Int` values.
pub type Point2i = Point2<Int>;

impl<T> Point2<T> {
    /// Creates a new 2-D point.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl Point2i {
    /// Returns the number of pixels covered by a resolution.
    pub fn area(&self) -> usize {
        (self.x.max(0) as usize) * (self.y.max(0) as usize)
    }
}
