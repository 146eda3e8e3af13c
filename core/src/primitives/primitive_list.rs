//! Primitive List

use crate::geometry::*;
use crate::interaction::*;
use crate::primitive::*;

/// A linear aggregate. Every query visits every primitive, which is fine for
/// the handful of primitives in test and demo scenes.
pub struct PrimitiveList {
    /// The primitives.
    primitives: Vec<ArcPrimitive>,

    /// Union of the primitive bounds.
    bounds: Bounds3f,
}

impl PrimitiveList {
    /// Create a new aggregate.
    ///
    /// * `primitives` - The primitives.
    pub fn new(primitives: Vec<ArcPrimitive>) -> Self {
        let bounds = primitives
            .iter()
            .fold(Bounds3f::empty(), |b, p| b.union(&p.world_bound()));
        Self { primitives, bounds }
    }

    /// Returns the number of primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// Returns true if the aggregate has no primitives.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

impl Primitive for PrimitiveList {
    fn world_bound(&self) -> Bounds3f {
        self.bounds
    }

    fn intersect(&self, r: &mut Ray) -> Option<SurfaceInteraction> {
        // Each hit shortens `r.t_max`, so the last hit is the nearest.
        let mut nearest = None;
        for primitive in self.primitives.iter() {
            if let Some(isect) = primitive.intersect(r) {
                nearest = Some(isect);
            }
        }
        nearest
    }

    fn intersect_p(&self, r: &Ray) -> bool {
        self.primitives.iter().any(|p| p.intersect_p(r))
    }
}
