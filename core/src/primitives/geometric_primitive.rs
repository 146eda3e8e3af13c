//! Geometric Primitives

use crate::geometry::*;
use crate::interaction::*;
use crate::material::*;
use crate::primitive::*;
use crate::shape::*;
use std::sync::Arc;

/// GeometricPrimitive represents a single shape in a scene.
#[derive(Clone)]
pub struct GeometricPrimitive {
    /// The shape.
    pub shape: ArcShape,

    /// The material.
    pub material: Option<ArcMaterial>,
}

impl GeometricPrimitive {
    /// Create a new geometric primitive.
    ///
    /// * `shape`    - The shape.
    /// * `material` - The material.
    pub fn new(shape: ArcShape, material: ArcMaterial) -> Self {
        Self {
            shape,
            material: Some(material),
        }
    }

    /// Wrap the primitive for use in an aggregate.
    pub fn into_arc(self) -> ArcPrimitive {
        Arc::new(self)
    }
}

impl Primitive for GeometricPrimitive {
    fn world_bound(&self) -> Bounds3f {
        self.shape.world_bound()
    }

    fn intersect(&self, r: &mut Ray) -> Option<SurfaceInteraction> {
        let mut isect = self.shape.intersect(r)?;
        r.t_max = isect.t;
        isect.material = self.material.clone();
        Some(isect)
    }

    fn intersect_p(&self, r: &Ray) -> bool {
        self.shape.intersect_p(r)
    }
}
