//! Small scenes for unit tests.

use cameras::PerspectiveCamera;
use lights::PointLight;
use materials::{MatteMaterial, MirrorMaterial};
use shapes::{Quad, Sphere};
use sppm_core::film::*;
use sppm_core::geometry::*;
use sppm_core::primitive::*;
use sppm_core::primitives::*;
use sppm_core::scene::*;
use sppm_core::spectrum::*;
use std::sync::Arc;

/// A matte floor seen from above, lit by a point light, with a small mirror
/// ball. Some camera rays miss the floor.
///
/// * `width`  - Film width.
/// * `height` - Film height.
pub fn floor_scene(width: i32, height: i32) -> Scene {
    let floor = Quad::new(
        Point3f::new(-1.0, 0.0, -1.0),
        Vector3f::new(0.0, 0.0, 2.0),
        Vector3f::new(2.0, 0.0, 0.0),
    );
    let ball = Sphere::new(Point3f::new(0.3, 0.2, 0.3), 0.2);
    let primitives: Vec<ArcPrimitive> = vec![
        GeometricPrimitive::new(Arc::new(floor), MatteMaterial::arc(Spectrum::new(0.7))).into_arc(),
        GeometricPrimitive::new(Arc::new(ball), MirrorMaterial::arc(Spectrum::new(0.9))).into_arc(),
    ];
    let aggregate: ArcPrimitive = Arc::new(PrimitiveList::new(primitives));

    let resolution = Point2i::new(width, height);
    let camera = PerspectiveCamera::look_at(
        Point3f::new(0.0, 2.0, 0.0),
        Point3f::zero(),
        Vector3f::new(0.0, 0.0, 1.0),
        60.0,
        resolution,
    )
    .into_arc();
    let light = PointLight::arc(Point3f::new(0.0, 1.0, 0.0), Spectrum::new(3.0));

    Scene::new(aggregate, vec![light], camera, Arc::new(Film::new(resolution, None)))
}
