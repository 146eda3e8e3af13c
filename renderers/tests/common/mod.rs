//! Scenes shared by the integration tests.

#![allow(dead_code)]

use cameras::PerspectiveCamera;
use lights::{PointLight, QuadLight};
use materials::{MatteMaterial, MirrorMaterial};
use shapes::{Quad, Sphere};
use sppm_core::film::*;
use sppm_core::geometry::*;
use sppm_core::light::*;
use sppm_core::paramset::*;
use sppm_core::primitive::*;
use sppm_core::primitives::*;
use sppm_core::scene::*;
use sppm_core::spectrum::*;
use std::sync::Arc;

/// A matte floor with a mirror ball, seen from above.
///
/// * `res`    - Film width and height.
/// * `lights` - Light sources.
pub fn floor_scene(res: i32, lights: Vec<ArcLight>) -> Scene {
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

    let resolution = Point2i::new(res, res);
    let camera = PerspectiveCamera::look_at(
        Point3f::new(0.0, 2.0, 0.0),
        Point3f::zero(),
        Vector3f::new(0.0, 0.0, 1.0),
        60.0,
        resolution,
    )
    .into_arc();

    Scene::new(aggregate, lights, camera, Arc::new(Film::new(resolution, None)))
}

/// The floor scene lit by a point light.
///
/// * `res` - Film width and height.
pub fn lit_scene(res: i32) -> Arc<Scene> {
    let light = PointLight::arc(Point3f::new(0.0, 1.0, 0.0), Spectrum::new(3.0));
    Arc::new(floor_scene(res, vec![light]))
}

/// The floor scene lit by a ceiling panel.
///
/// * `res` - Film width and height.
pub fn area_lit_scene(res: i32) -> Arc<Scene> {
    let panel = Quad::new(
        Point3f::new(-0.25, 1.5, -0.25),
        Vector3f::new(0.5, 0.0, 0.0),
        Vector3f::new(0.0, 0.0, 0.5),
    );
    let light = QuadLight::arc(panel, Spectrum::new(4.0));
    Arc::new(floor_scene(res, vec![light]))
}

/// Renderer parameters for quick test renders.
///
/// * `threads` - Number of worker threads.
/// * `passes`  - Pass limit; 0 for none.
pub fn quick_params(threads: i32, passes: i32) -> ParamSet {
    let mut params = ParamSet::new();
    params
        .add_int("nthreads", threads)
        .add_int("haltpasses", passes)
        .add_int("photonperpass", 1000)
        .add_int("maxphotondepth", 4)
        .add_int("maxeyedepth", 4);
    params
}
