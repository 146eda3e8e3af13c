//! Scene

use crate::camera::*;
use crate::film::*;
use crate::geometry::*;
use crate::interaction::*;
use crate::light::*;
use crate::primitive::*;
use crate::spectrum::*;
use std::sync::Arc;

/// Default seed base used when a scene does not specify one.
pub const DEFAULT_SEED_BASE: u64 = 1000;

/// Everything a renderer needs: geometry, lights, camera and film.
#[derive(Clone)]
pub struct Scene {
    /// An aggregate of all primitives in the scene.
    pub aggregate: ArcPrimitive,

    /// All light sources in the scene.
    pub lights: Vec<ArcLight>,

    /// The camera.
    pub camera: ArcCamera,

    /// The film receiving the image.
    pub film: Arc<Film>,

    /// The bounding box of the scene geometry.
    pub world_bound: Bounds3f,

    /// Base of the per-thread random seeds.
    pub seed_base: u64,

    /// Set when the scene only carries a previously rendered film and
    /// nothing must be rendered.
    pub film_only: bool,
}

impl Scene {
    /// Creates a new `Scene`.
    ///
    /// * `aggregate` - An aggregate of all primitives in the scene.
    /// * `lights`    - All light sources in the scene.
    /// * `camera`    - The camera.
    /// * `film`      - The film.
    pub fn new(
        aggregate: ArcPrimitive,
        lights: Vec<ArcLight>,
        camera: ArcCamera,
        film: Arc<Film>,
    ) -> Self {
        Self {
            world_bound: aggregate.world_bound(),
            aggregate,
            lights,
            camera,
            film,
            seed_base: DEFAULT_SEED_BASE,
            film_only: false,
        }
    }

    /// Override the seed base.
    ///
    /// * `seed_base` - Base of the per-thread random seeds.
    pub fn with_seed_base(mut self, seed_base: u64) -> Self {
        self.seed_base = seed_base;
        self
    }

    /// Mark the scene as film only.
    pub fn into_film_only(mut self) -> Self {
        self.film_only = true;
        self
    }

    /// Traces the ray into the scene and returns the `SurfaceInteraction` if
    /// an intersection occurred.
    ///
    /// * `ray` - The ray to trace.
    pub fn intersect(&self, ray: &mut Ray) -> Option<SurfaceInteraction> {
        self.aggregate.intersect(ray)
    }

    /// Traces the ray into the scene and returns whether or not an intersection
    /// occurred.
    ///
    /// * `ray` - The ray to trace.
    pub fn intersect_p(&self, ray: &Ray) -> bool {
        self.aggregate.intersect_p(ray)
    }

    /// Returns the radiance of all environment lights along an escaping ray.
    ///
    /// * `ray` - The escaping ray.
    pub fn environment_le(&self, ray: &Ray) -> Spectrum {
        self.lights
            .iter()
            .fold(Spectrum::ZERO, |acc, light| acc + light.le(ray))
    }
}
