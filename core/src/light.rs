//! Light

use crate::geometry::*;
use crate::pbrt::*;
use crate::sampling::*;
use crate::spectrum::*;
use std::sync::Arc;

/// Result of sampling an emitted photon.
#[derive(Copy, Clone, Debug)]
pub struct Le {
    /// The ray leaving the light.
    pub ray: Ray,

    /// Surface normal at the point of emission.
    pub n_light: Normal3f,

    /// PDF with respect to area for the ray origin.
    pub pdf_pos: Float,

    /// PDF with respect to solid angle for the ray direction.
    pub pdf_dir: Float,

    /// Emitted radiance.
    pub value: Spectrum,
}

/// Result of sampling incident illumination at a point.
#[derive(Copy, Clone, Debug)]
pub struct Li {
    /// Direction from the point towards the light.
    pub wi: Vector3f,

    /// PDF of the sampled direction.
    pub pdf: Float,

    /// Point on the light, used for the visibility test.
    pub p_light: Point3f,

    /// Incident radiance.
    pub value: Spectrum,
}

/// Light trait provides common behavior for lights.
pub trait Light: Send + Sync {
    /// Returns the total emitted power.
    fn power(&self) -> Spectrum;

    /// Sample a photon leaving the light.
    ///
    /// * `u1` - Sample for the ray origin.
    /// * `u2` - Sample for the ray direction.
    fn sample_le(&self, u1: &Point2f, u2: &Point2f) -> Le;

    /// Sample the direction of incident light at a point.
    ///
    /// * `p` - The reference point.
    /// * `u` - The 2D sample.
    fn sample_li(&self, p: &Point3f, u: &Point2f) -> Li;

    /// Returns radiance carried along a ray that escapes the scene. Only
    /// environment lights return a non-black value.
    ///
    /// * `_ray` - The escaping ray.
    fn le(&self, _ray: &Ray) -> Spectrum {
        Spectrum::ZERO
    }
}

/// Atomic reference counted `Light`.
pub type ArcLight = Arc<dyn Light>;

/// Returns a distribution for choosing lights in proportion to their power.
/// Returns `None` when there are no lights.
///
/// * `lights` - The scene lights.
pub fn compute_light_power_distribution(lights: &[ArcLight]) -> Option<Distribution1D> {
    if lights.is_empty() {
        return None;
    }
    let light_power: Vec<Float> = lights.iter().map(|light| light.power().y()).collect();
    Some(Distribution1D::new(light_power))
}
