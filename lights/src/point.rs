//! Point Light Source

use sppm_core::geometry::*;
use sppm_core::light::*;
use sppm_core::pbrt::*;
use sppm_core::sampling::*;
use sppm_core::spectrum::*;
use std::sync::Arc;

/// Implements an isotropic point light source that emits the same amount of
/// light in all directions.
#[derive(Clone, Debug)]
pub struct PointLight {
    /// Position.
    pub p_light: Point3f,

    /// Intensity.
    pub intensity: Spectrum,
}

impl PointLight {
    /// Returns a new `PointLight`.
    ///
    /// * `p_light`   - Position.
    /// * `intensity` - Intensity.
    pub fn new(p_light: Point3f, intensity: Spectrum) -> Self {
        Self { p_light, intensity }
    }

    /// Returns a new shared `PointLight`.
    ///
    /// * `p_light`   - Position.
    /// * `intensity` - Intensity.
    pub fn arc(p_light: Point3f, intensity: Spectrum) -> ArcLight {
        Arc::new(Self::new(p_light, intensity))
    }
}

impl Light for PointLight {
    fn power(&self) -> Spectrum {
        FOUR_PI * self.intensity
    }

    fn sample_le(&self, u1: &Point2f, _u2: &Point2f) -> Le {
        let dir = uniform_sample_sphere(u1);
        Le {
            ray: Ray::new(self.p_light, dir),
            n_light: dir,
            pdf_pos: 1.0,
            pdf_dir: uniform_sphere_pdf(),
            value: self.intensity,
        }
    }

    fn sample_li(&self, p: &Point3f, _u: &Point2f) -> Li {
        let wi = (self.p_light - *p).normalize();
        Li {
            wi,
            pdf: 1.0,
            p_light: self.p_light,
            value: self.intensity / self.p_light.distance_squared(p),
        }
    }
}
