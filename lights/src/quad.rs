//! Quad Area Light
//!
//! A one-sided emitter shaped like a parallelogram. It emits from the side
//! its normal points to. The emitter itself is not part of the scene
//! geometry, so rays never hit it.

use shapes::Quad;
use sppm_core::geometry::*;
use sppm_core::light::*;
use sppm_core::pbrt::*;
use sppm_core::sampling::*;
use sppm_core::shape::Shape;
use sppm_core::spectrum::*;
use std::sync::Arc;

/// Diffuse area light over a `Quad`.
#[derive(Clone, Debug)]
pub struct QuadLight {
    /// Emitting surface.
    pub quad: Quad,

    /// Emitted radiance.
    pub l_emit: Spectrum,

    /// Surface area.
    area: Float,
}

impl QuadLight {
    /// Returns a new `QuadLight`.
    ///
    /// * `quad`   - Emitting surface.
    /// * `l_emit` - Emitted radiance.
    pub fn new(quad: Quad, l_emit: Spectrum) -> Self {
        let area = quad.area();
        Self { quad, l_emit, area }
    }

    /// Returns a new shared `QuadLight`.
    ///
    /// * `quad`   - Emitting surface.
    /// * `l_emit` - Emitted radiance.
    pub fn arc(quad: Quad, l_emit: Spectrum) -> ArcLight {
        Arc::new(Self::new(quad, l_emit))
    }
}

impl Light for QuadLight {
    fn power(&self) -> Spectrum {
        self.l_emit * (self.area * PI)
    }

    fn sample_le(&self, u1: &Point2f, u2: &Point2f) -> Le {
        let p = self.quad.point_at(u1.x, u1.y);
        let local = cosine_sample_hemisphere(u2);
        let dir = local_to_world(&local, &self.quad.n);
        Le {
            ray: Ray::new(p + self.quad.n * RAY_EPSILON, dir),
            n_light: self.quad.n,
            pdf_pos: 1.0 / self.area,
            pdf_dir: cosine_hemisphere_pdf(local.z),
            value: self.l_emit,
        }
    }

    fn sample_li(&self, p: &Point3f, u: &Point2f) -> Li {
        let p_light = self.quad.point_at(u.x, u.y);
        let d = p_light - *p;
        let dist2 = d.length_squared();
        let wi = d.normalize();
        let cos_light = self.quad.n.dot(&-wi);
        if dist2 == 0.0 || cos_light <= 0.0 {
            return Li {
                wi,
                pdf: 0.0,
                p_light,
                value: Spectrum::ZERO,
            };
        }
        Li {
            wi,
            pdf: dist2 / (cos_light * self.area),
            p_light,
            value: self.l_emit,
        }
    }
}
