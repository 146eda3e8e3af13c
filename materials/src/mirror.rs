//! Mirror Material

use sppm_core::geometry::*;
use sppm_core::material::*;
use sppm_core::spectrum::*;
use std::sync::Arc;

/// A perfectly specular reflector.
#[derive(Clone, Debug)]
pub struct MirrorMaterial {
    /// Spectral reflectance.
    kr: Spectrum,
}

impl MirrorMaterial {
    /// Create a new `MirrorMaterial`.
    ///
    /// * `kr` - Spectral reflectance in [0, 1].
    pub fn new(kr: Spectrum) -> Self {
        Self {
            kr: kr.clamp(0.0, 1.0),
        }
    }

    /// Create a new shared `MirrorMaterial`.
    ///
    /// * `kr` - Spectral reflectance in [0, 1].
    pub fn arc(kr: Spectrum) -> ArcMaterial {
        Arc::new(Self::new(kr))
    }
}

impl Material for MirrorMaterial {
    fn bxdf_type(&self) -> BxDFType {
        BxDFType::BSDF_REFLECTION | BxDFType::BSDF_SPECULAR
    }

    fn f(&self, _n: &Normal3f, _wo: &Vector3f, _wi: &Vector3f) -> Spectrum {
        Spectrum::ZERO
    }

    fn sample_f(&self, n: &Normal3f, wo: &Vector3f, _u: &Point2f) -> Option<BSDFSample> {
        let cos_o = n.dot(wo);
        if cos_o == 0.0 || self.kr.is_black() {
            return None;
        }

        let wi = *n * (2.0 * cos_o) - *wo;
        Some(BSDFSample {
            f: self.kr / cos_o.abs(),
            wi,
            pdf: 1.0,
            sampled_type: self.bxdf_type(),
        })
    }
}
