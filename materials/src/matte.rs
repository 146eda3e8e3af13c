//! Matte Material

use sppm_core::geometry::*;
use sppm_core::material::*;
use sppm_core::pbrt::*;
use sppm_core::sampling::*;
use sppm_core::spectrum::*;
use std::sync::Arc;

/// Implements purely diffuse (Lambertian) surfaces.
#[derive(Clone, Debug)]
pub struct MatteMaterial {
    /// Spectral diffuse reflection.
    kd: Spectrum,
}

impl MatteMaterial {
    /// Create a new `MatteMaterial`.
    ///
    /// * `kd` - Spectral diffuse reflection in [0, 1].
    pub fn new(kd: Spectrum) -> Self {
        Self {
            kd: kd.clamp(0.0, 1.0),
        }
    }

    /// Create a new shared `MatteMaterial`.
    ///
    /// * `kd` - Spectral diffuse reflection in [0, 1].
    pub fn arc(kd: Spectrum) -> ArcMaterial {
        Arc::new(Self::new(kd))
    }
}

impl Material for MatteMaterial {
    fn bxdf_type(&self) -> BxDFType {
        BxDFType::BSDF_REFLECTION | BxDFType::BSDF_DIFFUSE
    }

    fn f(&self, n: &Normal3f, wo: &Vector3f, wi: &Vector3f) -> Spectrum {
        if n.dot(wo) * n.dot(wi) > 0.0 {
            self.kd * INV_PI
        } else {
            Spectrum::ZERO
        }
    }

    fn sample_f(&self, n: &Normal3f, wo: &Vector3f, u: &Point2f) -> Option<BSDFSample> {
        // Sample the hemisphere on the side of `wo`.
        let n = n.face_forward(wo);
        let local = cosine_sample_hemisphere(u);
        if local.z <= 0.0 {
            return None;
        }

        let wi = local_to_world(&local, &n);
        Some(BSDFSample {
            f: self.kd * INV_PI,
            wi,
            pdf: cosine_hemisphere_pdf(local.z),
            sampled_type: self.bxdf_type(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    #[test]
    fn no_transmission() {
        let m = MatteMaterial::new(Spectrum::new(0.5));
        let n = Normal3f::new(0.0, 0.0, 1.0);
        let wo = Vector3f::new(0.0, 0.0, 1.0);
        let below = Vector3f::new(0.0, 0.0, -1.0);
        assert!(m.f(&n, &wo, &below).is_black());
        assert!(approx_eq!(Float, m.f(&n, &wo, &wo)[0], 0.5 * INV_PI, epsilon = 1e-6));
        assert!(m.is_diffuse());
        assert!(!m.is_specular());
    }

    proptest! {
        #[test]
        fn samples_stay_on_wo_side(x in 0.01f32..0.99, y in 0.01f32..0.99) {
            let m = MatteMaterial::new(Spectrum::new(0.8));
            let n = Normal3f::new(0.0, 1.0, 0.0);
            let wo = Vector3f::new(0.3, -0.9, 0.1).normalize();
            if let Some(s) = m.sample_f(&n, &wo, &Point2f::new(x, y)) {
                prop_assert!(s.wi.dot(&n) * wo.dot(&n) >= 0.0);
                prop_assert!(s.pdf > 0.0);
            }
        }
    }
}
