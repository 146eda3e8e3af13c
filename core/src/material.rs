//! Material

use crate::geometry::*;
use crate::pbrt::*;
use crate::spectrum::*;
use bitflags::bitflags;
use std::sync::Arc;

bitflags! {
    /// Classifies the scattering a material performs.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct BxDFType: u8 {
        const BSDF_REFLECTION = 1 << 0;
        const BSDF_TRANSMISSION = 1 << 1;
        const BSDF_DIFFUSE = 1 << 2;
        const BSDF_GLOSSY = 1 << 3;
        const BSDF_SPECULAR = 1 << 4;
    }
}

/// Result of sampling a scattered direction.
#[derive(Copy, Clone, Debug)]
pub struct BSDFSample {
    /// Value of the BSDF for the pair of directions.
    pub f: Spectrum,

    /// The sampled incident direction.
    pub wi: Vector3f,

    /// PDF of the sampled direction.
    pub pdf: Float,

    /// The type of scattering that was sampled.
    pub sampled_type: BxDFType,
}

/// Material trait provides common behavior. Directions are in world space
/// and `n` is the shading normal facing `wo`.
pub trait Material: Send + Sync {
    /// Returns the kind of scattering this material performs.
    fn bxdf_type(&self) -> BxDFType;

    /// Evaluate the BSDF for a pair of directions. Specular materials return
    /// black.
    ///
    /// * `n`  - Shading normal.
    /// * `wo` - Outgoing direction.
    /// * `wi` - Incident direction.
    fn f(&self, n: &Normal3f, wo: &Vector3f, wi: &Vector3f) -> Spectrum;

    /// Sample an incident direction for a given outgoing direction. Returns
    /// `None` when no direction could be sampled.
    ///
    /// * `n`  - Shading normal.
    /// * `wo` - Outgoing direction.
    /// * `u`  - The 2D sample.
    fn sample_f(&self, n: &Normal3f, wo: &Vector3f, u: &Point2f) -> Option<BSDFSample>;

    /// Returns true if photons can be stored on this material.
    fn is_diffuse(&self) -> bool {
        self.bxdf_type().contains(BxDFType::BSDF_DIFFUSE)
    }

    /// Returns true if the material only scatters into delta directions.
    fn is_specular(&self) -> bool {
        self.bxdf_type().contains(BxDFType::BSDF_SPECULAR)
    }
}

/// Atomic reference counted `Material`.
pub type ArcMaterial = Arc<dyn Material>;
