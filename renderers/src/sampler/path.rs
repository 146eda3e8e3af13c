//! Path Integrator

use sppm_core::geometry::*;
use sppm_core::interaction::*;
use sppm_core::material::*;
use sppm_core::pbrt::*;
use sppm_core::rng::*;
use sppm_core::sampling::*;
use sppm_core::scene::*;
use sppm_core::spectrum::*;

/// Bounces after which Russian roulette may end a path.
const RR_START_BOUNCE: usize = 3;

/// Implements path tracing with next event estimation.
#[derive(Copy, Clone, Debug)]
pub struct PathIntegrator {
    /// Maximum number of bounces.
    max_depth: usize,
}

impl PathIntegrator {
    /// Create a new `PathIntegrator`.
    ///
    /// * `max_depth` - Maximum number of bounces.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Returns the incident radiance at the origin of a given ray.
    ///
    /// * `ray`         - The ray.
    /// * `scene`       - The scene.
    /// * `light_distr` - Distribution for choosing lights.
    /// * `rng`         - Random number generator.
    pub fn li(&self, mut ray: Ray, scene: &Scene, light_distr: &Distribution1D, rng: &mut RNG) -> Spectrum {
        let mut l = Spectrum::ZERO;
        let mut beta = Spectrum::ONE;
        let mut specular_bounce = false;

        let mut bounces = 0_usize;
        loop {
            let Some(isect) = scene.intersect(&mut ray) else {
                if bounces == 0 || specular_bounce {
                    l += beta * scene.environment_le(&ray);
                }
                break;
            };
            if bounces >= self.max_depth {
                break;
            }

            let Some(material) = isect.material.clone() else {
                ray = isect.spawn_ray(&ray.d);
                continue;
            };

            if !material.is_specular() {
                l += beta * sample_one_light(&isect, material.as_ref(), scene, light_distr, rng);
            }

            let u = Point2f::new(rng.uniform_float(), rng.uniform_float());
            let Some(s) = material.sample_f(&isect.n, &isect.wo, &u) else {
                break;
            };
            if s.f.is_black() || s.pdf == 0.0 {
                break;
            }
            beta *= s.f * (s.wi.abs_dot(&isect.n) / s.pdf);
            specular_bounce = s.sampled_type.contains(BxDFType::BSDF_SPECULAR);
            ray = isect.spawn_ray(&s.wi);

            // Possibly terminate the path with Russian roulette.
            if bounces >= RR_START_BOUNCE {
                let q = max(0.05, 1.0 - beta.max_component_value());
                if rng.uniform_float() < q {
                    break;
                }
                beta = beta / (1.0 - q);
            }
            bounces += 1;
        }
        l
    }
}

/// Estimate direct lighting at a surface from one light chosen in
/// proportion to its power.
///
/// * `isect`       - The surface interaction.
/// * `material`    - Material at the surface.
/// * `scene`       - The scene.
/// * `light_distr` - Distribution for choosing lights.
/// * `rng`         - Random number generator.
fn sample_one_light(
    isect: &SurfaceInteraction,
    material: &dyn Material,
    scene: &Scene,
    light_distr: &Distribution1D,
    rng: &mut RNG,
) -> Spectrum {
    let (light_num, light_pdf) = light_distr.sample_discrete(rng.uniform_float());
    if light_pdf == 0.0 {
        return Spectrum::ZERO;
    }
    let light = &scene.lights[light_num];

    let u = Point2f::new(rng.uniform_float(), rng.uniform_float());
    let li = light.sample_li(&isect.p, &u);
    if li.pdf == 0.0 || li.value.is_black() {
        return Spectrum::ZERO;
    }

    let f = material.f(&isect.n, &isect.wo, &li.wi) * li.wi.abs_dot(&isect.n);
    if f.is_black() || scene.intersect_p(&isect.spawn_ray_to(&li.p_light)) {
        return Spectrum::ZERO;
    }
    f * li.value / (li.pdf * light_pdf)
}
