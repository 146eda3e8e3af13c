//! Photon Samplers
//!
//! A photon path is driven by a vector of sample values in [0, 1): one to
//! choose the light, four to emit the photon and three per bounce (two for
//! the BSDF and one for Russian roulette).

use super::hitpoints::*;
use super::lookup_accel::*;
use super::PhotonSamplerType;
use sppm_core::error::*;
use sppm_core::geometry::*;
use sppm_core::interaction::*;
use sppm_core::light::*;
use sppm_core::low_discrepancy::*;
use sppm_core::pbrt::*;
use sppm_core::rng::*;
use sppm_core::sampling::*;
use sppm_core::scene::*;
use sppm_core::spectrum::*;

/// Sample values used to emit a photon.
const LIGHT_SAMPLE_DIMENSIONS: usize = 5;

/// Sample values used per bounce.
const BOUNCE_SAMPLE_DIMENSIONS: usize = 3;

/// Acceptance rate the adaptive MCMC sampler steers towards.
const TARGET_ACCEPTANCE: Float = 0.234;

/// Smallest mutation size of the adaptive MCMC sampler.
const MIN_MUTATION_SIZE: Float = 1e-4;

/// Returns the length of the sample vector of a photon path.
///
/// * `max_depth` - Maximum number of bounces.
pub fn photon_sample_dimensions(max_depth: usize) -> usize {
    LIGHT_SAMPLE_DIMENSIONS + BOUNCE_SAMPLE_DIMENSIONS * max_depth
}

/// Everything a photon pass reads. Shared by all threads of the pass.
pub struct PhotonPassContext<'a, 'v> {
    /// The scene.
    pub scene: &'a Scene,

    /// Distribution for choosing lights in proportion to their power.
    pub light_distr: &'a Distribution1D,

    /// The hit point table.
    pub hit_points: &'a HitPointsView<'v>,

    /// Spatial index over the hit points.
    pub index: &'a SpatialIndex,

    /// Eye pass generation the hit points belong to.
    pub eye_pass: u32,

    /// Maximum number of bounces.
    pub max_depth: usize,
}

/// Photon counts of one pass of one thread.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PhotonPassResult {
    /// Photon paths traced.
    pub photons: u64,

    /// Paths drawn uniformly from the sample space.
    pub uniform: u64,

    /// Uniform paths that deposited on at least one hit point.
    pub uniform_visible: u64,
}

/// Running photon counts used to normalize the flux.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PhotonCounters {
    /// Photon paths traced.
    pub photons: u64,

    /// Paths drawn uniformly from the sample space.
    pub uniform: u64,

    /// Uniform paths that deposited on at least one hit point.
    pub uniform_visible: u64,
}

impl PhotonCounters {
    /// Add the result of a pass.
    ///
    /// * `r` - Pass result.
    pub fn add(&mut self, r: &PhotonPassResult) {
        self.photons += r.photons;
        self.uniform += r.uniform;
        self.uniform_visible += r.uniform_visible;
    }
}

impl PhotonSamplerType {
    /// Create a sampler of this type for one worker thread.
    ///
    /// * `max_depth` - Maximum number of photon bounces.
    pub fn create(&self, max_depth: usize) -> Box<dyn PhotonSampler> {
        match self {
            Self::Halton => Box::new(HaltonPhotonSampler::new(max_depth)),
            Self::Amcmc => Box::new(AMCMCPhotonSampler::new(max_depth)),
        }
    }

    /// Returns the factor that turns accumulated photon flux into an
    /// estimate. 0 before any photon was traced.
    ///
    /// * `counters` - Photon counts of all passes so far.
    pub fn scale_factor(&self, counters: &PhotonCounters) -> Float {
        if counters.photons == 0 {
            return 0.0;
        }
        let photons = counters.photons as f64;
        let scale = match self {
            Self::Halton => 1.0 / photons,
            Self::Amcmc => {
                if counters.uniform == 0 {
                    0.0
                } else {
                    (counters.uniform_visible as f64 / counters.uniform as f64) / photons
                }
            }
        };
        scale as Float
    }
}

/// Generates photon paths for one worker thread.
pub trait PhotonSampler: Send {
    /// Returns the sampler type.
    fn sampler_type(&self) -> PhotonSamplerType;

    /// Prepare for a new photon pass.
    ///
    /// * `rng` - The thread's random stream.
    fn start_new_pass(&mut self, rng: &mut RNG);

    /// Trace photons and deposit them into the hit point scratch.
    ///
    /// * `ctx`   - The photon pass.
    /// * `rng`   - The thread's random stream.
    /// * `count` - Number of photon paths.
    fn trace_photons(
        &mut self,
        ctx: &PhotonPassContext<'_, '_>,
        rng: &mut RNG,
        count: u64,
    ) -> Result<PhotonPassResult>;
}

/// A photon arriving within range of a hit point.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhotonDeposit {
    /// Hit point index.
    pub index: usize,

    /// Photon flux weighted by the hit point's BSDF.
    pub flux: Spectrum,
}

/// Follow one photon path and collect its deposits. The path is visible if
/// `deposits` is non-empty afterwards.
///
/// * `ctx`      - The photon pass.
/// * `u`        - Sample vector of `photon_sample_dimensions(ctx.max_depth)` values.
/// * `deposits` - Receives the deposits; cleared first.
pub fn trace_photon_path(ctx: &PhotonPassContext<'_, '_>, u: &[Float], deposits: &mut Vec<PhotonDeposit>) -> Result<()> {
    deposits.clear();

    // Choose light to shoot photon from.
    let (light_num, light_pdf) = ctx.light_distr.sample_discrete(u[0]);
    let light = &ctx.scene.lights[light_num];

    // Generate photon ray from light source and initialize `beta`.
    let Le {
        ray,
        n_light,
        pdf_pos,
        pdf_dir,
        value: le,
    } = light.sample_le(&Point2f::new(u[1], u[2]), &Point2f::new(u[3], u[4]));
    if light_pdf == 0.0 || pdf_pos == 0.0 || pdf_dir == 0.0 || le.is_black() {
        return Ok(());
    }
    let mut beta = le * (n_light.abs_dot(&ray.d) / (light_pdf * pdf_pos * pdf_dir));
    let mut ray = ray;

    for depth in 0..ctx.max_depth {
        if beta.is_black() || beta.has_nans() {
            break;
        }
        let Some(isect) = ctx.scene.intersect(&mut ray) else {
            break;
        };
        let Some(material) = isect.material.clone() else {
            ray = isect.spawn_ray(&ray.d);
            continue;
        };

        if material.is_diffuse() {
            deposit(ctx, &isect, &beta, deposits)?;
        }

        // Sample new photon ray direction.
        let dim = LIGHT_SAMPLE_DIMENSIONS + BOUNCE_SAMPLE_DIMENSIONS * depth;
        let Some(s) = material.sample_f(&isect.n, &isect.wo, &Point2f::new(u[dim], u[dim + 1])) else {
            break;
        };
        if s.pdf == 0.0 || s.f.is_black() {
            break;
        }
        let bnew = beta * s.f * (s.wi.abs_dot(&isect.n) / s.pdf);

        // Possibly terminate photon path with Russian roulette.
        let y = beta.y();
        if y <= 0.0 {
            break;
        }
        let q = max(0.0, 1.0 - bnew.y() / y);
        if u[dim + 2] < q {
            break;
        }
        beta = bnew / (1.0 - q);
        ray = isect.spawn_ray(&s.wi);
    }
    Ok(())
}

/// Collect the hit points a photon landing at `isect` contributes to.
fn deposit(
    ctx: &PhotonPassContext<'_, '_>,
    isect: &SurfaceInteraction,
    beta: &Spectrum,
    deposits: &mut Vec<PhotonDeposit>,
) -> Result<()> {
    let hit_points = ctx.hit_points;
    ctx.index.lookup(ctx.eye_pass, &isect.p, &mut |index| {
        let hp = hit_points.get(index);
        let eye = &hp.eye_pass;
        if eye.kind != HitPointKind::Surface
            || eye.normal.dot(&isect.n) <= 0.0
            || eye.position.distance_squared(&isect.p) > hp.accum_photon_radius2
        {
            return;
        }
        if let Some(material) = eye.material.as_ref() {
            let f = material.f(&eye.normal, &eye.wo, &isect.wo);
            if !f.is_black() {
                deposits.push(PhotonDeposit {
                    index,
                    flux: *beta * f,
                });
            }
        }
    })
}

/// Add deposits to the hit point scratch.
fn apply(hit_points: &HitPointsView<'_>, deposits: &[PhotonDeposit]) {
    for d in deposits {
        hit_points.get(d.index).scratch.add(&d.flux);
    }
}

/// Draws photon paths from a Halton sequence randomized with a
/// Cranley-Patterson rotation that changes every pass. Dimensions past the
/// prime table fall back to the thread's random stream.
pub struct HaltonPhotonSampler {
    /// Rotation of each Halton dimension.
    offsets: Vec<Float>,

    /// Index of the next Halton point.
    path_index: u64,

    /// Sample vector.
    u: Vec<Float>,

    /// Deposits of the current path.
    deposits: Vec<PhotonDeposit>,
}

impl HaltonPhotonSampler {
    /// Create a new `HaltonPhotonSampler`.
    ///
    /// * `max_depth` - Maximum number of photon bounces.
    pub fn new(max_depth: usize) -> Self {
        let dims = photon_sample_dimensions(max_depth);
        Self {
            offsets: vec![0.0; min(dims, PRIME_TABLE_SIZE)],
            path_index: 0,
            u: vec![0.0; dims],
            deposits: vec![],
        }
    }
}

impl PhotonSampler for HaltonPhotonSampler {
    fn sampler_type(&self) -> PhotonSamplerType {
        PhotonSamplerType::Halton
    }

    fn start_new_pass(&mut self, rng: &mut RNG) {
        for offset in self.offsets.iter_mut() {
            *offset = rng.uniform_float();
        }
    }

    fn trace_photons(
        &mut self,
        ctx: &PhotonPassContext<'_, '_>,
        rng: &mut RNG,
        count: u64,
    ) -> Result<PhotonPassResult> {
        let mut visible = 0;
        for _ in 0..count {
            for (dim, u) in self.u.iter_mut().enumerate() {
                *u = match self.offsets.get(dim) {
                    Some(&offset) => cranley_patterson(radical_inverse(dim, self.path_index), offset),
                    None => rng.uniform_float(),
                };
            }
            self.path_index += 1;

            trace_photon_path(ctx, &self.u, &mut self.deposits)?;
            if !self.deposits.is_empty() {
                visible += 1;
                apply(ctx.hit_points, &self.deposits);
            }
        }
        Ok(PhotonPassResult {
            photons: count,
            uniform: count,
            uniform_visible: visible,
        })
    }
}

/// Adaptive Markov chain Monte Carlo photon sampler. Each step first tries a
/// uniform path; a visible one replaces the chain state. Otherwise the state
/// is mutated and the mutation accepted if it is visible. The current state
/// is deposited on every step. The mutation size adapts towards a target
/// acceptance rate.
pub struct AMCMCPhotonSampler {
    /// Current chain state.
    current: Vec<Float>,

    /// Proposed state.
    candidate: Vec<Float>,

    /// Deposits of the current state.
    current_deposits: Vec<PhotonDeposit>,

    /// Deposits of the proposed state.
    candidate_deposits: Vec<PhotonDeposit>,

    /// Whether `current` is a visible path.
    has_current: bool,

    /// `current_deposits` belong to the previous pass's hit points.
    current_stale: bool,

    /// Mutation size.
    mutation_size: Float,

    /// Accepted mutations.
    accepted: u64,

    /// Attempted mutations.
    mutated: u64,
}

impl AMCMCPhotonSampler {
    /// Create a new `AMCMCPhotonSampler`.
    ///
    /// * `max_depth` - Maximum number of photon bounces.
    pub fn new(max_depth: usize) -> Self {
        let dims = photon_sample_dimensions(max_depth);
        Self {
            current: vec![0.0; dims],
            candidate: vec![0.0; dims],
            current_deposits: vec![],
            candidate_deposits: vec![],
            has_current: false,
            current_stale: false,
            mutation_size: 1.0,
            accepted: 0,
            mutated: 0,
        }
    }

    /// Returns the current mutation size.
    pub fn mutation_size(&self) -> Float {
        self.mutation_size
    }

    /// Make the candidate the current state.
    fn accept(&mut self) {
        std::mem::swap(&mut self.current, &mut self.candidate);
        std::mem::swap(&mut self.current_deposits, &mut self.candidate_deposits);
        self.has_current = true;
    }

    /// Fill the candidate with a mutation of the current state.
    fn mutate(&mut self, rng: &mut RNG) {
        let exponent = 1.0 / self.mutation_size + 1.0;
        for (c, &u) in self.candidate.iter_mut().zip(self.current.iter()) {
            let du = rng.uniform_float().powf(exponent);
            let v = if rng.uniform_float() < 0.5 { u + du } else { u - du };
            *c = min(v - v.floor(), ONE_MINUS_EPSILON);
        }
    }

    /// Steer the mutation size towards the target acceptance rate.
    fn adapt(&mut self) {
        let mutated = self.mutated as Float;
        let rate = self.accepted as Float / mutated;
        self.mutation_size = max(
            self.mutation_size + (rate - TARGET_ACCEPTANCE) / mutated,
            MIN_MUTATION_SIZE,
        );
    }
}

impl PhotonSampler for AMCMCPhotonSampler {
    fn sampler_type(&self) -> PhotonSamplerType {
        PhotonSamplerType::Amcmc
    }

    fn start_new_pass(&mut self, _rng: &mut RNG) {
        self.current_stale = self.has_current;
    }

    fn trace_photons(
        &mut self,
        ctx: &PhotonPassContext<'_, '_>,
        rng: &mut RNG,
        count: u64,
    ) -> Result<PhotonPassResult> {
        // The hit points moved; the chain state may no longer be visible.
        if self.current_stale {
            trace_photon_path(ctx, &self.current, &mut self.current_deposits)?;
            self.has_current = !self.current_deposits.is_empty();
            self.current_stale = false;
        }

        let mut visible = 0;
        for _ in 0..count {
            for u in self.candidate.iter_mut() {
                *u = rng.uniform_float();
            }
            trace_photon_path(ctx, &self.candidate, &mut self.candidate_deposits)?;

            if !self.candidate_deposits.is_empty() {
                visible += 1;
                self.accept();
            } else if self.has_current {
                self.mutate(rng);
                trace_photon_path(ctx, &self.candidate, &mut self.candidate_deposits)?;
                self.mutated += 1;
                if !self.candidate_deposits.is_empty() {
                    self.accepted += 1;
                    self.accept();
                }
                self.adapt();
            }

            if self.has_current {
                apply(ctx.hit_points, &self.current_deposits);
            }
        }
        Ok(PhotonPassResult {
            photons: count,
            uniform: count,
            uniform_visible: visible,
        })
    }
}
