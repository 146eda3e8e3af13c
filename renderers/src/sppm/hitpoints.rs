//! Hit Points
//!
//! One hit point per pixel. The table is split into contiguous chunks, one
//! per worker thread; a thread only writes its own chunk during the eye pass
//! and the flux accumulation. During the photon pass every thread reads the
//! whole table and only touches the atomic per-pass scratch.

use sppm_core::camera::*;
use sppm_core::error::*;
use sppm_core::geometry::*;
use sppm_core::material::*;
use sppm_core::parallel::*;
use sppm_core::pbrt::*;
use sppm_core::rng::*;
use sppm_core::scene::*;
use sppm_core::spectrum::*;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// What the eye path found.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum HitPointKind {
    /// No eye pass has written the hit point yet.
    #[default]
    Unset,

    /// The path ended on a diffuse surface; photons are gathered here.
    Surface,

    /// The path ended without a gathering surface; the radiance it carries
    /// is added as is.
    ConstantColor,
}

/// Data written by the eye pass. Replaced every pass.
#[derive(Clone, Default)]
pub struct HitPointEyePass {
    /// Kind of hit point.
    pub kind: HitPointKind,

    /// Position of the gathering surface point.
    pub position: Point3f,

    /// Surface normal facing the eye path.
    pub normal: Normal3f,

    /// Direction back along the eye path.
    pub wo: Vector3f,

    /// Material at the gathering point.
    pub material: Option<ArcMaterial>,

    /// Eye path throughput up to the gathering point.
    pub throughput: Spectrum,

    /// Radiance carried by a `ConstantColor` path.
    pub radiance: Spectrum,
}

/// Photons deposited on a hit point during the current photon pass. Written
/// concurrently by every worker thread and cleared by the flux accumulation.
#[derive(Debug, Default)]
pub struct PassScratch {
    /// Number of photons.
    photon_count: AtomicU32,

    /// Sum of photon flux weighted by the BSDF at the hit point.
    flux: AtomicSpectrum,
}

impl PassScratch {
    /// Deposit one photon.
    ///
    /// * `flux` - Photon flux weighted by the BSDF.
    pub fn add(&self, flux: &Spectrum) {
        self.photon_count.fetch_add(1, Ordering::AcqRel);
        self.flux.add(flux);
    }

    /// Returns the photon count and flux without clearing them.
    pub fn load(&self) -> (u32, Spectrum) {
        (self.photon_count.load(Ordering::Acquire), self.flux.load())
    }

    /// Returns the photon count and flux and resets both to zero.
    pub fn take(&self) -> (u32, Spectrum) {
        (self.photon_count.swap(0, Ordering::AcqRel), self.flux.take())
    }

    /// Returns true if nothing was deposited.
    pub fn is_clear(&self) -> bool {
        let (count, flux) = self.load();
        count == 0 && flux.is_black()
    }
}

/// A pixel's gathering point together with its progressive estimate.
#[derive(Default)]
pub struct HitPoint {
    /// Eye pass data.
    pub eye_pass: HitPointEyePass,

    /// Progressive photon count N.
    pub photon_count: Float,

    /// Squared search radius. Never grows.
    pub accum_photon_radius2: Float,

    /// Accumulated reflected flux.
    pub reflected_flux: Spectrum,

    /// Accumulated radiance of `ConstantColor` passes.
    pub accum_radiance: Spectrum,

    /// Number of passes that ended as `ConstantColor`.
    pub constant_hits_count: u32,

    /// Number of passes that ended on a surface.
    pub surface_hits_count: u32,

    /// Current radiance estimate.
    pub radiance: Spectrum,

    /// Photon pass scratch.
    pub scratch: PassScratch,
}

/// The slice of the hit point table owned by one thread.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct HitPointRange {
    /// Owning thread.
    pub thread_index: usize,

    /// First hit point.
    pub start: usize,

    /// One past the last hit point.
    pub end: usize,
}

impl HitPointRange {
    /// Returns the number of hit points in the range.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if the range holds no hit points.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Returns the range of hit point indices.
    pub fn indices(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Split `len` hit points into contiguous ranges, one per thread. Range sizes
/// differ by at most one; with more threads than hit points some ranges are
/// empty.
///
/// * `len`     - Number of hit points.
/// * `threads` - Number of threads.
pub fn partition(len: usize, threads: NonZeroUsize) -> Vec<HitPointRange> {
    let n = threads.get();
    let base = len / n;
    let extra = len % n;
    let mut start = 0;
    (0..n)
        .map(|thread_index| {
            let size = base + usize::from(thread_index < extra);
            let range = HitPointRange {
                thread_index,
                start,
                end: start + size,
            };
            start += size;
            range
        })
        .collect()
}

/// The hit point table.
pub struct HitPoints {
    /// One chunk per thread.
    chunks: Vec<RwLock<Vec<HitPoint>>>,

    /// Range of each chunk.
    ranges: Vec<HitPointRange>,

    /// Eye pass generation; 0 before the first eye pass.
    eye_pass: AtomicU32,
}

impl HitPoints {
    /// Create a table of default hit points.
    ///
    /// * `len`     - Number of hit points (pixels).
    /// * `threads` - Number of worker threads.
    pub fn new(len: usize, threads: NonZeroUsize) -> Self {
        let ranges = partition(len, threads);
        let chunks = ranges
            .iter()
            .map(|r| RwLock::new((0..r.len()).map(|_| HitPoint::default()).collect()))
            .collect();
        Self {
            chunks,
            ranges,
            eye_pass: AtomicU32::new(0),
        }
    }

    /// Returns the number of hit points.
    pub fn len(&self) -> usize {
        self.ranges.last().map_or(0, |r| r.end)
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every thread's range.
    pub fn ranges(&self) -> &[HitPointRange] {
        &self.ranges
    }

    /// Returns the range owned by a thread.
    ///
    /// * `thread_index` - Thread index.
    pub fn range(&self, thread_index: usize) -> HitPointRange {
        self.ranges[thread_index]
    }

    /// Returns the current eye pass generation.
    pub fn eye_pass(&self) -> u32 {
        self.eye_pass.load(Ordering::Acquire)
    }

    /// Start a new eye pass generation and return it.
    pub fn begin_eye_pass(&self) -> u32 {
        self.eye_pass.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Lock a thread's chunk for writing.
    ///
    /// * `thread_index` - Thread index.
    pub fn write_range(&self, thread_index: usize) -> Result<RwLockWriteGuard<'_, Vec<HitPoint>>> {
        self.chunks[thread_index]
            .write()
            .map_err(|_| RenderError::Poisoned("hit points"))
    }

    /// Lock the whole table for reading.
    pub fn read_all(&self) -> Result<HitPointsView<'_>> {
        let chunks = self
            .chunks
            .iter()
            .map(|c| c.read().map_err(|_| RenderError::Poisoned("hit points")))
            .collect::<Result<Vec<_>>>()?;
        Ok(HitPointsView {
            chunks,
            ranges: &self.ranges,
        })
    }

    /// Compute the initial search radius from the bounding box of the
    /// surface hit points and apply it to every hit point. Returns the
    /// radius.
    ///
    /// * `start_radius_scale` - Scale applied to the derived radius.
    /// * `resolution`         - Film resolution.
    pub fn init_radius(&self, start_radius_scale: Float, resolution: &Point2i) -> Result<Float> {
        let mut chunks = self
            .chunks
            .iter()
            .map(|c| c.write().map_err(|_| RenderError::Poisoned("hit points")))
            .collect::<Result<Vec<_>>>()?;

        let bbox = chunks
            .iter()
            .flat_map(|c| c.iter())
            .filter(|hp| hp.eye_pass.kind == HitPointKind::Surface)
            .fold(Bounds3f::empty(), |b, hp| b.union_point(&hp.eye_pass.position));

        let mut radius = if bbox.is_empty() {
            0.0
        } else {
            let size = bbox.diagonal();
            let avg_size = (size.x + size.y + size.z) / 3.0;
            let avg_res = (resolution.x + resolution.y) as Float / 2.0;
            start_radius_scale * avg_size / avg_res * 2.0
        };
        if !(radius > 0.0) {
            warn!("No usable surface hit points; using start radius {start_radius_scale}.");
            radius = start_radius_scale;
        }

        let radius2 = radius * radius;
        for hp in chunks.iter_mut().flat_map(|c| c.iter_mut()) {
            hp.accum_photon_radius2 = radius2;
        }
        Ok(radius)
    }
}

/// Read access to the whole hit point table.
pub struct HitPointsView<'a> {
    /// Read guards, one per chunk.
    chunks: Vec<RwLockReadGuard<'a, Vec<HitPoint>>>,

    /// Range of each chunk.
    ranges: &'a [HitPointRange],
}

impl<'a> HitPointsView<'a> {
    /// Returns the number of hit points.
    pub fn len(&self) -> usize {
        self.ranges.last().map_or(0, |r| r.end)
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a hit point by global index.
    ///
    /// * `index` - Hit point index.
    pub fn get(&self, index: usize) -> &HitPoint {
        let chunk = self.ranges.partition_point(|r| r.end <= index);
        &self.chunks[chunk][index - self.ranges[chunk].start]
    }

    /// Iterate over all hit points with their global index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &HitPoint)> + '_ {
        self.ranges
            .iter()
            .zip(self.chunks.iter())
            .flat_map(|(r, chunk)| r.indices().zip(chunk.iter()))
    }
}

/// Trace one jittered eye path per hit point of a range, record where it
/// ends and clear the photon scratch. The progressive estimate is kept.
/// Returns the number of eye samples taken.
///
/// * `hit_points`          - The thread's chunk.
/// * `range`               - The chunk's range in the table.
/// * `scene`               - The scene.
/// * `max_depth`           - Maximum number of specular bounces.
/// * `include_environment` - Whether camera rays see the environment.
/// * `rng`                 - The thread's random stream.
pub fn set_hit_points(
    hit_points: &mut [HitPoint],
    range: &HitPointRange,
    scene: &Scene,
    max_depth: usize,
    include_environment: bool,
    rng: &mut RNG,
) -> u64 {
    let width = scene.film.full_resolution.x as usize;
    for (index, hp) in range.indices().zip(hit_points.iter_mut()) {
        let x = (index % width) as Float;
        let y = (index / width) as Float;
        let p_film = Point2f::new(x + rng.uniform_float(), y + rng.uniform_float());
        let (ray, weight) = scene.camera.generate_ray(&CameraSample::new(p_film));
        hp.eye_pass = trace_eye_path(ray, Spectrum::new(weight), scene, max_depth, include_environment, rng);
        hp.scratch.take();
    }
    range.len() as u64
}

/// Follow an eye path through specular bounces until it reaches a diffuse
/// surface, escapes or runs out of depth.
fn trace_eye_path(
    mut ray: Ray,
    mut throughput: Spectrum,
    scene: &Scene,
    max_depth: usize,
    include_environment: bool,
    rng: &mut RNG,
) -> HitPointEyePass {
    let constant = |radiance: Spectrum| HitPointEyePass {
        kind: HitPointKind::ConstantColor,
        radiance,
        ..Default::default()
    };

    for depth in 0..max_depth {
        let Some(isect) = scene.intersect(&mut ray) else {
            let le = if depth > 0 || include_environment {
                throughput * scene.environment_le(&ray)
            } else {
                Spectrum::ZERO
            };
            return constant(le);
        };

        let Some(material) = isect.material.clone() else {
            // Pass through interfaces without a material.
            ray = isect.spawn_ray(&ray.d);
            continue;
        };

        if material.is_diffuse() {
            return HitPointEyePass {
                kind: HitPointKind::Surface,
                position: isect.p,
                normal: isect.n,
                wo: isect.wo,
                material: Some(material),
                throughput,
                radiance: Spectrum::ZERO,
            };
        }

        let u = Point2f::new(rng.uniform_float(), rng.uniform_float());
        match material.sample_f(&isect.n, &isect.wo, &u) {
            Some(s) if s.pdf > 0.0 && !s.f.is_black() => {
                throughput *= s.f * (s.wi.abs_dot(&isect.n) / s.pdf);
                if throughput.is_black() {
                    break;
                }
                ray = isect.spawn_ray(&s.wi);
            }
            _ => break,
        }
    }
    constant(Spectrum::ZERO)
}

/// Progressive radius reduction applied once per pass to every hit point
/// that received photons.
pub trait RadiusShrink: Send + Sync {
    /// Returns the new progressive photon count and the ratio of the new to
    /// the old squared radius.
    ///
    /// * `photon_count` - Progressive photon count N.
    /// * `new_photons`  - Photons received this pass M (> 0).
    fn shrink(&self, photon_count: Float, new_photons: u32) -> (Float, Float);
}

/// The classic progressive photon mapping reduction: a fraction `alpha` of
/// the new photons is kept and the radius shrinks in proportion.
#[derive(Copy, Clone, Debug)]
pub struct ProgressiveShrink {
    /// Fraction of new photons kept, in (0, 1].
    pub alpha: Float,
}

impl ProgressiveShrink {
    /// Create a new `ProgressiveShrink`.
    ///
    /// * `alpha` - Fraction of new photons kept, in (0, 1].
    pub fn new(alpha: Float) -> Self {
        Self { alpha }
    }
}

impl RadiusShrink for ProgressiveShrink {
    fn shrink(&self, photon_count: Float, new_photons: u32) -> (Float, Float) {
        let m = new_photons as Float;
        let n_new = photon_count + self.alpha * m;
        (n_new, n_new / (photon_count + m))
    }
}

/// Fold the photon pass scratch into the progressive estimate of each hit
/// point and refresh its radiance.
///
/// * `hit_points` - The thread's chunk.
/// * `shrink`     - Radius reduction.
/// * `scale`      - Photon normalization factor.
pub fn accumulate_flux(hit_points: &mut [HitPoint], shrink: &dyn RadiusShrink, scale: Float) {
    for hp in hit_points.iter_mut() {
        let (m, phi) = hp.scratch.take();

        match hp.eye_pass.kind {
            HitPointKind::Surface => {
                if m > 0 {
                    let (n_new, ratio) = shrink.shrink(hp.photon_count, m);
                    let ratio = clamp(ratio, 0.0, 1.0);
                    hp.reflected_flux = (hp.reflected_flux + hp.eye_pass.throughput * phi) * ratio;
                    hp.accum_photon_radius2 *= ratio;
                    hp.photon_count = n_new;
                }
                hp.surface_hits_count += 1;
            }
            HitPointKind::ConstantColor => {
                hp.accum_radiance += hp.eye_pass.radiance;
                hp.constant_hits_count += 1;
            }
            HitPointKind::Unset => continue,
        }

        let hits = hp.constant_hits_count + hp.surface_hits_count;
        let k = if hp.accum_photon_radius2 > 0.0 {
            scale / (PI * hp.accum_photon_radius2)
        } else {
            0.0
        };
        hp.radiance = (hp.accum_radiance
            + hp.reflected_flux * (hp.surface_hits_count as Float * k))
            / hits as Float;
    }
}
