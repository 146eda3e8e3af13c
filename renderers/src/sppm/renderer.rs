//! SPPM Renderer

use super::barrier::*;
use super::coordinator::*;
use super::hitpoints::*;
use super::lookup_accel::*;
use super::photon_sampler::*;
use super::statistics::*;
use super::{LookUpAccelType, PhotonSamplerType, SPPMConfig};
use sppm_core::error::*;
use sppm_core::light::*;
use sppm_core::paramset::*;
use sppm_core::pbrt::*;
use sppm_core::renderer::*;
use sppm_core::sampling::*;
use sppm_core::scene::*;
use sppm_core::stats::*;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

/// Pass bookkeeping shared by the worker threads.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PassState {
    /// Completed passes.
    pub current_pass: u32,

    /// Photon counts of completed passes.
    pub photons_total: PhotonCounters,

    /// Photon counts of the pass in progress.
    pub photons_pass: PhotonCounters,
}

impl PassState {
    /// Returns the photon counts including the pass in progress. The value
    /// does not change when the pass is closed.
    pub fn counters(&self) -> PhotonCounters {
        let mut c = self.photons_total;
        c.photons += self.photons_pass.photons;
        c.uniform += self.photons_pass.uniform;
        c.uniform_visible += self.photons_pass.uniform_visible;
        c
    }

    /// Close the pass in progress.
    pub fn end_pass(&mut self) {
        self.photons_total = self.counters();
        self.photons_pass = PhotonCounters::default();
        self.current_pass += 1;
    }
}

/// Implements the stochastic progressive photon mapping renderer.
pub struct SPPMRenderer {
    /// Parameters.
    pub(crate) config: SPPMConfig,

    /// Lifecycle state.
    pub(crate) control: RendererControl,

    /// Pass bookkeeping.
    pass_state: Mutex<PassState>,

    /// Radius reduction applied at the end of every pass.
    pub(crate) shrink: Box<dyn RadiusShrink>,

    /// Optional hooks into the worker loop.
    pub(crate) observer: Option<Arc<dyn PassObserver>>,

    /// Per-thread statistics.
    stats: StatsCollector,

    /// Statistics attributes.
    registry: StatsRegistry<SPPMStats>,

    /// Number of worker threads of the current render.
    thread_count: AtomicUsize,

    /// Barrier arrivals and crossings of the last render.
    barrier_counts: Mutex<(u64, u64)>,
}

impl SPPMRenderer {
    /// Create a new `SPPMRenderer`.
    ///
    /// * `config` - Parameters.
    pub fn new(config: SPPMConfig) -> Self {
        let shrink = Box::new(ProgressiveShrink::new(config.photon_alpha));
        Self {
            config,
            control: RendererControl::new(),
            pass_state: Mutex::new(PassState::default()),
            shrink,
            observer: None,
            stats: StatsCollector::default(),
            registry: sppm_statistics(),
            thread_count: AtomicUsize::new(0),
            barrier_counts: Mutex::new((0, 0)),
        }
    }

    /// Replace the radius reduction.
    ///
    /// * `shrink` - Radius reduction.
    pub fn with_radius_shrink(mut self, shrink: Box<dyn RadiusShrink>) -> Self {
        self.shrink = shrink;
        self
    }

    /// Install hooks into the worker loop.
    ///
    /// * `observer` - The hooks.
    pub fn with_observer(mut self, observer: Arc<dyn PassObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Returns the parameters.
    pub fn config(&self) -> &SPPMConfig {
        &self.config
    }

    /// Returns a copy of the pass bookkeeping.
    pub fn pass_state(&self) -> PassState {
        *self.lock_pass_state()
    }

    /// Returns the factor that turns accumulated photon flux into an
    /// estimate for the photons traced so far.
    ///
    /// * `sampler_type` - Photon sampler type.
    pub fn get_scale_factor(&self, sampler_type: PhotonSamplerType) -> Float {
        sampler_type.scale_factor(&self.pass_state().counters())
    }

    /// Returns the statistics snapshot.
    pub fn stats_snapshot(&self) -> SPPMStats {
        self.stats.drain(false);
        let ps = self.pass_state();
        let totals = self.stats.totals();
        let (barrier_arrivals, barrier_crossings) =
            *self.barrier_counts.lock().unwrap_or_else(PoisonError::into_inner);
        SPPMStats {
            pass_count: ps.current_pass,
            photon_count: totals.photons,
            eye_sample_count: totals.eye_samples,
            elapsed: self.control.elapsed().as_secs_f64(),
            halt_passes: self.config.halt_passes,
            halt_time: self.config.halt_time as f64,
            thread_count: self.thread_count.load(Ordering::Acquire),
            barrier_arrivals,
            barrier_crossings,
        }
    }

    /// Returns the statistics attributes.
    pub fn statistics_registry(&self) -> &StatsRegistry<SPPMStats> {
        &self.registry
    }

    pub(crate) fn lock_pass_state(&self) -> MutexGuard<'_, PassState> {
        self.pass_state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check the scene and parameters before any thread starts.
    fn validate(&self, scene: &Scene) -> Result<(LookUpAccelType, PhotonSamplerType, Distribution1D)> {
        if scene.film_only {
            return Err(RenderError::FilmOnly);
        }
        let light_distr = compute_light_power_distribution(&scene.lights).ok_or(RenderError::NoLights)?;
        let sampler_type: PhotonSamplerType = self.config.photon_sampler.parse()?;
        let accel_type: LookUpAccelType = self.config.lookup_accel.parse()?;
        Ok((accel_type, sampler_type, light_distr))
    }
}

impl From<&ParamSet> for SPPMRenderer {
    /// Create `SPPMRenderer` from `ParamSet`.
    ///
    /// * `params` - Renderer parameters.
    fn from(params: &ParamSet) -> Self {
        Self::new(SPPMConfig::from(params))
    }
}

impl Renderer for SPPMRenderer {
    fn renderer_type(&self) -> RendererType {
        RendererType::Sppm
    }

    fn state(&self) -> RendererState {
        self.control.state()
    }

    fn render(&self, scene: Arc<Scene>) -> Result<()> {
        let (accel_type, sampler_type, light_distr) = match self.validate(&scene) {
            Ok(v) => v,
            Err(err) => {
                if matches!(err, RenderError::FilmOnly) {
                    info!("{err}");
                } else {
                    error!("{err}");
                }
                self.control.terminate();
                return Err(err);
            }
        };
        if !self.control.begin() {
            info!("SPPM renderer terminated before rendering started");
            return Ok(());
        }

        let n_threads = self.config.thread_count();
        let parties = NonZeroUsize::new(n_threads).unwrap_or(NonZeroUsize::MIN);
        info!("Hardware concurrency: {}", num_cpus::get());
        info!(
            "Starting {} SPPM threads: {} hit points, {} photons per pass, {} sampler, {} index",
            parties,
            scene.film.pixel_count(),
            self.config.photons_per_pass,
            sampler_type,
            accel_type
        );

        *self.lock_pass_state() = PassState::default();
        self.thread_count.store(parties.get(), Ordering::Release);
        let thread_stats = self.stats.reset(parties.get());

        let shared = PassShared::new(
            self,
            &scene,
            light_distr,
            sampler_type,
            SpatialIndex::new(accel_type),
            PassBarrier::new(parties),
        );

        thread::scope(|s| {
            let handles: Vec<_> = thread_stats
                .into_iter()
                .enumerate()
                .map(|(thread_index, stats)| {
                    let worker = PassCoordinator::new(thread_index, &shared, stats);
                    s.spawn(move || worker.run())
                })
                .collect();

            // Join the leader first.
            for (thread_index, handle) in handles.into_iter().enumerate() {
                if handle.join().is_err() {
                    error!("SPPM thread {thread_index} panicked");
                }
            }
        });

        self.control.terminate();
        self.stats.drain(true);
        *self.barrier_counts.lock().unwrap_or_else(PoisonError::into_inner) =
            (shared.barrier.arrivals(), shared.barrier.crossings());

        let ps = self.pass_state();
        info!(
            "SPPM done: {} passes, {} photons in {:.2}s",
            ps.current_pass,
            ps.photons_total.photons,
            self.control.elapsed().as_secs_f64()
        );

        match shared.take_fault() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn pause(&self) {
        self.control.pause();
    }

    fn resume(&self) {
        self.control.resume();
    }

    fn terminate(&self) {
        self.control.terminate();
    }

    fn statistics(&self, name: &str) -> f64 {
        let snapshot = self.stats_snapshot();
        match self.registry.get(&snapshot, name) {
            Some(v) => v,
            None => {
                warn!("Unknown statistics attribute '{name}'");
                0.0
            }
        }
    }
}
