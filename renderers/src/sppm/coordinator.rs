//! Pass Coordinator
//!
//! The loop every SPPM worker thread runs. Thread 0 is the leader: it alone
//! rebuilds the spatial index, makes the halt decision and updates the
//! film. Every thread crosses the same five barriers per pass, even after a
//! fault, so no thread is ever left waiting. Once any thread faults, every
//! thread skips the remaining phases and the film keeps the last clean pass.

use super::barrier::*;
use super::hitpoints::*;
use super::lookup_accel::*;
use super::photon_sampler::*;
use super::renderer::*;
use super::statistics::*;
use super::PhotonSamplerType;
use sppm_core::error::*;
use sppm_core::renderer::*;
use sppm_core::rng::*;
use sppm_core::sampling::*;
use sppm_core::scene::*;
use sppm_core::spectrum::*;
use std::any::Any;
use std::fmt;
use std::num::NonZeroUsize;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Work phases of a pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Trace eye paths and write the thread's hit points.
    EyePass,

    /// Rebuild the spatial index (leader only).
    IndexRebuild,

    /// Trace photons into the pass scratch.
    PhotonPass,

    /// Fold the pass scratch into the thread's hit points.
    FluxAccumulation,

    /// Close the pass and decide whether to stop (leader only).
    HaltCheck,

    /// Copy the radiance estimates to the film (leader only).
    FilmUpdate,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::EyePass => "eye pass",
            Self::IndexRebuild => "index rebuild",
            Self::PhotonPass => "photon pass",
            Self::FluxAccumulation => "flux accumulation",
            Self::HaltCheck => "halt check",
            Self::FilmUpdate => "film update",
        };
        write!(f, "{s}")
    }
}

/// Hooks called by the worker threads as they work through a pass. A panic
/// raised by a hook is handled like a fault of the phase it was called from.
pub trait PassObserver: Send + Sync {
    /// A thread starts a phase.
    ///
    /// * `_thread_index` - Thread index.
    /// * `_pass`         - Pass number, starting at 0.
    /// * `_phase`        - The phase.
    fn phase_started(&self, _thread_index: usize, _pass: u32, _phase: Phase) {}

    /// A thread finished writing a range of hit points.
    ///
    /// * `_thread_index` - Thread index.
    /// * `_pass`         - Pass number, starting at 0.
    /// * `_phase`        - The phase.
    /// * `_range`        - Hit point indices written.
    fn hit_points_written(&self, _thread_index: usize, _pass: u32, _phase: Phase, _range: Range<usize>) {}

    /// A thread starts tracing photons against the index.
    ///
    /// * `_thread_index` - Thread index.
    /// * `_pass`         - Pass number, starting at 0.
    /// * `_built_for`    - Eye pass generation of the index.
    /// * `_eye_pass`     - Eye pass generation of the hit points.
    fn index_checked(&self, _thread_index: usize, _pass: u32, _built_for: u32, _eye_pass: u32) {}
}

/// Returns the share of a pass's photons traced by one thread. Shares of
/// all threads add up to `total`.
///
/// * `total`        - Photons per pass.
/// * `threads`      - Number of threads.
/// * `thread_index` - Thread index.
pub(crate) fn photons_for_thread(total: u64, threads: usize, thread_index: usize) -> u64 {
    let n = threads as u64;
    total / n + u64::from((thread_index as u64) < total % n)
}

/// State shared by all worker threads of one render.
pub(crate) struct PassShared<'a> {
    /// The renderer.
    pub renderer: &'a SPPMRenderer,

    /// The scene.
    pub scene: &'a Scene,

    /// Distribution for choosing lights in proportion to their power.
    pub light_distr: Distribution1D,

    /// Photon sampler type.
    pub sampler_type: PhotonSamplerType,

    /// The hit point table.
    pub hit_points: HitPoints,

    /// Spatial index over the hit points.
    pub index: RwLock<SpatialIndex>,

    /// The pass barrier.
    pub barrier: PassBarrier,

    /// Leader decided at the pause checkpoint not to start another pass.
    stop_before_pass: AtomicBool,

    /// Leader decided at the halt check that this pass is the last.
    stop_after_pass: AtomicBool,

    /// Some thread faulted; the remaining phases are skipped everywhere.
    faulted: AtomicBool,

    /// First fault of any thread.
    fault: Mutex<Option<RenderError>>,
}

impl<'a> PassShared<'a> {
    /// Create the shared state of a render.
    ///
    /// * `renderer`     - The renderer.
    /// * `scene`        - The scene.
    /// * `light_distr`  - Light power distribution.
    /// * `sampler_type` - Photon sampler type.
    /// * `index`        - Empty spatial index.
    /// * `barrier`      - Barrier for all worker threads.
    pub fn new(
        renderer: &'a SPPMRenderer,
        scene: &'a Scene,
        light_distr: Distribution1D,
        sampler_type: PhotonSamplerType,
        index: SpatialIndex,
        barrier: PassBarrier,
    ) -> Self {
        let threads = NonZeroUsize::new(barrier.parties()).unwrap_or(NonZeroUsize::MIN);
        Self {
            renderer,
            scene,
            light_distr,
            sampler_type,
            hit_points: HitPoints::new(scene.film.pixel_count(), threads),
            index: RwLock::new(index),
            barrier,
            stop_before_pass: AtomicBool::new(false),
            stop_after_pass: AtomicBool::new(false),
            faulted: AtomicBool::new(false),
            fault: Mutex::new(None),
        }
    }

    /// Take the first recorded fault.
    pub fn take_fault(&self) -> Option<RenderError> {
        self.fault.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    /// Returns true once any thread has faulted.
    pub fn is_faulted(&self) -> bool {
        self.faulted.load(Ordering::Acquire)
    }

    fn record_fault(&self, err: RenderError) {
        let mut fault = self.fault.lock().unwrap_or_else(PoisonError::into_inner);
        if fault.is_none() {
            *fault = Some(err);
        }
        self.faulted.store(true, Ordering::Release);
    }
}

/// One worker thread.
pub(crate) struct PassCoordinator<'s, 'a> {
    /// Thread index; 0 is the leader.
    thread_index: usize,

    /// Shared render state.
    shared: &'s PassShared<'a>,

    /// The thread's random stream.
    rng: RNG,

    /// The thread's photon sampler.
    photon_sampler: Box<dyn PhotonSampler>,

    /// The thread's statistics.
    stats: Arc<ThreadStats>,

    /// Passes started by this thread.
    pass: u32,


    /// Whether the leader has set the initial search radius.
    radius_initialized: bool,
}

impl<'s, 'a> PassCoordinator<'s, 'a> {
    /// Create a worker.
    ///
    /// * `thread_index` - Thread index; 0 is the leader.
    /// * `shared`       - Shared render state.
    /// * `stats`        - The thread's statistics.
    pub fn new(thread_index: usize, shared: &'s PassShared<'a>, stats: Arc<ThreadStats>) -> Self {
        let config = &shared.renderer.config;
        Self {
            thread_index,
            shared,
            rng: RNG::for_thread(shared.scene.seed_base, thread_index),
            photon_sampler: shared.sampler_type.create(config.max_photon_path_depth),
            stats,
            pass: 0,
            radius_initialized: false,
        }
    }

    fn is_leader(&self) -> bool {
        self.thread_index == 0
    }

    /// Run passes until the leader decides to stop.
    pub fn run(mut self) {
        let sh = self.shared;
        let control = &sh.renderer.control;
        debug!(
            "SPPM thread {} started with seed {}",
            self.thread_index,
            thread_seed(sh.scene.seed_base, self.thread_index)
        );

        loop {
            let state = control.wait_while_paused();
            if self.is_leader() && state == RendererState::Terminate {
                sh.stop_before_pass.store(true, Ordering::Release);
            }

            sh.barrier.wait();
            if sh.stop_before_pass.load(Ordering::Acquire) {
                break;
            }

            self.run_phase(Phase::EyePass, Self::eye_pass);
            sh.barrier.wait();

            if self.is_leader() {
                self.run_phase(Phase::IndexRebuild, Self::rebuild_index);
            }
            sh.barrier.wait();

            self.run_phase(Phase::PhotonPass, Self::photon_pass);
            sh.barrier.wait();

            self.run_phase(Phase::FluxAccumulation, Self::accumulate_flux);
            if self.is_leader() {
                self.halt_check();
            }
            sh.barrier.wait();

            if self.is_leader() {
                self.run_phase(Phase::FilmUpdate, Self::update_film);
            }
            self.pass += 1;
            if sh.stop_after_pass.load(Ordering::Acquire) {
                break;
            }
        }
        debug!("SPPM thread {} done after {} passes", self.thread_index, self.pass);
    }

    /// Run a phase unless some thread has faulted. Errors and panics are
    /// logged, recorded and turn into a terminate request.
    fn run_phase(&mut self, phase: Phase, f: fn(&mut Self) -> Result<()>) {
        if self.shared.is_faulted() {
            return;
        }
        if let Err(err) = self.guarded(phase, f) {
            self.fault(phase, err);
        }
    }

    /// Call `f` after notifying the observer; a panic becomes an error.
    fn guarded<R>(&mut self, phase: Phase, f: fn(&mut Self) -> Result<R>) -> Result<R> {
        let observer = self.shared.renderer.observer.clone();
        let (thread_index, pass) = (self.thread_index, self.pass);
        panic::catch_unwind(AssertUnwindSafe(|| {
            if let Some(observer) = observer.as_ref() {
                observer.phase_started(thread_index, pass, phase);
            }
            f(self)
        }))
        .unwrap_or_else(|payload| {
            Err(RenderError::ThreadFault {
                thread: thread_index,
                phase: phase.to_string(),
                message: panic_message(payload.as_ref()),
            })
        })
    }

    fn fault(&self, phase: Phase, err: RenderError) {
        let sh = self.shared;
        error!(
            "SPPM thread {} failed in {phase} of pass {}: {err}",
            self.thread_index, self.pass
        );
        sh.record_fault(err);
        sh.renderer.control.terminate();
    }

    fn eye_pass(&mut self) -> Result<()> {
        let sh = self.shared;
        let config = &sh.renderer.config;
        if self.is_leader() {
            sh.hit_points.begin_eye_pass();
        }

        let range = sh.hit_points.range(self.thread_index);
        let samples = {
            let mut chunk = sh.hit_points.write_range(self.thread_index)?;
            set_hit_points(
                &mut chunk,
                &range,
                sh.scene,
                config.max_eye_path_depth,
                config.include_environment,
                &mut self.rng,
            )
        };
        self.stats.add_eye_samples(samples);
        self.notify_written(Phase::EyePass, &range);
        Ok(())
    }

    fn rebuild_index(&mut self) -> Result<()> {
        let sh = self.shared;
        if !self.radius_initialized {
            let radius = sh.hit_points.init_radius(
                sh.renderer.config.photon_start_radius_scale,
                &sh.scene.film.full_resolution,
            )?;
            info!("SPPM initial photon radius: {radius}");
            self.radius_initialized = true;
        }

        let view = sh.hit_points.read_all()?;
        let mut index = sh.index.write().map_err(|_| RenderError::Poisoned("spatial index"))?;
        index.refresh(&view, sh.hit_points.eye_pass());
        Ok(())
    }

    fn photon_pass(&mut self) -> Result<()> {
        let sh = self.shared;
        let config = &sh.renderer.config;
        let count = photons_for_thread(config.photons_per_pass, sh.barrier.parties(), self.thread_index);

        let result = {
            let view = sh.hit_points.read_all()?;
            let index = sh.index.read().map_err(|_| RenderError::Poisoned("spatial index"))?;
            let eye_pass = sh.hit_points.eye_pass();
            if let Some(observer) = sh.renderer.observer.as_ref() {
                observer.index_checked(self.thread_index, self.pass, index.built_for(), eye_pass);
            }

            let ctx = PhotonPassContext {
                scene: sh.scene,
                light_distr: &sh.light_distr,
                hit_points: &view,
                index: &index,
                eye_pass,
                max_depth: config.max_photon_path_depth,
            };
            self.photon_sampler.start_new_pass(&mut self.rng);
            self.photon_sampler.trace_photons(&ctx, &mut self.rng, count)?
        };

        self.stats.add_photons(result.photons);
        sh.renderer.lock_pass_state().photons_pass.add(&result);
        Ok(())
    }

    fn accumulate_flux(&mut self) -> Result<()> {
        let sh = self.shared;
        let counters = sh.renderer.lock_pass_state().counters();
        let scale = sh.sampler_type.scale_factor(&counters);

        let range = sh.hit_points.range(self.thread_index);
        {
            let mut chunk = sh.hit_points.write_range(self.thread_index)?;
            accumulate_flux(&mut chunk, sh.renderer.shrink.as_ref(), scale);
        }
        self.notify_written(Phase::FluxAccumulation, &range);
        Ok(())
    }

    /// Close the pass and decide whether it is the last one. Runs even
    /// after a fault; if it fails itself the pass is the last one.
    fn halt_check(&mut self) {
        let stop = match self.guarded(Phase::HaltCheck, Self::decide_halt) {
            Ok(stop) => stop,
            Err(err) => {
                self.fault(Phase::HaltCheck, err);
                true
            }
        };
        if stop {
            self.shared.renderer.control.terminate();
            self.shared.stop_after_pass.store(true, Ordering::Release);
        }
    }

    fn decide_halt(&mut self) -> Result<bool> {
        let sh = self.shared;
        let renderer = sh.renderer;
        let config = &renderer.config;

        let (current_pass, photons) = {
            let mut ps = renderer.lock_pass_state();
            ps.end_pass();
            (ps.current_pass, ps.photons_total.photons)
        };
        let elapsed = renderer.control.elapsed();
        debug!(
            "SPPM pass {current_pass} done: {photons} photons in {:.2}s",
            elapsed.as_secs_f64()
        );

        let passes_done = config.halt_passes > 0 && current_pass >= config.halt_passes;
        let time_up = config.halt_duration().is_some_and(|limit| elapsed >= limit);
        let terminated = renderer.control.state() == RendererState::Terminate;
        if passes_done {
            info!("SPPM halt pass {} reached", config.halt_passes);
        } else if time_up {
            info!("SPPM halt time {}s reached", config.halt_time);
        }
        Ok(passes_done || time_up || terminated)
    }

    /// Copy the radiance estimates to the film; write the image when due.
    /// Skipped for a pass in which any thread faulted.
    fn update_film(&mut self) -> Result<()> {
        let sh = self.shared;
        let film = &sh.scene.film;
        let pixels: Vec<Spectrum> = sh.hit_points.read_all()?.iter().map(|(_, hp)| hp.radiance).collect();
        film.set_image(&pixels)?;

        let write_frequency = sh.renderer.config.write_frequency;
        let due = write_frequency > 0 && (self.pass + 1) % write_frequency == 0;
        if !due {
            return Ok(());
        }
        if let Some(filename) = film.filename.as_ref() {
            if let Err(err) = film.write_image(filename) {
                error!("Unable to write image '{filename}': {err}");
            }
        }
        Ok(())
    }

    fn notify_written(&self, phase: Phase, range: &HitPointRange) {
        if let Some(observer) = self.shared.renderer.observer.as_ref() {
            observer.hit_points_written(self.thread_index, self.pass, phase, range.indices());
        }
    }
}

/// Returns the message of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        String::from("unknown panic")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn phase_names() {
        assert_eq!(Phase::EyePass.to_string(), "eye pass");
        assert_eq!(Phase::FluxAccumulation.to_string(), "flux accumulation");
        assert_eq!(Phase::HaltCheck.to_string(), "halt check");
    }

    #[test]
    fn panic_messages() {
        let payload = panic::catch_unwind(|| panic!("boom {}", 1)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom 1");
        let payload = panic::catch_unwind(|| panic!("static")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static");
    }

    proptest! {
        #[test]
        fn photon_shares_add_up(total in 0u64..1_000_000, threads in 1usize..64) {
            let shares: Vec<u64> = (0..threads).map(|i| photons_for_thread(total, threads, i)).collect();
            prop_assert_eq!(shares.iter().sum::<u64>(), total);
            let lo = *shares.iter().min().unwrap();
            let hi = *shares.iter().max().unwrap();
            prop_assert!(hi - lo <= 1);
        }
    }
}
