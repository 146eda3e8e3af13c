//! Sampler Renderer

use super::{PathIntegrator, SamplerConfig};
use crossbeam_channel::{RecvTimeoutError, Receiver, Sender};
use sppm_core::camera::*;
use sppm_core::error::*;
use sppm_core::geometry::*;
use sppm_core::light::*;
use sppm_core::paramset::*;
use sppm_core::pbrt::*;
use sppm_core::renderer::*;
use sppm_core::rng::*;
use sppm_core::sampling::*;
use sppm_core::scene::*;
use sppm_core::spectrum::*;
use sppm_core::stats::*;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Number of sample positions a worker claims at once.
const BATCH_SIZE: u64 = 256;

/// How long the rendering thread waits for contributions before checking
/// the renderer state again.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Minimum time between two film updates.
const FILM_UPDATE_INTERVAL: Duration = Duration::from_millis(500);

/// Radiance of one camera sample.
type Contribution = (usize, Spectrum);

/// Everything a worker thread needs for one render.
struct RenderContext {
    /// The scene.
    scene: Arc<Scene>,

    /// Distribution for choosing lights in proportion to their power.
    light_distr: Distribution1D,

    /// The integrator.
    integrator: PathIntegrator,

    /// Lifecycle state shared with the renderer.
    control: Arc<RendererControl>,

    /// Next unclaimed sample position.
    next_sample: AtomicU64,

    /// Total number of samples; `None` if not limited.
    sample_limit: Option<u64>,

    /// Number of pixels.
    pixel_count: u64,

    /// Channel to the rendering thread.
    sender: Sender<Vec<Contribution>>,
}

impl RenderContext {
    /// Claim the next batch of sample positions. Returns `None` when every
    /// sample has been claimed.
    fn next_batch(&self) -> Option<Range<u64>> {
        let start = self.next_sample.fetch_add(BATCH_SIZE, Ordering::AcqRel);
        let end = start + BATCH_SIZE;
        match self.sample_limit {
            Some(limit) if start >= limit => None,
            Some(limit) => Some(start..min(end, limit)),
            None => Some(start..end),
        }
    }

    /// Trace the camera sample at a sample position. Position `i` samples
    /// pixel `i % pixel_count`.
    ///
    /// * `position` - Sample position.
    /// * `rng`      - Random number generator.
    fn sample(&self, position: u64, rng: &mut RNG) -> Contribution {
        let pixel = (position % self.pixel_count) as usize;
        let width = self.scene.film.full_resolution.x as usize;
        let x = (pixel % width) as Float;
        let y = (pixel / width) as Float;
        let p_film = Point2f::new(x + rng.uniform_float(), y + rng.uniform_float());

        let (ray, weight) = self.scene.camera.generate_ray(&CameraSample::new(p_film));
        let l = if weight > 0.0 {
            self.integrator.li(ray, &self.scene, &self.light_distr, rng) * weight
        } else {
            Spectrum::ZERO
        };
        if l.has_nans() || l.y().is_infinite() {
            warn!("Invalid radiance for pixel {pixel}; setting to black.");
            return (pixel, Spectrum::ZERO);
        }
        (pixel, l)
    }
}

/// A worker thread of the current render.
struct RenderThread {
    /// Thread index; selects the random stream.
    thread_index: usize,

    /// Asks the thread to exit after its current batch.
    stop: Arc<AtomicBool>,

    /// The thread.
    handle: JoinHandle<()>,
}

/// Worker thread body.
///
/// * `ctx`          - The render.
/// * `thread_index` - Thread index.
/// * `stop`         - Set to remove the thread.
fn render_thread(ctx: Arc<RenderContext>, thread_index: usize, stop: Arc<AtomicBool>) {
    let mut rng = RNG::for_thread(ctx.scene.seed_base, thread_index);
    debug!(
        "Render thread {thread_index} started with seed {}",
        thread_seed(ctx.scene.seed_base, thread_index)
    );

    loop {
        if ctx.control.wait_while_paused() == RendererState::Terminate || stop.load(Ordering::Acquire) {
            break;
        }
        let Some(batch) = ctx.next_batch() else {
            break;
        };
        let contributions: Vec<Contribution> = batch.map(|position| ctx.sample(position, &mut rng)).collect();
        if ctx.sender.send(contributions).is_err() {
            break;
        }
    }
    debug!("Render thread {thread_index} done");
}

/// Snapshot the statistics attributes are computed from.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct SamplerStats {
    /// Samples received.
    pub sample_count: u64,

    /// Number of pixels.
    pub pixel_count: u64,

    /// Rendering time in seconds.
    pub elapsed: f64,

    /// Number of worker threads.
    pub thread_count: usize,

    /// Samples per pixel limit; 0 if none.
    pub halt_spp: u32,
}

/// Returns the sampler renderer statistics attributes.
pub fn sampler_statistics() -> StatsRegistry<SamplerStats> {
    StatsRegistry::<SamplerStats>::new()
        .add_double_attribute("sampleCount", "Camera samples taken", |s| s.sample_count as f64)
        .add_double_attribute("samplesPerPixel", "Samples per pixel", |s| {
            if s.pixel_count > 0 {
                s.sample_count as f64 / s.pixel_count as f64
            } else {
                0.0
            }
        })
        .add_double_attribute("samplesPerSecond", "Camera samples per second", |s| {
            if s.elapsed > 0.0 {
                s.sample_count as f64 / s.elapsed
            } else {
                0.0
            }
        })
        .add_double_attribute("secElapsed", "Rendering time (s)", |s| s.elapsed)
        .add_double_attribute("threadCount", "Render threads", |s| s.thread_count as f64)
        .add_double_attribute("haltSpp", "Samples per pixel limit", |s| s.halt_spp as f64)
}

/// Implements a renderer that path traces pixel samples on a pool of
/// worker threads.
pub struct SamplerRenderer {
    /// Parameters.
    config: SamplerConfig,

    /// Lifecycle state.
    control: Arc<RendererControl>,

    /// The render in progress.
    context: Mutex<Option<Arc<RenderContext>>>,

    /// Running worker threads.
    threads: Mutex<Vec<RenderThread>>,

    /// Removed worker threads not joined yet.
    retired: Mutex<Vec<JoinHandle<()>>>,

    /// Index of the next worker thread.
    next_thread_index: AtomicUsize,

    /// Samples received.
    sample_count: AtomicU64,

    /// Number of pixels of the current render.
    pixel_count: AtomicU64,

    /// Statistics attributes.
    registry: StatsRegistry<SamplerStats>,
}

impl SamplerRenderer {
    /// Create a new `SamplerRenderer`.
    ///
    /// * `config` - Parameters.
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            config,
            control: Arc::new(RendererControl::new()),
            context: Mutex::new(None),
            threads: Mutex::new(Vec::new()),
            retired: Mutex::new(Vec::new()),
            next_thread_index: AtomicUsize::new(0),
            sample_count: AtomicU64::new(0),
            pixel_count: AtomicU64::new(0),
            registry: sampler_statistics(),
        }
    }

    /// Returns the parameters.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Start another worker thread. Returns false when no render is in
    /// progress.
    pub fn add_render_thread(&self) -> bool {
        let context = self.lock_context();
        let Some(ctx) = context.as_ref() else {
            return false;
        };
        let thread_index = self.next_thread_index.fetch_add(1, Ordering::AcqRel);
        let stop = Arc::new(AtomicBool::new(false));
        let handle = {
            let ctx = Arc::clone(ctx);
            let stop = Arc::clone(&stop);
            thread::spawn(move || render_thread(ctx, thread_index, stop))
        };
        self.lock_threads().push(RenderThread {
            thread_index,
            stop,
            handle,
        });
        info!("Added render thread {thread_index}");
        true
    }

    /// Stop the most recently added worker thread. The last thread is never
    /// removed. Returns false if no thread was removed.
    pub fn remove_render_thread(&self) -> bool {
        let mut threads = self.lock_threads();
        if threads.len() <= 1 {
            return false;
        }
        let Some(t) = threads.pop() else {
            return false;
        };
        t.stop.store(true, Ordering::Release);
        info!("Removed render thread {}", t.thread_index);
        self.retired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(t.handle);
        true
    }

    /// Returns the number of running worker threads.
    pub fn thread_count(&self) -> usize {
        self.lock_threads().len()
    }

    /// Returns the statistics snapshot.
    pub fn stats_snapshot(&self) -> SamplerStats {
        SamplerStats {
            sample_count: self.sample_count.load(Ordering::Acquire),
            pixel_count: self.pixel_count.load(Ordering::Acquire),
            elapsed: self.control.elapsed().as_secs_f64(),
            thread_count: self.thread_count(),
            halt_spp: self.config.halt_spp,
        }
    }

    fn lock_context(&self) -> MutexGuard<'_, Option<Arc<RenderContext>>> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_threads(&self) -> MutexGuard<'_, Vec<RenderThread>> {
        self.threads.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Receive contributions until the render terminates.
    ///
    /// * `scene`    - The scene whose film is updated.
    /// * `receiver` - Contributions of the worker threads.
    /// * `limit`    - Total number of samples; `None` if not limited.
    /// * `sum`      - Radiance sum per pixel.
    /// * `count`    - Samples per pixel.
    fn accumulate(
        &self,
        scene: &Scene,
        receiver: &Receiver<Vec<Contribution>>,
        limit: Option<u64>,
        sum: &mut [Spectrum],
        count: &mut [u32],
    ) {
        let mut last_update = Instant::now();
        loop {
            match receiver.recv_timeout(POLL_INTERVAL) {
                Ok(batch) => self.add_contributions(batch, sum, count),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if limit.is_some_and(|l| self.sample_count.load(Ordering::Acquire) >= l) {
                info!("Sampler halt spp {} reached", self.config.halt_spp);
                self.control.terminate();
            }
            if self.control.state() == RendererState::Terminate {
                break;
            }
            if last_update.elapsed() >= FILM_UPDATE_INTERVAL {
                update_film(scene, sum, count);
                last_update = Instant::now();
            }
        }
    }

    fn add_contributions(&self, batch: Vec<Contribution>, sum: &mut [Spectrum], count: &mut [u32]) {
        let n = batch.len() as u64;
        for (pixel, l) in batch {
            sum[pixel] += l;
            count[pixel] += 1;
        }
        self.sample_count.fetch_add(n, Ordering::AcqRel);
    }
}

impl From<&ParamSet> for SamplerRenderer {
    /// Create `SamplerRenderer` from `ParamSet`.
    ///
    /// * `params` - Renderer parameters.
    fn from(params: &ParamSet) -> Self {
        Self::new(SamplerConfig::from(params))
    }
}

/// Set the film to the average of the samples of each pixel.
fn update_film(scene: &Scene, sum: &[Spectrum], count: &[u32]) {
    let img: Vec<Spectrum> = sum
        .iter()
        .zip(count.iter())
        .map(|(&s, &n)| if n > 0 { s / n as Float } else { Spectrum::ZERO })
        .collect();
    if let Err(err) = scene.film.set_image(&img) {
        error!("Unable to update film: {err}");
    }
}

impl Renderer for SamplerRenderer {
    fn renderer_type(&self) -> RendererType {
        RendererType::Sampler
    }

    fn state(&self) -> RendererState {
        self.control.state()
    }

    fn render(&self, scene: Arc<Scene>) -> Result<()> {
        let light_distr = if scene.film_only {
            Err(RenderError::FilmOnly)
        } else {
            compute_light_power_distribution(&scene.lights).ok_or(RenderError::NoLights)
        };
        let light_distr = match light_distr {
            Ok(d) => d,
            Err(err) => {
                error!("{err}");
                self.control.terminate();
                return Err(err);
            }
        };
        if !self.control.begin() {
            info!("Sampler renderer terminated before rendering started");
            return Ok(());
        }

        let pixel_count = scene.film.pixel_count();
        let limit = self.config.sample_limit(pixel_count);
        self.sample_count.store(0, Ordering::Release);
        self.pixel_count.store(pixel_count as u64, Ordering::Release);

        let (sender, receiver) = crossbeam_channel::unbounded();
        *self.lock_context() = Some(Arc::new(RenderContext {
            scene: Arc::clone(&scene),
            light_distr,
            integrator: PathIntegrator::new(self.config.max_depth),
            control: Arc::clone(&self.control),
            next_sample: AtomicU64::new(0),
            sample_limit: limit,
            pixel_count: pixel_count as u64,
            sender,
        }));

        let n_threads = self.config.thread_count();
        info!("Starting {n_threads} sampler threads for {pixel_count} pixels");
        for _ in 0..n_threads {
            self.add_render_thread();
        }

        let mut sum = vec![Spectrum::ZERO; pixel_count];
        let mut count = vec![0_u32; pixel_count];
        self.accumulate(&scene, &receiver, limit, &mut sum, &mut count);

        // No thread can be added once the context is gone.
        self.lock_context().take();
        let threads: Vec<RenderThread> = self.lock_threads().drain(..).collect();
        let retired: Vec<JoinHandle<()>> = self
            .retired
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for handle in threads.into_iter().map(|t| t.handle).chain(retired) {
            if handle.join().is_err() {
                error!("Render thread panicked");
            }
        }

        for batch in receiver.try_iter() {
            self.add_contributions(batch, &mut sum, &mut count);
        }
        update_film(&scene, &sum, &count);

        info!(
            "Sampler done: {} samples in {:.2}s",
            self.sample_count.load(Ordering::Acquire),
            self.control.elapsed().as_secs_f64()
        );
        Ok(())
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
        match self.registry.get(&self.stats_snapshot(), name) {
            Some(v) => v,
            None => {
                warn!("Unknown statistics attribute '{name}'");
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_scene::*;

    fn renderer(threads: i32, spp: i32) -> SamplerRenderer {
        let mut params = ParamSet::new();
        params.add_int("nthreads", threads).add_int("haltspp", spp);
        SamplerRenderer::from(&params)
    }

    fn wait_for_samples(r: &SamplerRenderer) {
        let start = Instant::now();
        while r.statistics("sampleCount") == 0.0 {
            assert!(start.elapsed() < Duration::from_secs(30), "no samples rendered");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn renders_until_halt_spp() {
        let r = renderer(2, 2);
        let scene = Arc::new(floor_scene(4, 4));
        r.render(Arc::clone(&scene)).unwrap();
        assert_eq!(r.state(), RendererState::Terminate);
        assert_eq!(r.statistics("sampleCount"), 32.0);
        assert_eq!(r.statistics("samplesPerPixel"), 2.0);
        assert_eq!(r.statistics("threadCount"), 0.0);

        let img = scene.film.image().unwrap();
        assert!(img.iter().any(|s| !s.is_black()));
        assert!(img.iter().all(|s| !s.has_nans()));
    }

    #[test]
    fn no_threads_added_outside_render() {
        let r = renderer(1, 1);
        assert!(!r.add_render_thread());
        assert!(!r.remove_render_thread());
    }

    #[test]
    fn add_and_remove_threads_while_rendering() {
        let r = renderer(1, 0);
        let scene = Arc::new(floor_scene(8, 8));
        thread::scope(|s| {
            let render = s.spawn(|| r.render(Arc::clone(&scene)));
            wait_for_samples(&r);

            assert!(r.add_render_thread());
            assert!(r.add_render_thread());
            assert_eq!(r.thread_count(), 3);
            assert!(r.remove_render_thread());
            assert!(r.remove_render_thread());
            assert!(!r.remove_render_thread());
            assert_eq!(r.statistics("threadCount"), 1.0);

            r.terminate();
            render.join().unwrap().unwrap();
        });
        assert_eq!(r.state(), RendererState::Terminate);
        assert!(!r.add_render_thread());
    }

    #[test]
    fn scene_without_lights_is_rejected() {
        let r = renderer(2, 1);
        let mut scene = floor_scene(4, 4);
        scene.lights.clear();
        assert!(matches!(r.render(Arc::new(scene)), Err(RenderError::NoLights)));
        assert_eq!(r.state(), RendererState::Terminate);
        assert_eq!(r.statistics("sampleCount"), 0.0);
    }
}
