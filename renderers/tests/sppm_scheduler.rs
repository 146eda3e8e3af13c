//! Scheduler behaviour of the SPPM renderer: barriers, write sets, halt
//! decisions, index freshness, preconditions and faults.

mod common;

use common::*;
use renderers::sppm::*;
use sppm_core::error::*;
use sppm_core::paramset::*;
use sppm_core::pbrt::*;
use sppm_core::renderer::*;
use sppm_core::scene::*;
use sppm_core::spectrum::*;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

fn stat(r: &SPPMRenderer, name: &str) -> u64 {
    r.statistics(name) as u64
}

/// Records the hit point ranges written and the index generations checked.
#[derive(Default)]
struct Recorder {
    written: Mutex<Vec<(usize, u32, Phase, Range<usize>)>>,
    checked: Mutex<Vec<(usize, u32, u32, u32)>>,
    rebuild_delay: Option<Duration>,
}

impl PassObserver for Recorder {
    fn phase_started(&self, _thread_index: usize, _pass: u32, phase: Phase) {
        if phase == Phase::IndexRebuild {
            if let Some(delay) = self.rebuild_delay {
                thread::sleep(delay);
            }
        }
    }

    fn hit_points_written(&self, thread_index: usize, pass: u32, phase: Phase, range: Range<usize>) {
        self.written.lock().unwrap().push((thread_index, pass, phase, range));
    }

    fn index_checked(&self, thread_index: usize, pass: u32, built_for: u32, eye_pass: u32) {
        self.checked
            .lock()
            .unwrap()
            .push((thread_index, pass, built_for, eye_pass));
    }
}

/// Panics in one phase of one thread in one pass.
struct FaultInjector {
    thread_index: usize,
    pass: u32,
    phase: Phase,
}

impl PassObserver for FaultInjector {
    fn phase_started(&self, thread_index: usize, pass: u32, phase: Phase) {
        if thread_index == self.thread_index && pass == self.pass && phase == self.phase {
            panic!("injected fault");
        }
    }
}

/// Progressive shrink that remembers whether a radius ever grew.
struct CheckedShrink {
    inner: ProgressiveShrink,
    grew: AtomicBool,
    calls: AtomicU32,
}

impl RadiusShrink for CheckedShrink {
    fn shrink(&self, photon_count: Float, new_photons: u32) -> (Float, Float) {
        let (n, ratio) = self.inner.shrink(photon_count, new_photons);
        if ratio > 1.0 || n < photon_count {
            self.grew.store(true, Ordering::SeqCst);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        (n, ratio)
    }
}

#[test]
fn thread_count_does_not_change_totals() {
    for threads in [1, 4, 16] {
        let r = SPPMRenderer::from(&quick_params(threads, 2));
        r.render(lit_scene(8)).unwrap();

        assert_eq!(r.state(), RendererState::Terminate);
        assert_eq!(stat(&r, "passCount"), 2, "{threads} threads");
        assert_eq!(stat(&r, "photonCount"), 2000, "{threads} threads");
        assert_eq!(stat(&r, "eyeSampleCount"), 2 * 64, "{threads} threads");
        assert_eq!(stat(&r, "threadCount"), threads as u64);

        // Five barriers per pass, each crossed by every thread.
        let crossings = stat(&r, "barrierCrossings");
        assert_eq!(crossings, 5 * 2, "{threads} threads");
        assert_eq!(stat(&r, "barrierArrivals"), threads as u64 * crossings);
    }
}

#[test]
fn halts_after_three_passes_with_four_threads() {
    let r = SPPMRenderer::from(&quick_params(4, 3));
    r.render(lit_scene(8)).unwrap();
    assert_eq!(r.state(), RendererState::Terminate);
    assert_eq!(r.pass_state().current_pass, 3);
    assert_eq!(stat(&r, "passCount"), 3);
    assert_eq!(stat(&r, "remainingPasses"), 0);
    assert_eq!(stat(&r, "percentHaltPassesComplete"), 100);
}

#[test]
fn hit_point_write_sets_are_disjoint() {
    let threads = 4;
    let recorder = Arc::new(Recorder::default());
    let r = SPPMRenderer::from(&quick_params(threads as i32, 2)).with_observer(recorder.clone());
    r.render(lit_scene(7)).unwrap();

    let written = recorder.written.lock().unwrap();
    let mut by_step: HashMap<(u32, Phase), Vec<(usize, Range<usize>)>> = HashMap::new();
    for (thread_index, pass, phase, range) in written.iter().cloned() {
        by_step.entry((pass, phase)).or_default().push((thread_index, range));
    }
    assert_eq!(by_step.len(), 2 * 2);

    let mut owned: HashMap<usize, Range<usize>> = HashMap::new();
    for ((pass, phase), mut ranges) in by_step {
        assert_eq!(ranges.len(), threads, "pass {pass} {phase}");
        let writers: HashSet<usize> = ranges.iter().map(|(t, _)| *t).collect();
        assert_eq!(writers.len(), threads);

        // Sorted ranges must tile the table without gaps or overlaps.
        ranges.sort_by_key(|(_, range)| range.start);
        let mut next = 0;
        for (thread_index, range) in ranges {
            assert_eq!(range.start, next, "pass {pass} {phase}");
            next = range.end;

            // A thread always writes the same range.
            let prev = owned.entry(thread_index).or_insert_with(|| range.clone());
            assert_eq!(*prev, range);
        }
        assert_eq!(next, 49);
    }
}

#[test]
fn delayed_rebuild_never_exposes_stale_index() {
    let threads = 4;
    let recorder = Arc::new(Recorder {
        rebuild_delay: Some(Duration::from_millis(30)),
        ..Default::default()
    });
    let r = SPPMRenderer::from(&quick_params(threads, 3)).with_observer(recorder.clone());
    r.render(lit_scene(8)).unwrap();

    let checked = recorder.checked.lock().unwrap();
    assert_eq!(checked.len(), threads as usize * 3);
    for &(thread_index, pass, built_for, eye_pass) in checked.iter() {
        assert_eq!(built_for, eye_pass, "thread {thread_index} pass {pass}");
        assert_eq!(eye_pass, pass + 1);
    }
}

#[test]
fn radius_never_grows_during_render() {
    let shrink = Arc::new(CheckedShrink {
        inner: ProgressiveShrink::new(0.7),
        grew: AtomicBool::new(false),
        calls: AtomicU32::new(0),
    });

    struct Shared(Arc<CheckedShrink>);
    impl RadiusShrink for Shared {
        fn shrink(&self, photon_count: Float, new_photons: u32) -> (Float, Float) {
            self.0.shrink(photon_count, new_photons)
        }
    }

    let r = SPPMRenderer::from(&quick_params(4, 4)).with_radius_shrink(Box::new(Shared(shrink.clone())));
    r.render(lit_scene(8)).unwrap();
    assert!(shrink.calls.load(Ordering::SeqCst) > 0);
    assert!(!shrink.grew.load(Ordering::SeqCst));
}

#[test]
fn scene_without_lights_starts_no_threads() {
    let r = SPPMRenderer::from(&quick_params(4, 3));
    let scene = Arc::new(floor_scene(8, vec![]));
    assert!(matches!(r.render(scene), Err(RenderError::NoLights)));
    assert_eq!(r.state(), RendererState::Terminate);
    assert_eq!(stat(&r, "threadCount"), 0);
    assert_eq!(stat(&r, "passCount"), 0);
    assert_eq!(stat(&r, "barrierArrivals"), 0);
}

#[test]
fn film_only_scene_is_not_rendered() {
    let r = SPPMRenderer::from(&quick_params(4, 3));
    let scene = Scene::clone(&lit_scene(8)).into_film_only();
    assert!(matches!(r.render(Arc::new(scene)), Err(RenderError::FilmOnly)));
    assert_eq!(r.state(), RendererState::Terminate);
    assert_eq!(stat(&r, "passCount"), 0);
}

#[test]
fn invalid_sampler_and_accel_are_rejected() {
    let mut params = quick_params(2, 1);
    params.add_string("photonsampler", String::from("metropolis"));
    let r = SPPMRenderer::from(&params);
    match r.render(lit_scene(4)) {
        Err(RenderError::InvalidSampler(name)) => assert_eq!(name, "metropolis"),
        other => panic!("unexpected result {other:?}"),
    }
    assert_eq!(r.state(), RendererState::Terminate);
    assert_eq!(stat(&r, "threadCount"), 0);

    let mut params = quick_params(2, 1);
    params.add_string("lookupaccel", String::from("octree"));
    let r = SPPMRenderer::from(&params);
    assert!(matches!(r.render(lit_scene(4)), Err(RenderError::InvalidAccel(_))));
    assert_eq!(r.state(), RendererState::Terminate);
}

#[test]
fn fault_in_one_thread_terminates_cleanly() {
    let threads = 4;
    let injector = Arc::new(FaultInjector {
        thread_index: 2,
        pass: 1,
        phase: Phase::PhotonPass,
    });
    let r = SPPMRenderer::from(&quick_params(threads, 10)).with_observer(injector);
    match r.render(lit_scene(8)) {
        Err(RenderError::ThreadFault { thread, phase, message }) => {
            assert_eq!(thread, 2);
            assert_eq!(phase, "photon pass");
            assert_eq!(message, "injected fault");
        }
        other => panic!("unexpected result {other:?}"),
    }

    // The faulting pass still crosses every barrier.
    assert_eq!(r.state(), RendererState::Terminate);
    assert_eq!(stat(&r, "passCount"), 2);
    let crossings = stat(&r, "barrierCrossings");
    assert_eq!(crossings, 5 * 2);
    assert_eq!(stat(&r, "barrierArrivals"), threads as u64 * crossings);
}

/// Panics in one thread's eye pass and keeps the film as the leader sees it
/// at every halt check, before the pass reaches the film.
struct EyePassFault {
    scene: Arc<Scene>,
    thread_index: usize,
    pass: u32,
    films: Mutex<HashMap<u32, Vec<Spectrum>>>,
}

impl PassObserver for EyePassFault {
    fn phase_started(&self, thread_index: usize, pass: u32, phase: Phase) {
        if phase == Phase::HaltCheck {
            let image = self.scene.film.image().unwrap();
            self.films.lock().unwrap().insert(pass, image);
        }
        if phase == Phase::EyePass && thread_index == self.thread_index && pass == self.pass {
            panic!("injected fault");
        }
    }
}

#[test]
fn eye_pass_fault_keeps_last_clean_image() {
    let scene = lit_scene(8);
    let observer = Arc::new(EyePassFault {
        scene: Arc::clone(&scene),
        thread_index: 3,
        pass: 2,
        films: Mutex::new(HashMap::new()),
    });
    let r = SPPMRenderer::from(&quick_params(4, 10)).with_observer(observer.clone());
    match r.render(Arc::clone(&scene)) {
        Err(RenderError::ThreadFault { thread, phase, .. }) => {
            assert_eq!(thread, 3);
            assert_eq!(phase, "eye pass");
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert_eq!(r.state(), RendererState::Terminate);

    // Nothing traced after the fault: no photons for the faulted pass.
    assert_eq!(stat(&r, "photonCount"), 2 * 1000);
    assert_eq!(stat(&r, "passCount"), 3);

    let films = observer.films.lock().unwrap();
    let last_clean = films.get(&2).unwrap();
    assert!(last_clean.iter().any(|s| !s.is_black()));
    assert_eq!(&scene.film.image().unwrap(), last_clean);
}

#[test]
fn halt_check_fault_terminates_cleanly() {
    let threads = 4;
    let injector = Arc::new(FaultInjector {
        thread_index: 0,
        pass: 1,
        phase: Phase::HaltCheck,
    });
    let r = SPPMRenderer::from(&quick_params(threads, 10)).with_observer(injector);
    match r.render(lit_scene(8)) {
        Err(RenderError::ThreadFault { thread, phase, .. }) => {
            assert_eq!(thread, 0);
            assert_eq!(phase, "halt check");
        }
        other => panic!("unexpected result {other:?}"),
    }
    assert_eq!(r.state(), RendererState::Terminate);
    assert_eq!(stat(&r, "barrierCrossings"), 5 * 2);
    assert_eq!(stat(&r, "barrierArrivals"), threads as u64 * 5 * 2);
}

#[test]
fn huge_halt_time_still_halts_on_passes() {
    let mut params = quick_params(2, 2);
    params.add_float("halttime", 1e20);
    let r = SPPMRenderer::from(&params);
    r.render(lit_scene(8)).unwrap();
    assert_eq!(r.state(), RendererState::Terminate);
    assert_eq!(stat(&r, "passCount"), 2);
    assert_eq!(stat(&r, "percentHaltTimeComplete"), 0);
}

#[test]
fn leader_fault_during_rebuild_terminates_cleanly() {
    let injector = Arc::new(FaultInjector {
        thread_index: 0,
        pass: 0,
        phase: Phase::IndexRebuild,
    });
    let r = SPPMRenderer::from(&quick_params(4, 10)).with_observer(injector);
    assert!(r.render(lit_scene(8)).is_err());
    assert_eq!(r.state(), RendererState::Terminate);
    assert_eq!(stat(&r, "passCount"), 1);
}

#[test]
fn pause_resume_and_terminate_from_another_thread() {
    let r = SPPMRenderer::from(&quick_params(4, 0));
    let scene = lit_scene(8);

    let wait_for = |pred: &dyn Fn() -> bool| {
        let start = Instant::now();
        while !pred() {
            assert!(start.elapsed() < Duration::from_secs(30), "timed out");
            thread::sleep(Duration::from_millis(5));
        }
    };

    thread::scope(|s| {
        let render = s.spawn(|| r.render(Arc::clone(&scene)));
        wait_for(&|| r.state() == RendererState::Run && stat(&r, "passCount") >= 1);

        r.pause();
        r.pause();
        assert_eq!(r.state(), RendererState::Pause);

        // The pass in progress completes, then the workers park.
        thread::sleep(Duration::from_millis(100));
        let parked = stat(&r, "passCount");
        thread::sleep(Duration::from_millis(100));
        assert_eq!(stat(&r, "passCount"), parked);

        r.resume();
        assert_eq!(r.state(), RendererState::Run);
        wait_for(&|| stat(&r, "passCount") > parked);

        r.terminate();
        r.terminate();
        render.join().unwrap().unwrap();
    });

    assert_eq!(r.state(), RendererState::Terminate);
    r.resume();
    assert_eq!(r.state(), RendererState::Terminate);
}

#[test]
fn terminate_while_paused_releases_workers() {
    let r = SPPMRenderer::from(&quick_params(4, 0));
    let scene = lit_scene(8);
    thread::scope(|s| {
        let render = s.spawn(|| r.render(Arc::clone(&scene)));
        let start = Instant::now();
        while stat(&r, "passCount") == 0 {
            assert!(start.elapsed() < Duration::from_secs(30), "timed out");
            thread::sleep(Duration::from_millis(5));
        }
        r.pause();
        thread::sleep(Duration::from_millis(50));
        r.terminate();
        render.join().unwrap().unwrap();
    });
    assert_eq!(r.state(), RendererState::Terminate);
    let crossings = stat(&r, "barrierCrossings");
    assert_eq!(stat(&r, "barrierArrivals"), 4 * crossings);
}

#[test]
fn halts_after_time_limit() {
    let mut params = quick_params(2, 0);
    params.add_float("halttime", 0.2);
    let r = SPPMRenderer::from(&params);
    r.render(lit_scene(8)).unwrap();
    assert_eq!(r.state(), RendererState::Terminate);
    assert!(r.statistics("secElapsed") >= 0.2);
    assert!(stat(&r, "passCount") >= 1);
}

#[test]
fn amcmc_sampler_with_kd_tree() {
    let mut params = quick_params(4, 3);
    params
        .add_string("photonsampler", String::from("amcmc"))
        .add_string("lookupaccel", String::from("kdtree"));
    let r = SPPMRenderer::from(&params);
    let scene = area_lit_scene(8);
    r.render(Arc::clone(&scene)).unwrap();

    assert_eq!(stat(&r, "photonCount"), 3000);
    assert!(r.get_scale_factor(PhotonSamplerType::Amcmc) > 0.0);
    let img = scene.film.image().unwrap();
    assert!(img.iter().any(|s| !s.is_black()));
    assert!(img.iter().all(|s| !s.has_nans()));
}

#[test]
fn renders_are_independent() {
    let a = SPPMRenderer::from(&quick_params(2, 1));
    let b = SPPMRenderer::from(&quick_params(2, 2));
    thread::scope(|s| {
        s.spawn(|| a.render(lit_scene(4)).unwrap());
        s.spawn(|| b.render(lit_scene(4)).unwrap());
    });
    assert_eq!(stat(&a, "passCount"), 1);
    assert_eq!(stat(&b, "passCount"), 2);
}

#[test]
fn params_reach_the_renderer() {
    let mut params = ParamSet::new();
    params.add_int("haltpasses", 5).add_float("alpha", 0.5);
    let r = SPPMRenderer::from(&params);
    assert_eq!(r.config().halt_passes, 5);
    assert_eq!(r.config().photon_alpha, 0.5);
    assert_eq!(r.renderer_type(), RendererType::Sppm);
    assert_eq!(r.state(), RendererState::Init);
}
