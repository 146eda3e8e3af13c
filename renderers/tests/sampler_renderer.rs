//! The sampler renderer shares the lifecycle of the SPPM renderer.

mod common;

use common::*;
use renderers::sampler::*;
use sppm_core::error::*;
use sppm_core::paramset::*;
use sppm_core::renderer::*;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

fn sampler(threads: i32, spp: i32) -> SamplerRenderer {
    let mut params = ParamSet::new();
    params
        .add_int("nthreads", threads)
        .add_int("haltspp", spp)
        .add_int("maxdepth", 3);
    SamplerRenderer::from(&params)
}

#[test]
fn renders_area_lit_scene() {
    let r = sampler(4, 4);
    let scene = area_lit_scene(8);
    r.render(Arc::clone(&scene)).unwrap();

    assert_eq!(r.state(), RendererState::Terminate);
    assert_eq!(r.renderer_type(), RendererType::Sampler);
    assert_eq!(r.statistics("sampleCount"), 4.0 * 64.0);
    assert_eq!(r.statistics("samplesPerPixel"), 4.0);

    let img = scene.film.image().unwrap();
    assert!(img.iter().any(|s| !s.is_black()));
    assert!(img.iter().all(|s| !s.has_nans()));
}

#[test]
fn film_only_scene_is_not_rendered() {
    let r = sampler(2, 1);
    let scene = sppm_core::scene::Scene::clone(&lit_scene(4)).into_film_only();
    assert!(matches!(r.render(Arc::new(scene)), Err(RenderError::FilmOnly)));
    assert_eq!(r.state(), RendererState::Terminate);
}

#[test]
fn pause_stops_sampling() {
    let r = sampler(2, 0);
    let scene = lit_scene(16);
    thread::scope(|s| {
        let render = s.spawn(|| r.render(Arc::clone(&scene)));
        let start = Instant::now();
        while r.statistics("sampleCount") == 0.0 {
            assert!(start.elapsed() < Duration::from_secs(30), "timed out");
            thread::sleep(Duration::from_millis(5));
        }

        r.pause();
        assert_eq!(r.state(), RendererState::Pause);
        thread::sleep(Duration::from_millis(200));
        let parked = r.statistics("sampleCount");
        thread::sleep(Duration::from_millis(200));
        assert_eq!(r.statistics("sampleCount"), parked);

        r.resume();
        r.terminate();
        render.join().unwrap().unwrap();
    });
    assert_eq!(r.state(), RendererState::Terminate);
}
