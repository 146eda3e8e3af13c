#[macro_use]
extern crate log;

mod scenes;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use renderers::sampler::*;
use renderers::sppm::*;
use scenes::*;
use sppm_core::app::*;
use sppm_core::geometry::*;
use sppm_core::renderer::*;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// How often the progress bar polls the renderer statistics.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

fn main() -> ExitCode {
    let options = Options::parse();

    // Initialize `env_logger`.
    let level = if options.quiet { "error" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match render(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns the renderer selected by the options.
///
/// * `options` - Command line options.
fn create_renderer(options: &Options) -> Result<ArcRenderer, String> {
    let params = options.renderer_params();
    match options.renderer.as_str() {
        "sppm" => Ok(Arc::new(SPPMRenderer::from(&params))),
        "sampler" => Ok(Arc::new(SamplerRenderer::from(&params))),
        name => Err(format!("Unknown renderer '{name}'.")),
    }
}

/// Render the selected scene and write the image.
///
/// * `options` - Command line options.
/// Returns the progress bar template; `{msg}` shows the render phase.
///
/// * `unit` - Unit of the progress position.
fn progress_template(unit: &str) -> String {
    format!("[{{elapsed_precise}}] {{bar:40.cyan/blue}} {{pos}}/{{len}} {unit} {{msg}}")
}

fn render(options: &Options) -> Result<(), String> {
    let resolution = Point2i::new(options.width, options.height);
    let scene = Arc::new(create_scene(
        &options.scene,
        resolution,
        &options.image_file,
        options.seed,
    )?);
    let renderer = create_renderer(options)?;

    // Progress is measured in passes or samples per pixel.
    let (statistic, limit, unit) = match renderer.renderer_type() {
        RendererType::Sppm => ("passCount", options.halt_passes, "passes"),
        RendererType::Sampler => ("samplesPerPixel", options.halt_spp, "spp"),
    };
    let progress = if options.quiet {
        ProgressBar::hidden()
    } else if limit > 0 {
        ProgressBar::new(limit as u64)
    } else {
        ProgressBar::new_spinner()
    };
    progress.set_style(
        ProgressStyle::with_template(&progress_template(unit)).unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    progress.set_message(format!("Rendering {} scene", options.scene));

    let result = thread::scope(|s| {
        let worker = s.spawn(|| renderer.render(Arc::clone(&scene)));
        while !worker.is_finished() {
            progress.set_position(renderer.statistics(statistic) as u64);
            thread::sleep(PROGRESS_INTERVAL);
        }
        worker.join()
    });
    progress.set_position(renderer.statistics(statistic) as u64);

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            progress.abandon_with_message("Render failed");
            return Err(e.to_string());
        }
        Err(_) => {
            progress.abandon_with_message("Render failed");
            return Err(String::from("Render thread panicked."));
        }
    }

    progress.set_message("Writing image");
    scene
        .film
        .write_image(&options.image_file)
        .map_err(|e| e.to_string())?;
    progress.finish_with_message("Render complete");

    info!(
        "Wrote '{}' after {:.2}s",
        options.image_file,
        renderer.statistics("secElapsed")
    );
    Ok(())
}
