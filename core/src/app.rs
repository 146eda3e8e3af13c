//! Application related stuff

use crate::paramset::*;
use crate::pbrt::*;
use clap::Parser;

/// Command line options.
#[derive(Parser, Clone, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Options {
    /// Number of threads to use for rendering.
    #[clap(
        long = "nthreads",
        short = 't',
        value_name = "NUM",
        default_value_t = 0,
        help = "Use specified number of threads for rendering (0 = one per logical CPU)."
    )]
    n_threads: usize,

    /// Suppress all text output other than error messages.
    #[clap(long, help = "Suppress all text output other than error messages.")]
    pub quiet: bool,

    /// Path to the image file.
    #[clap(
        long = "outfile",
        short = 'o',
        value_name = "FILE",
        default_value = "sppm.png",
        help = "Write the final image to the given filename."
    )]
    pub image_file: String,

    /// Renderer to use.
    #[clap(
        long,
        short = 'r',
        value_name = "NAME",
        default_value = "sppm",
        help = "Renderer: sppm or sampler."
    )]
    pub renderer: String,

    /// Built-in scene to render.
    #[clap(
        long,
        short = 's',
        value_name = "NAME",
        default_value = "cornell",
        help = "Built-in scene: cornell or spheres."
    )]
    pub scene: String,

    /// Image width.
    #[clap(long, value_name = "NUM", default_value_t = 256)]
    pub width: Int,

    /// Image height.
    #[clap(long, value_name = "NUM", default_value_t = 256)]
    pub height: Int,

    /// Number of passes after which the render stops.
    #[clap(long = "haltpasses", value_name = "NUM", default_value_t = 16)]
    pub halt_passes: Int,

    /// Number of seconds after which the render stops.
    #[clap(long = "halttime", value_name = "SECS", default_value_t = 0.0)]
    pub halt_time: Float,

    /// Samples per pixel after which the sampler renderer stops.
    #[clap(long = "haltspp", value_name = "NUM", default_value_t = 16)]
    pub halt_spp: Int,

    /// Photons traced per pass.
    #[clap(long = "photons", value_name = "NUM", default_value_t = 200_000)]
    pub photons_per_pass: Int,

    /// Photon sampler.
    #[clap(
        long = "photonsampler",
        value_name = "NAME",
        default_value = "halton",
        help = "Photon sampler: halton or amcmc."
    )]
    pub photon_sampler: String,

    /// Look-up accelerator for hit points.
    #[clap(
        long = "lookupaccel",
        value_name = "NAME",
        default_value = "hashgrid",
        help = "Hit point look-up accelerator: hashgrid or kdtree."
    )]
    pub lookup_accel: String,

    /// Seed base for the per-thread random streams.
    #[clap(long, value_name = "NUM", default_value_t = 1000)]
    pub seed: u64,
}

impl Options {
    /// Returns the number of threads to use.
    pub fn threads(&self) -> usize {
        let max_threads = num_cpus::get();
        match self.n_threads {
            0 => max_threads,
            n if n > max_threads => {
                warn!("Num threads > max logical CPUs {}", max_threads);
                n
            }
            n => n,
        }
    }

    /// Returns the renderer parameters described by the options.
    pub fn renderer_params(&self) -> ParamSet {
        let mut params = ParamSet::new();
        params
            .add_int("nthreads", self.threads() as Int)
            .add_int("haltpasses", self.halt_passes)
            .add_float("halttime", self.halt_time)
            .add_int("haltspp", self.halt_spp)
            .add_int("photonperpass", self.photons_per_pass)
            .add_string("photonsampler", self.photon_sampler.clone())
            .add_string("lookupaccel", self.lookup_accel.clone());
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_renderer_options() {
        let options = Options::parse_from([
            "sppm-rs",
            "-t",
            "2",
            "--haltpasses",
            "3",
            "--photonsampler",
            "amcmc",
        ]);
        assert_eq!(options.threads(), 2);

        let params = options.renderer_params();
        assert_eq!(params.find_one_int("haltpasses", 0), 3);
        assert_eq!(params.find_one_int("nthreads", 0), 2);
        assert_eq!(params.find_one_string("photonsampler", String::new()), "amcmc");
    }

    #[test]
    fn zero_threads_means_all_cpus() {
        let options = Options::parse_from(["sppm-rs"]);
        assert_eq!(options.threads(), num_cpus::get());
    }
}
