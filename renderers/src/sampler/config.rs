//! Sampler Renderer Configuration

use sppm_core::paramset::*;
use sppm_core::pbrt::*;

/// Parameters of the sampler renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplerConfig {
    /// Maximum number of bounces of a camera path.
    pub max_depth: usize,

    /// Stop after this many samples per pixel; 0 renders until terminated.
    pub halt_spp: u32,

    /// Number of worker threads started with the render; 0 uses the
    /// hardware concurrency.
    pub n_threads: usize,
}

impl SamplerConfig {
    /// Returns the number of worker threads to start. Never 0.
    pub fn thread_count(&self) -> usize {
        if self.n_threads > 0 {
            self.n_threads
        } else {
            max(num_cpus::get(), 1)
        }
    }

    /// Returns the total number of samples to take or `None` when rendering
    /// is not limited.
    ///
    /// * `pixel_count` - Number of pixels of the film.
    pub fn sample_limit(&self, pixel_count: usize) -> Option<u64> {
        if self.halt_spp > 0 {
            Some(self.halt_spp as u64 * pixel_count as u64)
        } else {
            None
        }
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self::from(&ParamSet::new())
    }
}

impl From<&ParamSet> for SamplerConfig {
    /// Create `SamplerConfig` from `ParamSet`.
    ///
    /// * `params` - Renderer parameters.
    fn from(params: &ParamSet) -> Self {
        Self {
            max_depth: params.find_one_count("maxdepth", 5),
            halt_spp: params.find_one_int("haltspp", 0).max(0) as u32,
            n_threads: params.find_one_count("nthreads", 0),
        }
    }
}
