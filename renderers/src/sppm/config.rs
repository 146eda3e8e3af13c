//! SPPM Configuration

use sppm_core::error::*;
use sppm_core::paramset::*;
use sppm_core::pbrt::*;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Spatial index used to find the hit points around a photon.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LookUpAccelType {
    /// Uniform hash grid with cells twice the largest search radius.
    HashGrid,

    /// Median split kd-tree.
    KdTree,
}

impl FromStr for LookUpAccelType {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hashgrid" => Ok(Self::HashGrid),
            "kdtree" => Ok(Self::KdTree),
            _ => Err(RenderError::InvalidAccel(s.to_string())),
        }
    }
}

impl fmt::Display for LookUpAccelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HashGrid => write!(f, "hashgrid"),
            Self::KdTree => write!(f, "kdtree"),
        }
    }
}

/// Strategy used to generate photon paths.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PhotonSamplerType {
    /// Randomized Halton sequence.
    Halton,

    /// Adaptive Markov chain Monte Carlo over visible photon paths.
    Amcmc,
}

impl FromStr for PhotonSamplerType {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "halton" => Ok(Self::Halton),
            "amcmc" => Ok(Self::Amcmc),
            _ => Err(RenderError::InvalidSampler(s.to_string())),
        }
    }
}

impl fmt::Display for PhotonSamplerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Halton => write!(f, "halton"),
            Self::Amcmc => write!(f, "amcmc"),
        }
    }
}

/// Parameters of the SPPM renderer.
#[derive(Clone, Debug, PartialEq)]
pub struct SPPMConfig {
    /// Maximum number of bounces of an eye path.
    pub max_eye_path_depth: usize,

    /// Maximum number of bounces of a photon path.
    pub max_photon_path_depth: usize,

    /// Number of photons traced by all threads together in one pass.
    pub photons_per_pass: u64,

    /// Scale applied to the scene size derived initial search radius.
    pub photon_start_radius_scale: Float,

    /// Fraction of new photons kept when the radius shrinks.
    pub photon_alpha: Float,

    /// Name of the spatial index. Validated when rendering starts.
    pub lookup_accel: String,

    /// Name of the photon sampler. Validated when rendering starts.
    pub photon_sampler: String,

    /// Whether eye paths escaping directly from the camera see the
    /// environment.
    pub include_environment: bool,

    /// Stop after this many passes; 0 disables the limit.
    pub halt_passes: u32,

    /// Stop after this many seconds; 0 disables the limit.
    pub halt_time: Float,

    /// Write the film every this many passes; 0 only writes at the end.
    pub write_frequency: u32,

    /// Number of worker threads; 0 uses the hardware concurrency.
    pub n_threads: usize,
}

impl SPPMConfig {
    /// Returns the number of worker threads to start. Never 0.
    pub fn thread_count(&self) -> usize {
        if self.n_threads > 0 {
            self.n_threads
        } else {
            max(num_cpus::get(), 1)
        }
    }

    /// Returns the time limit or `None` when rendering is not time limited.
    pub fn halt_duration(&self) -> Option<Duration> {
        if self.halt_time > 0.0 {
            Duration::try_from_secs_f32(self.halt_time).ok()
        } else {
            None
        }
    }
}

impl Default for SPPMConfig {
    fn default() -> Self {
        Self::from(&ParamSet::new())
    }
}

impl From<&ParamSet> for SPPMConfig {
    /// Create `SPPMConfig` from `ParamSet`.
    ///
    /// * `params` - Renderer parameters.
    fn from(params: &ParamSet) -> Self {
        let max_eye_path_depth = params.find_one_count("maxeyedepth", 16);
        let max_photon_path_depth = params.find_one_count("maxphotondepth", 16);
        let photons_per_pass = params.find_one_int("photonperpass", 1_000_000).max(1) as u64;
        let photon_start_radius_scale = params.find_one_float("startradius", 2.0);
        let photon_alpha = params.find_one_float("alpha", 0.7);
        let lookup_accel = params.find_one_string("lookupaccel", String::from("hashgrid"));
        let photon_sampler = params.find_one_string("photonsampler", String::from("halton"));
        let include_environment = params.find_one_bool("includeenvironment", true);
        let halt_passes = params.find_one_int("haltpasses", 0).max(0) as u32;
        let mut halt_time = params.find_one_float("halttime", 0.0);
        let write_frequency = params.find_one_int("writefrequency", 0).max(0) as u32;
        let n_threads = params.find_one_count("nthreads", 0);

        if !(halt_time >= 0.0) || (halt_time > 0.0 && Duration::try_from_secs_f32(halt_time).is_err()) {
            warn!("Halt time {halt_time}s out of range; rendering without a time limit.");
            halt_time = 0.0;
        }
        if !(photon_alpha > 0.0 && photon_alpha <= 1.0) {
            warn!("Photon alpha {photon_alpha} outside (0, 1]; clamping.");
        }

        Self {
            max_eye_path_depth,
            max_photon_path_depth,
            photons_per_pass,
            photon_start_radius_scale,
            photon_alpha: clamp(photon_alpha, 0.01, 1.0),
            lookup_accel,
            photon_sampler,
            include_environment,
            halt_passes,
            halt_time,
            write_frequency,
            n_threads,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SPPMConfig::default();
        assert_eq!(config.max_eye_path_depth, 16);
        assert_eq!(config.max_photon_path_depth, 16);
        assert_eq!(config.photons_per_pass, 1_000_000);
        assert_eq!(config.photon_alpha, 0.7);
        assert_eq!(config.lookup_accel, "hashgrid");
        assert_eq!(config.photon_sampler, "halton");
        assert!(config.include_environment);
        assert_eq!(config.halt_passes, 0);
        assert!(config.halt_duration().is_none());
        assert!(config.thread_count() >= 1);
    }

    #[test]
    fn from_params() {
        let mut params = ParamSet::new();
        params
            .add_int("photonperpass", 500)
            .add_int("haltpasses", 3)
            .add_float("halttime", 1.5)
            .add_string("photonsampler", String::from("amcmc"))
            .add_string("lookupaccel", String::from("kdtree"))
            .add_int("nthreads", 4);
        let config = SPPMConfig::from(&params);
        assert_eq!(config.photons_per_pass, 500);
        assert_eq!(config.halt_passes, 3);
        assert_eq!(config.halt_duration(), Some(Duration::from_millis(1500)));
        assert_eq!(config.thread_count(), 4);
        assert_eq!(
            config.photon_sampler.parse::<PhotonSamplerType>().unwrap(),
            PhotonSamplerType::Amcmc
        );
        assert_eq!(
            config.lookup_accel.parse::<LookUpAccelType>().unwrap(),
            LookUpAccelType::KdTree
        );
    }

    #[test]
    fn out_of_range_halt_time_disables_the_limit() {
        for halt_time in [1e20, Float::INFINITY, Float::NAN, -3.0] {
            let mut params = ParamSet::new();
            params.add_float("halttime", halt_time);
            let config = SPPMConfig::from(&params);
            assert_eq!(config.halt_time, 0.0, "halttime {halt_time}");
            assert!(config.halt_duration().is_none());
        }

        let config = SPPMConfig {
            halt_time: Float::MAX,
            ..Default::default()
        };
        assert!(config.halt_duration().is_none());
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(matches!(
            "metropolis".parse::<PhotonSamplerType>(),
            Err(RenderError::InvalidSampler(name)) if name == "metropolis"
        ));
        assert!(matches!(
            "bvh".parse::<LookUpAccelType>(),
            Err(RenderError::InvalidAccel(_))
        ));
    }
}
