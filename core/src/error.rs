//! Errors

/// Errors raised while setting up or running a render.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("No light sources defined in scene; nothing to render.")]
    NoLights,

    #[error("Scene is film only; nothing to render.")]
    FilmOnly,

    #[error("Invalid photon sampler: {0}")]
    InvalidSampler(String),

    #[error("Invalid look-up accelerator: {0}")]
    InvalidAccel(String),

    #[error("Spatial index built for eye pass {built} queried for eye pass {requested}")]
    StaleIndex { built: u32, requested: u32 },

    #[error("Lock poisoned: {0}")]
    Poisoned(&'static str),

    #[error("Thread {thread} failed in {phase}: {message}")]
    ThreadFault {
        thread: usize,
        phase: String,
        message: String,
    },

    #[error("Image error: {0}")]
    Image(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        Self::Image(err.to_string())
    }
}

/// Convenience alias for results of render operations.
pub type Result<T> = std::result::Result<T, RenderError>;
