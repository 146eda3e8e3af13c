//! Renderer
//!
//! Lifecycle shared by every worker-pool renderer. A renderer moves through
//! `Init -> Run <-> Pause -> Terminate`; `Terminate` is final.

mod control;
mod timer;

use crate::error::*;
use crate::scene::Scene;
use std::fmt;
use std::sync::Arc;

// Re-export.
pub use control::*;
pub use timer::*;

/// Lifecycle state of a renderer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RendererState {
    /// Created, not rendering yet.
    #[default]
    Init,

    /// Worker threads are rendering.
    Run,

    /// Worker threads are parked at their next checkpoint.
    Pause,

    /// Rendering has stopped for good.
    Terminate,
}

impl fmt::Display for RendererState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Init => "INIT",
            Self::Run => "RUN",
            Self::Pause => "PAUSE",
            Self::Terminate => "TERMINATE",
        };
        write!(f, "{s}")
    }
}

/// The available renderers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RendererType {
    /// Stochastic progressive photon mapping.
    Sppm,

    /// Per-pixel sampling with a path tracing integrator.
    Sampler,
}

/// Renderer interface. All methods except `render` may be called from any
/// thread while a render is in progress.
pub trait Renderer: Send + Sync {
    /// Returns the renderer type.
    fn renderer_type(&self) -> RendererType;

    /// Returns the current lifecycle state.
    fn state(&self) -> RendererState;

    /// Render the scene. Blocks until the render terminates. Invalid scenes
    /// are rejected before any worker thread starts; the renderer still ends
    /// in `Terminate`.
    ///
    /// * `scene` - The scene.
    fn render(&self, scene: Arc<Scene>) -> Result<()>;

    /// Ask the workers to park at their next checkpoint.
    fn pause(&self);

    /// Release paused workers.
    fn resume(&self);

    /// Stop rendering. Irreversible.
    fn terminate(&self);

    /// Returns a named statistic. Unknown names return 0.
    ///
    /// * `name` - Statistic name.
    fn statistics(&self, name: &str) -> f64;
}

/// Atomic reference counted `Renderer`.
pub type ArcRenderer = Arc<dyn Renderer>;
