//! Perspective Camera

use sppm_core::camera::*;
use sppm_core::geometry::*;
use sppm_core::pbrt::*;
use std::sync::Arc;

/// Pinhole perspective camera.
#[derive(Clone, Debug)]
pub struct PerspectiveCamera {
    /// Eye position.
    pub eye: Point3f,

    /// Unit viewing direction.
    forward: Vector3f,

    /// Image plane x axis scaled to the half-width at unit distance.
    right: Vector3f,

    /// Image plane y axis scaled to the half-height at unit distance.
    up: Vector3f,

    /// Film resolution in pixels.
    resolution: Point2i,
}

impl PerspectiveCamera {
    /// Create a new perspective camera looking from `eye` at `target`.
    ///
    /// * `eye`        - Eye position.
    /// * `target`     - Point the camera looks at.
    /// * `up`         - Approximate up direction.
    /// * `fov`        - The vertical field-of-view angle in degrees.
    /// * `resolution` - Film resolution in pixels.
    pub fn look_at(
        eye: Point3f,
        target: Point3f,
        up: Vector3f,
        fov: Float,
        resolution: Point2i,
    ) -> Self {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let true_up = right.cross(&forward);

        let half_height = (fov.to_radians() * 0.5).tan();
        let aspect = resolution.x as Float / resolution.y as Float;
        Self {
            eye,
            forward,
            right: right * (half_height * aspect),
            up: true_up * half_height,
            resolution,
        }
    }

    /// Wrap the camera for use in a scene.
    pub fn into_arc(self) -> ArcCamera {
        Arc::new(self)
    }
}

impl Camera for PerspectiveCamera {
    fn generate_ray(&self, sample: &CameraSample) -> (Ray, Float) {
        // Map raster space to [-1, 1]^2 with +y up.
        let sx = 2.0 * sample.p_film.x / self.resolution.x as Float - 1.0;
        let sy = 1.0 - 2.0 * sample.p_film.y / self.resolution.y as Float;
        let d = (self.forward + self.right * sx + self.up * sy).normalize();
        (Ray::new(self.eye, d), 1.0)
    }
}
