//! Built-in Scenes

use cameras::PerspectiveCamera;
use lights::{PointLight, QuadLight};
use materials::{MatteMaterial, MirrorMaterial};
use shapes::{Quad, Sphere};
use sppm_core::film::*;
use sppm_core::geometry::*;
use sppm_core::light::*;
use sppm_core::material::*;
use sppm_core::pbrt::*;
use sppm_core::primitive::*;
use sppm_core::primitives::*;
use sppm_core::scene::*;
use sppm_core::spectrum::*;
use std::sync::Arc;

/// Returns a built-in scene by name.
///
/// * `name`       - Scene name.
/// * `resolution` - Film resolution.
/// * `filename`   - Image file the film is written to.
/// * `seed_base`  - Base of the per-thread random seeds.
pub fn create_scene(name: &str, resolution: Point2i, filename: &str, seed_base: u64) -> Result<Scene, String> {
    if resolution.x <= 0 || resolution.y <= 0 {
        return Err(format!("Invalid resolution {}x{}.", resolution.x, resolution.y));
    }
    let film = Arc::new(Film::new(resolution, Some(filename.to_string())));
    let scene = match name {
        "cornell" => cornell_box(resolution, film),
        "spheres" => spheres(resolution, film),
        _ => return Err(format!("Unknown scene '{name}'.")),
    };
    Ok(scene.with_seed_base(seed_base))
}

fn quad(material: &ArcMaterial, p0: Point3f, u: Vector3f, v: Vector3f) -> ArcPrimitive {
    GeometricPrimitive::new(Arc::new(Quad::new(p0, u, v)), Arc::clone(material)).into_arc()
}

fn sphere(material: ArcMaterial, center: Point3f, radius: Float) -> ArcPrimitive {
    GeometricPrimitive::new(Arc::new(Sphere::new(center, radius)), material).into_arc()
}

/// A unit Cornell box with a mirror ball and a ceiling panel light.
fn cornell_box(resolution: Point2i, film: Arc<Film>) -> Scene {
    let white = MatteMaterial::arc(Spectrum::new(0.73));
    let red = MatteMaterial::arc(Spectrum::rgb(0.65, 0.05, 0.05));
    let green = MatteMaterial::arc(Spectrum::rgb(0.12, 0.45, 0.15));

    let x = Vector3f::new(1.0, 0.0, 0.0);
    let y = Vector3f::new(0.0, 1.0, 0.0);
    let z = Vector3f::new(0.0, 0.0, 1.0);
    let primitives = vec![
        quad(&white, Point3f::zero(), z, x),
        quad(&white, Point3f::new(0.0, 1.0, 0.0), x, z),
        quad(&white, Point3f::new(0.0, 0.0, 1.0), x, y),
        quad(&red, Point3f::zero(), y, z),
        quad(&green, Point3f::new(1.0, 0.0, 0.0), z, y),
        sphere(MirrorMaterial::arc(Spectrum::new(0.95)), Point3f::new(0.65, 0.2, 0.6), 0.2),
        sphere(Arc::clone(&white), Point3f::new(0.3, 0.15, 0.35), 0.15),
    ];

    // Faces down.
    let panel = Quad::new(
        Point3f::new(0.35, 0.99, 0.35),
        Vector3f::new(0.3, 0.0, 0.0),
        Vector3f::new(0.0, 0.0, 0.3),
    );
    let lights: Vec<ArcLight> = vec![QuadLight::arc(panel, Spectrum::new(15.0))];

    let camera = PerspectiveCamera::look_at(
        Point3f::new(0.5, 0.5, -1.4),
        Point3f::new(0.5, 0.5, 0.5),
        y,
        40.0,
        resolution,
    )
    .into_arc();

    Scene::new(Arc::new(PrimitiveList::new(primitives)), lights, camera, film)
}

/// Spheres on a matte ground plane lit by two point lights.
fn spheres(resolution: Point2i, film: Arc<Film>) -> Scene {
    let ground = MatteMaterial::arc(Spectrum::new(0.6));
    let primitives = vec![
        quad(
            &ground,
            Point3f::new(-4.0, 0.0, -4.0),
            Vector3f::new(0.0, 0.0, 8.0),
            Vector3f::new(8.0, 0.0, 0.0),
        ),
        sphere(MirrorMaterial::arc(Spectrum::new(0.9)), Point3f::new(-0.7, 0.5, 0.0), 0.5),
        sphere(MatteMaterial::arc(Spectrum::rgb(0.8, 0.3, 0.2)), Point3f::new(0.6, 0.4, 0.3), 0.4),
        sphere(MatteMaterial::arc(Spectrum::rgb(0.2, 0.4, 0.8)), Point3f::new(0.1, 0.25, -0.8), 0.25),
    ];
    let lights: Vec<ArcLight> = vec![
        PointLight::arc(Point3f::new(0.0, 3.0, 0.0), Spectrum::new(12.0)),
        PointLight::arc(Point3f::new(-2.0, 2.0, -2.0), Spectrum::rgb(4.0, 3.5, 3.0)),
    ];
    let camera = PerspectiveCamera::look_at(
        Point3f::new(0.0, 1.8, -4.0),
        Point3f::new(0.0, 0.4, 0.0),
        Vector3f::new(0.0, 1.0, 0.0),
        40.0,
        resolution,
    )
    .into_arc();

    Scene::new(Arc::new(PrimitiveList::new(primitives)), lights, camera, film)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_resolution_is_rejected() {
        for (w, h) in [(0, 4), (4, 0), (-1, 8)] {
            match create_scene("cornell", Point2i::new(w, h), "out.png", 0) {
                Err(err) => assert!(err.starts_with("Invalid resolution"), "{err}"),
                Ok(_) => panic!("{w}x{h} film accepted"),
            }
        }
    }

    #[test]
    fn built_in_scenes() {
        for name in ["cornell", "spheres"] {
            let scene = create_scene(name, Point2i::new(4, 4), "out.png", 7).unwrap();
            assert!(!scene.lights.is_empty());
            assert_eq!(scene.seed_base, 7);
            assert_eq!(scene.film.filename.as_deref(), Some("out.png"));
        }
        assert!(create_scene("teapot", Point2i::new(4, 4), "out.png", 7).is_err());
    }
}
