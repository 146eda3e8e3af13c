//! Hit Point Look-up Accelerators

mod hash_grid;
mod kd_tree;

use super::hitpoints::*;
use super::LookUpAccelType;
use sppm_core::error::*;
use sppm_core::geometry::*;
use sppm_core::pbrt::*;

// Re-export.
pub use hash_grid::*;
pub use kd_tree::*;

/// A surface hit point as seen by a look-up accelerator.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HitPointEntry {
    /// Index into the hit point table.
    pub index: usize,

    /// Position of the hit point.
    pub position: Point3f,

    /// Squared search radius.
    pub radius2: Float,
}

/// Finds the hit points whose search radius contains a point.
pub trait LookUpAccel: Send + Sync {
    /// Call `f` with the index of every hit point whose search sphere may
    /// contain `p`. May report extra candidates but never misses one.
    ///
    /// * `p` - Photon position.
    /// * `f` - Receives hit point indices.
    fn lookup(&self, p: &Point3f, f: &mut dyn FnMut(usize));
}

/// Create a look-up accelerator over a set of entries.
///
/// * `accel_type` - Accelerator type.
/// * `entries`    - Surface hit points.
pub fn create_lookup_accel(accel_type: LookUpAccelType, entries: Vec<HitPointEntry>) -> Box<dyn LookUpAccel> {
    match accel_type {
        LookUpAccelType::HashGrid => Box::new(HashGrid::new(entries)),
        LookUpAccelType::KdTree => Box::new(KdTree::new(entries)),
    }
}

/// The spatial index over the hit points of one eye pass. Rebuilt from
/// scratch after every eye pass; queries name the eye pass they expect and
/// are rejected when the index was built for another one.
pub struct SpatialIndex {
    /// Accelerator type.
    accel_type: LookUpAccelType,

    /// The accelerator; `None` until the first build.
    accel: Option<Box<dyn LookUpAccel>>,

    /// Eye pass generation the index was built for; 0 if never built.
    built_for: u32,

    /// Number of indexed hit points.
    entries: usize,
}

impl SpatialIndex {
    /// Create an empty index.
    ///
    /// * `accel_type` - Accelerator type.
    pub fn new(accel_type: LookUpAccelType) -> Self {
        Self {
            accel_type,
            accel: None,
            built_for: 0,
            entries: 0,
        }
    }

    /// Returns the accelerator type.
    pub fn accel_type(&self) -> LookUpAccelType {
        self.accel_type
    }

    /// Returns the eye pass generation the index was built for.
    pub fn built_for(&self) -> u32 {
        self.built_for
    }

    /// Returns the number of indexed hit points.
    pub fn len(&self) -> usize {
        self.entries
    }

    /// Returns true if no hit point is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }

    /// Discard the current index and build a new one over the surface hit
    /// points of the table.
    ///
    /// * `hit_points` - The hit point table.
    /// * `eye_pass`   - Eye pass generation the table was written by.
    pub fn refresh(&mut self, hit_points: &HitPointsView<'_>, eye_pass: u32) {
        let entries: Vec<HitPointEntry> = hit_points
            .iter()
            .filter(|(_, hp)| hp.eye_pass.kind == HitPointKind::Surface && hp.accum_photon_radius2 > 0.0)
            .map(|(index, hp)| HitPointEntry {
                index,
                position: hp.eye_pass.position,
                radius2: hp.accum_photon_radius2,
            })
            .collect();

        debug!(
            "Building {} index over {} of {} hit points for eye pass {}",
            self.accel_type,
            entries.len(),
            hit_points.len(),
            eye_pass
        );
        self.entries = entries.len();
        self.accel = Some(create_lookup_accel(self.accel_type, entries));
        self.built_for = eye_pass;
    }

    /// Call `f` with every candidate hit point around `p`.
    ///
    /// * `eye_pass` - Eye pass generation the caller works on.
    /// * `p`        - Photon position.
    /// * `f`        - Receives hit point indices.
    pub fn lookup(&self, eye_pass: u32, p: &Point3f, f: &mut dyn FnMut(usize)) -> Result<()> {
        match &self.accel {
            Some(accel) if self.built_for == eye_pass => {
                accel.lookup(p, f);
                Ok(())
            }
            _ => Err(RenderError::StaleIndex {
                built: self.built_for,
                requested: eye_pass,
            }),
        }
    }
}

/// Returns the bounds of the entries' positions and the largest radius.
fn entry_bounds(entries: &[HitPointEntry]) -> (Bounds3f, Float) {
    entries.iter().fold((Bounds3f::empty(), 0.0), |(b, r2), e| {
        (b.union_point(&e.position), max(r2, e.radius2))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sppm_core::rng::RNG;
    use std::num::NonZeroUsize;

    /// Random entries inside the unit cube.
    pub(super) fn random_entries(n: usize, radius: Float, seed: u64) -> Vec<HitPointEntry> {
        let mut rng = RNG::new(seed);
        (0..n)
            .map(|index| HitPointEntry {
                index,
                position: Point3f::new(rng.uniform_float(), rng.uniform_float(), rng.uniform_float()),
                radius2: radius * radius * (0.5 + 0.5 * rng.uniform_float()),
            })
            .collect()
    }

    /// Brute force reference.
    pub(super) fn brute_force(entries: &[HitPointEntry], p: &Point3f) -> Vec<usize> {
        let mut found: Vec<usize> = entries
            .iter()
            .filter(|e| e.position.distance_squared(p) <= e.radius2)
            .map(|e| e.index)
            .collect();
        found.sort_unstable();
        found
    }

    /// Candidates reported by an accelerator that really contain `p`.
    pub(super) fn accel_hits(accel: &dyn LookUpAccel, entries: &[HitPointEntry], p: &Point3f) -> Vec<usize> {
        let mut found = vec![];
        accel.lookup(p, &mut |i| {
            if entries[i].position.distance_squared(p) <= entries[i].radius2 {
                found.push(i);
            }
        });
        found.sort_unstable();
        found.dedup();
        found
    }

    #[test]
    fn never_built_index_rejects_queries() {
        let index = SpatialIndex::new(LookUpAccelType::HashGrid);
        let r = index.lookup(1, &Point3f::zero(), &mut |_| {});
        assert!(matches!(r, Err(RenderError::StaleIndex { built: 0, requested: 1 })));
    }

    #[test]
    fn stale_generation_is_rejected() {
        let table = HitPoints::new(4, NonZeroUsize::new(2).unwrap());
        let mut index = SpatialIndex::new(LookUpAccelType::KdTree);
        index.refresh(&table.read_all().unwrap(), 3);
        assert_eq!(index.built_for(), 3);
        assert!(index.is_empty());
        assert!(index.lookup(3, &Point3f::zero(), &mut |_| {}).is_ok());
        assert!(matches!(
            index.lookup(4, &Point3f::zero(), &mut |_| {}),
            Err(RenderError::StaleIndex { built: 3, requested: 4 })
        ));
    }

    #[test]
    fn only_surface_points_are_indexed() {
        let table = HitPoints::new(3, NonZeroUsize::new(1).unwrap());
        {
            let mut chunk = table.write_range(0).unwrap();
            chunk[0].eye_pass.kind = HitPointKind::Surface;
            chunk[0].accum_photon_radius2 = 1.0;
            chunk[1].eye_pass.kind = HitPointKind::ConstantColor;
            chunk[1].accum_photon_radius2 = 1.0;
        }
        let mut index = SpatialIndex::new(LookUpAccelType::HashGrid);
        index.refresh(&table.read_all().unwrap(), 1);
        assert_eq!(index.len(), 1);

        let mut found = vec![];
        index.lookup(1, &Point3f::new(0.1, 0.0, 0.0), &mut |i| found.push(i)).unwrap();
        assert_eq!(found, vec![0]);
    }
}
