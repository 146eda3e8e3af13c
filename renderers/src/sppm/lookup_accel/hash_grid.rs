//! Hash Grid

use super::*;

/// A spatially hashed uniform grid. Cells are twice the largest search
/// radius so a hit point overlaps at most 8 cells; each hit point is stored
/// in every cell its search sphere overlaps.
pub struct HashGrid {
    /// Hit points.
    entries: Vec<HitPointEntry>,

    /// Grid bounds; photons outside can not be within range of a hit point.
    bounds: Bounds3f,

    /// 1 / cell size.
    inv_cell_size: Float,

    /// Hashed cells holding indices into `entries`.
    grid: Vec<Vec<u32>>,
}

impl HashGrid {
    /// Build a new `HashGrid`.
    ///
    /// * `entries` - Surface hit points.
    pub fn new(entries: Vec<HitPointEntry>) -> Self {
        let (bounds, max_radius2) = entry_bounds(&entries);
        let max_radius = max_radius2.sqrt();
        if entries.is_empty() || !(max_radius > 0.0) {
            return Self {
                entries,
                bounds: Bounds3f::empty(),
                inv_cell_size: 0.0,
                grid: vec![],
            };
        }

        let bounds = bounds.expand(max_radius);
        let inv_cell_size = 1.0 / (2.0 * max_radius);
        let mut grid: Vec<Vec<u32>> = vec![vec![]; 2 * entries.len()];
        let hash_size = grid.len();

        for (slot, e) in entries.iter().enumerate() {
            let r = e.radius2.sqrt();
            let radius = Vector3f::new(r, r, r);
            let p_min = to_grid(&(e.position - radius), &bounds, inv_cell_size);
            let p_max = to_grid(&(e.position + radius), &bounds, inv_cell_size);
            for z in p_min.z..=p_max.z {
                for y in p_min.y..=p_max.y {
                    for x in p_min.x..=p_max.x {
                        // Colliding cells share a bucket; store each hit point once.
                        let cell = &mut grid[hash(&Point3i::new(x, y, z), hash_size)];
                        if cell.last() != Some(&(slot as u32)) {
                            cell.push(slot as u32);
                        }
                    }
                }
            }
        }

        let max_cell = grid.iter().map(|c| c.len()).max().unwrap_or(0);
        debug!("Hash grid: {} cells, largest holds {} hit points", hash_size, max_cell);

        Self {
            entries,
            bounds,
            inv_cell_size,
            grid,
        }
    }
}

impl LookUpAccel for HashGrid {
    fn lookup(&self, p: &Point3f, f: &mut dyn FnMut(usize)) {
        if self.grid.is_empty() || !self.bounds.inside(p) {
            return;
        }

        let cell = &self.grid[hash(&to_grid(p, &self.bounds, self.inv_cell_size), self.grid.len())];
        for &slot in cell.iter() {
            let e = &self.entries[slot as usize];
            if e.position.distance_squared(p) <= e.radius2 {
                f(e.index);
            }
        }
    }
}

/// Returns the coordinates of the cell that contains `p`.
///
/// * `p`             - The point.
/// * `bounds`        - Grid bounds.
/// * `inv_cell_size` - 1 / cell size.
#[inline]
fn to_grid(p: &Point3f, bounds: &Bounds3f, inv_cell_size: Float) -> Point3i {
    let d = *p - bounds.p_min;
    Point3i::new(
        (d.x * inv_cell_size).floor() as Int,
        (d.y * inv_cell_size).floor() as Int,
        (d.z * inv_cell_size).floor() as Int,
    )
}

/// Hashes the coordinates of a cell, returning an index into the grid.
///
/// * `p`         - Cell coordinates.
/// * `hash_size` - Number of cells.
#[inline(always)]
fn hash(p: &Point3i, hash_size: usize) -> usize {
    let (x, _) = p.x.overflowing_mul(73856093);
    let (y, _) = p.y.overflowing_mul(19349663);
    let (z, _) = p.z.overflowing_mul(83492791);

    (x ^ y ^ z) as u32 as usize % hash_size
}

#[cfg(test)]
mod tests {
    use super::super::tests::*;
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_grid_finds_nothing() {
        let grid = HashGrid::new(vec![]);
        let mut called = false;
        grid.lookup(&Point3f::zero(), &mut |_| called = true);
        assert!(!called);
    }

    #[test]
    fn points_outside_bounds_are_skipped() {
        let entries = random_entries(100, 0.05, 7);
        let grid = HashGrid::new(entries);
        let mut called = false;
        grid.lookup(&Point3f::new(5.0, 5.0, 5.0), &mut |_| called = true);
        assert!(!called);
    }

    proptest! {
        #[test]
        fn matches_brute_force(
            seed in 0u64..1000,
            x in -0.1f32..1.1,
            y in -0.1f32..1.1,
            z in -0.1f32..1.1,
        ) {
            let entries = random_entries(200, 0.1, seed);
            let grid = HashGrid::new(entries.clone());
            let p = Point3f::new(x, y, z);
            prop_assert_eq!(accel_hits(&grid, &entries, &p), brute_force(&entries, &p));
        }
    }
}
