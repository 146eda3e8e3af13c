//! Kd-Tree

use super::*;

/// A balanced kd-tree stored implicitly in an array. The node of the range
/// `[lo, hi)` is at `(lo + hi) / 2`; its left subtree is `[lo, mid)` and its
/// right subtree is `[mid + 1, hi)`.
pub struct KdTree {
    /// Hit points in tree order.
    nodes: Vec<HitPointEntry>,

    /// Split axis of each node.
    axes: Vec<u8>,

    /// Largest squared search radius.
    max_radius2: Float,
}

impl KdTree {
    /// Build a new `KdTree`.
    ///
    /// * `entries` - Surface hit points.
    pub fn new(mut entries: Vec<HitPointEntry>) -> Self {
        let (_, max_radius2) = entry_bounds(&entries);
        let mut axes = vec![0; entries.len()];
        build(&mut entries, &mut axes);
        Self {
            nodes: entries,
            axes,
            max_radius2,
        }
    }

    fn visit(&self, lo: usize, hi: usize, p: &Point3f, f: &mut dyn FnMut(usize)) {
        if lo >= hi {
            return;
        }
        let mid = (lo + hi) / 2;
        let node = &self.nodes[mid];
        if node.position.distance_squared(p) <= node.radius2 {
            f(node.index);
        }

        let axis = self.axes[mid] as usize;
        let d = p[axis] - node.position[axis];
        let (near, far) = if d <= 0.0 {
            ((lo, mid), (mid + 1, hi))
        } else {
            ((mid + 1, hi), (lo, mid))
        };
        self.visit(near.0, near.1, p, f);
        if d * d <= self.max_radius2 {
            self.visit(far.0, far.1, p, f);
        }
    }
}

/// Recursively split on the median of the axis with the largest extent.
///
/// * `entries` - Entries of the subtree; reordered in place.
/// * `axes`    - Split axes of the subtree.
fn build(entries: &mut [HitPointEntry], axes: &mut [u8]) {
    if entries.len() <= 1 {
        return;
    }
    let (bounds, _) = entry_bounds(entries);
    let axis = bounds.maximum_extent();
    let mid = entries.len() / 2;
    entries.select_nth_unstable_by(mid, |a, b| a.position[axis].total_cmp(&b.position[axis]));
    axes[mid] = axis as u8;

    let (left, rest) = entries.split_at_mut(mid);
    let (left_axes, rest_axes) = axes.split_at_mut(mid);
    build(left, left_axes);
    build(&mut rest[1..], &mut rest_axes[1..]);
}

impl LookUpAccel for KdTree {
    fn lookup(&self, p: &Point3f, f: &mut dyn FnMut(usize)) {
        self.visit(0, self.nodes.len(), p, f);
    }
}
