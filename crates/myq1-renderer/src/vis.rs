// vis.rs — potentially-visible-set lookup
//
// The pipeline consumes visibility as a bit-set over leaves. Which set it
// asks for (exact, fat, or all-visible) is policy decided in mark_surfaces;
// the sets themselves come from a VisProvider so tests and the level loader
// can plug in their own.

use myq1_common::q_shared::Vec3;

use crate::model_types::Model;

/// Slop distance around the viewer used when building a fat set near
/// transparent portals.
const FATPVS_RADIUS: f32 = 8.0;

/// Bit-set over visibility leaves. Bit `i` covers `model.leafs[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisBits {
    bits: Vec<u8>,
    num_leafs: usize,
}

impl VisBits {
    pub fn new(num_leafs: usize) -> Self {
        Self {
            bits: vec![0; (num_leafs + 7) / 8],
            num_leafs,
        }
    }

    pub fn all_visible(num_leafs: usize) -> Self {
        Self {
            bits: vec![0xff; (num_leafs + 7) / 8],
            num_leafs,
        }
    }

    #[inline]
    pub fn set(&mut self, i: usize) {
        if i < self.num_leafs {
            self.bits[i >> 3] |= 1 << (i & 7);
        }
    }

    #[inline]
    pub fn test(&self, i: usize) -> bool {
        i < self.num_leafs && self.bits[i >> 3] & (1 << (i & 7)) != 0
    }

    pub fn num_leafs(&self) -> usize {
        self.num_leafs
    }

    /// OR another set into this one (fat-set combining).
    pub fn union_with(&mut self, other: &VisBits) {
        for (dst, src) in self.bits.iter_mut().zip(other.bits.iter()) {
            *dst |= *src;
        }
    }
}

pub trait VisProvider {
    /// Exact leaf-to-leaf set for the given visibility leaf index (1-based,
    /// leaf 0 is solid and has no row).
    fn leaf_pvs(&self, leaf: usize, model: &Model) -> VisBits;

    /// Conservative set seeded from the viewer's exact position, used when
    /// peering through liquid portals.
    fn fat_pvs(&self, origin: Vec3, model: &Model) -> VisBits;
}

/// Precomputed per-leaf visibility rows, as decompressed from the BSP.
#[derive(Debug, Clone, Default)]
pub struct StaticPvs {
    rows: Vec<VisBits>,
}

impl StaticPvs {
    /// One row per visibility leaf; `rows[i]` is the set seen from
    /// `leafs[i + 1]`.
    pub fn new(rows: Vec<VisBits>) -> Self {
        Self { rows }
    }
}

impl VisProvider for StaticPvs {
    fn leaf_pvs(&self, leaf: usize, model: &Model) -> VisBits {
        debug_assert!(leaf >= 1);
        match self.rows.get(leaf - 1) {
            Some(row) => row.clone(),
            // missing vis data degrades to everything visible
            None => VisBits::all_visible(model.num_vis_leafs()),
        }
    }

    fn fat_pvs(&self, origin: Vec3, model: &Model) -> VisBits {
        let mut fat = VisBits::new(model.num_vis_leafs());
        // union the rows of every leaf the slop box around the origin touches
        for (i, leaf) in model.leafs.iter().enumerate().skip(1) {
            let outside = (0..3).any(|a| {
                origin[a] + FATPVS_RADIUS < leaf.mins[a]
                    || origin[a] - FATPVS_RADIUS > leaf.maxs[a]
            });
            if !outside {
                fat.union_with(&self.leaf_pvs(i, model));
            }
        }
        fat
    }
}

// =============================================================
//  Tests
// =============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model_types::Leaf;
    use myq1_common::bspfile::CONTENTS_EMPTY;

    #[test]
    fn test_visbits_set_and_test() {
        let mut v = VisBits::new(10);
        assert!(!v.test(3));
        v.set(3);
        v.set(9);
        assert!(v.test(3));
        assert!(v.test(9));
        assert!(!v.test(4));
        // out of range never reads or writes
        v.set(10);
        assert!(!v.test(10));
    }

    #[test]
    fn test_visbits_all_visible() {
        let v = VisBits::all_visible(12);
        for i in 0..12 {
            assert!(v.test(i));
        }
        assert!(!v.test(12));
    }

    #[test]
    fn test_visbits_union() {
        let mut a = VisBits::new(8);
        let mut b = VisBits::new(8);
        a.set(0);
        b.set(7);
        a.union_with(&b);
        assert!(a.test(0) && a.test(7));
        assert!(!a.test(3));
    }

    fn leaf_with_box(mins: [f32; 3], maxs: [f32; 3]) -> Leaf {
        let mut l = Leaf::new(CONTENTS_EMPTY);
        l.mins = mins;
        l.maxs = maxs;
        l
    }

    fn two_leaf_model() -> Model {
        let mut model = Model::default();
        model.leafs.push(Leaf::new(myq1_common::bspfile::CONTENTS_SOLID)); // leaf 0
        model.leafs.push(leaf_with_box([0.0, 0.0, 0.0], [64.0, 64.0, 64.0]));
        model.leafs.push(leaf_with_box([64.0, 0.0, 0.0], [128.0, 64.0, 64.0]));
        model
    }

    #[test]
    fn test_static_pvs_rows() {
        let model = two_leaf_model();
        let mut row0 = VisBits::new(2);
        row0.set(0);
        let mut row1 = VisBits::new(2);
        row1.set(0);
        row1.set(1);
        let pvs = StaticPvs::new(vec![row0, row1]);

        let v = pvs.leaf_pvs(1, &model);
        assert!(v.test(0) && !v.test(1));
        let v = pvs.leaf_pvs(2, &model);
        assert!(v.test(0) && v.test(1));
    }

    #[test]
    fn test_static_pvs_missing_row_degrades_to_all() {
        let model = two_leaf_model();
        let pvs = StaticPvs::new(vec![]);
        let v = pvs.leaf_pvs(1, &model);
        assert!(v.test(0) && v.test(1));
    }

    #[test]
    fn test_fat_pvs_unions_nearby_leaves() {
        let model = two_leaf_model();
        let mut row0 = VisBits::new(2);
        row0.set(0);
        let mut row1 = VisBits::new(2);
        row1.set(1);
        let pvs = StaticPvs::new(vec![row0, row1]);

        // right on the shared boundary: both rows contribute
        let v = pvs.fat_pvs([64.0, 32.0, 32.0], &model);
        assert!(v.test(0) && v.test(1));

        // deep inside leaf 1: only its row contributes
        let v = pvs.fat_pvs([20.0, 32.0, 32.0], &model);
        assert!(v.test(0) && !v.test(1));
    }
}
