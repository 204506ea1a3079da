use serde::{Deserialize, Serialize};
use strata_geom::CUBE_SIZE;

use crate::cube::Cube;

const S: usize = CUBE_SIZE as usize;

/// Per-column opacity index: for every (x, z) the y just above the topmost
/// opaque block seen so far.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeightMap {
    tops: Vec<i32>,
}

impl HeightMap {
    /// Height reported when nothing opaque is known.
    pub const NO_HEIGHT: i32 = i32::MIN / 2;

    pub fn new() -> Self {
        Self {
            tops: vec![Self::NO_HEIGHT; S * S],
        }
    }

    #[inline]
    fn idx(lx: usize, lz: usize) -> usize {
        lz * S + lx
    }

    #[inline]
    pub fn height(&self, lx: usize, lz: usize) -> i32 {
        self.tops[Self::idx(lx, lz)]
    }

    /// Raises the index to cover an opaque block at world height `wy`.
    pub fn on_opaque_block(&mut self, lx: usize, wy: i32, lz: usize) -> bool {
        let i = Self::idx(lx, lz);
        if wy + 1 > self.tops[i] {
            self.tops[i] = wy + 1;
            return true;
        }
        false
    }

    /// Folds a cube's blocks into the index. Returns true if anything rose.
    pub fn update_from_cube(&mut self, cube: &Cube) -> bool {
        let (_, base_y, _) = cube.pos().min_block();
        let mut changed = false;
        for lz in 0..S {
            for lx in 0..S {
                for ly in (0..S).rev() {
                    if cube.block_local(lx, ly, lz).is_opaque() {
                        changed |= self.on_opaque_block(lx, base_y + ly as i32, lz);
                        break;
                    }
                }
            }
        }
        changed
    }

    pub fn from_tops(mut tops: Vec<i32>) -> Self {
        tops.resize(S * S, Self::NO_HEIGHT);
        Self { tops }
    }

    pub fn tops(&self) -> &[i32] {
        &self.tops
    }
}

impl Default for HeightMap {
    fn default() -> Self {
        Self::new()
    }
}
