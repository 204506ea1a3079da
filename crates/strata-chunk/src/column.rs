use std::collections::BTreeSet;

use strata_geom::{ColumnPos, CubePos};

use crate::cube::Lifecycle;
use crate::height::HeightMap;

/// Vertical stack of cubes sharing (x, z).
///
/// The column only indexes which cube ys are loaded; the cubes themselves live
/// in the cube store, keyed by position.
#[derive(Debug)]
pub struct Column {
    pos: ColumnPos,
    loaded: BTreeSet<i32>,
    height_map: HeightMap,
    needs_saving: bool,
    last_save_time: u64,
    lifecycle: Lifecycle,
}

impl Column {
    pub fn new(pos: ColumnPos) -> Self {
        Self {
            pos,
            loaded: BTreeSet::new(),
            height_map: HeightMap::new(),
            needs_saving: true,
            last_save_time: 0,
            lifecycle: Lifecycle::Detached,
        }
    }

    pub(crate) fn from_parts(pos: ColumnPos, height_map: HeightMap, last_save_time: u64) -> Self {
        Self {
            pos,
            loaded: BTreeSet::new(),
            height_map,
            needs_saving: false,
            last_save_time,
            lifecycle: Lifecycle::Detached,
        }
    }

    #[inline]
    pub fn pos(&self) -> ColumnPos {
        self.pos
    }

    /// Records cube `y` as loaded. Returns false if it already was.
    pub fn add_cube(&mut self, y: i32) -> bool {
        self.loaded.insert(y)
    }

    /// Forgets cube `y`. Returns false if it was not loaded.
    pub fn remove_cube(&mut self, y: i32) -> bool {
        self.loaded.remove(&y)
    }

    #[inline]
    pub fn has_cube(&self, y: i32) -> bool {
        self.loaded.contains(&y)
    }

    #[inline]
    pub fn has_loaded_cubes(&self) -> bool {
        !self.loaded.is_empty()
    }

    pub fn loaded_cube_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn loaded_cubes(&self) -> impl Iterator<Item = CubePos> + '_ {
        self.loaded.iter().map(move |&y| self.pos.cube(y))
    }

    /// Loaded cubes between `start_y` and `end_y` inclusive, walking from
    /// `start_y` towards `end_y`.
    pub fn loaded_cubes_between(&self, start_y: i32, end_y: i32) -> Vec<CubePos> {
        let (lo, hi) = (start_y.min(end_y), start_y.max(end_y));
        let range = self.loaded.range(lo..=hi).map(|&y| self.pos.cube(y));
        if start_y <= end_y {
            range.collect()
        } else {
            range.rev().collect()
        }
    }

    #[inline]
    pub fn height_map(&self) -> &HeightMap {
        &self.height_map
    }

    #[inline]
    pub fn height_map_mut(&mut self) -> &mut HeightMap {
        &mut self.height_map
    }

    /// Top of the opaque terrain at local (x, z), or `HeightMap::NO_HEIGHT`.
    pub fn height(&self, lx: usize, lz: usize) -> i32 {
        self.height_map.height(lx, lz)
    }

    #[inline]
    pub fn needs_saving(&self) -> bool {
        self.needs_saving
    }

    pub fn mark_dirty(&mut self) {
        self.needs_saving = true;
    }

    pub fn mark_saved(&mut self, world_time: u64) {
        self.needs_saving = false;
        self.last_save_time = world_time;
    }

    pub fn last_save_time(&self) -> u64 {
        self.last_save_time
    }

    pub fn set_last_save_time(&mut self, world_time: u64) {
        self.last_save_time = world_time;
    }

    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn on_load(&mut self) {
        self.lifecycle = Lifecycle::Loaded;
    }

    pub fn on_unload(&mut self) {
        self.lifecycle = Lifecycle::Unloaded;
    }
}

impl crate::store::Positioned for Column {
    type Key = ColumnPos;
    fn pos(&self) -> ColumnPos {
        self.pos
    }
}
