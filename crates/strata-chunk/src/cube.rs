use std::sync::atomic::{AtomicU64, Ordering};

use strata_geom::{CUBE_SIZE, CUBE_VOLUME, ColumnPos, CubePos, local_index};

use crate::Block;
use crate::tickets::Tickets;

pub const MAX_SKYLIGHT: u8 = 15;

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Built but not yet attached to its column.
    Detached,
    Loaded,
    /// Unload hook ran; the cube is about to leave the store.
    Unloaded,
}

/// Raw block output of a generator, before it becomes a cube.
#[derive(Clone, Debug)]
pub struct CubePrimer {
    pub blocks: Vec<Block>,
}

impl CubePrimer {
    pub fn empty() -> Self {
        Self {
            blocks: vec![Block::AIR; CUBE_VOLUME],
        }
    }

    #[inline]
    pub fn set(&mut self, lx: usize, ly: usize, lz: usize, b: Block) {
        self.blocks[local_index(lx, ly, lz)] = b;
    }

    #[inline]
    pub fn get(&self, lx: usize, ly: usize, lz: usize) -> Block {
        self.blocks[local_index(lx, ly, lz)]
    }
}

impl Default for CubePrimer {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Debug)]
pub struct Cube {
    pos: CubePos,
    instance: u64,
    pub(crate) blocks: Vec<Block>,
    pub(crate) sky_light: Vec<u8>,
    populated: bool,
    fully_populated: bool,
    initial_lighting_done: bool,
    needs_saving: bool,
    lifecycle: Lifecycle,
    tickets: Tickets,
}

impl Cube {
    pub fn from_primer(pos: CubePos, primer: CubePrimer) -> Self {
        let mut blocks = primer.blocks;
        blocks.resize(CUBE_VOLUME, Block::AIR);
        Self {
            pos,
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            blocks,
            sky_light: vec![0; CUBE_VOLUME],
            populated: false,
            fully_populated: false,
            initial_lighting_done: false,
            // fresh terrain has never been written out
            needs_saving: true,
            lifecycle: Lifecycle::Detached,
            tickets: Tickets::default(),
        }
    }

    pub(crate) fn from_parts(
        pos: CubePos,
        blocks: Vec<Block>,
        sky_light: Vec<u8>,
        populated: bool,
        fully_populated: bool,
        initial_lighting_done: bool,
    ) -> Self {
        let mut blocks = blocks;
        blocks.resize(CUBE_VOLUME, Block::AIR);
        let mut sky_light = sky_light;
        sky_light.resize(CUBE_VOLUME, 0);
        Self {
            pos,
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            blocks,
            sky_light,
            populated,
            fully_populated,
            initial_lighting_done,
            needs_saving: false,
            lifecycle: Lifecycle::Detached,
            tickets: Tickets::default(),
        }
    }

    #[inline]
    pub fn pos(&self) -> CubePos {
        self.pos
    }

    /// Column this cube belongs to; resolve it through the store.
    #[inline]
    pub fn column_pos(&self) -> ColumnPos {
        self.pos.column()
    }

    /// Process-unique id of this in-memory instance.
    #[inline]
    pub fn instance(&self) -> u64 {
        self.instance
    }

    #[inline]
    pub fn block_local(&self, lx: usize, ly: usize, lz: usize) -> Block {
        self.blocks[local_index(lx, ly, lz)]
    }

    pub fn set_block_local(&mut self, lx: usize, ly: usize, lz: usize, b: Block) {
        let idx = local_index(lx, ly, lz);
        if self.blocks[idx] != b {
            self.blocks[idx] = b;
            self.needs_saving = true;
        }
    }

    /// Maps a world block coordinate into this cube, if it lies inside.
    #[inline]
    pub fn local_of(&self, wx: i32, wy: i32, wz: i32) -> Option<(usize, usize, usize)> {
        let (bx, by, bz) = self.pos.min_block();
        let (lx, ly, lz) = (wx - bx, wy - by, wz - bz);
        let inside = |v: i32| (0..CUBE_SIZE).contains(&v);
        if inside(lx) && inside(ly) && inside(lz) {
            Some((lx as usize, ly as usize, lz as usize))
        } else {
            None
        }
    }

    #[inline]
    pub fn sky_light_local(&self, lx: usize, ly: usize, lz: usize) -> u8 {
        self.sky_light[local_index(lx, ly, lz)]
    }

    #[inline]
    pub fn set_sky_light_local(&mut self, lx: usize, ly: usize, lz: usize, v: u8) {
        self.sky_light[local_index(lx, ly, lz)] = v.min(MAX_SKYLIGHT);
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn sky_light(&self) -> &[u8] {
        &self.sky_light
    }

    pub fn has_opaque_blocks(&self) -> bool {
        self.blocks.iter().any(|b| b.is_opaque())
    }

    #[inline]
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    pub fn set_populated(&mut self, populated: bool) {
        if self.populated != populated {
            self.populated = populated;
            self.needs_saving = true;
        }
    }

    #[inline]
    pub fn is_fully_populated(&self) -> bool {
        self.fully_populated
    }

    /// Marks full population done. Returns false if it already was.
    pub fn mark_fully_populated(&mut self) -> bool {
        if self.fully_populated {
            return false;
        }
        self.fully_populated = true;
        self.needs_saving = true;
        true
    }

    #[inline]
    pub fn is_initial_lighting_done(&self) -> bool {
        self.initial_lighting_done
    }

    /// Marks initial lighting done. Returns false if it already was.
    pub fn mark_initial_lighting_done(&mut self) -> bool {
        if self.initial_lighting_done {
            return false;
        }
        self.initial_lighting_done = true;
        self.needs_saving = true;
        true
    }

    #[inline]
    pub fn needs_saving(&self) -> bool {
        self.needs_saving
    }

    pub fn mark_dirty(&mut self) {
        self.needs_saving = true;
    }

    pub fn mark_saved(&mut self) {
        self.needs_saving = false;
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

    #[inline]
    pub fn tickets(&self) -> &Tickets {
        &self.tickets
    }

    #[inline]
    pub fn tickets_mut(&mut self) -> &mut Tickets {
        &mut self.tickets
    }
}

impl crate::store::Positioned for Cube {
    type Key = CubePos;
    fn pos(&self) -> CubePos {
        self.pos
    }
}
