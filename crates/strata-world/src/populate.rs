//! Decoration passes run after terrain exists.
//!
//! A populator for cube `c` works on the 16³ area starting half a cube past
//! `c`'s minimum corner, so everything it writes stays inside the 2×2×2 cubes
//! starting at `c`.

use strata_chunk::{Block, BlockAccess};
use strata_geom::{CUBE_SIZE, CubePos};

use crate::generator::GenError;
use crate::worldgen::WorldGenParams;

const HALF: i32 = CUBE_SIZE / 2;

pub trait Populator: Send + Sync {
    fn name(&self) -> &'static str;
    fn populate(
        &self,
        pos: CubePos,
        world: &mut dyn BlockAccess,
        seed: u32,
    ) -> Result<(), GenError>;
}

#[inline]
fn hash3(ix: i32, iy: i32, iz: i32, seed: u32) -> u32 {
    let mut h = (ix as u32).wrapping_mul(0x85eb_ca6b)
        ^ (iy as u32).wrapping_mul(0x1656_67b1)
        ^ (iz as u32).wrapping_mul(0xc2b2_ae35)
        ^ seed.wrapping_mul(0x27d4_eb2d);
    h ^= h >> 16;
    h = h.wrapping_mul(0x7feb_352d);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846c_a68b);
    h ^= h >> 16;
    h
}

#[inline]
fn rand01(seed: u32, ix: i32, iy: i32, iz: i32, salt: u32) -> f32 {
    let h = hash3(ix, iy, iz, (seed ^ salt).wrapping_add(0x9E37_79B9));
    ((h & 0x00FF_FFFF) as f32) / 16_777_216.0
}

fn put(
    world: &mut dyn BlockAccess,
    pos: CubePos,
    wx: i32,
    wy: i32,
    wz: i32,
    b: Block,
) -> Result<(), GenError> {
    if world.set_block(wx, wy, wz, b) {
        Ok(())
    } else {
        Err(GenError::MissingNeighbor { pos, wx, wy, wz })
    }
}

/// Populators ordered by ascending weight; equal weights keep insertion order.
#[derive(Default)]
pub struct PopulatorRegistry {
    entries: Vec<(i32, Box<dyn Populator>)>,
}

impl PopulatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, weight: i32, populator: Box<dyn Populator>) {
        let at = self.entries.partition_point(|(w, _)| *w <= weight);
        self.entries.insert(at, (weight, populator));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(_, p)| p.name()).collect()
    }

    pub fn populate(
        &self,
        pos: CubePos,
        world: &mut dyn BlockAccess,
        seed: u32,
    ) -> Result<(), GenError> {
        for (_, p) in &self.entries {
            p.populate(pos, world, seed)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PopulatorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

pub struct TreePopulator {
    probability: f32,
    trunk_min: i32,
    trunk_max: i32,
    leaf_radius: i32,
}

impl TreePopulator {
    pub fn from_params(p: &WorldGenParams) -> Self {
        Self {
            probability: p.tree_probability,
            trunk_min: p.trunk_min,
            trunk_max: p.trunk_max,
            leaf_radius: p.leaf_radius,
        }
    }

    fn trunk_height(&self, seed: u32, x: i32, z: i32) -> i32 {
        let span = (self.trunk_max - self.trunk_min + 1).max(1);
        let r = rand01(seed, x, 0, z, 0x5EED_7EEE);
        self.trunk_min + ((r * span as f32) as i32).min(span - 1)
    }
}

impl Populator for TreePopulator {
    fn name(&self) -> &'static str {
        "trees"
    }

    fn populate(
        &self,
        pos: CubePos,
        world: &mut dyn BlockAccess,
        seed: u32,
    ) -> Result<(), GenError> {
        let (bx, by, bz) = pos.min_block();
        let (ox, oy, oz) = (bx + HALF, by + HALF, bz + HALF);
        let ceiling = by + 2 * CUBE_SIZE;
        for z in oz..oz + CUBE_SIZE {
            for x in ox..ox + CUBE_SIZE {
                if rand01(seed, x, pos.y, z, 0x7EE5_0001) >= self.probability {
                    continue;
                }
                let Some(ground) = (oy..oy + CUBE_SIZE)
                    .rev()
                    .find(|&y| world.block(x, y, z) == Some(Block::GRASS))
                else {
                    continue;
                };
                let trunk = self.trunk_height(seed, x, z);
                let top = ground + trunk;
                if top + self.leaf_radius >= ceiling {
                    continue;
                }
                put(world, pos, x, ground, z, Block::DIRT)?;
                for y in ground + 1..=top {
                    put(world, pos, x, y, z, Block::LOG)?;
                }
                let r = self.leaf_radius;
                for dy in -r..=r {
                    for dz in -r..=r {
                        for dx in -r..=r {
                            if dx.abs() + dy.abs() + dz.abs() > r + 1 {
                                continue;
                            }
                            let (lx, ly, lz) = (x + dx, top + dy, z + dz);
                            if world.block(lx, ly, lz) == Some(Block::AIR) {
                                put(world, pos, lx, ly, lz, Block::LEAVES)?;
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

pub struct OrePopulator {
    veins: u32,
    vein_size: u32,
    max_y: i32,
}

impl OrePopulator {
    pub fn from_params(p: &WorldGenParams) -> Self {
        Self {
            veins: p.ore_veins_per_cube,
            vein_size: p.ore_vein_size,
            max_y: p.ore_max_y,
        }
    }
}

impl Populator for OrePopulator {
    fn name(&self) -> &'static str {
        "ores"
    }

    fn populate(
        &self,
        pos: CubePos,
        world: &mut dyn BlockAccess,
        seed: u32,
    ) -> Result<(), GenError> {
        let (bx, by, bz) = pos.min_block();
        let (ox, oy, oz) = (bx + HALF, by + HALF, bz + HALF);
        if oy > self.max_y {
            return Ok(());
        }
        let pick = |v: u32, salt: u32| -> i32 {
            (hash3(pos.x, pos.y, pos.z, seed ^ salt ^ v.wrapping_mul(0x9E37_79B9)) % CUBE_SIZE as u32)
                as i32
        };
        for v in 0..self.veins {
            let (mut x, mut y, mut z) = (ox + pick(v, 0x0A), oy + pick(v, 0x0B), oz + pick(v, 0x0C));
            for step in 0..self.vein_size {
                if y <= self.max_y && world.block(x, y, z) == Some(Block::STONE) {
                    put(world, pos, x, y, z, Block::ORE)?;
                }
                let dir = hash3(x, y, z, seed ^ step) % 6;
                let (nx, ny, nz) = match dir {
                    0 => (x + 1, y, z),
                    1 => (x - 1, y, z),
                    2 => (x, y + 1, z),
                    3 => (x, y - 1, z),
                    4 => (x, y, z + 1),
                    _ => (x, y, z - 1),
                };
                // walk stays inside the population area
                if (ox..ox + CUBE_SIZE).contains(&nx)
                    && (oy..oy + CUBE_SIZE).contains(&ny)
                    && (oz..oz + CUBE_SIZE).contains(&nz)
                {
                    (x, y, z) = (nx, ny, nz);
                }
            }
        }
        Ok(())
    }
}
