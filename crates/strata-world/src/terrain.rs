use fastnoise_lite::{FastNoiseLite, NoiseType};
use strata_chunk::{Block, BlockAccess, Column, CubePrimer};
use strata_geom::{CUBE_SIZE, CubePos};

use crate::generator::{CubeGenerator, GenError};
use crate::populate::{OrePopulator, PopulatorRegistry, TreePopulator};
use crate::worldgen::WorldGenParams;

/// Noise-driven heightfield terrain with tree and ore decoration.
pub struct TerrainGenerator {
    params: WorldGenParams,
    terrain: FastNoiseLite,
    populators: PopulatorRegistry,
}

impl TerrainGenerator {
    pub fn new(params: WorldGenParams) -> Self {
        let mut terrain = FastNoiseLite::with_seed(params.seed);
        terrain.set_noise_type(Some(NoiseType::OpenSimplex2));
        terrain.set_frequency(Some(params.height_frequency));
        let mut populators = PopulatorRegistry::new();
        populators.register(0, Box::new(OrePopulator::from_params(&params)));
        populators.register(10, Box::new(TreePopulator::from_params(&params)));
        Self {
            params,
            terrain,
            populators,
        }
    }

    pub fn params(&self) -> &WorldGenParams {
        &self.params
    }

    pub fn populators_mut(&mut self) -> &mut PopulatorRegistry {
        &mut self.populators
    }

    /// World y of the first air block above the surface at (wx, wz).
    pub fn surface_height(&self, wx: i32, wz: i32) -> i32 {
        let n = self.terrain.get_noise_2d(wx as f32, wz as f32);
        self.params.base_y + (n * self.params.amplitude).round() as i32
    }

    fn block_at(&self, wy: i32, surface: i32) -> Block {
        if wy >= surface {
            if wy < self.params.sea_level {
                Block::WATER
            } else {
                Block::AIR
            }
        } else if wy == surface - 1 {
            if surface <= self.params.sea_level {
                Block::DIRT
            } else {
                Block::GRASS
            }
        } else if wy >= surface - 1 - self.params.topsoil_thickness {
            Block::DIRT
        } else {
            Block::STONE
        }
    }
}

impl CubeGenerator for TerrainGenerator {
    fn generate_column(&self, column: &mut Column) -> Result<(), GenError> {
        log::trace!(target: "worldgen", "column {} prepared", column.pos());
        Ok(())
    }

    fn generate_cube(&self, pos: CubePos) -> Result<CubePrimer, GenError> {
        let (bx, by, bz) = pos.min_block();
        let mut primer = CubePrimer::empty();
        for lz in 0..CUBE_SIZE as usize {
            for lx in 0..CUBE_SIZE as usize {
                let surface = self.surface_height(bx + lx as i32, bz + lz as i32);
                for ly in 0..CUBE_SIZE as usize {
                    let b = self.block_at(by + ly as i32, surface);
                    if b != Block::AIR {
                        primer.set(lx, ly, lz, b);
                    }
                }
            }
        }
        Ok(primer)
    }

    fn populate(&self, pos: CubePos, world: &mut dyn BlockAccess) -> Result<(), GenError> {
        self.populators.populate(pos, world, self.params.seed as u32)
    }
}
