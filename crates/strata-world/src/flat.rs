use strata_chunk::{Block, BlockAccess, Column, CubePrimer};
use strata_geom::{CUBE_SIZE, CubePos};

use crate::generator::{CubeGenerator, GenError};
use crate::populate::PopulatorRegistry;

/// Stone up to `ground_y`, grass on top, air above.
#[derive(Debug)]
pub struct FlatGenerator {
    ground_y: i32,
    seed: u32,
    populators: PopulatorRegistry,
}

impl FlatGenerator {
    pub fn new(ground_y: i32) -> Self {
        Self {
            ground_y,
            seed: 0,
            populators: PopulatorRegistry::new(),
        }
    }

    pub fn with_populators(mut self, seed: u32, populators: PopulatorRegistry) -> Self {
        self.seed = seed;
        self.populators = populators;
        self
    }

    pub fn ground_y(&self) -> i32 {
        self.ground_y
    }
}

impl CubeGenerator for FlatGenerator {
    fn generate_column(&self, _column: &mut Column) -> Result<(), GenError> {
        Ok(())
    }

    fn generate_cube(&self, pos: CubePos) -> Result<CubePrimer, GenError> {
        let (_, by, _) = pos.min_block();
        let mut primer = CubePrimer::empty();
        for ly in 0..CUBE_SIZE as usize {
            let wy = by + ly as i32;
            let b = if wy < self.ground_y {
                Block::STONE
            } else if wy == self.ground_y {
                Block::GRASS
            } else {
                continue;
            };
            for lz in 0..CUBE_SIZE as usize {
                for lx in 0..CUBE_SIZE as usize {
                    primer.set(lx, ly, lz, b);
                }
            }
        }
        Ok(primer)
    }

    fn populate(&self, pos: CubePos, world: &mut dyn BlockAccess) -> Result<(), GenError> {
        self.populators.populate(pos, world, self.seed)
    }
}
