use strata_chunk::{BlockAccess, Column, Cube, CubePrimer};
use strata_geom::{CubeBox, CubePos};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenError {
    #[error("generator failed at {pos}: {reason}")]
    Failed { pos: CubePos, reason: String },
    #[error("population of {pos} needs unloaded block at ({wx}, {wy}, {wz})")]
    MissingNeighbor {
        pos: CubePos,
        wx: i32,
        wy: i32,
        wz: i32,
    },
}

/// Procedural generation collaborator.
///
/// Population of cube `c` writes into the 2×2×2 block of cubes starting at
/// `c` (features are offset by half a cube), so a cube is fully populated once
/// every cube in its full-population box has been populated.
pub trait CubeGenerator: Send + Sync {
    fn generate_column(&self, column: &mut Column) -> Result<(), GenError>;

    fn generate_cube(&self, pos: CubePos) -> Result<CubePrimer, GenError>;

    /// Cubes, relative to `cube`, whose population must run before `cube`
    /// counts as fully populated.
    fn full_population_requirements(&self, _cube: &Cube) -> CubeBox {
        CubeBox::new(-1, -1, -1, 0, 0, 0)
    }

    /// Cubes, relative to `cube`, that must exist before `cube` itself can be
    /// populated.
    fn population_pregeneration_requirements(&self, _cube: &Cube) -> CubeBox {
        CubeBox::new(0, 0, 0, 1, 1, 1)
    }

    fn populate(&self, pos: CubePos, world: &mut dyn BlockAccess) -> Result<(), GenError>;
}
