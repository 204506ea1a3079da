//! World generation: the generator contract, worldgen parameters, and the
//! reference terrain generators.
#![forbid(unsafe_code)]

pub mod flat;
pub mod generator;
pub mod populate;
pub mod terrain;
pub mod worldgen;

pub use flat::FlatGenerator;
pub use generator::{CubeGenerator, GenError};
pub use populate::{OrePopulator, Populator, PopulatorRegistry, TreePopulator};
pub use terrain::TerrainGenerator;
pub use worldgen::{WorldGenConfig, WorldGenParams, load_params_from_path};
