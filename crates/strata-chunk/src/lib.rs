//! Columns, cubes, and the coordinate store that holds them.
#![forbid(unsafe_code)]

pub mod column;
pub mod cube;
pub mod height;
pub mod record;
pub mod store;
pub mod tickets;

pub use column::Column;
pub use cube::{Cube, CubePrimer, Lifecycle};
pub use height::HeightMap;
pub use record::{ColumnRecord, CubeRecord};
pub use store::{ColumnMap, CoordMap, CubeMap, Positioned, StoreError};
pub use tickets::Tickets;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Block {
    pub id: u16,
}

impl Block {
    pub const AIR: Block = Block { id: 0 };
    pub const STONE: Block = Block { id: 1 };
    pub const DIRT: Block = Block { id: 2 };
    pub const GRASS: Block = Block { id: 3 };
    pub const WATER: Block = Block { id: 4 };
    pub const LOG: Block = Block { id: 5 };
    pub const LEAVES: Block = Block { id: 6 };
    pub const ORE: Block = Block { id: 7 };

    #[inline]
    pub const fn new(id: u16) -> Self {
        Self { id }
    }

    /// Whether the block stops skylight completely.
    #[inline]
    pub fn is_opaque(self) -> bool {
        !matches!(self, Block::AIR | Block::WATER | Block::LEAVES)
    }

    /// Skylight lost when passing through the block.
    #[inline]
    pub fn light_opacity(self) -> u8 {
        match self {
            Block::AIR => 0,
            Block::WATER | Block::LEAVES => 1,
            _ => 15,
        }
    }
}

/// Block reads and writes by world coordinate across loaded cubes.
///
/// Population writes through this so a populator can spill into neighbours.
pub trait BlockAccess {
    fn block(&self, wx: i32, wy: i32, wz: i32) -> Option<Block>;
    /// Returns false when the target cube is not loaded.
    fn set_block(&mut self, wx: i32, wy: i32, wz: i32, block: Block) -> bool;
}
