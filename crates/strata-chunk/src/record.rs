//! Plain data shapes handed to and from persistence backends.

use serde::{Deserialize, Serialize};
use strata_geom::{ColumnPos, CubePos};

use crate::Block;
use crate::column::Column;
use crate::cube::Cube;
use crate::height::HeightMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubeRecord {
    pub pos: CubePos,
    pub blocks: Vec<Block>,
    pub sky_light: Vec<u8>,
    #[serde(default)]
    pub populated: bool,
    #[serde(default)]
    pub fully_populated: bool,
    #[serde(default)]
    pub initial_lighting_done: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnRecord {
    pub pos: ColumnPos,
    pub heights: Vec<i32>,
    #[serde(default)]
    pub last_save_time: u64,
}

impl Cube {
    pub fn to_record(&self) -> CubeRecord {
        CubeRecord {
            pos: self.pos(),
            blocks: self.blocks.clone(),
            sky_light: self.sky_light.clone(),
            populated: self.is_populated(),
            fully_populated: self.is_fully_populated(),
            initial_lighting_done: self.is_initial_lighting_done(),
        }
    }

    /// Rebuilds a detached cube; the caller attaches it to its column.
    pub fn from_record(rec: CubeRecord) -> Self {
        Cube::from_parts(
            rec.pos,
            rec.blocks,
            rec.sky_light,
            rec.populated,
            rec.fully_populated,
            rec.initial_lighting_done,
        )
    }
}

impl Column {
    pub fn to_record(&self) -> ColumnRecord {
        ColumnRecord {
            pos: self.pos(),
            heights: self.height_map().tops().to_vec(),
            last_save_time: self.last_save_time(),
        }
    }

    pub fn from_record(rec: ColumnRecord) -> Self {
        Column::from_parts(rec.pos, HeightMap::from_tops(rec.heights), rec.last_save_time)
    }
}
