use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_chunk::{Block, Column, ColumnRecord, Cube, CubeRecord};
use strata_geom::{ColumnPos, CubePos};

use crate::{CubeIo, PartialCube};

/// One TOML file per column and per cube under a world directory:
/// `columns/<x>.<z>.toml` and `cubes/<x>.<y>.<z>.toml`.
#[derive(Debug, Clone)]
pub struct DirCubeIo {
    root: PathBuf,
}

#[derive(Serialize, Deserialize)]
struct ColumnFile {
    x: i32,
    z: i32,
    #[serde(default)]
    last_save_time: u64,
    heights: Vec<i32>,
}

#[derive(Serialize, Deserialize)]
struct CubeFile {
    x: i32,
    y: i32,
    z: i32,
    #[serde(default)]
    populated: bool,
    #[serde(default)]
    fully_populated: bool,
    #[serde(default)]
    initial_lighting_done: bool,
    blocks: Vec<u16>,
    sky_light: Vec<u8>,
}

fn invalid(e: impl std::error::Error + Send + Sync + 'static) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e)
}

impl DirCubeIo {
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("columns"))?;
        fs::create_dir_all(root.join("cubes"))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn column_path(&self, pos: ColumnPos) -> PathBuf {
        self.root
            .join("columns")
            .join(format!("{}.{}.toml", pos.x, pos.z))
    }

    fn cube_path(&self, pos: CubePos) -> PathBuf {
        self.root
            .join("cubes")
            .join(format!("{}.{}.{}.toml", pos.x, pos.y, pos.z))
    }

    // write-then-rename so a reader never sees half a record
    fn write_atomic(path: &Path, text: &str) -> io::Result<()> {
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, path)
    }

    fn read_optional(path: &Path) -> io::Result<Option<String>> {
        match fs::read_to_string(path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl CubeIo for DirCubeIo {
    fn save_column(&self, column: &Column) -> io::Result<()> {
        let rec = column.to_record();
        let file = ColumnFile {
            x: rec.pos.x,
            z: rec.pos.z,
            last_save_time: rec.last_save_time,
            heights: rec.heights,
        };
        let text = toml::to_string(&file).map_err(invalid)?;
        Self::write_atomic(&self.column_path(column.pos()), &text)
    }

    fn save_cube(&self, cube: &Cube) -> io::Result<()> {
        let rec = cube.to_record();
        let file = CubeFile {
            x: rec.pos.x,
            y: rec.pos.y,
            z: rec.pos.z,
            populated: rec.populated,
            fully_populated: rec.fully_populated,
            initial_lighting_done: rec.initial_lighting_done,
            blocks: rec.blocks.iter().map(|b| b.id).collect(),
            sky_light: rec.sky_light,
        };
        let text = toml::to_string(&file).map_err(invalid)?;
        Self::write_atomic(&self.cube_path(cube.pos()), &text)
    }

    fn load_column(&self, pos: ColumnPos) -> io::Result<Option<Column>> {
        let Some(text) = Self::read_optional(&self.column_path(pos))? else {
            return Ok(None);
        };
        let file: ColumnFile = toml::from_str(&text).map_err(invalid)?;
        Ok(Some(Column::from_record(ColumnRecord {
            pos: ColumnPos::new(file.x, file.z),
            heights: file.heights,
            last_save_time: file.last_save_time,
        })))
    }

    fn load_cube_async_part(&self, column: ColumnPos, y: i32) -> io::Result<Option<PartialCube>> {
        let pos = column.cube(y);
        let Some(text) = Self::read_optional(&self.cube_path(pos))? else {
            return Ok(None);
        };
        let file: CubeFile = toml::from_str(&text).map_err(invalid)?;
        if (file.x, file.y, file.z) != (pos.x, pos.y, pos.z) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("record for ({}, {}, {}) stored under {pos}", file.x, file.y, file.z),
            ));
        }
        Ok(Some(PartialCube {
            record: CubeRecord {
                pos,
                blocks: file.blocks.into_iter().map(Block::new).collect(),
                sky_light: file.sky_light,
                populated: file.populated,
                fully_populated: file.fully_populated,
                initial_lighting_done: file.initial_lighting_done,
            },
        }))
    }

    fn cube_exists(&self, pos: CubePos) -> bool {
        self.cube_path(pos).is_file()
    }

    fn flush(&self) -> io::Result<()> {
        // every save is already a completed rename
        Ok(())
    }
}
