use std::io;
use std::sync::Mutex;

use hashbrown::HashMap;
use strata_chunk::{Column, ColumnRecord, Cube, CubeRecord};
use strata_geom::{ColumnPos, CubePos};

use crate::{CubeIo, PartialCube};

/// In-process backend. Records survive eviction for as long as the value
/// lives.
#[derive(Debug, Default)]
pub struct MemoryCubeIo {
    columns: Mutex<HashMap<ColumnPos, ColumnRecord>>,
    cubes: Mutex<HashMap<CubePos, CubeRecord>>,
}

fn poisoned<T>(_: T) -> io::Error {
    io::Error::other("memory store lock poisoned")
}

impl MemoryCubeIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored_cube_count(&self) -> usize {
        self.cubes.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn stored_column_count(&self) -> usize {
        self.columns.lock().map(|m| m.len()).unwrap_or(0)
    }
}

impl CubeIo for MemoryCubeIo {
    fn save_column(&self, column: &Column) -> io::Result<()> {
        self.columns
            .lock()
            .map_err(poisoned)?
            .insert(column.pos(), column.to_record());
        Ok(())
    }

    fn save_cube(&self, cube: &Cube) -> io::Result<()> {
        self.cubes
            .lock()
            .map_err(poisoned)?
            .insert(cube.pos(), cube.to_record());
        Ok(())
    }

    fn load_column(&self, pos: ColumnPos) -> io::Result<Option<Column>> {
        let map = self.columns.lock().map_err(poisoned)?;
        Ok(map.get(&pos).cloned().map(Column::from_record))
    }

    fn load_cube_async_part(&self, column: ColumnPos, y: i32) -> io::Result<Option<PartialCube>> {
        let map = self.cubes.lock().map_err(poisoned)?;
        Ok(map
            .get(&column.cube(y))
            .cloned()
            .map(|record| PartialCube { record }))
    }

    fn cube_exists(&self, pos: CubePos) -> bool {
        self.cubes
            .lock()
            .map(|m| m.contains_key(&pos))
            .unwrap_or(false)
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}
