//! Persistence collaborator contract and the off-thread read scheduler.
#![forbid(unsafe_code)]

pub mod dir;
pub mod executor;
pub mod memory;

use std::fmt;
use std::io;

use strata_chunk::{Column, Cube, CubeRecord};
use strata_geom::{ColumnPos, CubePos};

pub use dir::DirCubeIo;
pub use executor::{AsyncIoExecutor, CompletedJob, IoWork, Submission, WaitOutcome};
pub use memory::MemoryCubeIo;

/// Identity of one unit of I/O work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IoKey {
    Column(ColumnPos),
    Cube(CubePos),
}

impl IoKey {
    pub fn column(self) -> ColumnPos {
        match self {
            IoKey::Column(c) => c,
            IoKey::Cube(c) => c.column(),
        }
    }
}

impl fmt::Display for IoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoKey::Column(c) => write!(f, "column {c}"),
            IoKey::Cube(c) => write!(f, "cube {c}"),
        }
    }
}

/// Cube data read off-thread, not yet turned into a live cube.
#[derive(Clone, Debug)]
pub struct PartialCube {
    pub record: CubeRecord,
}

/// Result of an async read, handed back to the owner thread.
#[derive(Debug)]
pub enum IoPayload {
    Column(Column),
    Cube(PartialCube),
}

/// Storage backend. Reads may run on worker threads; writes come from the
/// owner thread.
pub trait CubeIo: Send + Sync {
    fn save_column(&self, column: &Column) -> io::Result<()>;

    fn save_cube(&self, cube: &Cube) -> io::Result<()>;

    fn load_column(&self, pos: ColumnPos) -> io::Result<Option<Column>>;

    /// Thread-safe half of a cube load.
    fn load_cube_async_part(&self, column: ColumnPos, y: i32) -> io::Result<Option<PartialCube>>;

    /// Owner-thread half of a cube load.
    fn load_cube_sync_part(&self, partial: PartialCube) -> Cube {
        Cube::from_record(partial.record)
    }

    fn cube_exists(&self, pos: CubePos) -> bool;

    fn flush(&self) -> io::Result<()>;
}
