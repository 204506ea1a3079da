#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use strata_chunk::{Block, BlockAccess, Column, Cube, CubePrimer};
use strata_geom::{ColumnPos, CubePos};
use strata_io::{CubeIo, IoKey, MemoryCubeIo, PartialCube};
use strata_runtime::{CubeProvider, ProviderConfig};
use strata_world::{CubeGenerator, FlatGenerator, GenError};

/// Flat terrain that counts every generator call per coordinate.
pub struct CountingGenerator {
    inner: FlatGenerator,
    generated: Mutex<HashMap<CubePos, usize>>,
    populated: Mutex<HashMap<CubePos, usize>>,
    columns: AtomicUsize,
    fail_at: Mutex<Option<CubePos>>,
}

impl CountingGenerator {
    pub fn new(ground_y: i32) -> Self {
        Self {
            inner: FlatGenerator::new(ground_y),
            generated: Mutex::new(HashMap::new()),
            populated: Mutex::new(HashMap::new()),
            columns: AtomicUsize::new(0),
            fail_at: Mutex::new(None),
        }
    }

    pub fn fail_at(&self, pos: Option<CubePos>) {
        *self.fail_at.lock().unwrap() = pos;
    }

    pub fn generated(&self, pos: CubePos) -> usize {
        self.generated.lock().unwrap().get(&pos).copied().unwrap_or(0)
    }

    pub fn populated(&self, pos: CubePos) -> usize {
        self.populated.lock().unwrap().get(&pos).copied().unwrap_or(0)
    }

    pub fn total_generated(&self) -> usize {
        self.generated.lock().unwrap().values().sum()
    }

    pub fn populate_counts(&self) -> HashMap<CubePos, usize> {
        self.populated.lock().unwrap().clone()
    }

    pub fn columns_generated(&self) -> usize {
        self.columns.load(Ordering::SeqCst)
    }
}

impl CubeGenerator for CountingGenerator {
    fn generate_column(&self, column: &mut Column) -> Result<(), GenError> {
        self.columns.fetch_add(1, Ordering::SeqCst);
        self.inner.generate_column(column)
    }

    fn generate_cube(&self, pos: CubePos) -> Result<CubePrimer, GenError> {
        if *self.fail_at.lock().unwrap() == Some(pos) {
            return Err(GenError::Failed {
                pos,
                reason: "scripted failure".into(),
            });
        }
        *self.generated.lock().unwrap().entry(pos).or_default() += 1;
        self.inner.generate_cube(pos)
    }

    fn populate(&self, pos: CubePos, world: &mut dyn BlockAccess) -> Result<(), GenError> {
        *self.populated.lock().unwrap().entry(pos).or_default() += 1;
        // lands in the +1 neighbour, which the pregeneration box guarantees
        let (bx, by, bz) = pos.min_block();
        let (wx, wy, wz) = (bx + 20, by + 20, bz + 20);
        if world.set_block(wx, wy, wz, Block::LOG) {
            Ok(())
        } else {
            Err(GenError::MissingNeighbor { pos, wx, wy, wz })
        }
    }
}

/// In-memory backend that records reads per key and the highest number of
/// reads of one key ever in flight at once.
pub struct InstrumentedIo {
    inner: MemoryCubeIo,
    delay: Duration,
    active: Mutex<HashMap<IoKey, usize>>,
    reads: Mutex<HashMap<IoKey, usize>>,
    max_concurrent: AtomicUsize,
}

impl InstrumentedIo {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryCubeIo::new(),
            delay,
            active: Mutex::new(HashMap::new()),
            reads: Mutex::new(HashMap::new()),
            max_concurrent: AtomicUsize::new(0),
        }
    }

    fn enter(&self, key: IoKey) {
        let mut active = self.active.lock().unwrap();
        let n = active.entry(key).or_default();
        *n += 1;
        self.max_concurrent.fetch_max(*n, Ordering::SeqCst);
        *self.reads.lock().unwrap().entry(key).or_default() += 1;
    }

    fn exit(&self, key: IoKey) {
        let mut active = self.active.lock().unwrap();
        if let Some(n) = active.get_mut(&key) {
            *n -= 1;
        }
    }

    pub fn reads(&self, key: IoKey) -> usize {
        self.reads.lock().unwrap().get(&key).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.reads.lock().unwrap().values().sum()
    }

    pub fn max_concurrent_per_key(&self) -> usize {
        self.max_concurrent.load(Ordering::SeqCst)
    }
}

impl CubeIo for InstrumentedIo {
    fn save_column(&self, column: &Column) -> io::Result<()> {
        self.inner.save_column(column)
    }

    fn save_cube(&self, cube: &Cube) -> io::Result<()> {
        self.inner.save_cube(cube)
    }

    fn load_column(&self, pos: ColumnPos) -> io::Result<Option<Column>> {
        let key = IoKey::Column(pos);
        self.enter(key);
        thread::sleep(self.delay);
        let out = self.inner.load_column(pos);
        self.exit(key);
        out
    }

    fn load_cube_async_part(&self, column: ColumnPos, y: i32) -> io::Result<Option<PartialCube>> {
        let key = IoKey::Cube(column.cube(y));
        self.enter(key);
        thread::sleep(self.delay);
        let out = self.inner.load_cube_async_part(column, y);
        self.exit(key);
        out
    }

    fn cube_exists(&self, pos: CubePos) -> bool {
        self.inner.cube_exists(pos)
    }

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

pub fn provider_with(
    io: Arc<dyn CubeIo>,
    generator: Arc<dyn CubeGenerator>,
    config: ProviderConfig,
) -> CubeProvider {
    CubeProvider::new(io, generator, config).unwrap()
}

pub fn counting_provider(ground_y: i32) -> (CubeProvider, Arc<CountingGenerator>, Arc<MemoryCubeIo>) {
    let generator = Arc::new(CountingGenerator::new(ground_y));
    let io = Arc::new(MemoryCubeIo::new());
    let p = provider_with(io.clone(), generator.clone(), ProviderConfig::default());
    (p, generator, io)
}

/// Drives completions until `done` holds or five seconds pass.
pub fn drive_until(p: &mut CubeProvider, done: impl Fn(&CubeProvider) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        p.drive_pending_completions();
        if done(p) {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

pub type Seen<T> = Rc<RefCell<Vec<T>>>;

pub fn seen<T>() -> Seen<T> {
    Rc::new(RefCell::new(Vec::new()))
}
