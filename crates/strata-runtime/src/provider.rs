//! The readiness pipeline.
//!
//! Every coordinate moves through load, generate, populate and light at most
//! once. All store mutation happens here, on the thread that owns the
//! provider; worker threads only read from the backend.

use std::fmt::Write as _;
use std::sync::Arc;

use strata_chunk::{Column, ColumnMap, Cube, CubeMap};
use strata_geom::{ColumnPos, CubeBox, CubePos};
use strata_io::{AsyncIoExecutor, CompletedJob, CubeIo, IoKey, IoPayload, IoWork, PartialCube, WaitOutcome};
use strata_lighting::FirstLightProcessor;
use strata_world::CubeGenerator;

use crate::access::WorldAccess;
use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::pins::{ForcedColumns, PinRegistry};
use crate::requirement::Requirement;

type Listener = Box<dyn FnOnce(&mut CubeProvider)>;

/// Outcome of [`CubeProvider::save_all`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub cubes: usize,
    pub columns: usize,
    pub failed: usize,
}

pub struct CubeProvider {
    pub(crate) columns: ColumnMap,
    pub(crate) cubes: CubeMap,
    pub(crate) io: Arc<dyn CubeIo>,
    generator: Arc<dyn CubeGenerator>,
    pub(crate) executor: AsyncIoExecutor<Listener>,
    lighting: FirstLightProcessor,
    pub(crate) pins: Box<dyn PinRegistry>,
    config: ProviderConfig,
    pub(crate) world_time: u64,
}

impl CubeProvider {
    pub fn new(
        io: Arc<dyn CubeIo>,
        generator: Arc<dyn CubeGenerator>,
        config: ProviderConfig,
    ) -> Result<Self, ProviderError> {
        let executor = AsyncIoExecutor::new(config.io_threads)?;
        Ok(Self {
            columns: ColumnMap::new(),
            cubes: CubeMap::new(),
            io,
            generator,
            executor,
            lighting: FirstLightProcessor::new(config.no_sunlight_propagation),
            pins: Box::new(ForcedColumns::new()),
            config,
            world_time: 0,
        })
    }

    pub fn with_pin_registry(mut self, pins: Box<dyn PinRegistry>) -> Self {
        self.pins = pins;
        self
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn world_time(&self) -> u64 {
        self.world_time
    }

    pub fn advance_time(&mut self, ticks: u64) {
        self.world_time = self.world_time.wrapping_add(ticks);
    }

    // ---- cached access -------------------------------------------------

    #[inline]
    pub fn cube(&self, pos: CubePos) -> Option<&Cube> {
        self.cubes.get(pos)
    }

    #[inline]
    pub fn cube_mut(&mut self, pos: CubePos) -> Option<&mut Cube> {
        self.cubes.get_mut(pos)
    }

    #[inline]
    pub fn column(&self, pos: ColumnPos) -> Option<&Column> {
        self.columns.get(pos)
    }

    pub fn loaded_column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn loaded_cube_count(&self) -> usize {
        self.cubes.len()
    }

    pub fn cube_positions(&self) -> Vec<CubePos> {
        self.cubes.keys()
    }

    pub fn column_positions(&self) -> Vec<ColumnPos> {
        self.columns.keys()
    }

    /// Loaded, or present in the backend.
    pub fn is_cube_generated(&self, pos: CubePos) -> bool {
        self.cubes.contains(pos) || self.io.cube_exists(pos)
    }

    pub fn pending_io(&self) -> usize {
        self.executor.pending_count()
    }

    /// Adds a ticket to a loaded cube. Returns false if it is not loaded.
    pub fn pin_cube(&mut self, pos: CubePos) -> bool {
        match self.cubes.get_mut(pos) {
            Some(c) => {
                c.tickets_mut().add();
                true
            }
            None => false,
        }
    }

    pub fn unpin_cube(&mut self, pos: CubePos) -> bool {
        self.cubes
            .get_mut(pos)
            .is_some_and(|c| c.tickets_mut().remove())
    }

    // ---- synchronous resolution ----------------------------------------

    pub fn get_cube(&mut self, pos: CubePos, req: Requirement) -> Result<Option<&Cube>, ProviderError> {
        let found = self.resolve_cube(pos, req)?;
        Ok(found.and_then(|p| self.cubes.get(p)))
    }

    pub fn get_column(&mut self, pos: ColumnPos, req: Requirement) -> Result<Option<&Column>, ProviderError> {
        let found = self.resolve_column(pos, req)?;
        Ok(found.and_then(|p| self.columns.get(p)))
    }

    /// Brings the cube at `pos` to at least `req`, blocking on I/O as needed.
    /// `Ok(None)` means the cube does not exist at that level (not cached, or
    /// not on disk for `Load`).
    pub fn resolve_cube(&mut self, pos: CubePos, req: Requirement) -> Result<Option<CubePos>, ProviderError> {
        match self.cubes.get(pos) {
            Some(c) if req.satisfied_by(c) => return Ok(Some(pos)),
            None if req == Requirement::GetCached => return Ok(None),
            _ => {}
        }
        let col = pos.column();
        if self.resolve_column(col, req.for_column())?.is_none() {
            return Ok(None);
        }
        if !self.cubes.contains(pos) {
            self.load_cube_blocking(pos)?;
        }
        self.advance_cube(pos, req)
    }

    pub fn resolve_column(&mut self, pos: ColumnPos, req: Requirement) -> Result<Option<ColumnPos>, ProviderError> {
        if self.columns.contains(pos) {
            return Ok(Some(pos));
        }
        if req == Requirement::GetCached {
            return Ok(None);
        }
        self.load_column_blocking(pos)?;
        self.advance_column(pos, req)
    }

    // ---- asynchronous resolution ---------------------------------------

    /// Like [`resolve_cube`](Self::resolve_cube), but disk reads happen off
    /// the owner thread. `callback` runs during
    /// [`drive_pending_completions`](Self::drive_pending_completions), or at
    /// once if no I/O is needed.
    pub fn resolve_cube_async(
        &mut self,
        pos: CubePos,
        req: Requirement,
        callback: impl FnOnce(&mut CubeProvider, Option<CubePos>) + 'static,
    ) {
        if req == Requirement::GetCached || self.cubes.contains(pos) {
            let found = self.resolve_cube(pos, req).unwrap_or_else(|e| {
                log::error!(target: "provider", "resolving {pos} failed: {e}");
                None
            });
            callback(self, found);
            return;
        }
        let col = pos.column();
        let col_req = req.for_column();
        if !self.columns.contains(col) {
            self.resolve_column_async(col, col_req, |_, _| {});
        }
        let io = Arc::clone(&self.io);
        let work: IoWork = Box::new(move || {
            Ok(io.load_cube_async_part(col, pos.y)?.map(IoPayload::Cube))
        });
        let listener: Listener = Box::new(move |p: &mut CubeProvider| {
            let found = p.finish_cube(pos, req).unwrap_or_else(|e| {
                log::error!(target: "provider", "resolving {pos} failed: {e}");
                None
            });
            callback(p, found);
        });
        self.executor
            .submit_gated(IoKey::Cube(pos), IoKey::Column(col), work, listener);
    }

    pub fn resolve_column_async(
        &mut self,
        pos: ColumnPos,
        req: Requirement,
        callback: impl FnOnce(&mut CubeProvider, Option<ColumnPos>) + 'static,
    ) {
        if req == Requirement::GetCached || self.columns.contains(pos) {
            let found = self.resolve_column(pos, req).unwrap_or_else(|e| {
                log::error!(target: "provider", "resolving column {pos} failed: {e}");
                None
            });
            callback(self, found);
            return;
        }
        let listener: Listener = Box::new(move |p: &mut CubeProvider| {
            let found = p.advance_column(pos, req).unwrap_or_else(|e| {
                log::error!(target: "provider", "resolving column {pos} failed: {e}");
                None
            });
            callback(p, found);
        });
        let work = self.column_read(pos);
        self.executor.submit(IoKey::Column(pos), work, listener);
    }

    /// Runs the sync phase of every finished read. Call once per tick.
    /// Returns the number of jobs completed.
    pub fn drive_pending_completions(&mut self) -> usize {
        let mut handled = 0;
        while let Some(job) = self.executor.next_completed() {
            let key = job.key;
            if let Err(e) = self.complete_job(job) {
                log::error!(target: "provider", "completing {key} failed: {e}");
            }
            handled += 1;
        }
        handled
    }

    // ---- I/O plumbing --------------------------------------------------

    fn column_read(&self, pos: ColumnPos) -> IoWork {
        let io = Arc::clone(&self.io);
        Box::new(move || Ok(io.load_column(pos)?.map(IoPayload::Column)))
    }

    fn load_column_blocking(&mut self, pos: ColumnPos) -> Result<(), ProviderError> {
        let work = self.column_read(pos);
        self.executor
            .submit(IoKey::Column(pos), work, Box::new(|_: &mut CubeProvider| {}));
        self.await_job(IoKey::Column(pos))
    }

    fn load_cube_blocking(&mut self, pos: CubePos) -> Result<(), ProviderError> {
        let col = pos.column();
        let io = Arc::clone(&self.io);
        let work: IoWork = Box::new(move || {
            Ok(io.load_cube_async_part(col, pos.y)?.map(IoPayload::Cube))
        });
        self.executor.submit_gated(
            IoKey::Cube(pos),
            IoKey::Column(col),
            work,
            Box::new(|_: &mut CubeProvider| {}),
        );
        self.await_job(IoKey::Cube(pos))
    }

    /// Blocks until `key`'s job has run its sync phase. A cube job still
    /// waiting on its column settles the column first.
    fn await_job(&mut self, key: IoKey) -> Result<(), ProviderError> {
        loop {
            match self.executor.wait_for(key) {
                WaitOutcome::Ready(job) => return self.complete_job(job),
                WaitOutcome::NotPending => return Ok(()),
                WaitOutcome::Gated(gate) => {
                    if self.executor.has_pending_job(gate) {
                        self.await_job(gate)?;
                    } else {
                        self.executor.release_gate(gate);
                    }
                }
            }
        }
    }

    fn complete_job(&mut self, job: CompletedJob<Listener>) -> Result<(), ProviderError> {
        let CompletedJob {
            key,
            payload,
            listeners,
        } = job;
        let registered = match (key, payload) {
            (_, None) => Ok(()),
            (IoKey::Column(pos), Some(IoPayload::Column(column))) => self.register_loaded_column(pos, column),
            (IoKey::Cube(pos), Some(IoPayload::Cube(partial))) => self.register_loaded_cube(pos, partial),
            (key, Some(_)) => {
                log::warn!(target: "provider", "payload kind does not match {key}");
                Ok(())
            }
        };
        if let IoKey::Column(_) = key {
            self.executor.release_gate(key);
        }
        // listeners always get an answer, even after a failed registration
        for listener in listeners {
            listener(self);
        }
        registered
    }

    fn register_loaded_column(&mut self, pos: ColumnPos, column: Column) -> Result<(), ProviderError> {
        if column.pos() != pos {
            log::warn!(target: "provider", "column record {} read for {pos}, ignored", column.pos());
            return Ok(());
        }
        if self.columns.contains(pos) {
            log::debug!(target: "provider", "column {pos} appeared while loading");
            return Ok(());
        }
        self.register_column(column)
    }

    fn register_loaded_cube(&mut self, pos: CubePos, partial: PartialCube) -> Result<(), ProviderError> {
        if self.cubes.contains(pos) {
            log::debug!(target: "provider", "cube {pos} appeared while loading");
            return Ok(());
        }
        if !self.columns.contains(pos.column()) {
            log::warn!(target: "provider", "cube {pos} loaded without its column, dropped");
            return Ok(());
        }
        let cube = self.io.load_cube_sync_part(partial);
        if cube.pos() != pos {
            return Err(ProviderError::State(format!(
                "record for {} read for {pos}",
                cube.pos()
            )));
        }
        self.attach_cube(cube)
    }

    // ---- registration --------------------------------------------------

    fn register_column(&mut self, mut column: Column) -> Result<(), ProviderError> {
        column.on_load();
        self.columns.put(column)?;
        Ok(())
    }

    /// Puts a cube into the store and its column's index together.
    fn attach_cube(&mut self, mut cube: Cube) -> Result<(), ProviderError> {
        let pos = cube.pos();
        let col = pos.column();
        let Some(column) = self.columns.get_mut(col) else {
            return Err(ProviderError::State(format!("cube {pos} has no column {col}")));
        };
        if column.height_map_mut().update_from_cube(&cube) {
            column.mark_dirty();
        }
        cube.on_load();
        self.cubes.put(cube)?;
        if !column.add_cube(pos.y) {
            return Err(ProviderError::State(format!("column {col} already indexed cube {pos}")));
        }
        Ok(())
    }

    // ---- pipeline stages -----------------------------------------------

    fn advance_column(&mut self, pos: ColumnPos, req: Requirement) -> Result<Option<ColumnPos>, ProviderError> {
        if self.columns.contains(pos) {
            return Ok(Some(pos));
        }
        if req < Requirement::Generate {
            return Ok(None);
        }
        let mut column = Column::new(pos);
        self.generator.generate_column(&mut column)?;
        column.set_last_save_time(self.world_time);
        if self.columns.contains(pos) {
            return Ok(Some(pos));
        }
        log::trace!(target: "provider", "generated column {pos}");
        self.register_column(column)?;
        Ok(Some(pos))
    }

    /// Continuation of an async cube read.
    fn finish_cube(&mut self, pos: CubePos, req: Requirement) -> Result<Option<CubePos>, ProviderError> {
        if self.advance_column(pos.column(), req.for_column())?.is_none() {
            return Ok(None);
        }
        self.advance_cube(pos, req)
    }

    /// Everything after the disk read: generate, populate, light.
    fn advance_cube(&mut self, pos: CubePos, req: Requirement) -> Result<Option<CubePos>, ProviderError> {
        if !self.cubes.contains(pos) {
            if req < Requirement::Generate {
                return Ok(None);
            }
            self.generate_cube(pos)?;
        }
        if req >= Requirement::Populate {
            self.ensure_populated(pos)?;
        }
        if req >= Requirement::Light {
            self.ensure_lit(pos)?;
        }
        Ok(Some(pos))
    }

    fn generate_cube(&mut self, pos: CubePos) -> Result<(), ProviderError> {
        if self.cubes.contains(pos) {
            return Ok(());
        }
        let col = pos.column();
        if self.advance_column(col, Requirement::Generate)?.is_none() {
            return Err(ProviderError::State(format!("no column for {pos}")));
        }
        let primer = self.generator.generate_cube(pos)?;
        if self.cubes.contains(pos) {
            return Ok(());
        }
        let mut cube = Cube::from_primer(pos, primer);
        let Some(column) = self.columns.get_mut(col) else {
            return Err(ProviderError::State(format!("column {col} vanished while generating {pos}")));
        };
        if column.height_map_mut().update_from_cube(&cube) {
            column.mark_dirty();
        }
        self.lighting.initialize_skylight(&mut cube, column);
        log::trace!(target: "provider", "generated cube {pos}");
        self.attach_cube(cube)
    }

    fn require_generated(&mut self, pos: CubePos) -> Result<(), ProviderError> {
        match self.resolve_cube(pos, Requirement::Generate)? {
            Some(_) => Ok(()),
            None => Err(ProviderError::State(format!("cube {pos} could not be generated"))),
        }
    }

    /// Widens a population box to the bottom `h` cubes of the column when the
    /// vanilla-compatible span is configured.
    fn population_box(&self, cube_y: i32, base: CubeBox) -> CubeBox {
        match self.config.column_population_span {
            Some(h) if h > 0 && (0..h).contains(&cube_y) => {
                base.union(CubeBox::new(0, -cube_y, 0, 0, h - 1 - cube_y, 0))
            }
            _ => base,
        }
    }

    fn full_population_box(&self, pos: CubePos) -> Result<CubeBox, ProviderError> {
        let cube = self.present(pos)?;
        let base = self.generator.full_population_requirements(cube);
        Ok(self.population_box(pos.y, base).translated(pos))
    }

    fn pregeneration_box(&self, pos: CubePos) -> Result<CubeBox, ProviderError> {
        let cube = self.present(pos)?;
        let base = self.generator.population_pregeneration_requirements(cube);
        Ok(self.population_box(pos.y, base).translated(pos))
    }

    fn present(&self, pos: CubePos) -> Result<&Cube, ProviderError> {
        self.cubes
            .get(pos)
            .ok_or_else(|| ProviderError::State(format!("cube {pos} is not loaded")))
    }

    fn ensure_populated(&mut self, pos: CubePos) -> Result<(), ProviderError> {
        if self.present(pos)?.is_fully_populated() {
            return Ok(());
        }
        for member in self.full_population_box(pos)?.points() {
            self.require_generated(member)?;
            for dep in self.pregeneration_box(member)?.points() {
                self.require_generated(dep)?;
            }
            // checked right before populating: a nested resolve may have
            // populated this member already
            if self.present(member)?.is_populated() {
                continue;
            }
            let mut access = WorldAccess::new(&mut self.cubes, &mut self.columns);
            self.generator.populate(member, &mut access)?;
            if let Some(m) = self.cubes.get_mut(member) {
                m.set_populated(true);
            }
            log::trace!(target: "provider", "populated {member}");
        }
        match self.cubes.get_mut(pos) {
            Some(c) => {
                c.mark_fully_populated();
                Ok(())
            }
            None => Err(ProviderError::State(format!("cube {pos} unloaded during population"))),
        }
    }

    fn ensure_lit(&mut self, pos: CubePos) -> Result<(), ProviderError> {
        if self.present(pos)?.is_initial_lighting_done() {
            return Ok(());
        }
        if !self.lighting.no_sunlight_propagation() {
            for dep in FirstLightProcessor::required_window(pos).points() {
                self.require_generated(dep)?;
            }
            // the height index is more complete now than at generation time
            if let (Some(column), Some(cube)) = (self.columns.get(pos.column()), self.cubes.get_mut(pos)) {
                self.lighting.initialize_skylight(cube, column);
            }
        }
        if !self.lighting.diffuse_skylight(pos, &mut self.cubes) {
            log::warn!(target: "provider", "skylight diffusion for {pos} did not complete");
        }
        Ok(())
    }

    // ---- persistence and diagnostics -----------------------------------

    /// Writes every dirty cube, then every dirty column, then flushes.
    pub fn save_all(&mut self) -> SaveReport {
        let mut report = SaveReport::default();
        for pos in self.cubes.keys() {
            let Some(cube) = self.cubes.get_mut(pos) else {
                continue;
            };
            if !cube.needs_saving() {
                continue;
            }
            match self.io.save_cube(cube) {
                Ok(()) => {
                    cube.mark_saved();
                    report.cubes += 1;
                }
                Err(e) => {
                    log::error!(target: "io", "saving cube {pos} failed: {e}");
                    report.failed += 1;
                }
            }
        }
        for pos in self.columns.keys() {
            let Some(column) = self.columns.get_mut(pos) else {
                continue;
            };
            if !column.needs_saving() {
                continue;
            }
            match self.io.save_column(column) {
                Ok(()) => {
                    column.mark_saved(self.world_time);
                    report.columns += 1;
                }
                Err(e) => {
                    log::error!(target: "io", "saving column {pos} failed: {e}");
                    report.failed += 1;
                }
            }
        }
        if let Err(e) = self.io.flush() {
            log::error!(target: "io", "flush failed: {e}");
            report.failed += 1;
        }
        log::info!(
            target: "provider",
            "saved {} cubes, {} columns ({} failed)",
            report.cubes,
            report.columns,
            report.failed
        );
        report
    }

    pub fn describe(&self) -> String {
        format!("{} columns, {} cubes", self.columns.len(), self.cubes.len())
    }

    /// One line per loaded column listing its loaded cube ys, sorted.
    pub fn dump_loaded_cubes(&self) -> String {
        let mut cols = self.columns.keys();
        cols.sort_unstable();
        let mut out = String::new();
        for pos in cols {
            let Some(col) = self.columns.get(pos) else {
                continue;
            };
            let ys: Vec<i32> = col.loaded_cubes().map(|c| c.y).collect();
            let _ = writeln!(out, "column {pos}: {ys:?}");
        }
        out
    }
}

impl std::fmt::Debug for CubeProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CubeProvider")
            .field("columns", &self.columns.len())
            .field("cubes", &self.cubes.len())
            .field("pending_io", &self.executor.pending_count())
            .field("world_time", &self.world_time)
            .finish()
    }
}
