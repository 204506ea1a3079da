use strata_geom::{ColumnPos, CubePos};
use strata_io::IoKey;

use crate::error::ProviderError;
use crate::provider::CubeProvider;

impl CubeProvider {
    /// Evicts a cube, saving it first if dirty.
    ///
    /// `Ok(false)` leaves everything untouched: the cube is absent, its column
    /// is force-loaded, it holds tickets, or a read for it is in flight.
    pub fn try_unload_cube(&mut self, pos: CubePos) -> Result<bool, ProviderError> {
        let col = pos.column();
        let Some(cube) = self.cubes.get_mut(pos) else {
            return Ok(false);
        };
        if self.pins.is_persistently_pinned(col)
            || !cube.tickets().can_unload()
            || self.executor.has_pending_job(IoKey::Cube(pos))
        {
            return Ok(false);
        }

        cube.on_unload();
        if cube.needs_saving() {
            if let Err(e) = self.io.save_cube(cube) {
                cube.on_load();
                return Err(e.into());
            }
            cube.mark_saved();
        }

        let indexed = self
            .columns
            .get_mut(col)
            .is_some_and(|c| c.remove_cube(pos.y));
        if !indexed {
            return Err(ProviderError::State(format!(
                "cube {pos} missing from the index of column {col}"
            )));
        }
        if self.cubes.remove(pos).is_none() {
            return Err(ProviderError::State(format!("cube {pos} vanished from the store")));
        }
        log::trace!(target: "provider", "unloaded cube {pos}");
        Ok(true)
    }

    /// Evicts an empty column, saving it first if dirty.
    pub fn try_unload_column(&mut self, pos: ColumnPos) -> Result<bool, ProviderError> {
        let Some(column) = self.columns.get_mut(pos) else {
            return Ok(false);
        };
        if self.pins.is_persistently_pinned(pos)
            || column.has_loaded_cubes()
            || !self.executor.can_drop_column(pos)
        {
            return Ok(false);
        }

        if column.needs_saving() {
            self.io.save_column(column)?;
            column.mark_saved(self.world_time);
        }
        column.on_unload();
        if self.columns.remove(pos).is_none() {
            return Err(ProviderError::State(format!("column {pos} vanished from the store")));
        }
        log::trace!(target: "provider", "unloaded column {pos}");
        Ok(true)
    }
}
