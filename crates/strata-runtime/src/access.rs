use strata_chunk::{Block, BlockAccess, ColumnMap, CubeMap};
use strata_geom::{ColumnPos, CubePos};

/// Block view over the loaded world used while populating.
pub(crate) struct WorldAccess<'a> {
    cubes: &'a mut CubeMap,
    columns: &'a mut ColumnMap,
}

impl<'a> WorldAccess<'a> {
    pub(crate) fn new(cubes: &'a mut CubeMap, columns: &'a mut ColumnMap) -> Self {
        Self { cubes, columns }
    }
}

impl BlockAccess for WorldAccess<'_> {
    fn block(&self, wx: i32, wy: i32, wz: i32) -> Option<Block> {
        let cube = self.cubes.get(CubePos::from_block(wx, wy, wz))?;
        let (lx, ly, lz) = cube.local_of(wx, wy, wz)?;
        Some(cube.block_local(lx, ly, lz))
    }

    fn set_block(&mut self, wx: i32, wy: i32, wz: i32, block: Block) -> bool {
        let Some(cube) = self.cubes.get_mut(CubePos::from_block(wx, wy, wz)) else {
            return false;
        };
        let Some((lx, ly, lz)) = cube.local_of(wx, wy, wz) else {
            return false;
        };
        cube.set_block_local(lx, ly, lz, block);
        if block.is_opaque() {
            if let Some(col) = self.columns.get_mut(ColumnPos::from_block(wx, wz)) {
                if col.height_map_mut().on_opaque_block(lx, wy, lz) {
                    col.mark_dirty();
                }
            }
        }
        true
    }
}
