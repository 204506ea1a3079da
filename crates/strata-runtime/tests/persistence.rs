use std::sync::Arc;

use strata_geom::CubePos;
use strata_io::DirCubeIo;
use strata_runtime::{CubeGc, CubeProvider, ProviderConfig, Requirement};
use strata_world::{TerrainGenerator, WorldGenParams};

fn open(dir: &std::path::Path) -> CubeProvider {
    let io = Arc::new(DirCubeIo::open(dir).unwrap());
    let generator = Arc::new(TerrainGenerator::new(WorldGenParams::default()));
    CubeProvider::new(io, generator, ProviderConfig::default()).unwrap()
}

#[test]
fn world_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let pos = CubePos::new(0, 4, 0);
    let blocks = {
        let mut p = open(dir.path());
        let cube = p.get_cube(pos, Requirement::Populate).unwrap().unwrap();
        assert!(cube.is_fully_populated());
        let blocks = cube.blocks().to_vec();
        let report = p.save_all();
        assert_eq!(report.failed, 0);
        assert_eq!(report.cubes, p.loaded_cube_count());
        blocks
    };

    let mut p = open(dir.path());
    assert!(p.is_cube_generated(pos));
    let cube = p.get_cube(pos, Requirement::Load).unwrap().unwrap();
    assert_eq!(cube.blocks(), &blocks[..]);
    assert!(cube.is_fully_populated());
    assert!(!cube.is_initial_lighting_done());
}

#[test]
fn gc_writes_back_what_it_evicts() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = open(dir.path());
    p.resolve_cube(CubePos::new(3, 4, 3), Requirement::Generate).unwrap();
    let mut gc = CubeGc::new(1, 64);
    let report = gc.tick(&mut p, |_| false).unwrap();
    assert_eq!(report.cubes_unloaded, 1);
    assert_eq!(report.columns_unloaded, 1);
    assert_eq!(p.loaded_column_count(), 0);
    assert!(p.is_cube_generated(CubePos::new(3, 4, 3)));
}
