mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use proptest::prelude::*;
use strata_chunk::Block;
use strata_geom::{ColumnPos, CubeBox, CubePos};
use strata_io::MemoryCubeIo;
use strata_runtime::{ProviderConfig, ProviderError, Requirement};

const ORIGIN: CubePos = CubePos::new(0, 0, 0);

#[test]
fn get_cached_touches_nothing() {
    let io = Arc::new(InstrumentedIo::new(Duration::ZERO));
    let generator = Arc::new(CountingGenerator::new(4));
    let mut p = provider_with(io.clone(), generator.clone(), ProviderConfig::default());

    assert!(p.resolve_cube(ORIGIN, Requirement::GetCached).unwrap().is_none());
    assert!(p.resolve_column(ORIGIN.column(), Requirement::GetCached).unwrap().is_none());
    assert_eq!(io.total_reads(), 0);
    assert_eq!(generator.total_generated(), 0);
    assert_eq!(p.loaded_cube_count(), 0);

    p.resolve_cube(ORIGIN, Requirement::Generate).unwrap();
    let reads = io.total_reads();
    let id = p.get_cube(ORIGIN, Requirement::GetCached).unwrap().unwrap().instance();
    assert_eq!(p.cube(ORIGIN).unwrap().instance(), id);
    assert!(p.resolve_cube(CubePos::new(0, 1, 0), Requirement::GetCached).unwrap().is_none());
    assert_eq!(io.total_reads(), reads);
    assert_eq!(generator.total_generated(), 1);
}

#[test]
fn generate_on_empty_store() {
    let (mut p, generator, _io) = counting_provider(4);
    let cube = p.get_cube(ORIGIN, Requirement::Generate).unwrap().unwrap();
    assert!(!cube.is_populated());
    assert!(!cube.is_fully_populated());
    assert!(!cube.is_initial_lighting_done());
    assert!(cube.needs_saving());
    assert_eq!(cube.block_local(3, 4, 3), Block::GRASS);

    let col = p.column(ORIGIN.column()).unwrap();
    assert!(col.has_cube(0));
    assert_eq!(col.loaded_cube_count(), 1);
    assert_eq!(col.height(0, 0), 5);
    assert_eq!(col.last_save_time(), p.world_time());
    assert_eq!(generator.generated(ORIGIN), 1);
    assert_eq!(generator.columns_generated(), 1);
}

#[test]
fn load_of_missing_cube_is_absent_not_error() {
    let (mut p, generator, _io) = counting_provider(4);
    assert!(p.resolve_cube(CubePos::new(5, 5, 5), Requirement::Load).unwrap().is_none());
    assert_eq!(p.loaded_column_count(), 0);
    assert_eq!(generator.total_generated(), 0);

    p.resolve_column(ColumnPos::new(5, 5), Requirement::Generate).unwrap();
    assert!(p.resolve_cube(CubePos::new(5, 5, 5), Requirement::Load).unwrap().is_none());
    assert_eq!(p.loaded_column_count(), 1);
    assert_eq!(p.loaded_cube_count(), 0);
}

#[test]
fn populate_cascades_through_both_boxes() {
    let (mut p, generator, _io) = counting_provider(4);
    p.resolve_cube(ORIGIN, Requirement::Populate).unwrap().unwrap();

    let full = CubeBox::new(-1, -1, -1, 0, 0, 0);
    for member in full.points() {
        let c = p.cube(member).unwrap();
        assert!(c.is_populated(), "{member} not populated");
        assert_eq!(generator.populated(member), 1);
        for dep in CubeBox::new(0, 0, 0, 1, 1, 1).translated(member).points() {
            assert!(p.cube(dep).is_some(), "{dep} not generated");
        }
    }
    assert!(p.cube(ORIGIN).unwrap().is_fully_populated());
    assert_eq!(p.loaded_cube_count(), 27);
    assert_eq!(generator.populate_counts().len(), 8);
    for pos in p.cube_positions() {
        assert_eq!(generator.generated(pos), 1);
        let col = p.column(pos.column()).unwrap();
        assert!(col.has_cube(pos.y));
    }
    // the marker written by populating (0,0,0) lands in (1,1,1)
    let (bx, by, bz) = ORIGIN.min_block();
    assert_eq!(
        p.cube(CubePos::new(1, 1, 1)).unwrap().block_local(
            (bx + 20 - 16) as usize,
            (by + 20 - 16) as usize,
            (bz + 20 - 16) as usize
        ),
        Block::LOG
    );
}

#[test]
fn overlapping_populate_requests_populate_once() {
    let (mut p, generator, _io) = counting_provider(4);
    p.resolve_cube(ORIGIN, Requirement::Populate).unwrap();
    p.resolve_cube(ORIGIN, Requirement::Populate).unwrap();
    p.resolve_cube(CubePos::new(1, 0, 0), Requirement::Populate).unwrap();
    p.resolve_cube(CubePos::new(0, -1, 0), Requirement::Populate).unwrap();
    assert!(generator.populate_counts().values().all(|&n| n == 1));
    assert!(p.cube(CubePos::new(1, 0, 0)).unwrap().is_fully_populated());
    assert!(!p.cube(CubePos::new(1, 1, 1)).unwrap().is_fully_populated());
}

#[test]
fn light_requires_window_and_sets_flag() {
    let (mut p, _generator, _io) = counting_provider(4);
    let cube = p.get_cube(ORIGIN, Requirement::Light).unwrap().unwrap();
    assert!(cube.is_fully_populated());
    assert!(cube.is_initial_lighting_done());
    // open sky above the grass, dark inside the stone
    assert_eq!(cube.sky_light_local(8, 10, 8), 15);
    assert_eq!(cube.sky_light_local(8, 2, 8), 0);
    for dep in CubeBox::around(2).points() {
        assert!(p.cube(dep).is_some(), "{dep} missing from lighting window");
    }
}

#[test]
fn disabled_sunlight_skips_window() {
    let generator = Arc::new(CountingGenerator::new(4));
    let config = ProviderConfig {
        no_sunlight_propagation: true,
        ..ProviderConfig::default()
    };
    let mut p = provider_with(Arc::new(MemoryCubeIo::new()), generator, config);
    let cube = p.get_cube(ORIGIN, Requirement::Light).unwrap().unwrap();
    assert!(cube.is_initial_lighting_done());
    assert_eq!(p.loaded_cube_count(), 27);
}

#[test]
fn column_population_span_covers_bottom_cubes() {
    let generator = Arc::new(CountingGenerator::new(4));
    let config = ProviderConfig {
        column_population_span: Some(4),
        ..ProviderConfig::default()
    };
    let mut p = provider_with(Arc::new(MemoryCubeIo::new()), generator.clone(), config);
    p.resolve_cube(CubePos::new(0, 1, 0), Requirement::Populate).unwrap();
    for y in 0..4 {
        assert_eq!(generator.populated(CubePos::new(0, y, 0)), 1, "cube y={y}");
    }
    // above the span the default box applies
    p.resolve_cube(CubePos::new(0, 8, 0), Requirement::Populate).unwrap();
    assert_eq!(generator.populated(CubePos::new(0, 5, 0)), 0);
}

#[test]
fn generator_failure_leaves_no_trace() {
    let (mut p, generator, _io) = counting_provider(4);
    generator.fail_at(Some(ORIGIN));
    let err = p.resolve_cube(ORIGIN, Requirement::Generate).unwrap_err();
    assert!(matches!(err, ProviderError::Generation(_)));
    assert!(p.cube(ORIGIN).is_none());
    assert!(!p.column(ORIGIN.column()).unwrap().has_cube(0));

    // (0,4,0) is only needed by the pregeneration box of the y=3 members
    let target = CubePos::new(0, 3, 0);
    generator.fail_at(Some(CubePos::new(0, 4, 0)));
    let err = p.resolve_cube(target, Requirement::Populate).unwrap_err();
    assert!(matches!(err, ProviderError::Generation(_)));
    assert!(!p.cube(target).unwrap().is_fully_populated());
    assert!(p.cube(CubePos::new(-1, 2, -1)).unwrap().is_populated());
    assert!(!p.cube(CubePos::new(-1, 3, -1)).unwrap().is_populated());

    generator.fail_at(None);
    p.resolve_cube(target, Requirement::Populate).unwrap();
    assert!(p.cube(target).unwrap().is_fully_populated());
    assert!(generator.populate_counts().values().all(|&n| n == 1));
}

#[test]
fn async_then_sync_generate_share_one_instance() {
    let io = Arc::new(InstrumentedIo::new(Duration::from_millis(5)));
    let generator = Arc::new(CountingGenerator::new(4));
    let mut p = provider_with(io, generator.clone(), ProviderConfig::default());

    let ids = seen::<u64>();
    let sink = ids.clone();
    p.resolve_cube_async(ORIGIN, Requirement::Generate, move |p, found| {
        let id = found.and_then(|pos| p.cube(pos)).map(|c| c.instance());
        sink.borrow_mut().extend(id);
    });
    let sync_id = p.get_cube(ORIGIN, Requirement::Generate).unwrap().unwrap().instance();
    p.drive_pending_completions();

    assert_eq!(*ids.borrow(), vec![sync_id]);
    assert_eq!(generator.generated(ORIGIN), 1);
    assert_eq!(p.pending_io(), 0);
}

#[test]
fn async_listeners_run_in_submission_order() {
    let (mut p, _generator, _io) = counting_provider(4);
    let order = seen::<u32>();
    for tag in 1..=3 {
        let sink = order.clone();
        p.resolve_cube_async(ORIGIN, Requirement::Generate, move |_, found| {
            assert!(found.is_some());
            sink.borrow_mut().push(tag);
        });
    }
    let done = order.clone();
    assert!(drive_until(&mut p, move |_| done.borrow().len() == 3));
    assert_eq!(*order.borrow(), vec![1, 2, 3]);
}

#[test]
fn async_column_resolution() {
    let (mut p, generator, _io) = counting_provider(4);
    p.advance_time(40);
    let got = seen::<Option<ColumnPos>>();
    let a = got.clone();
    p.resolve_column_async(ColumnPos::new(3, 3), Requirement::Load, move |_, r| a.borrow_mut().push(r));
    let b = got.clone();
    p.resolve_column_async(ColumnPos::new(4, 4), Requirement::Generate, move |_, r| {
        b.borrow_mut().push(r)
    });
    let done = got.clone();
    assert!(drive_until(&mut p, move |_| done.borrow().len() == 2));
    assert!(got.borrow().contains(&None));
    assert!(got.borrow().contains(&Some(ColumnPos::new(4, 4))));
    assert_eq!(generator.columns_generated(), 1);
    assert_eq!(p.column(ColumnPos::new(4, 4)).unwrap().last_save_time(), 40);
}

#[test]
fn async_request_for_cached_cube_answers_immediately() {
    let (mut p, _generator, _io) = counting_provider(4);
    p.resolve_cube(ORIGIN, Requirement::Generate).unwrap();
    let got = seen::<Option<CubePos>>();
    let sink = got.clone();
    p.resolve_cube_async(ORIGIN, Requirement::Populate, move |_, r| sink.borrow_mut().push(r));
    assert_eq!(*got.borrow(), vec![Some(ORIGIN)]);
    assert!(p.cube(ORIGIN).unwrap().is_fully_populated());

    let sink = got.clone();
    p.resolve_cube_async(CubePos::new(9, 9, 9), Requirement::GetCached, move |_, r| {
        sink.borrow_mut().push(r)
    });
    assert_eq!(got.borrow().last(), Some(&None));
}

#[test]
fn diagnostics_and_save_all() {
    let (mut p, _generator, io) = counting_provider(4);
    for y in [1, 0] {
        p.resolve_cube(CubePos::new(0, y, 0), Requirement::Generate).unwrap();
    }
    assert_eq!(p.describe(), "1 columns, 2 cubes");
    assert_eq!(p.dump_loaded_cubes(), "column [0, 0]: [0, 1]\n");
    assert!(!p.is_cube_generated(CubePos::new(0, 2, 0)));
    assert!(p.is_cube_generated(ORIGIN));

    let report = p.save_all();
    assert_eq!((report.cubes, report.columns, report.failed), (2, 1, 0));
    assert_eq!(io.stored_cube_count(), 2);
    assert_eq!(p.save_all().cubes, 0);
    assert!(p.cube_positions().iter().all(|c| !p.cube(*c).unwrap().needs_saving()));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    // Any interleaving of populate requests populates each cube at most once
    #[test]
    fn populate_at_most_once(targets in prop::collection::vec((-2i32..=2, -1i32..=1, -2i32..=2), 1..8)) {
        let (mut p, generator, _io) = counting_provider(4);
        for (x, y, z) in &targets {
            let pos = CubePos::new(*x, *y, *z);
            p.resolve_cube(pos, Requirement::Populate).unwrap();
            prop_assert!(p.cube(pos).unwrap().is_fully_populated());
        }
        prop_assert!(generator.populate_counts().values().all(|&n| n == 1));
        for pos in p.cube_positions() {
            prop_assert_eq!(generator.generated(pos), 1);
        }
    }
}
