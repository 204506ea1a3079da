mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use strata_geom::{ColumnPos, CubePos};
use strata_io::IoKey;
use strata_runtime::{ProviderConfig, Requirement};

#[test]
fn one_read_in_flight_per_key() {
    let io = Arc::new(InstrumentedIo::new(Duration::from_millis(10)));
    let generator = Arc::new(CountingGenerator::new(4));
    let config = ProviderConfig {
        io_threads: 4,
        ..ProviderConfig::default()
    };
    let mut p = provider_with(io.clone(), generator.clone(), config);

    let targets: Vec<CubePos> = (0..3)
        .flat_map(|x| (0..3).map(move |y| CubePos::new(x, y, 0)))
        .collect();
    let answers = seen::<CubePos>();
    for round in 0..4 {
        for &pos in &targets {
            let sink = answers.clone();
            p.resolve_cube_async(pos, Requirement::Generate, move |_, r| {
                sink.borrow_mut().extend(r);
            });
        }
        if round == 1 {
            // a blocking request in the middle of the async burst
            p.resolve_cube(CubePos::new(1, 1, 0), Requirement::Generate).unwrap();
        }
    }
    let expected = targets.len() * 4;
    let done = answers.clone();
    assert!(drive_until(&mut p, move |_| done.borrow().len() == expected));

    assert_eq!(io.max_concurrent_per_key(), 1);
    for &pos in &targets {
        assert_eq!(io.reads(IoKey::Cube(pos)), 1, "cube {pos} read more than once");
        assert_eq!(generator.generated(pos), 1);
    }
    for x in 0..3 {
        assert_eq!(io.reads(IoKey::Column(ColumnPos::new(x, 0))), 1);
    }
    assert_eq!(p.pending_io(), 0);
}

#[test]
fn completions_only_run_when_driven() {
    let io = Arc::new(InstrumentedIo::new(Duration::from_millis(1)));
    let generator = Arc::new(CountingGenerator::new(4));
    let mut p = provider_with(io, generator.clone(), ProviderConfig::default());
    let answers = seen::<CubePos>();
    let sink = answers.clone();
    p.resolve_cube_async(CubePos::new(0, 0, 0), Requirement::Populate, move |_, r| {
        sink.borrow_mut().extend(r);
    });
    std::thread::sleep(Duration::from_millis(50));
    assert!(answers.borrow().is_empty());
    assert_eq!(generator.total_generated(), 0);

    let done = answers.clone();
    assert!(drive_until(&mut p, move |_| !done.borrow().is_empty()));
    assert!(p.cube(CubePos::new(0, 0, 0)).unwrap().is_fully_populated());
}
