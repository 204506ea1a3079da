use super::*;
use proptest::prelude::*;
use strata_chunk::{Block, CubePrimer};
use strata_geom::ColumnPos;

fn filled(pos: CubePos, block: Block, sky: u8) -> Cube {
    let mut primer = CubePrimer::empty();
    if block != Block::AIR {
        for ly in 0..S {
            for lz in 0..S {
                for lx in 0..S {
                    primer.set(lx, ly, lz, block);
                }
            }
        }
    }
    let mut c = Cube::from_primer(pos, primer);
    for ly in 0..S {
        for lz in 0..S {
            for lx in 0..S {
                c.set_sky_light_local(lx, ly, lz, sky);
            }
        }
    }
    c.mark_saved();
    c
}

fn neighbourhood(center: CubePos, f: impl Fn(CubePos) -> Cube) -> CubeMap {
    let mut map = CubeMap::new();
    for p in CubeBox::around(1).translated(center).points() {
        map.put(f(p)).unwrap();
    }
    map
}

#[test]
fn initialize_follows_height_index() {
    let mut col = Column::new(ColumnPos::new(0, 0));
    col.height_map_mut().on_opaque_block(0, 19, 0);
    let mut cube = filled(CubePos::new(0, 1, 0), Block::AIR, 0);
    FirstLightProcessor::new(false).initialize_skylight(&mut cube, &col);
    assert_eq!(cube.sky_light_local(0, 3, 0), 0);
    assert_eq!(cube.sky_light_local(0, 4, 0), 15);
    // nothing opaque known in this (x, z)
    assert_eq!(cube.sky_light_local(5, 0, 5), 15);
}

#[test]
fn light_spreads_down_from_lit_layer() {
    let center = CubePos::new(0, 0, 0);
    let mut cubes = neighbourhood(center, |p| {
        let sky = if p.y == 1 { 15 } else { 0 };
        filled(p, Block::AIR, sky)
    });
    assert!(FirstLightProcessor::new(false).diffuse_skylight(center, &mut cubes));
    let c = cubes.get(center).unwrap();
    assert!(c.is_initial_lighting_done());
    assert!(c.needs_saving());
    assert_eq!(c.sky_light_local(7, 15, 7), 14);
    assert_eq!(c.sky_light_local(7, 10, 7), 9);
    assert_eq!(c.sky_light_local(7, 0, 7), 0);
    let top = cubes.get(CubePos::new(0, 1, 0)).unwrap();
    assert_eq!(top.sky_light_local(0, 0, 0), 15);
    assert!(!top.needs_saving());
}

#[test]
fn opaque_cube_stays_dark() {
    let center = CubePos::new(2, -3, 1);
    let mut cubes = neighbourhood(center, |p| {
        if p == center {
            filled(p, Block::STONE, 0)
        } else {
            filled(p, Block::AIR, 15)
        }
    });
    assert!(FirstLightProcessor::new(false).diffuse_skylight(center, &mut cubes));
    let c = cubes.get(center).unwrap();
    assert!(c.sky_light().iter().all(|&v| v == 0));
    assert!(c.is_initial_lighting_done());
}

#[test]
fn missing_neighbour_changes_nothing() {
    let center = CubePos::new(0, 0, 0);
    let mut cubes = neighbourhood(center, |p| filled(p, Block::AIR, 15));
    cubes.remove(CubePos::new(1, 1, 1));
    assert!(!FirstLightProcessor::new(false).diffuse_skylight(center, &mut cubes));
    assert!(!cubes.get(center).unwrap().is_initial_lighting_done());
}

#[test]
fn disabled_propagation_only_sets_flag() {
    let center = CubePos::new(0, 0, 0);
    let mut cubes = CubeMap::new();
    cubes.put(filled(center, Block::AIR, 3)).unwrap();
    assert!(FirstLightProcessor::new(true).diffuse_skylight(center, &mut cubes));
    let c = cubes.get(center).unwrap();
    assert!(c.is_initial_lighting_done());
    assert!(c.sky_light().iter().all(|&v| v == 3));
}

#[test]
fn window_is_two_cubes_each_way() {
    let w = FirstLightProcessor::required_window(CubePos::new(1, 1, 1));
    assert_eq!(w.volume(), 125);
    assert!(w.contains(CubePos::new(-1, 3, -1)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    // Diffusion only ever raises light
    #[test]
    fn diffusion_never_darkens(seeds in prop::collection::vec((0usize..27, 0u8..=15, any::<bool>()), 27)) {
        let center = CubePos::new(0, 0, 0);
        let points: Vec<CubePos> = CubeBox::around(1).translated(center).points().collect();
        let mut cubes = CubeMap::new();
        for (i, p) in points.iter().enumerate() {
            let (_, sky, stone) = seeds[i];
            let block = if stone { Block::STONE } else { Block::AIR };
            cubes.put(filled(*p, block, sky)).unwrap();
        }
        let before: Vec<Vec<u8>> = points.iter().map(|p| cubes.get(*p).unwrap().sky_light().to_vec()).collect();
        prop_assert!(FirstLightProcessor::new(false).diffuse_skylight(center, &mut cubes));
        for (p, old) in points.iter().zip(before) {
            let new = cubes.get(*p).unwrap().sky_light();
            prop_assert!(new.iter().zip(old.iter()).all(|(n, o)| n >= o));
        }
    }
}
