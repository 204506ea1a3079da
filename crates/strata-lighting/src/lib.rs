//! Initial skylight for freshly generated cubes.
#![forbid(unsafe_code)]

use std::collections::VecDeque;

use strata_chunk::cube::MAX_SKYLIGHT;
use strata_chunk::{Column, Cube, CubeMap};
use strata_geom::{CUBE_SIZE, CubeBox, CubePos, local_index};

const S: usize = CUBE_SIZE as usize;
// 3x3x3 cubes around the centre
const SPAN: usize = 3 * S;

pub struct FirstLightProcessor {
    no_sunlight_propagation: bool,
}

struct Volume {
    opacity: Vec<u8>,
    light: Vec<u8>,
}

impl Volume {
    #[inline]
    fn idx(x: usize, y: usize, z: usize) -> usize {
        (y * SPAN + z) * SPAN + x
    }
}

impl FirstLightProcessor {
    pub fn new(no_sunlight_propagation: bool) -> Self {
        Self {
            no_sunlight_propagation,
        }
    }

    pub fn no_sunlight_propagation(&self) -> bool {
        self.no_sunlight_propagation
    }

    /// Cubes that must be at least generated before `center` can be lit.
    pub fn required_window(center: CubePos) -> CubeBox {
        CubeBox::around(2).translated(center)
    }

    /// Sets skylight from the column's height index alone: full light at and
    /// above the top opaque block, dark below.
    pub fn initialize_skylight(&self, cube: &mut Cube, column: &Column) {
        let (_, by, _) = cube.pos().min_block();
        for lz in 0..S {
            for lx in 0..S {
                let top = column.height(lx, lz);
                for ly in 0..S {
                    let v = if by + ly as i32 >= top { MAX_SKYLIGHT } else { 0 };
                    cube.set_sky_light_local(lx, ly, lz, v);
                }
            }
        }
    }

    /// Spreads skylight through the 3×3×3 cubes around `center`, raising any
    /// value that diffusion can improve, then marks `center` lit.
    ///
    /// Returns false, changing nothing, if a cube of that neighbourhood is
    /// not loaded.
    pub fn diffuse_skylight(&self, center: CubePos, cubes: &mut CubeMap) -> bool {
        if self.no_sunlight_propagation {
            return match cubes.get_mut(center) {
                Some(c) => {
                    c.mark_initial_lighting_done();
                    true
                }
                None => false,
            };
        }
        let hood = CubeBox::around(1).translated(center);
        if hood.points().any(|p| !cubes.contains(p)) {
            log::debug!(target: "lighting", "neighbourhood of {center} incomplete");
            return false;
        }

        let mut vol = Volume {
            opacity: vec![0; SPAN * SPAN * SPAN],
            light: vec![0; SPAN * SPAN * SPAN],
        };
        let origin = center.offset(-1, -1, -1);
        for p in hood.points() {
            let Some(cube) = cubes.get(p) else {
                return false;
            };
            let (ox, oy, oz) = cell_origin(origin, p);
            for ly in 0..S {
                for lz in 0..S {
                    for lx in 0..S {
                        let i = Volume::idx(ox + lx, oy + ly, oz + lz);
                        vol.opacity[i] = cube.block_local(lx, ly, lz).light_opacity();
                        vol.light[i] = cube.sky_light_local(lx, ly, lz);
                    }
                }
            }
        }

        propagate(&mut vol);

        for p in hood.points() {
            let Some(cube) = cubes.get_mut(p) else {
                continue;
            };
            let (ox, oy, oz) = cell_origin(origin, p);
            let mut raised = false;
            for ly in 0..S {
                for lz in 0..S {
                    for lx in 0..S {
                        let v = vol.light[Volume::idx(ox + lx, oy + ly, oz + lz)];
                        if v > cube.sky_light()[local_index(lx, ly, lz)] {
                            cube.set_sky_light_local(lx, ly, lz, v);
                            raised = true;
                        }
                    }
                }
            }
            if raised {
                cube.mark_dirty();
            }
        }

        match cubes.get_mut(center) {
            Some(c) => {
                c.mark_initial_lighting_done();
                true
            }
            None => false,
        }
    }
}

fn cell_origin(origin: CubePos, p: CubePos) -> (usize, usize, usize) {
    (
        ((p.x - origin.x) * CUBE_SIZE) as usize,
        ((p.y - origin.y) * CUBE_SIZE) as usize,
        ((p.z - origin.z) * CUBE_SIZE) as usize,
    )
}

fn propagate(vol: &mut Volume) {
    let mut q: VecDeque<(usize, usize, usize)> = VecDeque::new();
    for y in 0..SPAN {
        for z in 0..SPAN {
            for x in 0..SPAN {
                if vol.light[Volume::idx(x, y, z)] > 1 {
                    q.push_back((x, y, z));
                }
            }
        }
    }
    while let Some((x, y, z)) = q.pop_front() {
        let level = vol.light[Volume::idx(x, y, z)] as i32;
        if level <= 1 {
            continue;
        }
        let mut try_push = |nx: i32, ny: i32, nz: i32| {
            let span = SPAN as i32;
            if nx < 0 || ny < 0 || nz < 0 || nx >= span || ny >= span || nz >= span {
                return;
            }
            let (nx, ny, nz) = (nx as usize, ny as usize, nz as usize);
            let i = Volume::idx(nx, ny, nz);
            let v = level - (vol.opacity[i] as i32).max(1);
            if v > vol.light[i] as i32 {
                vol.light[i] = v as u8;
                q.push_back((nx, ny, nz));
            }
        };
        let (x, y, z) = (x as i32, y as i32, z as i32);
        try_push(x + 1, y, z);
        try_push(x - 1, y, z);
        try_push(x, y + 1, z);
        try_push(x, y - 1, z);
        try_push(x, y, z + 1);
        try_push(x, y, z - 1);
    }
}

#[cfg(test)]
mod tests;
