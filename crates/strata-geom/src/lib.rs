//! Integer coordinates and boxes shared by the world crates.
#![forbid(unsafe_code)]

use core::ops::Add;
use serde::{Deserialize, Serialize};

/// Edge length of a cube in blocks.
pub const CUBE_SIZE: i32 = 16;
/// Number of blocks held by one cube.
pub const CUBE_VOLUME: usize = (CUBE_SIZE * CUBE_SIZE * CUBE_SIZE) as usize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct ColumnPos {
    pub x: i32,
    pub z: i32,
}

impl ColumnPos {
    #[inline]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    #[inline]
    pub const fn cube(self, y: i32) -> CubePos {
        CubePos::new(self.x, y, self.z)
    }

    #[inline]
    pub fn from_block(wx: i32, wz: i32) -> Self {
        Self::new(wx.div_euclid(CUBE_SIZE), wz.div_euclid(CUBE_SIZE))
    }
}

impl std::fmt::Display for ColumnPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct CubePos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl CubePos {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Column containing this cube.
    #[inline]
    pub const fn column(self) -> ColumnPos {
        ColumnPos::new(self.x, self.z)
    }

    #[inline]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    #[inline]
    pub fn from_block(wx: i32, wy: i32, wz: i32) -> Self {
        Self::new(
            wx.div_euclid(CUBE_SIZE),
            wy.div_euclid(CUBE_SIZE),
            wz.div_euclid(CUBE_SIZE),
        )
    }

    /// World coordinates of the cube's lowest corner block.
    #[inline]
    pub const fn min_block(self) -> (i32, i32, i32) {
        (self.x * CUBE_SIZE, self.y * CUBE_SIZE, self.z * CUBE_SIZE)
    }

    #[inline]
    pub fn chebyshev(self, other: CubePos) -> i32 {
        (self.x - other.x)
            .abs()
            .max((self.y - other.y).abs())
            .max((self.z - other.z).abs())
    }
}

impl Add for CubePos {
    type Output = CubePos;
    #[inline]
    fn add(self, rhs: CubePos) -> CubePos {
        self.offset(rhs.x, rhs.y, rhs.z)
    }
}

impl From<(i32, i32, i32)> for CubePos {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl From<CubePos> for (i32, i32, i32) {
    fn from(value: CubePos) -> Self {
        (value.x, value.y, value.z)
    }
}

impl std::fmt::Display for CubePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {}]", self.x, self.y, self.z)
    }
}

/// Local index of a block inside a cube, `x` fastest then `z` then `y`.
#[inline]
pub const fn local_index(lx: usize, ly: usize, lz: usize) -> usize {
    let s = CUBE_SIZE as usize;
    (ly * s + lz) * s + lx
}

/// Inclusive axis-aligned box of cube offsets.
///
/// Boxes express generation dependencies ("these relative cubes must exist
/// first") and are never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct CubeBox {
    pub min: CubePos,
    pub max: CubePos,
}

impl CubeBox {
    /// Builds a box from two corners in any order.
    pub fn new(x1: i32, y1: i32, z1: i32, x2: i32, y2: i32, z2: i32) -> Self {
        Self {
            min: CubePos::new(x1.min(x2), y1.min(y2), z1.min(z2)),
            max: CubePos::new(x1.max(x2), y1.max(y2), z1.max(z2)),
        }
    }

    /// A single-point box.
    pub const fn point(p: CubePos) -> Self {
        Self { min: p, max: p }
    }

    /// A cube of side `2 * radius + 1` centred on the origin.
    pub fn around(radius: i32) -> Self {
        let r = radius.abs();
        Self::new(-r, -r, -r, r, r, r)
    }

    #[inline]
    pub fn translated(self, by: CubePos) -> Self {
        Self {
            min: self.min + by,
            max: self.max + by,
        }
    }

    /// Smallest box containing both boxes.
    pub fn union(self, other: CubeBox) -> Self {
        Self {
            min: CubePos::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: CubePos::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    #[inline]
    pub fn contains(&self, p: CubePos) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    pub fn volume(&self) -> u64 {
        let dx = (i64::from(self.max.x) - i64::from(self.min.x) + 1) as u64;
        let dy = (i64::from(self.max.y) - i64::from(self.min.y) + 1) as u64;
        let dz = (i64::from(self.max.z) - i64::from(self.min.z) + 1) as u64;
        dx * dy * dz
    }

    /// Iterates every point, x fastest, then z, then y.
    pub fn points(&self) -> BoxPoints {
        BoxPoints {
            bx: *self,
            next: Some(self.min),
        }
    }
}

pub struct BoxPoints {
    bx: CubeBox,
    next: Option<CubePos>,
}

impl Iterator for BoxPoints {
    type Item = CubePos;

    fn next(&mut self) -> Option<CubePos> {
        let cur = self.next?;
        let mut n = cur;
        if n.x < self.bx.max.x {
            n.x += 1;
        } else if n.z < self.bx.max.z {
            n.x = self.bx.min.x;
            n.z += 1;
        } else if n.y < self.bx.max.y {
            n.x = self.bx.min.x;
            n.z = self.bx.min.z;
            n.y += 1;
        } else {
            self.next = None;
            return Some(cur);
        }
        self.next = Some(n);
        Some(cur)
    }
}
