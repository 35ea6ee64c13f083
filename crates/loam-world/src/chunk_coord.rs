use serde::{Deserialize, Serialize};

/// Column coordinate of a chunk. Vertical extent lives in sections, so a
/// chunk is addressed by its x/z column only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    #[inline]
    pub const fn of_block(x: i32, z: i32) -> Self {
        Self {
            cx: x.div_euclid(16),
            cz: z.div_euclid(16),
        }
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cz: self.cz + dz,
        }
    }

    /// Chebyshev ring distance, the metric task margins are expressed in.
    #[inline]
    pub fn ring_distance(self, other: ChunkCoord) -> i32 {
        (self.cx - other.cx).abs().max((self.cz - other.cz).abs())
    }

    #[inline]
    pub fn distance_sq(self, other: ChunkCoord) -> i64 {
        let dx = i64::from(self.cx - other.cx);
        let dz = i64::from(self.cz - other.cz);
        dx * dx + dz * dz
    }

    #[inline]
    pub const fn min_block_x(self) -> i32 {
        self.cx * 16
    }

    #[inline]
    pub const fn min_block_z(self) -> i32 {
        self.cz * 16
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<ChunkCoord> for (i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cz)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn column(self) -> ChunkCoord {
        ChunkCoord::of_block(self.x, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_blocks_round_toward_negative_columns() {
        assert_eq!(ChunkCoord::of_block(-1, -1), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::of_block(-16, 15), ChunkCoord::new(-1, 0));
        assert_eq!(ChunkCoord::of_block(16, -17), ChunkCoord::new(1, -2));
    }

    #[test]
    fn ring_distance_is_chebyshev() {
        let a = ChunkCoord::new(0, 0);
        assert_eq!(a.ring_distance(ChunkCoord::new(3, -2)), 3);
        assert_eq!(a.ring_distance(ChunkCoord::new(-1, 8)), 8);
        assert_eq!(a.ring_distance(a), 0);
    }
}
