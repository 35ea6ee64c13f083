use std::sync::Arc;

use loam_blocks::BlockState;
use loam_world::{BlockPos, ChunkCoord, World};

use crate::chunk::Chunk;

/// Supplies already-loaded chunks. Implemented by the external world
/// storage; the cache never triggers loading or generation.
pub trait ChunkSource {
    fn chunk_at(&self, coord: ChunkCoord) -> Option<Arc<Chunk>>;
}

/// Immutable bounded view over the chunk columns covering a block-space
/// box. Missing cells read as a synthetic empty chunk (all air, reports
/// empty unconditionally); the whole cache carries a precomputed empty
/// flag so callers can skip per-block queries over untouched terrain.
pub struct RegionCache {
    min_chunk: ChunkCoord,
    width: i32,
    depth: i32,
    grid: Vec<Option<Arc<Chunk>>>,
    min_y: i32,
    max_y: i32,
    empty: bool,
}

impl RegionCache {
    pub fn new(source: &dyn ChunkSource, world: &World, min: BlockPos, max: BlockPos) -> Self {
        let min_chunk = min.column();
        let max_chunk = max.column();
        let width = max_chunk.cx - min_chunk.cx + 1;
        let depth = max_chunk.cz - min_chunk.cz + 1;

        let mut grid = Vec::with_capacity((width * depth) as usize);
        let mut empty = true;
        for cz in min_chunk.cz..=max_chunk.cz {
            for cx in min_chunk.cx..=max_chunk.cx {
                let cell = source.chunk_at(ChunkCoord::new(cx, cz));
                if let Some(chunk) = &cell {
                    if chunk.has_non_air_in_range(min.y, max.y) {
                        empty = false;
                    }
                }
                grid.push(cell);
            }
        }

        Self {
            min_chunk,
            width,
            depth,
            grid,
            min_y: world.min_y(),
            max_y: world.max_y(),
            empty,
        }
    }

    /// True when no covered chunk held non-air anywhere in the requested
    /// Y-range at construction time.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.empty
    }

    /// Grid cell for a column; `None` is the synthetic empty chunk, which
    /// also stands in for anything outside the covered rectangle.
    pub fn chunk_for(&self, coord: ChunkCoord) -> Option<&Arc<Chunk>> {
        let dx = coord.cx - self.min_chunk.cx;
        let dz = coord.cz - self.min_chunk.cz;
        if dx < 0 || dz < 0 || dx >= self.width || dz >= self.depth {
            return None;
        }
        self.grid[(dz * self.width + dx) as usize].as_ref()
    }

    /// Block read rounded to the owning column. Outside the world's
    /// vertical bounds this is the void and never touches the grid.
    pub fn block_at(&self, pos: BlockPos) -> BlockState {
        if pos.y < self.min_y || pos.y >= self.max_y {
            return BlockState::AIR;
        }
        match self.chunk_for(pos.column()) {
            Some(chunk) => chunk.block_at(
                pos.x.rem_euclid(16) as usize,
                pos.y,
                pos.z.rem_euclid(16) as usize,
            ),
            None => BlockState::AIR,
        }
    }

    /// Per-column emptiness: synthetic cells report empty unconditionally.
    pub fn column_is_empty(&self, coord: ChunkCoord) -> bool {
        match self.chunk_for(coord) {
            Some(chunk) => chunk.is_empty(),
            None => true,
        }
    }
}
