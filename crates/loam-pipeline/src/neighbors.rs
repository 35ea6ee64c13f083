use std::sync::Arc;

use loam_chunk::{Chunk, ChunkSource};
use loam_world::ChunkCoord;

use crate::status::{ChunkStatus, StatusTable};

/// Read-only square of neighbor chunks centered on the chunk being
/// promoted, radius = the stage's task margin. The center cell is absent:
/// the target travels separately (and mutably) with the job.
pub struct NeighborGrid {
    center: ChunkCoord,
    radius: i32,
    cells: Vec<Option<Arc<Chunk>>>,
}

impl NeighborGrid {
    /// Grid for a margin-0 stage; no neighbors consulted.
    pub fn solo(center: ChunkCoord) -> Self {
        Self {
            center,
            radius: 0,
            cells: Vec::new(),
        }
    }

    /// Collects every chunk within `radius` rings of `center` from the
    /// orchestrator's store.
    ///
    /// # Panics
    /// Panics if any cell in the footprint is not loaded. The margin
    /// contract belongs to the orchestrator; a hole in the footprint is a
    /// scheduling bug, not a recoverable condition.
    pub fn gather(source: &dyn ChunkSource, center: ChunkCoord, radius: i32) -> Self {
        assert!(radius >= 0);
        let side = (2 * radius + 1) as usize;
        let mut cells = Vec::with_capacity(side * side);
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                if dx == 0 && dz == 0 {
                    cells.push(None);
                    continue;
                }
                let coord = center.offset(dx, dz);
                let chunk = source.chunk_at(coord).unwrap_or_else(|| {
                    panic!("neighbor {coord:?} missing within margin {radius} of {center:?}")
                });
                cells.push(Some(chunk));
            }
        }
        Self {
            center,
            radius,
            cells,
        }
    }

    #[inline]
    pub fn center(&self) -> ChunkCoord {
        self.center
    }

    #[inline]
    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Neighbor at the given offset; `None` at the center cell or outside
    /// the gathered radius.
    pub fn get(&self, dx: i32, dz: i32) -> Option<&Arc<Chunk>> {
        if dx.abs() > self.radius || dz.abs() > self.radius || (dx == 0 && dz == 0) {
            return None;
        }
        let side = 2 * self.radius + 1;
        let idx = ((dz + self.radius) * side + (dx + self.radius)) as usize;
        self.cells[idx].as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Chunk>> {
        self.cells.iter().filter_map(|c| c.as_ref())
    }

    /// Verifies the margin precondition for `status`: the grid covers the
    /// declared radius and every covered chunk is at least at the stage
    /// immediately prior.
    ///
    /// # Panics
    /// Panics on any violation; the pipeline refuses to generate against
    /// an unmet precondition rather than produce corrupt terrain.
    pub fn assert_satisfies(&self, table: &StatusTable, status: &ChunkStatus) {
        assert!(
            self.radius >= status.task_margin(),
            "stage {:?} needs margin {} but the grid covers {} rings around {:?}",
            status.name(),
            status.task_margin(),
            self.radius,
            self.center,
        );
        for chunk in self.iter() {
            if chunk.coord().ring_distance(self.center) > status.task_margin() {
                continue;
            }
            assert!(
                chunk.status().is_at_least(status.previous()),
                "neighbor {:?} at status {} below {} required by stage {:?}",
                chunk.coord(),
                chunk.status().0,
                table.get(status.previous()).name(),
                status.name(),
            );
        }
    }
}
