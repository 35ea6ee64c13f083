use loam_blocks::{BlockRegistry, BlockState};
use loam_world::{ChunkCoord, World};

use crate::section::Section;

/// Position of a generation status in the pipeline's ordered stage table.
/// The chunk stores only the index; the descriptor itself lives in the
/// pipeline's process-wide table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatusIndex(pub u8);

impl StatusIndex {
    /// Lowest status; every chunk is created here.
    pub const INITIAL: StatusIndex = StatusIndex(0);

    #[inline]
    pub fn is_at_least(self, other: StatusIndex) -> bool {
        self.0 >= other.0
    }
}

/// A chunk column: stacked sections plus a monotonically advancing
/// generation status. Promotion is the pipeline's job; eviction belongs to
/// the external world-loading subsystem.
#[derive(Clone, Debug)]
pub struct Chunk {
    coord: ChunkCoord,
    status: StatusIndex,
    sections: Box<[Section]>,
    min_y: i32,
    is_lighted: bool,
}

impl Chunk {
    /// Fresh chunk at the lowest status with one empty section per slot of
    /// the world's vertical range.
    pub fn new_empty(coord: ChunkCoord, world: &World) -> Self {
        let sections = (0..world.section_count())
            .map(|_| Section::new_empty())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            coord,
            status: StatusIndex::INITIAL,
            sections,
            min_y: world.min_y(),
            is_lighted: false,
        }
    }

    #[inline]
    pub fn coord(&self) -> ChunkCoord {
        self.coord
    }

    #[inline]
    pub fn status(&self) -> StatusIndex {
        self.status
    }

    #[inline]
    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    #[inline]
    pub fn max_y(&self) -> i32 {
        self.min_y + (self.sections.len() * 16) as i32
    }

    #[inline]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[inline]
    pub fn sections_mut(&mut self) -> &mut [Section] {
        &mut self.sections
    }

    #[inline]
    pub fn is_lighted(&self) -> bool {
        self.is_lighted
    }

    pub fn mark_lighted(&mut self) {
        self.is_lighted = true;
    }

    /// Moves the status forward exactly one registration step.
    ///
    /// # Panics
    /// Panics if `next` is not strictly ahead of the current status; a
    /// regressing or repeated advance is a pipeline ordering bug, not a
    /// recoverable condition.
    pub fn advance_status(&mut self, next: StatusIndex) {
        assert!(
            next.0 > self.status.0,
            "chunk {:?} status may only move forward ({} -> {})",
            self.coord,
            self.status.0,
            next.0,
        );
        self.status = next;
    }

    #[inline]
    fn section_for(&self, y: i32) -> Option<(usize, usize)> {
        if y < self.min_y || y >= self.max_y() {
            return None;
        }
        let rel = (y - self.min_y) as usize;
        Some((rel >> 4, rel & 15))
    }

    /// World-space read; local x/z. Outside the vertical range this is the
    /// void and reads as air.
    pub fn block_at(&self, x: usize, y: i32, z: usize) -> BlockState {
        match self.section_for(y) {
            Some((section, ly)) => self.sections[section].get(x, ly, z),
            None => BlockState::AIR,
        }
    }

    /// World-space write; silently drops writes outside the vertical range.
    pub fn set_block_at(&mut self, x: usize, y: i32, z: usize, state: BlockState, reg: &BlockRegistry) {
        if let Some((section, ly)) = self.section_for(y) {
            self.sections[section].set(x, ly, z, state, reg);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(Section::is_empty)
    }

    /// True when any section overlapping `[y_min, y_max]` holds non-air.
    pub fn has_non_air_in_range(&self, y_min: i32, y_max: i32) -> bool {
        if y_max < self.min_y || y_min >= self.max_y() {
            return false;
        }
        let lo = (y_min.max(self.min_y) - self.min_y) >> 4;
        let hi = (y_max.min(self.max_y() - 1) - self.min_y) >> 4;
        self.sections[lo as usize..=hi as usize]
            .iter()
            .any(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(-16, 64, 0)
    }

    #[test]
    fn void_reads_air_and_drops_writes() {
        let reg = BlockRegistry::builtin();
        let stone = reg.id_by_name("stone").unwrap();
        let mut c = Chunk::new_empty(ChunkCoord::new(0, 0), &world());
        c.set_block_at(0, -17, 0, stone, &reg);
        c.set_block_at(0, 48, 0, stone, &reg);
        assert_eq!(c.block_at(0, -17, 0), BlockState::AIR);
        assert_eq!(c.block_at(0, 48, 0), BlockState::AIR);
        assert!(c.is_empty());
    }

    #[test]
    fn block_round_trip_across_sections() {
        let reg = BlockRegistry::builtin();
        let dirt = reg.id_by_name("dirt").unwrap();
        let mut c = Chunk::new_empty(ChunkCoord::new(2, -3), &world());
        c.set_block_at(5, -16, 9, dirt, &reg);
        c.set_block_at(5, 47, 9, dirt, &reg);
        assert_eq!(c.block_at(5, -16, 9), dirt);
        assert_eq!(c.block_at(5, 47, 9), dirt);
        assert!(c.has_non_air_in_range(-16, -1));
        assert!(c.has_non_air_in_range(32, 47));
        assert!(!c.has_non_air_in_range(0, 31));
    }

    #[test]
    fn status_moves_forward_only() {
        let mut c = Chunk::new_empty(ChunkCoord::new(0, 0), &world());
        assert_eq!(c.status(), StatusIndex::INITIAL);
        c.advance_status(StatusIndex(1));
        c.advance_status(StatusIndex(2));
        assert!(c.status().is_at_least(StatusIndex(1)));
    }

    #[test]
    #[should_panic]
    fn status_regression_panics() {
        let mut c = Chunk::new_empty(ChunkCoord::new(0, 0), &world());
        c.advance_status(StatusIndex(3));
        c.advance_status(StatusIndex(2));
    }
}
