use crate::config::WorldConfig;

/// Vertical bounds and seed. The world owns no chunks; chunk storage and
/// loading live with the external orchestrator.
#[derive(Clone, Debug)]
pub struct World {
    min_y: i32,
    height: i32,
    seed: i64,
}

impl World {
    /// # Panics
    /// Panics if `min_y` or `height` is not a multiple of the section edge,
    /// or if `height` is not positive.
    pub fn new(min_y: i32, height: i32, seed: i64) -> Self {
        assert!(height > 0, "world height must be positive");
        assert!(
            min_y % 16 == 0 && height % 16 == 0,
            "world vertical bounds must be section-aligned"
        );
        Self { min_y, height, seed }
    }

    pub fn from_config(cfg: &WorldConfig) -> Self {
        Self::new(cfg.min_y, cfg.height, cfg.seed)
    }

    #[inline]
    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn max_y(&self) -> i32 {
        self.min_y + self.height
    }

    #[inline]
    pub fn seed(&self) -> i64 {
        self.seed
    }

    #[inline]
    pub fn section_count(&self) -> usize {
        (self.height / 16) as usize
    }

    #[inline]
    pub fn min_section_y(&self) -> i32 {
        self.min_y >> 4
    }

    /// True when `y` lies inside the generated column. Everything outside
    /// is the void: air block, no fluid.
    #[inline]
    pub fn contains_y(&self, y: i32) -> bool {
        y >= self.min_y && y < self.max_y()
    }

    #[inline]
    pub fn section_index_for(&self, y: i32) -> Option<usize> {
        if !self.contains_y(y) {
            return None;
        }
        Some(((y - self.min_y) >> 4) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_arithmetic() {
        let w = World::new(-64, 384, 1);
        assert_eq!(w.section_count(), 24);
        assert_eq!(w.min_section_y(), -4);
        assert_eq!(w.section_index_for(-64), Some(0));
        assert_eq!(w.section_index_for(-49), Some(0));
        assert_eq!(w.section_index_for(-48), Some(1));
        assert_eq!(w.section_index_for(319), Some(23));
        assert_eq!(w.section_index_for(320), None);
        assert_eq!(w.section_index_for(-65), None);
    }

    #[test]
    #[should_panic]
    fn rejects_unaligned_bounds() {
        let _ = World::new(-60, 384, 0);
    }
}
