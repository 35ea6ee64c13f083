use loam_blocks::{BlockRegistry, BlockState};

/// Outcome of an array-palette lookup. `Full` tells the owning section to
/// grow the palette and repack its index storage before retrying.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaletteLookup {
    Existing(u32),
    Appended(u32),
    Full,
}

/// Bounded palette: capacity `2^bits`, entries append-only, indices never
/// reassigned or reused for a different state.
#[derive(Clone, Debug)]
pub struct ArrayPalette {
    bits: usize,
    entries: Vec<BlockState>,
}

impl ArrayPalette {
    pub fn new(bits: usize) -> Self {
        Self {
            bits,
            entries: Vec::with_capacity(1 << bits),
        }
    }

    /// Fresh section palette with air interned at index 0, so zeroed index
    /// storage resolves to air.
    pub fn with_default_air(bits: usize) -> Self {
        let mut palette = Self::new(bits);
        palette.entries.push(BlockState::AIR);
        palette
    }

    #[inline]
    pub fn bits(&self) -> usize {
        self.bits
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        1 << self.bits
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn entries(&self) -> &[BlockState] {
        &self.entries
    }

    /// Decode-path append that bypasses the scan; wire data is trusted to
    /// be deduplicated.
    ///
    /// # Panics
    /// Panics when the palette is already at capacity.
    pub(crate) fn push_raw(&mut self, value: BlockState) {
        assert!(self.entries.len() < self.capacity(), "palette over capacity");
        self.entries.push(value);
    }

    pub fn lookup(&mut self, value: BlockState) -> PaletteLookup {
        if let Some(idx) = self.entries.iter().position(|&e| e == value) {
            return PaletteLookup::Existing(idx as u32);
        }
        if self.entries.len() < self.capacity() {
            self.entries.push(value);
            return PaletteLookup::Appended((self.entries.len() - 1) as u32);
        }
        PaletteLookup::Full
    }

    #[inline]
    pub fn value_of(&self, index: u32) -> Option<BlockState> {
        self.entries.get(index as usize).copied()
    }

    pub fn accepts(&self, predicate: impl Fn(BlockState) -> bool) -> bool {
        self.entries.iter().any(|&e| predicate(e))
    }

    /// Growth protocol: a rebuilt palette one bit wider, with `value`
    /// interned, plus the index assigned to it. The caller owns swapping
    /// this in and repacking its index storage; the palette never mutates
    /// its owner.
    pub fn grown(&self, value: BlockState) -> (ArrayPalette, u32) {
        let mut next = ArrayPalette::new(self.bits + 1);
        next.entries.extend_from_slice(&self.entries);
        next.entries.push(value);
        let idx = (next.entries.len() - 1) as u32;
        (next, idx)
    }
}

/// Per-section index mapping. `Array` interns states locally; `Global`
/// passes registry ids straight through once the local palette outgrows
/// its useful width.
#[derive(Clone, Debug)]
pub enum Palette {
    Array(ArrayPalette),
    Global,
}

impl Palette {
    pub fn section_default() -> Self {
        Palette::Array(ArrayPalette::with_default_air(4))
    }

    /// Index stored for `value`. `Full` only ever comes from the array
    /// variant; the global variant maps unregistered states to 0 (air).
    pub fn lookup(&mut self, value: BlockState, reg: &BlockRegistry) -> PaletteLookup {
        match self {
            Palette::Array(p) => p.lookup(value),
            Palette::Global => {
                if reg.contains(value) {
                    PaletteLookup::Existing(u32::from(value.0))
                } else {
                    log::warn!("state {} not in registry, storing as air", value.0);
                    PaletteLookup::Existing(0)
                }
            }
        }
    }

    #[inline]
    pub fn value_of(&self, index: u32) -> Option<BlockState> {
        match self {
            Palette::Array(p) => p.value_of(index),
            Palette::Global => Some(BlockState(index as u16)),
        }
    }

    pub fn accepts(&self, predicate: impl Fn(BlockState) -> bool) -> bool {
        match self {
            Palette::Array(p) => p.accepts(predicate),
            Palette::Global => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_value_reuses_its_index() {
        let mut p = ArrayPalette::with_default_air(4);
        let a = p.lookup(BlockState(7));
        let b = p.lookup(BlockState(7));
        assert_eq!(a, PaletteLookup::Appended(1));
        assert_eq!(b, PaletteLookup::Existing(1));
        assert_eq!(p.value_of(1), Some(BlockState(7)));
    }

    #[test]
    fn round_trip_for_every_interned_value() {
        let mut p = ArrayPalette::new(4);
        for raw in 0..16u16 {
            match p.lookup(BlockState(raw * 3)) {
                PaletteLookup::Appended(idx) | PaletteLookup::Existing(idx) => {
                    assert_eq!(p.value_of(idx), Some(BlockState(raw * 3)));
                }
                PaletteLookup::Full => panic!("palette filled early"),
            }
        }
    }

    #[test]
    fn overflow_reports_full_then_grows_to_double_capacity() {
        let mut p = ArrayPalette::new(2);
        for raw in 0..4u16 {
            assert_ne!(p.lookup(BlockState(raw)), PaletteLookup::Full);
        }
        assert_eq!(p.lookup(BlockState(4)), PaletteLookup::Full);

        let (grown, idx) = p.grown(BlockState(4));
        assert_eq!(grown.capacity(), 8);
        assert!(idx < 8);
        assert_eq!(grown.value_of(idx), Some(BlockState(4)));
        // Old indices survive the rebuild untouched.
        for raw in 0..4u16 {
            assert_eq!(grown.value_of(u32::from(raw)), Some(BlockState(raw)));
        }
    }

    #[test]
    fn accepts_scans_entries() {
        let mut p = ArrayPalette::with_default_air(4);
        p.lookup(BlockState(9));
        assert!(p.accepts(|s| s == BlockState(9)));
        assert!(!p.accepts(|s| s == BlockState(10)));
        assert!(Palette::Global.accepts(|s| s == BlockState(10)));
    }

    #[test]
    fn global_palette_passes_registry_ids_through() {
        let reg = BlockRegistry::builtin();
        let mut p = Palette::Global;
        let stone = reg.id_by_name("stone").unwrap();
        assert_eq!(
            p.lookup(stone, &reg),
            PaletteLookup::Existing(u32::from(stone.0))
        );
        assert_eq!(p.value_of(u32::from(stone.0)), Some(stone));
        // Unregistered states fall back to the default.
        assert_eq!(p.lookup(BlockState(4000), &reg), PaletteLookup::Existing(0));
    }
}
