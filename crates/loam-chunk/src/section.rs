use loam_blocks::{BlockRegistry, BlockState};
use loam_world::SECTION_VOLUME;

use crate::nibble::NibbleArray;
use crate::packed::PackedArray;
use crate::palette::{Palette, PaletteLookup};

/// Widest useful array palette; one more growth step promotes the section
/// to the global (id passthrough) palette instead.
const MAX_ARRAY_BITS: usize = 8;

/// One 16x16x16 sub-volume: block indices through a palette, plus the
/// packed 4-bit light fields.
#[derive(Clone, Debug)]
pub struct Section {
    palette: Palette,
    indices: PackedArray,
    sky_light: NibbleArray,
    block_light: NibbleArray,
    non_air_count: u16,
}

impl Default for Section {
    fn default() -> Self {
        Self::new_empty()
    }
}

impl Section {
    pub fn new_empty() -> Self {
        let palette = Palette::section_default();
        let bits = match &palette {
            Palette::Array(p) => p.bits(),
            Palette::Global => unreachable!("fresh sections start with an array palette"),
        };
        Self {
            palette,
            indices: PackedArray::new(bits, SECTION_VOLUME),
            sky_light: NibbleArray::new(),
            block_light: NibbleArray::new(),
            non_air_count: 0,
        }
    }

    pub(crate) fn from_parts(palette: Palette, indices: PackedArray, non_air_count: u16) -> Self {
        Self {
            palette,
            indices,
            sky_light: NibbleArray::new(),
            block_light: NibbleArray::new(),
            non_air_count,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.non_air_count == 0
    }

    #[inline]
    pub fn non_air_count(&self) -> u16 {
        self.non_air_count
    }

    #[inline]
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    #[inline]
    pub(crate) fn indices(&self) -> &PackedArray {
        &self.indices
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> BlockState {
        let idx = NibbleArray::cell_index(x, y, z);
        self.palette
            .value_of(self.indices.get(idx))
            .expect("stored palette index resolves to an interned state")
    }

    pub fn set(&mut self, x: usize, y: usize, z: usize, state: BlockState, reg: &BlockRegistry) {
        let idx = NibbleArray::cell_index(x, y, z);
        let old = self
            .palette
            .value_of(self.indices.get(idx))
            .expect("stored palette index resolves to an interned state");

        let slot = match self.palette.lookup(state, reg) {
            PaletteLookup::Existing(i) | PaletteLookup::Appended(i) => i,
            PaletteLookup::Full => self.grow(state, reg),
        };
        self.indices.set(idx, slot);

        // The palette may have stored something other than the request
        // (the global palette maps unregistered states to air); the
        // occupancy count follows what the cell now actually holds.
        let stored = self
            .palette
            .value_of(slot)
            .expect("stored palette index resolves to an interned state");
        match (old.is_air(), stored.is_air()) {
            (true, false) => self.non_air_count += 1,
            (false, true) => self.non_air_count -= 1,
            _ => {}
        }
    }

    /// Palette growth: rebuilds the palette one bit wider and repacks the
    /// index storage to match, atomically from any reader's point of view
    /// (single-writer discipline; no reader runs concurrently with this).
    /// Past `MAX_ARRAY_BITS` the section switches to the global palette.
    fn grow(&mut self, state: BlockState, reg: &BlockRegistry) -> u32 {
        let Palette::Array(palette) = &self.palette else {
            unreachable!("global palettes never report Full");
        };
        if palette.bits() + 1 > MAX_ARRAY_BITS {
            return self.promote_to_global(state, reg);
        }
        let (grown, slot) = palette.grown(state);
        self.indices = self.indices.resized(grown.bits());
        self.palette = Palette::Array(grown);
        slot
    }

    fn promote_to_global(&mut self, state: BlockState, reg: &BlockRegistry) -> u32 {
        let Palette::Array(palette) = &self.palette else {
            unreachable!("only array palettes promote");
        };
        let direct_bits = crate::packed::log2_ceil(reg.len()).max(self.indices.bits() + 1);
        let mut direct = PackedArray::new(direct_bits, SECTION_VOLUME);
        for idx in 0..SECTION_VOLUME {
            let value = palette
                .value_of(self.indices.get(idx))
                .expect("stored palette index resolves to an interned state");
            direct.set(idx, u32::from(value.0));
        }
        self.indices = direct;
        self.palette = Palette::Global;
        match self.palette.lookup(state, reg) {
            PaletteLookup::Existing(i) | PaletteLookup::Appended(i) => i,
            PaletteLookup::Full => unreachable!("global palettes never report Full"),
        }
    }

    #[inline]
    pub fn sky_light(&self) -> &NibbleArray {
        &self.sky_light
    }

    #[inline]
    pub fn sky_light_mut(&mut self) -> &mut NibbleArray {
        &mut self.sky_light
    }

    #[inline]
    pub fn block_light(&self) -> &NibbleArray {
        &self.block_light
    }

    #[inline]
    pub fn block_light_mut(&mut self) -> &mut NibbleArray {
        &mut self.block_light
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_section_is_all_air() {
        let s = Section::new_empty();
        assert!(s.is_empty());
        assert_eq!(s.get(0, 0, 0), BlockState::AIR);
        assert_eq!(s.get(15, 15, 15), BlockState::AIR);
    }

    #[test]
    fn set_get_tracks_non_air_count() {
        let reg = BlockRegistry::builtin();
        let stone = reg.id_by_name("stone").unwrap();
        let mut s = Section::new_empty();
        s.set(1, 2, 3, stone, &reg);
        assert_eq!(s.get(1, 2, 3), stone);
        assert_eq!(s.non_air_count(), 1);
        s.set(1, 2, 3, BlockState::AIR, &reg);
        assert!(s.is_empty());
    }

    #[test]
    fn palette_overflow_grows_and_preserves_contents() {
        let reg = BlockRegistry::builtin();
        let mut s = Section::new_empty();
        // 16 distinct non-default states on top of interned air overflows
        // the 4-bit palette and forces exactly one growth to 5 bits.
        for raw in 1..=16u16 {
            let x = (raw as usize) % 16;
            s.set(x, 0, 0, BlockState(raw), &reg);
        }
        for raw in 1..=16u16 {
            let x = (raw as usize) % 16;
            assert_eq!(s.get(x, 0, 0), BlockState(raw));
        }
        match s.palette() {
            Palette::Array(p) => {
                assert_eq!(p.bits(), 5);
                assert_eq!(p.capacity(), 32);
            }
            Palette::Global => panic!("one overflow must not reach the global palette"),
        }
    }

    #[test]
    fn unregistered_state_on_global_palette_keeps_count_truthful() {
        use loam_blocks::{BlockDef, BlocksConfig};
        let mut blocks = vec![BlockDef::named("air").solid(false)];
        for n in 1..400u16 {
            blocks.push(BlockDef::named(&format!("block_{n}")));
        }
        let reg = BlockRegistry::from_config(BlocksConfig { blocks }).unwrap();

        let mut s = Section::new_empty();
        for raw in 1..=300u16 {
            s.set((raw % 16) as usize, (raw / 16) as usize % 16, 0, BlockState(raw), &reg);
        }
        assert!(matches!(s.palette(), Palette::Global));
        for raw in 1..=300u16 {
            s.set((raw % 16) as usize, (raw / 16) as usize % 16, 0, BlockState::AIR, &reg);
        }
        assert!(s.is_empty());

        // The global palette stores unregistered states as air; the
        // occupancy count must track the stored cell, not the request.
        s.set(0, 0, 0, BlockState(5000), &reg);
        assert_eq!(s.get(0, 0, 0), BlockState::AIR);
        assert!(s.is_empty());
        assert_eq!(s.non_air_count(), 0);
    }

    #[test]
    fn repeated_overflow_promotes_to_global() {
        use loam_blocks::{BlockDef, BlocksConfig};
        let mut blocks = vec![BlockDef::named("air").solid(false)];
        for n in 1..400u16 {
            blocks.push(BlockDef::named(&format!("block_{n}")));
        }
        let reg = BlockRegistry::from_config(BlocksConfig { blocks }).unwrap();

        let mut s = Section::new_empty();
        // 300 distinct states exceed the 8-bit array palette ceiling, which
        // must land the section on the global passthrough palette.
        let mut raw = 1u16;
        for y in 0..16 {
            for z in 0..16 {
                for x in 0..16 {
                    s.set(x, y, z, BlockState(raw), &reg);
                    raw = raw % 300 + 1;
                }
            }
        }
        assert!(matches!(s.palette(), Palette::Global));
        raw = 1;
        for y in 0..16 {
            for z in 0..16 {
                for x in 0..16 {
                    assert_eq!(s.get(x, y, z), BlockState(raw));
                    raw = raw % 300 + 1;
                }
            }
        }
    }
}
