//! Chunk interiors: palettes, packed storage, sections, and the read cache.
#![forbid(unsafe_code)]

mod chunk;
mod nibble;
mod packed;
mod palette;
mod region;
mod section;
pub mod wire;

pub use chunk::{Chunk, StatusIndex};
pub use nibble::NibbleArray;
pub use packed::PackedArray;
pub use palette::{ArrayPalette, Palette, PaletteLookup};
pub use region::{ChunkSource, RegionCache};
pub use section::Section;
