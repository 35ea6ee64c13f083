//! World sizing, vertical bounds, and chunk coordinates.
#![forbid(unsafe_code)]

mod chunk_coord;
mod config;
mod world;

pub use chunk_coord::{BlockPos, ChunkCoord};
pub use config::WorldConfig;
pub use world::World;

/// Horizontal footprint of a chunk column and edge length of a section.
pub const CHUNK_SIZE: usize = 16;

/// Cells in one 16x16x16 section.
pub const SECTION_VOLUME: usize = CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE;
