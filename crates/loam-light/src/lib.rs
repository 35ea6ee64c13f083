//! In-chunk lighting into the packed section nibble fields.
#![forbid(unsafe_code)]

use std::collections::VecDeque;

use loam_blocks::{BlockRegistry, BlockState};
use loam_chunk::Chunk;

pub const MAX_LIGHT: u8 = 15;

/// Lighting collaborator invoked by the pipeline's light stage. Operates
/// on one chunk at a time; cross-chunk seam exchange belongs to the
/// orchestrator's relight passes and is out of scope here.
pub struct LightEngine {
    reg: std::sync::Arc<BlockRegistry>,
}

impl LightEngine {
    pub fn new(reg: std::sync::Arc<BlockRegistry>) -> Self {
        Self { reg }
    }

    /// Computes skylight and block light for the chunk and marks it
    /// lighted. `skip_block_reseed` is the reload path: the chunk already
    /// carried computed light, so only the cheap skylight column pass
    /// refreshes and the emitter BFS is skipped.
    pub fn light_chunk(&self, chunk: &mut Chunk, skip_block_reseed: bool) {
        self.seed_skylight(chunk);
        if !skip_block_reseed {
            self.flood_block_light(chunk);
        }
        chunk.mark_lighted();
        log::trace!(
            "lit chunk {:?} (skip_block_reseed={skip_block_reseed})",
            chunk.coord()
        );
    }

    /// Top-down column scan: full level while the column is open to the
    /// sky, zero below the first skylight-blocking state.
    fn seed_skylight(&self, chunk: &mut Chunk) {
        let min_y = chunk.min_y();
        let max_y = chunk.max_y();
        for z in 0..16 {
            for x in 0..16 {
                let mut open_above = true;
                for y in (min_y..max_y).rev() {
                    let state = chunk.block_at(x, y, z);
                    if open_above && self.reg.blocks_skylight(state) {
                        open_above = false;
                    }
                    let level = if open_above { MAX_LIGHT } else { 0 };
                    let section = ((y - min_y) >> 4) as usize;
                    chunk.sections_mut()[section]
                        .sky_light_mut()
                        .set(x, (y - min_y) as usize & 15, z, level);
                }
            }
        }
    }

    /// Emitter seed + BFS flood with one level lost per step, clamped to
    /// the chunk interior.
    fn flood_block_light(&self, chunk: &mut Chunk) {
        let min_y = chunk.min_y();
        let max_y = chunk.max_y();
        let height = (max_y - min_y) as usize;

        let mut levels = vec![0u8; 16 * 16 * height];
        let at = |x: usize, y: usize, z: usize| (y * 16 + z) * 16 + x;

        let mut queue: VecDeque<(usize, usize, usize, u8)> = VecDeque::new();
        for y in 0..height {
            for z in 0..16 {
                for x in 0..16 {
                    let state = chunk.block_at(x, min_y + y as i32, z);
                    let emission = self.reg.light_emission(state);
                    if emission > 0 {
                        levels[at(x, y, z)] = emission;
                        queue.push_back((x, y, z, emission));
                    }
                }
            }
        }

        while let Some((x, y, z, level)) = queue.pop_front() {
            if level <= 1 {
                continue;
            }
            let next = level - 1;
            let neighbors = [
                (x as i32 + 1, y as i32, z as i32),
                (x as i32 - 1, y as i32, z as i32),
                (x as i32, y as i32 + 1, z as i32),
                (x as i32, y as i32 - 1, z as i32),
                (x as i32, y as i32, z as i32 + 1),
                (x as i32, y as i32, z as i32 - 1),
            ];
            for (nx, ny, nz) in neighbors {
                if nx < 0 || ny < 0 || nz < 0 || nx >= 16 || nz >= 16 || ny >= height as i32 {
                    continue;
                }
                let (nx, ny, nz) = (nx as usize, ny as usize, nz as usize);
                let state = chunk.block_at(nx, min_y + ny as i32, nz);
                if !self.passable(state) {
                    continue;
                }
                let slot = &mut levels[at(nx, ny, nz)];
                if *slot < next {
                    *slot = next;
                    queue.push_back((nx, ny, nz, next));
                }
            }
        }

        for y in 0..height {
            let section = y >> 4;
            for z in 0..16 {
                for x in 0..16 {
                    let level = levels[at(x, y, z)];
                    if level > 0 {
                        chunk.sections_mut()[section]
                            .block_light_mut()
                            .set(x, y & 15, z, level);
                    }
                }
            }
        }
    }

    #[inline]
    fn passable(&self, state: BlockState) -> bool {
        state.is_air() || !self.reg.is_solid(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_world::{ChunkCoord, World};
    use std::sync::Arc;

    fn setup() -> (Arc<BlockRegistry>, World) {
        (Arc::new(BlockRegistry::builtin()), World::new(0, 32, 0))
    }

    #[test]
    fn open_column_gets_full_skylight_roof_cuts_it() {
        let (reg, world) = setup();
        let stone = reg.id_by_name("stone").unwrap();
        let mut chunk = Chunk::new_empty(ChunkCoord::new(0, 0), &world);
        chunk.set_block_at(4, 20, 4, stone, &reg);

        let engine = LightEngine::new(reg);
        engine.light_chunk(&mut chunk, false);
        assert!(chunk.is_lighted());

        let sky = |y: i32| {
            let section = (y >> 4) as usize;
            chunk.sections()[section].sky_light().get(4, (y & 15) as usize, 4)
        };
        assert_eq!(sky(31), MAX_LIGHT);
        assert_eq!(sky(21), MAX_LIGHT);
        assert_eq!(sky(20), 0);
        assert_eq!(sky(0), 0);
        // Neighboring open column is unaffected.
        assert_eq!(chunk.sections()[0].sky_light().get(5, 0, 5), MAX_LIGHT);
    }

    #[test]
    fn emitter_floods_with_per_step_falloff() {
        let (reg, world) = setup();
        let glow = reg.id_by_name("glowstone").unwrap();
        let mut chunk = Chunk::new_empty(ChunkCoord::new(0, 0), &world);
        chunk.set_block_at(8, 8, 8, glow, &reg);

        LightEngine::new(reg).light_chunk(&mut chunk, false);
        let light = |x: usize, y: usize, z: usize| chunk.sections()[0].block_light().get(x, y, z);
        assert_eq!(light(8, 8, 8), 15);
        assert_eq!(light(9, 8, 8), 14);
        assert_eq!(light(8, 12, 8), 11);
        assert_eq!(light(8 + 3, 8 + 2, 8 + 4), 15 - 9);
    }

    #[test]
    fn reload_path_skips_block_light_reseed() {
        let (reg, world) = setup();
        let glow = reg.id_by_name("glowstone").unwrap();
        let mut chunk = Chunk::new_empty(ChunkCoord::new(0, 0), &world);
        chunk.set_block_at(3, 3, 3, glow, &reg);

        LightEngine::new(reg).light_chunk(&mut chunk, true);
        assert!(chunk.is_lighted());
        // Skylight is still refreshed; block light was left untouched.
        assert_eq!(chunk.sections()[1].sky_light().get(0, 15, 0), MAX_LIGHT);
        assert!(chunk.sections()[0].block_light().is_uninitialized());
    }
}
