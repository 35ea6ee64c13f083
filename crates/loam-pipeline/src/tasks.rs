use std::sync::Arc;

use loam_blocks::BlockRegistry;
use loam_chunk::Chunk;
use loam_light::LightEngine;
use loam_world::World;

use crate::diag::PipelineDiagnostics;
use crate::generator::{ChunkGenerator, PoolResolver};
use crate::neighbors::NeighborGrid;
use crate::status::{ChunkStatus, stages};

/// Shared collaborators every stage task can reach. Cloned into each
/// worker; all members are thread-safe handles.
#[derive(Clone)]
pub struct StageContext {
    pub world: Arc<World>,
    pub reg: Arc<BlockRegistry>,
    pub generator: Arc<dyn ChunkGenerator>,
    pub resolver: Arc<dyn PoolResolver>,
    pub lighting: Arc<LightEngine>,
    pub diagnostics: Arc<PipelineDiagnostics>,
}

pub(crate) type GenerateFn = fn(&StageContext, &ChunkStatus, &NeighborGrid, &mut Chunk);
pub(crate) type LoadFn = fn(&StageContext, &ChunkStatus, &mut Chunk);

/// One generation task per stage, indexed by status index. Fixed at
/// compile time; the status table and this array must agree on order.
const GENERATE: [GenerateFn; 12] = [
    noop,
    structure_starts,
    structure_references,
    biomes,
    noise,
    surface,
    carvers,
    features,
    initialize_light,
    light,
    spawn,
    full,
];

/// Load-path counterparts. Most stages have nothing to redo when a chunk
/// comes back from storage; the light stage reruns the engine so a chunk
/// persisted before lighting still gets lit.
const LOAD: [LoadFn; 12] = [
    noop_load, noop_load, noop_load, noop_load, noop_load, noop_load, noop_load, noop_load,
    noop_load, light_load, noop_load, noop_load,
];

pub(crate) fn generation_task(status: &ChunkStatus) -> GenerateFn {
    GENERATE[status.index().0 as usize]
}

pub(crate) fn load_task(status: &ChunkStatus) -> LoadFn {
    LOAD[status.index().0 as usize]
}

fn noop(_ctx: &StageContext, _status: &ChunkStatus, _neighbors: &NeighborGrid, _chunk: &mut Chunk) {}

fn noop_load(_ctx: &StageContext, _status: &ChunkStatus, _chunk: &mut Chunk) {}

/// Resolves each pool the generator names. A missing pool is tolerated:
/// it contributes nothing and the chunk promotes anyway, but the miss is
/// logged and recorded so a misconfigured data pack stays visible.
fn structure_starts(
    ctx: &StageContext,
    status: &ChunkStatus,
    _neighbors: &NeighborGrid,
    chunk: &mut Chunk,
) {
    for id in ctx.generator.structure_pool_ids() {
        match ctx.resolver.resolve(id) {
            Some(pool) => {
                log::debug!(
                    "chunk {:?}: pool {:?} resolved with {} pieces",
                    chunk.coord(),
                    pool.id(),
                    pool.pieces().len()
                );
            }
            None => {
                log::warn!(
                    "chunk {:?}: template pool {id:?} does not exist, skipping",
                    chunk.coord()
                );
                ctx.diagnostics.record_skip(status.name(), chunk.coord(), id);
            }
        }
    }
}

fn structure_references(
    _ctx: &StageContext,
    _status: &ChunkStatus,
    neighbors: &NeighborGrid,
    chunk: &mut Chunk,
) {
    // Starts carry no persisted placement data here, so there is nothing
    // to cross-reference; the stage still exists to hold its margin.
    log::trace!(
        "chunk {:?}: referenced {} neighbors",
        chunk.coord(),
        neighbors.iter().count()
    );
}

fn biomes(ctx: &StageContext, _status: &ChunkStatus, neighbors: &NeighborGrid, chunk: &mut Chunk) {
    ctx.generator.place_biomes(chunk, neighbors);
}

fn noise(ctx: &StageContext, _status: &ChunkStatus, neighbors: &NeighborGrid, chunk: &mut Chunk) {
    ctx.generator.fill_noise(chunk, neighbors);
}

fn surface(ctx: &StageContext, _status: &ChunkStatus, neighbors: &NeighborGrid, chunk: &mut Chunk) {
    ctx.generator.build_surface(chunk, neighbors);
}

fn carvers(ctx: &StageContext, _status: &ChunkStatus, neighbors: &NeighborGrid, chunk: &mut Chunk) {
    ctx.generator.carve(chunk, neighbors);
}

fn features(ctx: &StageContext, _status: &ChunkStatus, neighbors: &NeighborGrid, chunk: &mut Chunk) {
    ctx.generator.place_features(chunk, neighbors);
}

fn initialize_light(
    _ctx: &StageContext,
    _status: &ChunkStatus,
    _neighbors: &NeighborGrid,
    _chunk: &mut Chunk,
) {
    // Light nibbles allocate lazily on first write; nothing to prepare.
}

fn light(ctx: &StageContext, _status: &ChunkStatus, _neighbors: &NeighborGrid, chunk: &mut Chunk) {
    run_light(ctx, chunk);
}

fn light_load(ctx: &StageContext, _status: &ChunkStatus, chunk: &mut Chunk) {
    run_light(ctx, chunk);
}

/// Block-light reseeding is skipped only on the reload path: the chunk
/// already reached the light stage once and still carries its flag.
fn run_light(ctx: &StageContext, chunk: &mut Chunk) {
    let skip_block_reseed = chunk.status().is_at_least(stages::LIGHT) && chunk.is_lighted();
    ctx.lighting.light_chunk(chunk, skip_block_reseed);
}

fn spawn(_ctx: &StageContext, _status: &ChunkStatus, _neighbors: &NeighborGrid, _chunk: &mut Chunk) {
    // Entity placement belongs to the world simulation, not terrain.
}

fn full(_ctx: &StageContext, _status: &ChunkStatus, _neighbors: &NeighborGrid, _chunk: &mut Chunk) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{EmptyPoolResolver, FlatGenerator, StaticPoolResolver, StructurePool};
    use crate::status::StatusTable;
    use loam_world::ChunkCoord;

    fn context(resolver: Arc<dyn PoolResolver>, pools: Vec<String>) -> StageContext {
        let reg = Arc::new(BlockRegistry::builtin());
        StageContext {
            world: Arc::new(World::new(0, 64, 7)),
            reg: reg.clone(),
            generator: Arc::new(FlatGenerator::standard(reg.clone()).with_pools(pools)),
            resolver,
            lighting: Arc::new(LightEngine::new(reg)),
            diagnostics: Arc::new(PipelineDiagnostics::new()),
        }
    }

    #[test]
    fn missing_pool_is_skipped_and_recorded() {
        let resolver = StaticPoolResolver::new(vec![StructurePool::new("ruin", vec![])]);
        let ctx = context(
            Arc::new(resolver),
            vec!["ruin".to_string(), "village/center".to_string()],
        );
        let table = StatusTable::standard();
        let status = table.get(stages::STRUCTURE_STARTS);
        let mut chunk = Chunk::new_empty(ChunkCoord::new(2, 3), &ctx.world);

        structure_starts(&ctx, status, &NeighborGrid::solo(chunk.coord()), &mut chunk);

        assert_eq!(ctx.diagnostics.skip_count(), 1);
        let skips = ctx.diagnostics.skips();
        assert_eq!(skips[0].reference, "village/center");
        assert_eq!(skips[0].chunk, ChunkCoord::new(2, 3));
        assert_eq!(skips[0].stage, "structure_starts");
    }

    #[test]
    fn light_task_marks_the_chunk_lighted() {
        let ctx = context(Arc::new(EmptyPoolResolver), Vec::new());
        let table = StatusTable::standard();
        let mut chunk = Chunk::new_empty(ChunkCoord::new(0, 0), &ctx.world);
        let grid = NeighborGrid::solo(chunk.coord());

        noise(&ctx, table.get(stages::NOISE), &grid, &mut chunk);
        surface(&ctx, table.get(stages::SURFACE), &grid, &mut chunk);
        light(&ctx, table.get(stages::LIGHT), &grid, &mut chunk);

        assert!(chunk.is_lighted());
        // Open sky above the grass cap.
        assert_eq!(chunk.sections()[1].sky_light().get(4, 0, 4), 15);
    }

    #[test]
    fn reload_keeps_existing_block_light() {
        let ctx = context(Arc::new(EmptyPoolResolver), Vec::new());
        let table = StatusTable::standard();
        let mut chunk = Chunk::new_empty(ChunkCoord::new(0, 0), &ctx.world);
        let grid = NeighborGrid::solo(chunk.coord());

        light(&ctx, table.get(stages::LIGHT), &grid, &mut chunk);
        for idx in stages::STRUCTURE_STARTS.0..=stages::LIGHT.0 {
            chunk.advance_status(loam_chunk::StatusIndex(idx));
        }
        // Reload path: already lighted and at the light stage, so block
        // light is not reseeded.
        light_load(&ctx, table.get(stages::LIGHT), &mut chunk);
        assert!(chunk.is_lighted());
    }
}
