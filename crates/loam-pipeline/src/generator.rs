use std::sync::Arc;

use loam_blocks::{BlockRegistry, BlockState};
use loam_chunk::Chunk;

use crate::neighbors::NeighborGrid;

/// A named template pool a structure stage can draw from. Pools live in
/// external data packs; the pipeline only resolves them by id.
#[derive(Clone, Debug)]
pub struct StructurePool {
    id: String,
    pieces: Vec<String>,
}

impl StructurePool {
    pub fn new(id: impl Into<String>, pieces: Vec<String>) -> Self {
        Self {
            id: id.into(),
            pieces,
        }
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn pieces(&self) -> &[String] {
        &self.pieces
    }
}

/// Resolves pool ids named by the generator. Absent ids are tolerated at
/// the call site: the stage logs and skips, it never fails the chunk.
pub trait PoolResolver: Send + Sync {
    fn resolve(&self, id: &str) -> Option<Arc<StructurePool>>;
}

/// Resolver with no pools at all; every lookup misses.
#[derive(Default)]
pub struct EmptyPoolResolver;

impl PoolResolver for EmptyPoolResolver {
    fn resolve(&self, _id: &str) -> Option<Arc<StructurePool>> {
        None
    }
}

/// Resolver over a fixed in-memory pool set.
#[derive(Default)]
pub struct StaticPoolResolver {
    pools: Vec<Arc<StructurePool>>,
}

impl StaticPoolResolver {
    pub fn new(pools: Vec<StructurePool>) -> Self {
        Self {
            pools: pools.into_iter().map(Arc::new).collect(),
        }
    }
}

impl PoolResolver for StaticPoolResolver {
    fn resolve(&self, id: &str) -> Option<Arc<StructurePool>> {
        self.pools.iter().find(|p| p.id() == id).cloned()
    }
}

/// Per-stage terrain strategy. The pipeline sequences these calls and
/// enforces margins and ordering; what the blocks actually look like is
/// entirely the strategy's business. Neighbors are read-only and only
/// populated out to the calling stage's margin.
pub trait ChunkGenerator: Send + Sync {
    /// Pool ids the structure stages will try to resolve.
    fn structure_pool_ids(&self) -> &[String] {
        &[]
    }

    fn place_biomes(&self, _chunk: &mut Chunk, _neighbors: &NeighborGrid) {}

    fn fill_noise(&self, chunk: &mut Chunk, neighbors: &NeighborGrid);

    fn build_surface(&self, chunk: &mut Chunk, neighbors: &NeighborGrid);

    fn carve(&self, _chunk: &mut Chunk, _neighbors: &NeighborGrid) {}

    fn place_features(&self, _chunk: &mut Chunk, _neighbors: &NeighborGrid) {}
}

#[derive(Clone, Copy, Debug)]
struct FlatLayer {
    block: BlockState,
    thickness: i32,
}

/// Layered superflat reference generator: a bedrock floor, a dirt body
/// and a grass cap, rising from the world floor. Exists so the pipeline
/// has a complete concrete strategy for tests and the demo binary; real
/// terrain math is an injected replacement.
pub struct FlatGenerator {
    reg: Arc<BlockRegistry>,
    layers: Vec<FlatLayer>,
    surface: BlockState,
    pool_ids: Vec<String>,
    decorate_with: Option<BlockState>,
}

impl FlatGenerator {
    /// The classic stack: 1 bedrock, 3 dirt, grass on top.
    ///
    /// # Panics
    /// Panics if the registry lacks the builtin block names.
    pub fn standard(reg: Arc<BlockRegistry>) -> Self {
        let block = |name: &str| {
            reg.id_by_name(name)
                .unwrap_or_else(|| panic!("registry has no block named {name:?}"))
        };
        let layers = vec![
            FlatLayer {
                block: block("bedrock"),
                thickness: 1,
            },
            FlatLayer {
                block: block("dirt"),
                thickness: 3,
            },
        ];
        let surface = block("grass");
        Self {
            reg,
            layers,
            surface,
            pool_ids: Vec::new(),
            decorate_with: None,
        }
    }

    /// Names the template pools the structure stages should resolve.
    pub fn with_pools(mut self, ids: Vec<String>) -> Self {
        self.pool_ids = ids;
        self
    }

    /// Drops one block of `name` on the surface of every chunk during the
    /// feature stage. Handy for exercising block light downstream.
    pub fn with_decoration(mut self, name: &str) -> Self {
        self.decorate_with = self.reg.id_by_name(name);
        if self.decorate_with.is_none() {
            log::warn!("decoration block {name:?} not registered, features disabled");
        }
        self
    }

    fn body_top_y(&self, chunk: &Chunk) -> i32 {
        let depth: i32 = self.layers.iter().map(|l| l.thickness).sum();
        chunk.min_y() + depth
    }
}

impl ChunkGenerator for FlatGenerator {
    fn structure_pool_ids(&self) -> &[String] {
        &self.pool_ids
    }

    fn fill_noise(&self, chunk: &mut Chunk, _neighbors: &NeighborGrid) {
        let mut y = chunk.min_y();
        for layer in &self.layers {
            for _ in 0..layer.thickness {
                for z in 0..16 {
                    for x in 0..16 {
                        chunk.set_block_at(x, y, z, layer.block, &self.reg);
                    }
                }
                y += 1;
            }
        }
    }

    fn build_surface(&self, chunk: &mut Chunk, _neighbors: &NeighborGrid) {
        let y = self.body_top_y(chunk);
        for z in 0..16 {
            for x in 0..16 {
                chunk.set_block_at(x, y, z, self.surface, &self.reg);
            }
        }
    }

    fn place_features(&self, chunk: &mut Chunk, _neighbors: &NeighborGrid) {
        if let Some(block) = self.decorate_with {
            let y = self.body_top_y(chunk) + 1;
            chunk.set_block_at(8, y, 8, block, &self.reg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_world::{ChunkCoord, World};

    fn flat_world() -> (Arc<BlockRegistry>, World) {
        (Arc::new(BlockRegistry::builtin()), World::new(0, 64, 0))
    }

    #[test]
    fn flat_generator_builds_the_classic_stack() {
        let (reg, world) = flat_world();
        let flat = FlatGenerator::standard(reg.clone());
        let mut chunk = Chunk::new_empty(ChunkCoord::new(0, 0), &world);
        let grid = NeighborGrid::solo(chunk.coord());
        flat.fill_noise(&mut chunk, &grid);
        flat.build_surface(&mut chunk, &grid);

        assert_eq!(reg.name_of(chunk.block_at(5, 0, 5)), "bedrock");
        assert_eq!(reg.name_of(chunk.block_at(5, 2, 5)), "dirt");
        assert_eq!(reg.name_of(chunk.block_at(5, 4, 5)), "grass");
        assert!(chunk.block_at(5, 5, 5).is_air());
    }

    #[test]
    fn decoration_lands_one_above_the_surface() {
        let (reg, world) = flat_world();
        let flat = FlatGenerator::standard(reg.clone()).with_decoration("glowstone");
        let mut chunk = Chunk::new_empty(ChunkCoord::new(1, -1), &world);
        let grid = NeighborGrid::solo(chunk.coord());
        flat.fill_noise(&mut chunk, &grid);
        flat.build_surface(&mut chunk, &grid);
        flat.place_features(&mut chunk, &grid);
        assert_eq!(reg.name_of(chunk.block_at(8, 5, 8)), "glowstone");
    }

    #[test]
    fn static_resolver_hits_and_misses() {
        let resolver = StaticPoolResolver::new(vec![StructurePool::new(
            "village/plains",
            vec!["well".into(), "path".into()],
        )]);
        assert_eq!(
            resolver.resolve("village/plains").map(|p| p.pieces().len()),
            Some(2)
        );
        assert!(resolver.resolve("village/desert").is_none());
        assert!(EmptyPoolResolver.resolve("village/plains").is_none());
    }
}
