use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use hashbrown::HashMap;
use loam_blocks::BlockRegistry;
use loam_chunk::{Chunk, ChunkSource, RegionCache, StatusIndex};
use loam_light::LightEngine;
use loam_pipeline::{
    FlatGenerator, GenRuntime, NeighborGrid, PipelineDiagnostics, Promotion, StageContext,
    StaticPoolResolver, StatusTable, StructurePool, stages,
};
use loam_world::{BlockPos, ChunkCoord, World, WorldConfig};

#[derive(Parser)]
#[command(name = "loam", about = "Staged, dependency-aware chunk generation demo")]
struct Cli {
    /// Rings of fully generated chunks around the origin
    #[arg(long, default_value_t = 1)]
    radius: i32,

    /// World seed (overrides the config file)
    #[arg(long)]
    seed: Option<i64>,

    /// Worker threads, 0 uses all cores
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// TOML world parameters (min_y, height, seed)
    #[arg(long)]
    world_config: Option<PathBuf>,

    /// TOML block definitions
    #[arg(long)]
    blocks_config: Option<PathBuf>,

    /// Template pool ids the generator should request; unknown ids are
    /// skipped with a warning
    #[arg(long = "pool")]
    pools: Vec<String>,
}

struct MapSource<'a>(&'a HashMap<ChunkCoord, Arc<Chunk>>);

impl ChunkSource for MapSource<'_> {
    fn chunk_at(&self, coord: ChunkCoord) -> Option<Arc<Chunk>> {
        self.0.get(&coord).cloned()
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let reg = match &cli.blocks_config {
        Some(path) => match BlockRegistry::load_from_path(path) {
            Ok(reg) => Arc::new(reg),
            Err(err) => {
                log::error!("failed to load block config {}: {err}", path.display());
                std::process::exit(1);
            }
        },
        None => Arc::new(BlockRegistry::builtin()),
    };
    let mut world_cfg = match &cli.world_config {
        Some(path) => match WorldConfig::load_from_path(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                log::error!("failed to load world config {}: {err}", path.display());
                std::process::exit(1);
            }
        },
        None => WorldConfig::default(),
    };
    if let Some(seed) = cli.seed {
        world_cfg.seed = seed;
    }
    let world = Arc::new(World::from_config(&world_cfg));

    let table = Arc::new(StatusTable::standard());
    // The demo resolver only knows the plains pool; ask for others via
    // --pool to watch the skip path in action.
    let resolver = StaticPoolResolver::new(vec![StructurePool::new(
        "village/plains",
        vec!["well".into(), "farm".into(), "path".into()],
    )]);
    let generator = FlatGenerator::standard(reg.clone())
        .with_pools(cli.pools.clone())
        .with_decoration("glowstone");
    let diagnostics = Arc::new(PipelineDiagnostics::new());
    let ctx = StageContext {
        world: world.clone(),
        reg: reg.clone(),
        generator: Arc::new(generator),
        resolver: Arc::new(resolver),
        lighting: Arc::new(LightEngine::new(reg.clone())),
        diagnostics: diagnostics.clone(),
    };
    let runtime = GenRuntime::new(cli.workers, table.clone(), ctx);

    // To hand out `radius` rings of full chunks, the area has to extend
    // another max_distance rings of partially generated scaffolding.
    let extent = cli.radius + table.max_distance();
    let mut chunks: HashMap<ChunkCoord, Arc<Chunk>> = HashMap::new();
    for cz in -extent..=extent {
        for cx in -extent..=extent {
            let coord = ChunkCoord::new(cx, cz);
            chunks.insert(coord, Arc::new(Chunk::new_empty(coord, &world)));
        }
    }
    log::info!(
        "generating {} chunks ({} rings full, {} rings scaffolding)",
        chunks.len(),
        cli.radius,
        table.max_distance(),
    );

    let started = Instant::now();
    let origin = ChunkCoord::new(0, 0);
    for stage_idx in 1..table.len() as u8 {
        let target = table.get(StatusIndex(stage_idx)).clone();
        let margin = target.task_margin();
        let due: Vec<ChunkCoord> = chunks
            .keys()
            .copied()
            .filter(|c| {
                let ring = (c.ring_distance(origin) - cli.radius).max(0);
                table
                    .by_distance_from_full(ring)
                    .index()
                    .is_at_least(target.index())
            })
            .collect();

        let wave_started = Instant::now();
        let mut gathered = Vec::with_capacity(due.len());
        {
            let source = MapSource(&chunks);
            for &coord in &due {
                let grid = if margin == 0 {
                    NeighborGrid::solo(coord)
                } else {
                    NeighborGrid::gather(&source, coord, margin)
                };
                gathered.push((coord, grid));
            }
        }
        let mut handles = Vec::with_capacity(gathered.len());
        for (coord, grid) in gathered {
            let chunk = match chunks.remove(&coord).map(Arc::try_unwrap) {
                Some(Ok(chunk)) => chunk,
                Some(Err(shared)) => (*shared).clone(),
                None => continue,
            };
            handles.push((coord, runtime.run_generation_task(&target, chunk, grid)));
        }
        let count = handles.len();
        for (coord, handle) in handles {
            match handle.wait() {
                Ok(Promotion::Promoted(chunk)) => {
                    chunks.insert(coord, Arc::new(chunk));
                }
                Ok(Promotion::Unloaded) => log::warn!("chunk {coord:?} unloaded mid-wave"),
                Err(err) => log::error!("chunk {coord:?}: {err}"),
            }
        }
        log::info!(
            "stage {:<22} promoted {:>6} chunks in {:?}",
            target.name(),
            count,
            wave_started.elapsed(),
        );
    }

    let full = chunks
        .values()
        .filter(|c| c.status() == stages::FULL)
        .count();
    log::info!(
        "done: {} chunks at full out of {} in {:?}",
        full,
        chunks.len(),
        started.elapsed(),
    );

    // Read the finished area back through the cache, the way a mesher or
    // simulation slice would.
    let span = cli.radius * 16;
    let source = MapSource(&chunks);
    let cache = RegionCache::new(
        &source,
        &world,
        BlockPos::new(-span, world.min_y(), -span),
        BlockPos::new(span, world.max_y() - 1, span),
    );
    let surface = world.min_y() + 4;
    log::info!(
        "full area empty: {}, surface block at origin: {}",
        cache.is_empty(),
        reg.name_of(cache.block_at(BlockPos::new(0, surface, 0))),
    );

    for skip in diagnostics.skips() {
        log::warn!(
            "skipped reference {:?} at {:?} during {}",
            skip.reference,
            skip.chunk,
            skip.stage,
        );
    }
    if diagnostics.skip_count() > 0 {
        log::warn!("{} reference(s) skipped in total", diagnostics.skip_count());
    }
}
