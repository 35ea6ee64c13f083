use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use crossbeam_channel::{Sender, bounded, unbounded};
use rayon::{ThreadPool, ThreadPoolBuilder};
use thiserror::Error;

use loam_chunk::Chunk;
use loam_world::ChunkCoord;

use crate::handle::PromotionHandle;
use crate::neighbors::NeighborGrid;
use crate::status::{ChunkStatus, StatusTable};
use crate::tasks::{StageContext, generation_task, load_task};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("loading chunk {coord:?} from storage failed: {source}")]
    Load { coord: ChunkCoord, source: io::Error },
}

/// Outcome of a promotion: the chunk one stage further along, or the
/// runtime let go of it before the task ran.
pub enum Promotion {
    Promoted(Chunk),
    Unloaded,
}

pub type PromoteResult = Result<Promotion, PipelineError>;

enum Job {
    Generate {
        target: ChunkStatus,
        chunk: Chunk,
        neighbors: NeighborGrid,
        done: Sender<PromoteResult>,
    },
    Load {
        target: ChunkStatus,
        chunk: Chunk,
        done: Sender<PromoteResult>,
    },
}

/// Worker pool that executes stage tasks off-thread. Margin and ordering
/// preconditions are checked on the submitting thread, so a scheduling
/// bug fails fast at the call site instead of inside a worker.
pub struct GenRuntime {
    table: Arc<StatusTable>,
    job_tx: Sender<Job>,
    queued: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
    stopping: Arc<AtomicBool>,
    _pool: Arc<ThreadPool>,
}

impl GenRuntime {
    pub fn new(workers: usize, table: Arc<StatusTable>, ctx: StageContext) -> Self {
        let workers = if workers == 0 {
            thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
        } else {
            workers
        };
        let (job_tx, job_rx) = unbounded::<Job>();
        let queued = Arc::new(AtomicUsize::new(0));
        let inflight = Arc::new(AtomicUsize::new(0));
        let stopping = Arc::new(AtomicBool::new(false));

        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("loam-gen-{i}"))
                .build()
                .expect("generation pool"),
        );
        for _ in 0..workers {
            let rx = job_rx.clone();
            let ctx = ctx.clone();
            let queued = queued.clone();
            let inflight = inflight.clone();
            let stopping = stopping.clone();
            pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    queued.fetch_sub(1, Ordering::Relaxed);
                    if stopping.load(Ordering::Relaxed) {
                        // Drain without executing; the submitter sees the
                        // chunk as unloaded.
                        let done = match job {
                            Job::Generate { done, .. } | Job::Load { done, .. } => done,
                        };
                        let _ = done.send(Ok(Promotion::Unloaded));
                        continue;
                    }
                    inflight.fetch_add(1, Ordering::Relaxed);
                    execute(&ctx, job);
                    inflight.fetch_sub(1, Ordering::Relaxed);
                }
            });
        }

        Self {
            table,
            job_tx,
            queued,
            inflight,
            stopping,
            _pool: pool,
        }
    }

    #[inline]
    pub fn table(&self) -> &StatusTable {
        &self.table
    }

    /// Jobs accepted but not yet picked up by a worker.
    #[inline]
    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::Relaxed)
    }

    /// Jobs currently executing.
    #[inline]
    pub fn inflight(&self) -> usize {
        self.inflight.load(Ordering::Relaxed)
    }

    /// Stops executing queued work. Jobs still in the queue resolve as
    /// `Unloaded`; jobs already running finish normally.
    pub fn shutdown(&self) {
        self.stopping.store(true, Ordering::Relaxed);
    }

    /// Promotes `chunk` to `target` by running that stage's generation
    /// task on a worker.
    ///
    /// Already at/above `target` is a no-op resolving immediately with
    /// the chunk unchanged; a stage is never applied twice.
    ///
    /// # Panics
    /// Panics if `target` is more than one stage ahead of the chunk's
    /// current status, or if `neighbors` does not satisfy the stage's
    /// declared margin. Both are orchestrator bugs; generating against an
    /// unmet precondition would corrupt terrain.
    pub fn run_generation_task(
        &self,
        target: &ChunkStatus,
        chunk: Chunk,
        neighbors: NeighborGrid,
    ) -> PromotionHandle {
        if chunk.status().is_at_least(target.index()) {
            return PromotionHandle::ready(Ok(Promotion::Promoted(chunk)));
        }
        assert_eq!(
            target.index().0,
            chunk.status().0 + 1,
            "stage {:?} invoked out of order on chunk {:?} at status {}",
            target.name(),
            chunk.coord(),
            chunk.status().0,
        );
        neighbors.assert_satisfies(&self.table, target);

        let (done, rx) = bounded(1);
        self.queued.fetch_add(1, Ordering::Relaxed);
        let sent = self.job_tx.send(Job::Generate {
            target: target.clone(),
            chunk,
            neighbors,
            done,
        });
        if sent.is_err() {
            self.queued.fetch_sub(1, Ordering::Relaxed);
            return PromotionHandle::ready(Ok(Promotion::Unloaded));
        }
        PromotionHandle::pending(rx)
    }

    /// Re-admits a chunk restored from storage at `target`. The load
    /// task re-runs no generation logic; the light stage re-runs the
    /// engine, skipping the block-light reseed when the chunk still
    /// carries its lighting.
    ///
    /// An `Err` from the storage layer is passed straight through as a
    /// failed handle; the caller decides whether to regenerate.
    ///
    /// # Panics
    /// Panics if `target` is more than one stage ahead of the restored
    /// chunk's status.
    pub fn run_load_task(
        &self,
        target: &ChunkStatus,
        loaded: Result<Chunk, PipelineError>,
    ) -> PromotionHandle {
        let chunk = match loaded {
            Ok(chunk) => chunk,
            Err(err) => return PromotionHandle::ready(Err(err)),
        };
        if chunk.status().is_at_least(target.index()) {
            return PromotionHandle::ready(Ok(Promotion::Promoted(chunk)));
        }
        assert_eq!(
            target.index().0,
            chunk.status().0 + 1,
            "load for stage {:?} out of order on chunk {:?} at status {}",
            target.name(),
            chunk.coord(),
            chunk.status().0,
        );

        let (done, rx) = bounded(1);
        self.queued.fetch_add(1, Ordering::Relaxed);
        let sent = self.job_tx.send(Job::Load {
            target: target.clone(),
            chunk,
            done,
        });
        if sent.is_err() {
            self.queued.fetch_sub(1, Ordering::Relaxed);
            return PromotionHandle::ready(Ok(Promotion::Unloaded));
        }
        PromotionHandle::pending(rx)
    }
}

fn execute(ctx: &StageContext, job: Job) {
    match job {
        Job::Generate {
            target,
            mut chunk,
            neighbors,
            done,
        } => {
            generation_task(&target)(ctx, &target, &neighbors, &mut chunk);
            chunk.advance_status(target.index());
            log::trace!("chunk {:?} promoted to {:?}", chunk.coord(), target.name());
            let _ = done.send(Ok(Promotion::Promoted(chunk)));
        }
        Job::Load {
            target,
            mut chunk,
            done,
        } => {
            load_task(&target)(ctx, &target, &mut chunk);
            chunk.advance_status(target.index());
            let _ = done.send(Ok(Promotion::Promoted(chunk)));
        }
    }
}
