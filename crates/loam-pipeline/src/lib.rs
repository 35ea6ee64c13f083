//! Staged chunk promotion: status descriptors, the distance table, stage
//! tasks, and the worker runtime that drives them.
#![forbid(unsafe_code)]

mod diag;
mod generator;
mod handle;
mod neighbors;
mod runtime;
mod status;
mod tasks;

pub use diag::{PipelineDiagnostics, SkipEvent};
pub use generator::{
    ChunkGenerator, EmptyPoolResolver, FlatGenerator, PoolResolver, StaticPoolResolver,
    StructurePool,
};
pub use handle::PromotionHandle;
pub use neighbors::NeighborGrid;
pub use runtime::{GenRuntime, PipelineError, PromoteResult, Promotion};
pub use status::{ChunkKind, ChunkStatus, StatusTable, stages};
pub use tasks::StageContext;
