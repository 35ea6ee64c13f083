//! Block state ids and the process-wide registry.
#![forbid(unsafe_code)]

pub mod config;
pub mod registry;
pub mod types;

pub use config::{BlockDef, BlocksConfig};
pub use registry::BlockRegistry;
pub use types::BlockState;
