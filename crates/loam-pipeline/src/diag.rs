use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use loam_world::ChunkCoord;

/// One tolerated skip: a stage found a named external reference missing
/// and contributed nothing for it instead of failing the chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkipEvent {
    pub stage: &'static str,
    pub chunk: ChunkCoord,
    pub reference: String,
}

/// Queryable record of tolerated skips. Promotion behavior stays
/// unchanged; the orchestrator can poll this to surface configuration
/// problems that would otherwise only exist as warning lines.
#[derive(Debug, Default)]
pub struct PipelineDiagnostics {
    skip_count: AtomicU64,
    events: Mutex<VecDeque<SkipEvent>>,
}

/// Bounded history; counters keep the true total.
const EVENT_CAP: usize = 256;

impl PipelineDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skip(&self, stage: &'static str, chunk: ChunkCoord, reference: &str) {
        self.skip_count.fetch_add(1, Ordering::Relaxed);
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        if events.len() == EVENT_CAP {
            events.pop_front();
        }
        events.push_back(SkipEvent {
            stage,
            chunk,
            reference: reference.to_string(),
        });
    }

    #[inline]
    pub fn skip_count(&self) -> u64 {
        self.skip_count.load(Ordering::Relaxed)
    }

    pub fn skips(&self) -> Vec<SkipEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}
