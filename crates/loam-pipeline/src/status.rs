use loam_chunk::StatusIndex;

/// Whether a chunk at this status is still under construction or ready
/// for the outside world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkKind {
    Proto,
    Complete,
}

/// Immutable descriptor for one point in the generation pipeline. The
/// name exists for debugging and serialization only; runtime lookups go
/// through `index`.
#[derive(Clone, Debug)]
pub struct ChunkStatus {
    name: &'static str,
    index: StatusIndex,
    previous: StatusIndex,
    task_margin: i32,
    kind: ChunkKind,
}

impl ChunkStatus {
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn index(&self) -> StatusIndex {
        self.index
    }

    /// Index of the stage before this one; the first stage points at
    /// itself.
    #[inline]
    pub fn previous(&self) -> StatusIndex {
        self.previous
    }

    /// Neighbor ring radius that must be at `previous` before this
    /// stage's task may run.
    #[inline]
    pub fn task_margin(&self) -> i32 {
        self.task_margin
    }

    #[inline]
    pub fn kind(&self) -> ChunkKind {
        self.kind
    }

    #[inline]
    pub fn is_at_least(&self, other: &ChunkStatus) -> bool {
        self.index.is_at_least(other.index)
    }
}

/// Well-known stage positions, in registration order.
pub mod stages {
    use loam_chunk::StatusIndex;

    pub const EMPTY: StatusIndex = StatusIndex(0);
    pub const STRUCTURE_STARTS: StatusIndex = StatusIndex(1);
    pub const STRUCTURE_REFERENCES: StatusIndex = StatusIndex(2);
    pub const BIOMES: StatusIndex = StatusIndex(3);
    pub const NOISE: StatusIndex = StatusIndex(4);
    pub const SURFACE: StatusIndex = StatusIndex(5);
    pub const CARVERS: StatusIndex = StatusIndex(6);
    pub const FEATURES: StatusIndex = StatusIndex(7);
    pub const INITIALIZE_LIGHT: StatusIndex = StatusIndex(8);
    pub const LIGHT: StatusIndex = StatusIndex(9);
    pub const SPAWN: StatusIndex = StatusIndex(10);
    pub const FULL: StatusIndex = StatusIndex(11);
}

/// Process-wide ordered stage list plus the precomputed two-way distance
/// table. Built once at pipeline initialization and shared from then on.
#[derive(Debug)]
pub struct StatusTable {
    statuses: Vec<ChunkStatus>,
    status_by_distance: Vec<StatusIndex>,
    distance_by_status: Vec<i32>,
}

impl StatusTable {
    /// The standard pipeline: twelve stages from `empty` to `full`.
    pub fn standard() -> Self {
        let mut b = Builder::default();
        b.register("empty", 0, ChunkKind::Proto);
        b.register("structure_starts", 0, ChunkKind::Proto);
        b.register("structure_references", 8, ChunkKind::Proto);
        b.register("biomes", 8, ChunkKind::Proto);
        b.register("noise", 8, ChunkKind::Proto);
        b.register("surface", 8, ChunkKind::Proto);
        b.register("carvers", 8, ChunkKind::Proto);
        b.register("features", 1, ChunkKind::Proto);
        b.register("initialize_light", 0, ChunkKind::Proto);
        b.register("light", 1, ChunkKind::Proto);
        b.register("spawn", 0, ChunkKind::Proto);
        b.register("full", 0, ChunkKind::Complete);
        b.build()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    #[inline]
    pub fn get(&self, index: StatusIndex) -> &ChunkStatus {
        &self.statuses[index.0 as usize]
    }

    #[inline]
    pub fn first(&self) -> &ChunkStatus {
        &self.statuses[0]
    }

    #[inline]
    pub fn terminal(&self) -> &ChunkStatus {
        self.statuses.last().expect("table is never empty")
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChunkStatus> {
        self.statuses.iter()
    }

    /// Minimum status achievable `distance` rings away from a fully
    /// generated chunk. Negative distances are inside the full area and
    /// yield the terminal status; distances beyond the table yield the
    /// lowest.
    pub fn by_distance_from_full(&self, distance: i32) -> &ChunkStatus {
        if distance < 0 {
            return self.terminal();
        }
        let idx = self
            .status_by_distance
            .get(distance as usize)
            .copied()
            .unwrap_or(self.first().index());
        self.get(idx)
    }

    /// Inverse of the distance table, read by status index: the ring at
    /// which `status` first becomes the achievable minimum.
    #[inline]
    pub fn distance_from_full(&self, status: StatusIndex) -> i32 {
        self.distance_by_status[status.0 as usize]
    }

    /// Total keep-alive radius the external loader needs around a chunk
    /// it wants fully generated.
    #[inline]
    pub fn max_distance(&self) -> i32 {
        (self.status_by_distance.len() - 1) as i32
    }
}

#[derive(Default)]
struct Builder {
    statuses: Vec<ChunkStatus>,
}

impl Builder {
    fn register(&mut self, name: &'static str, task_margin: i32, kind: ChunkKind) {
        assert!(task_margin >= 0);
        let index = StatusIndex(self.statuses.len() as u8);
        let previous = if index.0 == 0 { index } else { StatusIndex(index.0 - 1) };
        self.statuses.push(ChunkStatus {
            name,
            index,
            previous,
            task_margin,
            kind,
        });
    }

    /// Finalizes the table and derives the distance table by reverse
    /// traversal: walking inward from the terminal stage, each ring of a
    /// stage's margin pushes the achievable minimum one ring further out
    /// at the previous status.
    fn build(self) -> StatusTable {
        let statuses = self.statuses;
        assert!(!statuses.is_empty(), "pipeline needs at least one stage");

        let mut status_by_distance = vec![statuses.last().expect("non-empty").index()];
        let mut cursor = statuses.len() - 1;
        while cursor > 0 {
            let status = &statuses[cursor];
            for _ in 0..status.task_margin {
                status_by_distance.push(status.previous());
            }
            cursor -= 1;
        }
        // A bare table (all margins zero) still needs its far end to be
        // the lowest status.
        if *status_by_distance.last().expect("non-empty") != statuses[0].index() {
            status_by_distance.push(statuses[0].index());
        }

        let mut distance_by_status = vec![0i32; statuses.len()];
        for status in &statuses {
            let d = status_by_distance
                .iter()
                .position(|&s| !s.is_at_least(StatusIndex(status.index().0 + 1)))
                .unwrap_or(status_by_distance.len() - 1) as i32;
            distance_by_status[status.index().0 as usize] = d;
        }

        StatusTable {
            statuses,
            status_by_distance,
            distance_by_status,
        }
    }
}
