/// Number of bytes backing one fully allocated nibble field.
pub const NIBBLE_BYTES: usize = 2048;

/// 4096 4-bit cells for one 16x16x16 section, two cells per byte. Backing
/// storage is allocated on first write; an unallocated array reads as all
/// zero everywhere.
#[derive(Clone, Debug, Default)]
pub struct NibbleArray {
    data: Option<Box<[u8]>>,
}

impl NibbleArray {
    pub const fn new() -> Self {
        Self { data: None }
    }

    /// Reconstructs from a persisted 2048-byte block.
    ///
    /// # Panics
    /// Panics if `bytes` is not exactly 2048 bytes.
    pub fn from_raw(bytes: Vec<u8>) -> Self {
        assert_eq!(bytes.len(), NIBBLE_BYTES, "nibble field must be 2048 bytes");
        Self {
            data: Some(bytes.into_boxed_slice()),
        }
    }

    #[inline]
    pub fn cell_index(x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < 16 && y < 16 && z < 16);
        (y << 8) | (z << 4) | x
    }

    #[inline]
    pub fn is_uninitialized(&self) -> bool {
        self.data.is_none()
    }

    /// Persisted form: the full byte block, or `None` when never written
    /// (absent-means-zero on reload).
    #[inline]
    pub fn raw(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    #[inline]
    pub fn get_index(&self, idx: usize) -> u8 {
        debug_assert!(idx < 4096);
        match &self.data {
            None => 0,
            Some(bytes) => {
                let byte = bytes[idx >> 1];
                if idx & 1 == 0 { byte & 0x0f } else { byte >> 4 }
            }
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        self.get_index(Self::cell_index(x, y, z))
    }

    pub fn set_index(&mut self, idx: usize, value: u8) {
        debug_assert!(idx < 4096);
        debug_assert!(value <= 0x0f);
        let bytes = self
            .data
            .get_or_insert_with(|| vec![0u8; NIBBLE_BYTES].into_boxed_slice());
        let slot = &mut bytes[idx >> 1];
        if idx & 1 == 0 {
            *slot = (*slot & 0xf0) | (value & 0x0f);
        } else {
            *slot = (*slot & 0x0f) | ((value & 0x0f) << 4);
        }
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: u8) {
        self.set_index(Self::cell_index(x, y, z), value);
    }

    pub fn fill(&mut self, value: u8) {
        debug_assert!(value <= 0x0f);
        let packed = (value << 4) | value;
        match &mut self.data {
            Some(bytes) => bytes.fill(packed),
            None => self.data = Some(vec![packed; NIBBLE_BYTES].into_boxed_slice()),
        }
    }

    /// Independent copy; copying an unallocated array yields another
    /// unallocated one.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}
