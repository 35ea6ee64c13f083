/// Fixed-length bit-packed storage for palette indices. Entries never span
/// a word boundary, so each u64 holds `64 / bits` whole entries.
#[derive(Clone, Debug)]
pub struct PackedArray {
    bits: usize,
    len: usize,
    words: Vec<u64>,
}

impl PackedArray {
    /// # Panics
    /// Panics unless `1 <= bits <= 32`.
    pub fn new(bits: usize, len: usize) -> Self {
        assert!((1..=32).contains(&bits), "entry width out of range");
        let per_word = 64 / bits;
        let words = vec![0u64; len.div_ceil(per_word)];
        Self { bits, len, words }
    }

    pub fn from_words(bits: usize, len: usize, words: Vec<u64>) -> Self {
        let mut arr = Self::new(bits, len);
        assert_eq!(arr.words.len(), words.len(), "word count mismatch");
        arr.words = words;
        arr
    }

    #[inline]
    pub fn bits(&self) -> usize {
        self.bits
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    #[inline]
    fn slot(&self, idx: usize) -> (usize, u32) {
        let per_word = 64 / self.bits;
        (idx / per_word, ((idx % per_word) * self.bits) as u32)
    }

    #[inline]
    pub fn get(&self, idx: usize) -> u32 {
        debug_assert!(idx < self.len);
        let (word, shift) = self.slot(idx);
        let mask = (1u64 << self.bits) - 1;
        ((self.words[word] >> shift) & mask) as u32
    }

    #[inline]
    pub fn set(&mut self, idx: usize, value: u32) {
        debug_assert!(idx < self.len);
        debug_assert!(u64::from(value) < (1u64 << self.bits));
        let (word, shift) = self.slot(idx);
        let mask = (1u64 << self.bits) - 1;
        let w = &mut self.words[word];
        *w = (*w & !(mask << shift)) | ((u64::from(value) & mask) << shift);
    }

    /// Rebuilds at a wider entry width, copying every entry. Used when the
    /// owning section's palette grows.
    pub fn resized(&self, new_bits: usize) -> Self {
        assert!(new_bits >= self.bits, "packed storage only widens");
        let mut out = Self::new(new_bits, self.len);
        for idx in 0..self.len {
            out.set(idx, self.get(idx));
        }
        out
    }
}

/// Log base 2, rounded up; the entry width needed to store ids below `n`.
#[inline]
pub fn log2_ceil(n: usize) -> usize {
    n.next_power_of_two().trailing_zeros() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_trips_at_the_width_limit() {
        let mut arr = PackedArray::new(4, 4096);
        arr.set(0, 15);
        arr.set(4095, 7);
        assert_eq!(arr.get(0), 15);
        assert_eq!(arr.get(4095), 7);
        assert_eq!(arr.get(1), 0);
    }

    #[test]
    fn resized_preserves_entries() {
        let mut arr = PackedArray::new(4, 100);
        for idx in 0..100 {
            arr.set(idx, (idx % 16) as u32);
        }
        let wide = arr.resized(5);
        assert_eq!(wide.bits(), 5);
        for idx in 0..100 {
            assert_eq!(wide.get(idx), (idx % 16) as u32);
        }
    }

    proptest! {
        #[test]
        fn set_get(bits in 1usize..=16, idx in 0usize..4096, raw in 0u32..u32::MAX) {
            let value = raw % (1u32 << bits);
            let mut arr = PackedArray::new(bits, 4096);
            arr.set(idx, value);
            prop_assert_eq!(arr.get(idx), value);
        }
    }
}
