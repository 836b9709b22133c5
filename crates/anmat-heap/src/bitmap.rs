//! Occupancy bitmap: one bit per arena byte plus a trailing guard byte.
//!
//! Bit `i` lives in byte `i >> 3` at bit position `i & 7` (LSB first).
//! A set bit means the arena byte belongs to a live allocation. The guard
//! byte after the last addressable bit is never written, so any forward
//! scan that runs one position past the end reads a zero.

/// Packed occupancy bits for an arena of `capacity` bytes.
#[derive(Clone, Debug)]
pub struct OccupancyBitmap {
    /// `capacity / 8` addressable bytes followed by one zero guard byte.
    bytes: Box<[u8]>,
    capacity: usize,
}

#[inline]
fn mask(bit: usize) -> u8 {
    1 << (bit & 7)
}

impl OccupancyBitmap {
    /// Create an all-clear bitmap for `capacity` arena bytes.
    ///
    /// `capacity` must be a non-zero multiple of 8.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0 && capacity % 8 == 0);
        Self {
            bytes: vec![0u8; (capacity >> 3) + 1].into_boxed_slice(),
            capacity,
        }
    }

    /// Number of addressable bits (equal to the arena capacity).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of addressable bitmap bytes (guard byte excluded).
    pub fn byte_len(&self) -> usize {
        self.capacity >> 3
    }

    /// Whether bit `bit` is set. Positions at or past `capacity` read the
    /// guard byte and are always clear.
    #[inline]
    pub fn is_set(&self, bit: usize) -> bool {
        self.bytes
            .get(bit >> 3)
            .is_some_and(|byte| byte & mask(bit) != 0)
    }

    /// Set bit `bit`.
    ///
    /// # Panics
    ///
    /// Panics if `bit >= capacity`.
    #[inline]
    pub fn set(&mut self, bit: usize) {
        assert!(bit < self.capacity, "bit {bit} outside bitmap");
        self.bytes[bit >> 3] |= mask(bit);
    }

    /// Clear bit `bit`. Clearing a position in the guard byte is a no-op.
    #[inline]
    pub fn clear(&mut self, bit: usize) {
        if bit < self.capacity {
            self.bytes[bit >> 3] &= !mask(bit);
        }
    }

    /// The packed byte holding bits `index * 8 .. index * 8 + 8`.
    ///
    /// `index == byte_len()` returns the guard byte.
    pub fn byte(&self, index: usize) -> u8 {
        self.bytes.get(index).copied().unwrap_or(0)
    }

    /// The guard byte. Always zero unless something has corrupted storage.
    pub fn guard(&self) -> u8 {
        self.bytes[self.byte_len()]
    }

    /// Clear every addressable bit.
    pub fn reset(&mut self) {
        self.bytes.fill(0);
    }

    /// Number of clear bits over `[0, capacity)`.
    pub fn count_zeros(&self) -> usize {
        let ones: usize = self.bytes[..self.byte_len()]
            .iter()
            .map(|b| b.count_ones() as usize)
            .sum();
        self.capacity - ones
    }

    /// Number of maximal runs of set bits over `[0, capacity)`.
    pub fn count_runs(&self) -> usize {
        (0..self.capacity)
            .filter(|&bit| self.is_set(bit) && (bit == 0 || !self.is_set(bit - 1)))
            .count()
    }

    /// Length of the run of set bits starting at `bit`.
    pub fn run_len(&self, bit: usize) -> usize {
        (bit..self.capacity)
            .take_while(|&b| self.is_set(b))
            .count()
    }
}
