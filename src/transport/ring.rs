//! Fixed-capacity circular byte buffer.

/// Circular buffer tracked by a write cursor and a pending count.
///
/// The read position is derived as `write - count` modulo the capacity, so
/// the pair can never disagree about how much is stored.
pub struct ByteRing<const N: usize> {
    data: [u8; N],
    write: usize,
    count: usize,
}

impl<const N: usize> ByteRing<N> {
    pub const fn new() -> Self {
        Self {
            data: [0; N],
            write: 0,
            count: 0,
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == N
    }

    /// Append a byte; a full ring hands it back untouched.
    pub fn push(&mut self, byte: u8) -> Result<(), u8> {
        if self.is_full() {
            return Err(byte);
        }
        self.data[self.write] = byte;
        self.write = (self.write + 1) % N;
        self.count += 1;
        Ok(())
    }

    /// Remove the oldest byte.
    pub fn pop(&mut self) -> Option<u8> {
        if self.count == 0 {
            return None;
        }
        let read = (self.write + N - self.count) % N;
        self.count -= 1;
        Some(self.data[read])
    }

    pub fn clear(&mut self) {
        self.write = 0;
        self.count = 0;
    }
}

impl<const N: usize> Default for ByteRing<N> {
    fn default() -> Self {
        Self::new()
    }
}
