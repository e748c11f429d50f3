//! Circular history buffer (sliding window) for LZ77 decompression.
//!
//! The buffer plays two roles at once. It is the queue of decoded bytes the
//! caller has not read yet, and it is the window that back-references copy
//! from. Bytes the caller has already popped stay in place until the write
//! cursor laps them, so they remain valid lookback sources.
//!
//! The capacity is fixed at the DEFLATE window of 32 KB. A larger window would
//! only hide encoders that emit out-of-range distances.

use crate::error::{KompressError, Result};

/// Window size for DEFLATE (32 KB).
pub const WINDOW_SIZE: usize = 32768;

/// Ring buffer holding the decoded output tail.
///
/// `available() + free() == capacity()` holds at all times.
#[derive(Debug, Clone)]
pub struct CircularHistoryBuffer {
    /// The underlying storage.
    buffer: Box<[u8]>,
    /// Index of the oldest unread byte.
    next_read: usize,
    /// Index the next written byte lands at.
    next_write: usize,
    /// Bytes written but not yet popped.
    available: usize,
    /// Bytes ever written, saturating at capacity.
    history: usize,
    /// Mask for efficient modulo (capacity - 1).
    mask: usize,
}

impl CircularHistoryBuffer {
    /// Create an empty buffer with the DEFLATE window capacity.
    pub fn new() -> Self {
        Self {
            buffer: vec![0; WINDOW_SIZE].into_boxed_slice(),
            next_read: 0,
            next_write: 0,
            available: 0,
            history: 0,
            mask: WINDOW_SIZE - 1,
        }
    }

    /// Get the capacity of the buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of bytes ready to be popped.
    pub fn available(&self) -> usize {
        self.available
    }

    /// Number of bytes that can be written before unread data is overwritten.
    pub fn free(&self) -> usize {
        self.capacity() - self.available
    }

    /// Number of bytes a back-reference may reach.
    pub fn history_len(&self) -> usize {
        self.history
    }

    /// Check if there is nothing to pop.
    pub fn is_empty(&self) -> bool {
        self.available == 0
    }

    /// Drop all buffered and historical bytes.
    pub fn clear(&mut self) {
        self.next_read = 0;
        self.next_write = 0;
        self.available = 0;
        self.history = 0;
    }

    /// Remove and return the oldest unread byte.
    #[inline]
    pub fn pop(&mut self) -> Option<u8> {
        if self.available == 0 {
            return None;
        }

        let byte = self.buffer[self.next_read];
        self.next_read = (self.next_read + 1) & self.mask;
        self.available -= 1;
        Some(byte)
    }

    /// Append a single byte.
    #[inline]
    pub fn push(&mut self, byte: u8) -> Result<()> {
        debug_assert!(self.free() > 0, "push into a full history buffer");
        if self.free() == 0 {
            return Err(KompressError::buffer_too_small(1, 0));
        }

        self.write_unchecked(byte);
        Ok(())
    }

    /// Append `length` bytes copied from `distance` bytes behind the write
    /// cursor.
    ///
    /// The copy runs forward one byte at a time, so a `length` larger than
    /// `distance` repeats the referenced pattern: bytes written earlier in the
    /// same call are valid sources for later ones.
    ///
    /// # Arguments
    ///
    /// * `length` - Number of bytes to append
    /// * `distance` - Distance back from the write cursor (1-based)
    pub fn lookback(&mut self, length: usize, distance: usize) -> Result<()> {
        if distance == 0 || distance > self.history_len() {
            return Err(KompressError::invalid_distance(distance, self.history_len()));
        }
        debug_assert!(length <= self.free(), "lookback overruns free space");
        if length > self.free() {
            return Err(KompressError::buffer_too_small(length, self.free()));
        }

        let mut src = self.next_write.wrapping_sub(distance) & self.mask;
        for _ in 0..length {
            let byte = self.buffer[src];
            self.write_unchecked(byte);
            src = (src + 1) & self.mask;
        }

        Ok(())
    }

    #[inline]
    fn write_unchecked(&mut self, byte: u8) {
        self.buffer[self.next_write] = byte;
        self.next_write = (self.next_write + 1) & self.mask;
        self.available += 1;
        if self.history < self.capacity() {
            self.history += 1;
        }
    }
}

impl Default for CircularHistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}
