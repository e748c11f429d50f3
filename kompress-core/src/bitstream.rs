//! Bit-level input for DEFLATE decoding.
//!
//! `BitReader` serves fixed-size bit groups from any `Read` implementation.
//!
//! # Bit Ordering
//!
//! DEFLATE packs bits LSB-first (Least Significant Bit first) within bytes.
//! The first bit read is bit 0 of the first byte, and multi-bit values are
//! assembled with their first bit in the least significant position.
//!
//! # Example
//!
//! ```
//! use kompress_core::bitstream::BitReader;
//! use std::io::Cursor;
//!
//! let mut reader = BitReader::new(Cursor::new([0b1100_0101u8]));
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(5).unwrap(), 0b11000);
//! ```

use crate::error::{KompressError, Result};
use std::io::{ErrorKind, Read};

/// Largest group `read_bits` serves in one call.
pub const MAX_READ_BITS: u8 = 16;

/// A bit-level reader that wraps any `Read` implementation.
///
/// The accumulator is refilled one byte at a time and only when a request
/// cannot be served from it, so it never holds 32 bits or more and never
/// pulls a byte from the source earlier than needed.
#[derive(Debug)]
pub struct BitReader<R: Read> {
    /// Underlying byte source.
    reader: R,
    /// Bit accumulator (LSB-first). Bits above `bits_in_buffer` are zero.
    buffer: u32,
    /// Number of valid bits in the accumulator.
    bits_in_buffer: u8,
    /// Total bits consumed (for error reporting).
    total_bits_read: u64,
}

impl<R: Read> BitReader<R> {
    /// Create a new `BitReader` wrapping the given reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: 0,
            bits_in_buffer: 0,
            total_bits_read: 0,
        }
    }

    /// Get a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Consume this `BitReader` and return the underlying reader.
    ///
    /// Bits still sitting in the accumulator are lost.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Get the current bit position (for error reporting).
    pub fn bit_position(&self) -> u64 {
        self.total_bits_read
    }

    /// Bits currently buffered, with the count of valid ones.
    ///
    /// Used by table-driven decoders that look ahead speculatively.
    #[inline]
    pub fn buffered(&self) -> (u32, u8) {
        (self.buffer, self.bits_in_buffer)
    }

    /// Pull one byte from the source into the accumulator.
    #[inline]
    pub fn refill_byte(&mut self) -> Result<()> {
        debug_assert!(self.bits_in_buffer < 24, "accumulator would overflow");
        if self.bits_in_buffer >= 24 {
            return Err(KompressError::accumulator_overflow(self.bits_in_buffer));
        }

        match self.next_source_byte()? {
            Some(byte) => {
                self.buffer |= (byte as u32) << self.bits_in_buffer;
                self.bits_in_buffer += 8;
                Ok(())
            }
            None => Err(KompressError::unexpected_eof(self.bit_position())),
        }
    }

    /// Ensure at least `count` bits are buffered.
    #[inline]
    pub fn ensure_bits(&mut self, count: u8) -> Result<()> {
        debug_assert!(count <= MAX_READ_BITS, "Cannot buffer more than 16 bits");

        while self.bits_in_buffer < count {
            self.refill_byte()?;
        }
        Ok(())
    }

    /// Drop `count` buffered bits. The bits must already be buffered.
    #[inline]
    pub fn consume_bits(&mut self, count: u8) {
        debug_assert!(count <= self.bits_in_buffer, "consuming unbuffered bits");

        let count = count.min(self.bits_in_buffer);
        self.buffer = self.buffer.checked_shr(count as u32).unwrap_or(0);
        self.bits_in_buffer -= count;
        self.total_bits_read += count as u64;
    }

    /// Read up to 16 bits from the stream.
    ///
    /// # Arguments
    ///
    /// * `count` - Number of bits to read (0-16)
    ///
    /// # Returns
    ///
    /// The bits read as a u32, with the first bit read in the LSB position.
    #[inline]
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        debug_assert!(count <= MAX_READ_BITS, "Cannot read more than 16 bits at once");

        if count == 0 {
            return Ok(0);
        }

        self.ensure_bits(count)?;

        let mask = (1u32 << count) - 1;
        let result = self.buffer & mask;
        self.consume_bits(count);

        Ok(result)
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? != 0)
    }

    /// Align to the next byte boundary by discarding partial bits.
    ///
    /// Whole bytes already pulled into the accumulator are kept.
    pub fn align_to_byte(&mut self) {
        let remainder = self.bits_in_buffer % 8;
        if remainder > 0 {
            self.consume_bits(remainder);
        }
    }

    /// Read one byte at a byte boundary.
    ///
    /// Buffered whole bytes are drained first; after that bytes come straight
    /// from the source. Returns `None` at end of source.
    pub fn read_aligned_byte(&mut self) -> Result<Option<u8>> {
        debug_assert!(self.bits_in_buffer % 8 == 0, "reader is not byte aligned");

        if self.bits_in_buffer >= 8 {
            let byte = (self.buffer & 0xFF) as u8;
            self.consume_bits(8);
            return Ok(Some(byte));
        }

        let byte = self.next_source_byte()?;
        if byte.is_some() {
            self.total_bits_read += 8;
        }
        Ok(byte)
    }

    /// Read one byte from the source, retrying interrupted reads.
    fn next_source_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.reader.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_bitreader_basic() {
        // 0b10110101 = 0xB5
        let data = vec![0xB5];
        let mut reader = BitReader::new(Cursor::new(data));

        assert_eq!(reader.read_bits(1).unwrap(), 1); // LSB first
        assert_eq!(reader.read_bits(1).unwrap(), 0);
        assert_eq!(reader.read_bits(1).unwrap(), 1);
        assert_eq!(reader.read_bits(1).unwrap(), 0);
        assert_eq!(reader.read_bits(1).unwrap(), 1);
        assert_eq!(reader.read_bits(1).unwrap(), 1);
        assert_eq!(reader.read_bits(1).unwrap(), 0);
        assert_eq!(reader.read_bits(1).unwrap(), 1);
        assert_eq!(reader.bit_position(), 8);
    }

    #[test]
    fn test_bitreader_multi_byte() {
        let data = vec![0xFF, 0x00];
        let mut reader = BitReader::new(Cursor::new(data));

        assert_eq!(reader.read_bits(4).unwrap(), 0xF);
        assert_eq!(reader.read_bits(8).unwrap(), 0x0F); // Crosses byte boundary
        assert_eq!(reader.read_bits(4).unwrap(), 0x0);
    }

    #[test]
    fn test_bitreader_sixteen_bits() {
        let data = vec![0x34, 0x12, 0xCD, 0xAB];
        let mut reader = BitReader::new(Cursor::new(data));

        reader.read_bits(4).unwrap();
        assert_eq!(reader.read_bits(16).unwrap(), 0xD123);
        assert_eq!(reader.read_bits(12).unwrap(), 0xABC);
    }

    #[test]
    fn test_refills_lazily() {
        let data = vec![0xAA, 0x55];
        let mut reader = BitReader::new(Cursor::new(data));

        reader.read_bits(3).unwrap();
        assert_eq!(reader.get_ref().position(), 1);
        reader.read_bits(5).unwrap();
        assert_eq!(reader.get_ref().position(), 1);
        reader.read_bits(1).unwrap();
        assert_eq!(reader.get_ref().position(), 2);
    }

    #[test]
    fn test_eof_mid_group() {
        let data = vec![0xFF];
        let mut reader = BitReader::new(Cursor::new(data));

        reader.read_bits(6).unwrap();
        let err = reader.read_bits(4).unwrap_err();
        assert!(matches!(
            err,
            KompressError::UnexpectedEndOfStream { bit_position: 6 }
        ));
    }

    #[test]
    fn test_align_to_byte() {
        let data = vec![0xFF, 0xAA];
        let mut reader = BitReader::new(Cursor::new(data));

        reader.read_bits(3).unwrap(); // Read 3 bits
        reader.align_to_byte(); // Skip remaining 5 bits
        assert_eq!(reader.read_bits(8).unwrap(), 0xAA);
    }

    #[test]
    fn test_align_keeps_whole_buffered_bytes() {
        let data = vec![0x0F, 0x12, 0x34];
        let mut reader = BitReader::new(Cursor::new(data));

        reader.read_bits(6).unwrap();
        reader.ensure_bits(10).unwrap();
        assert_eq!(reader.buffered().1, 10);
        reader.align_to_byte();
        assert_eq!(reader.buffered().1, 8);
        assert_eq!(reader.read_aligned_byte().unwrap(), Some(0x12));
        assert_eq!(reader.read_aligned_byte().unwrap(), Some(0x34));
        assert_eq!(reader.read_aligned_byte().unwrap(), None);
    }

    #[test]
    fn test_read_aligned_bytes() {
        let data = vec![0x12, 0x34, 0x56];
        let mut reader = BitReader::new(Cursor::new(data));

        assert_eq!(reader.read_bits(8).unwrap(), 0x12);
        assert_eq!(reader.read_aligned_byte().unwrap(), Some(0x34));
        assert_eq!(reader.read_aligned_byte().unwrap(), Some(0x56));
        assert_eq!(reader.read_aligned_byte().unwrap(), None);
        assert_eq!(reader.bit_position(), 24);
    }

    #[test]
    fn test_buffered_and_consume() {
        let data = vec![0b1010_0110];
        let mut reader = BitReader::new(Cursor::new(data));

        reader.ensure_bits(3).unwrap();
        assert_eq!(reader.buffered(), (0b1010_0110, 8));
        reader.consume_bits(3);
        assert_eq!(reader.buffered(), (0b1_0100, 5));
        assert_eq!(reader.bit_position(), 3);
    }

    fn three_bytes_buffered() -> BitReader<Cursor<Vec<u8>>> {
        let mut reader = BitReader::new(Cursor::new(vec![0u8; 5]));
        for _ in 0..3 {
            reader.refill_byte().unwrap();
        }
        assert_eq!(reader.buffered().1, 24);
        reader
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "accumulator would overflow")]
    fn test_refill_past_accumulator_width_panics() {
        let _ = three_bytes_buffered().refill_byte();
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_refill_past_accumulator_width_fails() {
        let mut reader = three_bytes_buffered();
        assert!(matches!(
            reader.refill_byte(),
            Err(KompressError::AccumulatorOverflow { buffered: 24 })
        ));
        // The accumulator is left untouched
        assert_eq!(reader.buffered().1, 24);
    }
}
