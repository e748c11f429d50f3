//! Error types for kompress operations.
//!
//! Every error is fatal to the stream that raised it. The variants mirror the
//! ways a raw DEFLATE bitstream can be malformed, plus a pass-through for
//! failures of the underlying byte source.

use std::io;
use thiserror::Error;

/// The main error type for kompress operations.
#[derive(Debug, Error)]
pub enum KompressError {
    /// I/O error from the underlying byte source (anything but end of stream).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The byte source ran dry in the middle of a bit group, header field or
    /// stored block.
    #[error("Unexpected end of stream at bit position {bit_position}")]
    UnexpectedEndOfStream {
        /// Bit position at which more input was required.
        bit_position: u64,
    },

    /// Reserved block type, LEN/NLEN mismatch or malformed dynamic header.
    #[error("Invalid block header: {message}")]
    InvalidBlockHeader {
        /// Description of the header error.
        message: String,
    },

    /// A decode hit a bit pattern with no assigned code, or an empty table.
    #[error("Invalid Huffman code at bit position {bit_position}")]
    InvalidHuffmanCode {
        /// Bit position where the invalid code was found.
        bit_position: u64,
    },

    /// Back-reference reaches before the start of the available history.
    #[error("Invalid back-reference distance: {distance} exceeds history size {history_size}")]
    InvalidDistance {
        /// The invalid distance value.
        distance: usize,
        /// Bytes of history that could be referenced.
        history_size: usize,
    },

    /// Internal invariant: a refill would push the 32-bit bit accumulator
    /// past its width. Only reachable by calling `refill_byte` directly with
    /// 24 or more bits buffered.
    #[error("Bit accumulator overflow: {buffered} bits buffered, refill needs fewer than 24")]
    AccumulatorOverflow {
        /// Bits held when the refill was attempted.
        buffered: u8,
    },

    /// A write would overrun the free space of the history buffer.
    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Number of bytes needed.
        needed: usize,
        /// Number of bytes available.
        available: usize,
    },
}

/// Result type alias for kompress operations.
pub type Result<T> = std::result::Result<T, KompressError>;

impl KompressError {
    /// Create an unexpected end-of-stream error.
    pub fn unexpected_eof(bit_position: u64) -> Self {
        Self::UnexpectedEndOfStream { bit_position }
    }

    /// Create an invalid block header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidBlockHeader {
            message: message.into(),
        }
    }

    /// Create an invalid Huffman code error.
    pub fn invalid_huffman(bit_position: u64) -> Self {
        Self::InvalidHuffmanCode { bit_position }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, history_size: usize) -> Self {
        Self::InvalidDistance {
            distance,
            history_size,
        }
    }

    /// Create an accumulator overflow error.
    pub fn accumulator_overflow(buffered: u8) -> Self {
        Self::AccumulatorOverflow { buffered }
    }

    /// Create a buffer too small error.
    pub fn buffer_too_small(needed: usize, available: usize) -> Self {
        Self::BufferTooSmall { needed, available }
    }

    /// Whether this error means the input was truncated.
    pub fn is_truncation(&self) -> bool {
        matches!(self, Self::UnexpectedEndOfStream { .. })
    }
}
