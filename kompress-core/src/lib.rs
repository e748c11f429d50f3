//! # kompress core
//!
//! Core components for the kompress DEFLATE decoder.
//!
//! This crate provides the building blocks the codec layer is built on:
//!
//! - [`bitstream`]: LSB-first bit-level input over any `Read`
//! - [`ringbuffer`]: Sliding window history for LZ77 back-references
//! - [`error`]: Error types
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Tools                                               │
//! │     kompress CLI                                        │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     Inflate (canonical Huffman + LZ77 block decoding)   │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: BitStream (this crate)                              │
//! │     BitReader, CircularHistoryBuffer, errors            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use kompress_core::{BitReader, CircularHistoryBuffer};
//! use std::io::Cursor;
//!
//! let mut reader = BitReader::new(Cursor::new(vec![0xAB, 0xCD]));
//! let bits = reader.read_bits(12).unwrap();
//! assert_eq!(bits, 0xDAB);
//!
//! let mut history = CircularHistoryBuffer::new();
//! history.push(b'z').unwrap();
//! history.lookback(3, 1).unwrap();
//! assert_eq!(history.available(), 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod error;
pub mod ringbuffer;

// Re-exports for convenience
pub use bitstream::BitReader;
pub use error::{KompressError, Result};
pub use ringbuffer::{CircularHistoryBuffer, WINDOW_SIZE};
