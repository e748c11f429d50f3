//! # Kompress Deflate
//!
//! Pure Rust streaming decompressor for raw DEFLATE data (RFC 1951).
//!
//! Output is produced one byte at a time through a 32 KB history window, so
//! memory use stays constant no matter how large the stream is.
//!
//! ## Features
//!
//! - All three block types
//!   - Stored (uncompressed) blocks
//!   - Fixed Huffman codes
//!   - Dynamic Huffman codes
//! - Pull-based [`DeflateDecoder`] over any [`std::io::Read`]
//! - One-shot [`decompress`] and [`decompress_partial`] helpers
//!
//! ## Example
//!
//! ```rust
//! use kompress_deflate::decompress;
//!
//! // A single final stored block holding "abc"
//! let compressed = [0x01, 0x03, 0x00, 0xFC, 0xFF, b'a', b'b', b'c'];
//! assert_eq!(decompress(&compressed).unwrap(), b"abc");
//! ```
//!
//! Zlib and gzip framing are not handled here. Strip the container header
//! before handing the payload to the decoder.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod huffman;
pub mod inflate;
pub mod tables;

// Re-exports
pub use huffman::{CanonicalCode, HuffmanDecoder, canonical_codes};
pub use inflate::{BlockType, DeflateDecoder, decompress, decompress_partial};
