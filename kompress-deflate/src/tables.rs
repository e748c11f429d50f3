//! Fixed code tables for DEFLATE (RFC 1951).
//!
//! Besides the fixed Huffman codes of block type 1, this module holds the
//! base/extra-bits tables that turn length and distance symbols into match
//! lengths and distances, and the transmission order of code length codes.

use crate::huffman::HuffmanDecoder;
use std::sync::OnceLock;

/// Number of literal/length symbols covered by the fixed code.
pub const FIXED_LITLEN_SYMBOLS: usize = 288;

/// Number of distance symbols covered by the fixed code.
pub const FIXED_DISTANCE_SYMBOLS: usize = 30;

/// Largest output a single literal/length symbol can produce.
pub const MAX_MATCH_LENGTH: usize = 258;

/// Fixed literal/length code lengths (RFC 1951 Section 3.2.6).
///
/// - Symbols 0-143: 8 bits
/// - Symbols 144-255: 9 bits
/// - Symbols 256-279: 7 bits
/// - Symbols 280-287: 8 bits
pub fn fixed_litlen_lengths() -> [u8; FIXED_LITLEN_SYMBOLS] {
    let mut lengths = [0u8; FIXED_LITLEN_SYMBOLS];

    lengths[..144].fill(8);
    lengths[144..256].fill(9);
    lengths[256..280].fill(7);
    lengths[280..].fill(8);

    lengths
}

/// Fixed distance code lengths (RFC 1951 Section 3.2.6).
///
/// All 30 distance codes use 5 bits.
pub fn fixed_distance_lengths() -> [u8; FIXED_DISTANCE_SYMBOLS] {
    [5u8; FIXED_DISTANCE_SYMBOLS]
}

/// Get the fixed literal/length decoder.
///
/// This decoder is built once and shared for the life of the process.
pub fn fixed_litlen_decoder() -> &'static HuffmanDecoder {
    static DECODER: OnceLock<HuffmanDecoder> = OnceLock::new();

    DECODER.get_or_init(|| {
        HuffmanDecoder::from_code_lengths(&fixed_litlen_lengths())
            .expect("Fixed litlen code construction should never fail")
    })
}

/// Get the fixed distance decoder.
///
/// This decoder is built once and shared for the life of the process.
pub fn fixed_distance_decoder() -> &'static HuffmanDecoder {
    static DECODER: OnceLock<HuffmanDecoder> = OnceLock::new();

    DECODER.get_or_init(|| {
        HuffmanDecoder::from_code_lengths(&fixed_distance_lengths())
            .expect("Fixed distance code construction should never fail")
    })
}

/// Length code base values (RFC 1951 Section 3.2.5).
///
/// For length codes 257-285, this gives the base length value.
/// Extra bits are added to get the final length.
pub const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, // 257-264: 0 extra bits
    11, 13, 15, 17, // 265-268: 1 extra bit
    19, 23, 27, 31, // 269-272: 2 extra bits
    35, 43, 51, 59, // 273-276: 3 extra bits
    67, 83, 99, 115, // 277-280: 4 extra bits
    131, 163, 195, 227, // 281-284: 5 extra bits
    258, // 285: 0 extra bits (special case)
];

/// Number of extra bits for length codes 257-285.
pub const LENGTH_EXTRA_BITS: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, // 257-264
    1, 1, 1, 1, // 265-268
    2, 2, 2, 2, // 269-272
    3, 3, 3, 3, // 273-276
    4, 4, 4, 4, // 277-280
    5, 5, 5, 5, // 281-284
    0, // 285
];

/// Distance code base values (RFC 1951 Section 3.2.5).
///
/// For distance codes 0-29, this gives the base distance value.
pub const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, // 0-3: 0 extra bits
    5, 7, // 4-5: 1 extra bit
    9, 13, // 6-7: 2 extra bits
    17, 25, // 8-9: 3 extra bits
    33, 49, // 10-11: 4 extra bits
    65, 97, // 12-13: 5 extra bits
    129, 193, // 14-15: 6 extra bits
    257, 385, // 16-17: 7 extra bits
    513, 769, // 18-19: 8 extra bits
    1025, 1537, // 20-21: 9 extra bits
    2049, 3073, // 22-23: 10 extra bits
    4097, 6145, // 24-25: 11 extra bits
    8193, 12289, // 26-27: 12 extra bits
    16385, 24577, // 28-29: 13 extra bits
];

/// Number of extra bits for distance codes 0-29.
pub const DISTANCE_EXTRA_BITS: [u8; 30] = [
    0, 0, 0, 0, // 0-3
    1, 1, // 4-5
    2, 2, // 6-7
    3, 3, // 8-9
    4, 4, // 10-11
    5, 5, // 12-13
    6, 6, // 14-15
    7, 7, // 16-17
    8, 8, // 18-19
    9, 9, // 20-21
    10, 10, // 22-23
    11, 11, // 24-25
    12, 12, // 26-27
    13, 13, // 28-29
];

/// Order of code length codes in dynamic block header.
///
/// Code length codes are transmitted in this order (RFC 1951 Section 3.2.7).
pub const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// Extra bits that follow a length code (257-285).
pub fn length_extra_bits(code: u16) -> u8 {
    debug_assert!((257..=285).contains(&code), "Invalid length code: {}", code);
    LENGTH_EXTRA_BITS[(code - 257) as usize]
}

/// Extra bits that follow a distance code (0-29).
pub fn distance_extra_bits(code: u16) -> u8 {
    debug_assert!(code < 30, "Invalid distance code: {}", code);
    DISTANCE_EXTRA_BITS[code as usize]
}

/// Decode a length from a length code and extra bits.
pub fn decode_length(code: u16, extra: u16) -> u16 {
    debug_assert!((257..=285).contains(&code), "Invalid length code: {}", code);
    LENGTH_BASE[(code - 257) as usize] + extra
}

/// Decode a distance from a distance code and extra bits.
pub fn decode_distance(code: u16, extra: u16) -> u16 {
    debug_assert!(code < 30, "Invalid distance code: {}", code);
    DISTANCE_BASE[code as usize] + extra
}
