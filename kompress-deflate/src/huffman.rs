//! Canonical Huffman decoding for DEFLATE.
//!
//! DEFLATE transmits Huffman codes as a list of code lengths only. Codes of
//! the same length are consecutive integers in symbol order, and the first
//! code of each length follows the last code of the previous length shifted
//! left by one (RFC 1951 Section 3.2.2).
//!
//! # Alphabets
//!
//! DEFLATE uses three Huffman alphabets:
//! - **Literal/Length**: 0-287 (0-255 literals, 256 EOB, 257-285 lengths)
//! - **Distance**: 0-31 (0-29 back-reference distances)
//! - **Code Length**: 0-18 (for encoding dynamic Huffman tables)

use kompress_core::BitReader;
use kompress_core::error::{KompressError, Result};
use std::io::Read;

/// Maximum code length in DEFLATE (15 bits).
pub const MAX_CODE_LENGTH: u8 = 15;

/// End of block symbol.
pub const END_OF_BLOCK: u16 = 256;

/// One lookup table slot. A `length` of 0 marks a slot no code maps to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableEntry {
    /// Decoded symbol.
    pub symbol: u16,
    /// Number of bits the code occupies.
    pub length: u8,
}

/// A code as assigned by the canonical construction, MSB-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalCode {
    /// Symbol the code stands for.
    pub symbol: u16,
    /// Code bits, most significant bit first.
    pub code: u16,
    /// Code length in bits.
    pub length: u8,
}

/// Assign canonical codes to every symbol with a non-zero code length.
///
/// The result is ordered by (length, symbol), which is also code order.
///
/// # Errors
///
/// `InvalidBlockHeader` if a length exceeds 15 or the lengths over-subscribe
/// the code space.
pub fn canonical_codes(code_lengths: &[u8]) -> Result<Vec<CanonicalCode>> {
    let mut entries = Vec::with_capacity(code_lengths.len());
    for (symbol, &length) in code_lengths.iter().enumerate() {
        if length == 0 {
            continue;
        }
        if length > MAX_CODE_LENGTH {
            return Err(KompressError::invalid_header(format!(
                "Code length {} exceeds maximum {}",
                length, MAX_CODE_LENGTH
            )));
        }
        entries.push(TableEntry {
            symbol: symbol as u16,
            length,
        });
    }

    entries.sort_unstable_by_key(|e| (e.length, e.symbol));

    let mut codes = Vec::with_capacity(entries.len());
    let mut code = 0u32;
    let mut current_length = entries.first().map_or(0, |e| e.length);

    for entry in entries {
        code <<= entry.length - current_length;
        current_length = entry.length;

        if code >= 1 << entry.length {
            return Err(KompressError::invalid_header("Over-subscribed Huffman code"));
        }

        codes.push(CanonicalCode {
            symbol: entry.symbol,
            code: code as u16,
            length: entry.length,
        });
        code += 1;
    }

    Ok(codes)
}

/// Reverse the low `length` bits of `code`.
fn reverse_bits(code: u16, length: u8) -> u16 {
    code.reverse_bits() >> (16 - length as u32)
}

/// Table-driven canonical Huffman decoder.
///
/// The table has `2^max_length` slots indexed by upcoming stream bits. A code
/// of length `n` is stored bit-reversed (the stream is LSB-first while codes
/// are MSB-first) and replicated into every slot whose low `n` bits match, so
/// one lookup on `max_length` speculative bits finds the code and tells how
/// many bits it really takes.
#[derive(Debug, Clone)]
pub struct HuffmanDecoder {
    table: Vec<TableEntry>,
    min_length: u8,
    max_length: u8,
}

impl HuffmanDecoder {
    /// Build a decoder from code lengths.
    ///
    /// # Arguments
    ///
    /// * `code_lengths` - `code_lengths[i]` is the bit length for symbol `i`.
    ///   A length of 0 means the symbol is not used.
    ///
    /// An all-zero input yields an empty decoder on which every decode fails.
    /// Incomplete codes are accepted; their unassigned patterns fail to decode.
    pub fn from_code_lengths(code_lengths: &[u8]) -> Result<Self> {
        let codes = canonical_codes(code_lengths)?;

        let (min_length, max_length) = match (codes.first(), codes.last()) {
            (Some(first), Some(last)) => (first.length, last.length),
            _ => {
                return Ok(Self {
                    table: Vec::new(),
                    min_length: 0,
                    max_length: 0,
                });
            }
        };

        let size = 1usize << max_length;
        let mut table = vec![TableEntry::default(); size];

        for c in &codes {
            let entry = TableEntry {
                symbol: c.symbol,
                length: c.length,
            };
            let step = 1usize << c.length;
            let mut index = reverse_bits(c.code, c.length) as usize;
            while index < size {
                table[index] = entry;
                index += step;
            }
        }

        Ok(Self {
            table,
            min_length,
            max_length,
        })
    }

    /// Whether no symbol has a code.
    pub fn is_empty(&self) -> bool {
        self.max_length == 0
    }

    /// Shortest code length present.
    pub fn min_code_length(&self) -> u8 {
        self.min_length
    }

    /// Longest code length present.
    pub fn max_code_length(&self) -> u8 {
        self.max_length
    }

    /// Table slot for the given upcoming stream bits (masked to the table).
    pub fn lookup(&self, bits: u32) -> TableEntry {
        if self.table.is_empty() {
            return TableEntry::default();
        }
        let mask = (1u32 << self.max_length) - 1;
        self.table[(bits & mask) as usize]
    }

    /// Decode a symbol from the bit stream.
    ///
    /// Only `min_code_length` bits are required up front; further bytes are
    /// pulled one at a time while the buffered bits cannot settle the code, so
    /// a short final code decodes even when fewer than `max_code_length` bits
    /// are left in the stream.
    #[inline]
    pub fn decode<R: Read>(&self, reader: &mut BitReader<R>) -> Result<u16> {
        if self.is_empty() {
            return Err(KompressError::invalid_huffman(reader.bit_position()));
        }

        reader.ensure_bits(self.min_length)?;

        loop {
            let (bits, available) = reader.buffered();
            let entry = self.lookup(bits);

            if entry.length != 0 && entry.length <= available {
                reader.consume_bits(entry.length);
                return Ok(entry.symbol);
            }

            if available >= self.max_length {
                // Every candidate bit is known and no code matches
                return Err(KompressError::invalid_huffman(reader.bit_position()));
            }

            reader.refill_byte()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn codes_of(lengths: &[u8]) -> Vec<(u16, u16, u8)> {
        let mut codes: Vec<_> = canonical_codes(lengths)
            .unwrap()
            .into_iter()
            .map(|c| (c.symbol, c.code, c.length))
            .collect();
        codes.sort_by_key(|&(symbol, _, _)| symbol);
        codes
    }

    #[test]
    fn test_canonical_codes_rfc_example() {
        // RFC 1951 Section 3.2.2: ABCDEFGH with lengths (3, 3, 3, 3, 3, 2, 4, 4)
        let lengths = [3u8, 3, 3, 3, 3, 2, 4, 4];
        assert_eq!(
            codes_of(&lengths),
            vec![
                (0, 0b010, 3),
                (1, 0b011, 3),
                (2, 0b100, 3),
                (3, 0b101, 3),
                (4, 0b110, 3),
                (5, 0b00, 2),
                (6, 0b1110, 4),
                (7, 0b1111, 4),
            ]
        );
    }

    #[test]
    fn test_canonical_codes_skip_unused() {
        let lengths = [0u8, 2, 0, 1, 2];
        assert_eq!(
            codes_of(&lengths),
            vec![(1, 0b10, 2), (3, 0b0, 1), (4, 0b11, 2)]
        );
    }

    #[test]
    fn test_over_subscribed() {
        let lengths = [1u8, 1, 1];
        assert!(matches!(
            HuffmanDecoder::from_code_lengths(&lengths),
            Err(KompressError::InvalidBlockHeader { .. })
        ));
    }

    #[test]
    fn test_code_length_too_long() {
        let lengths = [16u8, 1];
        assert!(HuffmanDecoder::from_code_lengths(&lengths).is_err());
    }

    #[test]
    fn test_table_replicates_short_codes() {
        let lengths = [1u8, 2, 2];
        let decoder = HuffmanDecoder::from_code_lengths(&lengths).unwrap();

        assert_eq!(decoder.min_code_length(), 1);
        assert_eq!(decoder.max_code_length(), 2);
        // Symbol 0 has code "0": both slots with a low 0 bit
        assert_eq!(decoder.lookup(0b00), TableEntry { symbol: 0, length: 1 });
        assert_eq!(decoder.lookup(0b10), TableEntry { symbol: 0, length: 1 });
        // Symbol 1 has code "10", stored reversed
        assert_eq!(decoder.lookup(0b01), TableEntry { symbol: 1, length: 2 });
        assert_eq!(decoder.lookup(0b11), TableEntry { symbol: 2, length: 2 });
    }

    #[test]
    fn test_decode_sequence() {
        // A=0, B=10, C=11; bits LSB-first: 0 | 1 0 | 1 1 | 0
        let lengths = [1u8, 2, 2];
        let decoder = HuffmanDecoder::from_code_lengths(&lengths).unwrap();

        let data = vec![0b00011010u8];
        let mut reader = BitReader::new(Cursor::new(data));

        assert_eq!(decoder.decode(&mut reader).unwrap(), 0); // A
        assert_eq!(decoder.decode(&mut reader).unwrap(), 1); // B
        assert_eq!(decoder.decode(&mut reader).unwrap(), 2); // C
        assert_eq!(decoder.decode(&mut reader).unwrap(), 0); // A
        assert_eq!(reader.bit_position(), 6);
    }

    #[test]
    fn test_decode_across_byte_boundary() {
        // Codes: 0 -> "0", 1 -> "10", 2 -> "110", 3 -> "111"
        let lengths = [1u8, 2, 3, 3];
        let decoder = HuffmanDecoder::from_code_lengths(&lengths).unwrap();

        // Seven zeros (symbol 0) then "111" straddling into the second byte
        let data = vec![0b1000_0000u8, 0b0000_0011];
        let mut reader = BitReader::new(Cursor::new(data));
        for _ in 0..7 {
            assert_eq!(decoder.decode(&mut reader).unwrap(), 0);
        }
        assert_eq!(decoder.decode(&mut reader).unwrap(), 3);
    }

    #[test]
    fn test_decode_short_code_at_end_of_stream() {
        // max length is 9 but the final byte only holds 8 bits
        let mut lengths = [0u8; 4];
        lengths[0] = 1;
        lengths[1] = 2;
        lengths[2] = 9;
        lengths[3] = 9;
        let decoder = HuffmanDecoder::from_code_lengths(&lengths).unwrap();

        let data = vec![0b0000_0001u8];
        let mut reader = BitReader::new(Cursor::new(data));
        assert_eq!(decoder.decode(&mut reader).unwrap(), 1);
        assert_eq!(decoder.decode(&mut reader).unwrap(), 0);
    }

    #[test]
    fn test_decode_truncated_long_code() {
        let lengths = [1u8, 2, 9, 9];
        let decoder = HuffmanDecoder::from_code_lengths(&lengths).unwrap();

        // "11" prefix needs the full 9 bits, only 8 exist
        let data = vec![0xFFu8];
        let mut reader = BitReader::new(Cursor::new(data));
        assert!(matches!(
            decoder.decode(&mut reader),
            Err(KompressError::UnexpectedEndOfStream { .. })
        ));
    }

    #[test]
    fn test_single_symbol() {
        let lengths = [1u8, 0, 0, 0];
        let decoder = HuffmanDecoder::from_code_lengths(&lengths).unwrap();

        let data = vec![0b0000_0010u8];
        let mut reader = BitReader::new(Cursor::new(data));

        assert_eq!(decoder.decode(&mut reader).unwrap(), 0);
        // Pattern "1" is unassigned in an incomplete code
        assert!(matches!(
            decoder.decode(&mut reader),
            Err(KompressError::InvalidHuffmanCode { bit_position: 1 })
        ));
    }

    #[test]
    fn test_empty_decoder() {
        let lengths = [0u8; 4];
        let decoder = HuffmanDecoder::from_code_lengths(&lengths).unwrap();
        assert!(decoder.is_empty());

        let mut reader = BitReader::new(Cursor::new(vec![0u8]));
        assert!(matches!(
            decoder.decode(&mut reader),
            Err(KompressError::InvalidHuffmanCode { .. })
        ));
    }

    #[test]
    fn test_reverse_bits() {
        assert_eq!(reverse_bits(0b101, 3), 0b101);
        assert_eq!(reverse_bits(0b1100, 4), 0b0011);
        assert_eq!(reverse_bits(0b10101010, 8), 0b01010101);
        assert_eq!(reverse_bits(0b1, 15), 0b100_0000_0000_0000);
    }
}
