//! DEFLATE decompression (inflate).
//!
//! This module implements the DEFLATE decompression algorithm as specified
//! in RFC 1951. It supports all three block types:
//! - Type 0: Stored (uncompressed)
//! - Type 1: Fixed Huffman codes
//! - Type 2: Dynamic Huffman codes
//!
//! Decoding is pull-based. [`DeflateDecoder::read_byte`] serves bytes from the
//! history window and, when the window has nothing left to give, runs the
//! block state machine until it produces more output or the stream ends. A
//! Huffman block stops producing once fewer than 259 bytes of window space are
//! free, so the caller has to drain before decoding continues.

use crate::huffman::{END_OF_BLOCK, HuffmanDecoder};
use crate::tables::{
    CODE_LENGTH_ORDER, MAX_MATCH_LENGTH, decode_distance, decode_length, distance_extra_bits,
    fixed_distance_decoder, fixed_litlen_decoder, length_extra_bits,
};
use kompress_core::error::{KompressError, Result};
use kompress_core::{BitReader, CircularHistoryBuffer};
use std::borrow::Cow;
use std::io::Read;
use tracing::{debug, trace};

/// Largest literal/length alphabet a dynamic header can declare.
const MAX_LITLEN_CODES: usize = 288;

/// Largest distance alphabet a dynamic header can declare.
const MAX_DISTANCE_CODES: usize = 32;

/// Size of the code length alphabet (0-18).
const CODELEN_ALPHABET_SIZE: usize = 19;

/// DEFLATE block encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    /// Raw bytes with an explicit length.
    Stored,
    /// Huffman codes fixed by RFC 1951.
    Fixed,
    /// Huffman codes described in the block header.
    Dynamic,
}

impl BlockType {
    /// Interpret the two BTYPE header bits.
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            0 => Ok(Self::Stored),
            1 => Ok(Self::Fixed),
            2 => Ok(Self::Dynamic),
            _ => Err(KompressError::invalid_header("Reserved block type 3")),
        }
    }
}

/// Where the decoder is within the stream.
#[derive(Debug)]
enum BlockState {
    BetweenBlocks,
    Stored {
        remaining: u16,
    },
    Huffman {
        block_type: BlockType,
        litlen: Cow<'static, HuffmanDecoder>,
        distance: Cow<'static, HuffmanDecoder>,
    },
    Finished,
}

/// Streaming DEFLATE decompressor over any byte source.
///
/// # Example
///
/// ```rust
/// use kompress_deflate::DeflateDecoder;
///
/// // One stored block holding "abc"
/// let raw = [0x01, 0x03, 0x00, 0xFC, 0xFF, b'a', b'b', b'c'];
/// let mut decoder = DeflateDecoder::new(&raw[..]);
///
/// assert_eq!(decoder.read_byte().unwrap(), Some(b'a'));
/// let rest: Vec<u8> = decoder.collect::<Result<_, _>>().unwrap();
/// assert_eq!(rest, b"bc");
/// ```
#[derive(Debug)]
pub struct DeflateDecoder<R: Read> {
    /// Compressed input.
    reader: BitReader<R>,
    /// Decoded bytes not yet read, plus the back-reference window.
    history: CircularHistoryBuffer,
    /// Block state machine.
    state: BlockState,
    /// BFINAL flag of the current block.
    last_block: bool,
    /// Block headers parsed so far.
    blocks: u64,
    /// Bytes handed to the caller.
    total_out: u64,
}

impl<R: Read> DeflateDecoder<R> {
    /// Create a decoder reading a raw DEFLATE bitstream from `source`.
    pub fn new(source: R) -> Self {
        Self {
            reader: BitReader::new(source),
            history: CircularHistoryBuffer::new(),
            state: BlockState::BetweenBlocks,
            last_block: false,
            blocks: 0,
            total_out: 0,
        }
    }

    /// Read the next decoded byte, or `None` at end of stream.
    ///
    /// After an error the decoder is finished: undrained output is dropped
    /// and later calls return `None`.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        if let Some(byte) = self.history.pop() {
            self.total_out += 1;
            return Ok(Some(byte));
        }

        if self.is_finished() {
            return Ok(None);
        }

        if let Err(err) = self.refill() {
            debug!(error = %err, bit_position = self.reader.bit_position(), "deflate stream failed");
            self.state = BlockState::Finished;
            self.history.clear();
            return Err(err);
        }

        match self.history.pop() {
            Some(byte) => {
                self.total_out += 1;
                Ok(Some(byte))
            }
            None => {
                self.state = BlockState::Finished;
                Ok(None)
            }
        }
    }

    /// Whether the final block has been fully decoded (or decoding failed).
    ///
    /// Buffered output may still be waiting to be read.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, BlockState::Finished)
    }

    /// Type of the block currently being decoded, if any.
    pub fn block_type(&self) -> Option<BlockType> {
        match &self.state {
            BlockState::Stored { .. } => Some(BlockType::Stored),
            BlockState::Huffman { block_type, .. } => Some(*block_type),
            BlockState::BetweenBlocks | BlockState::Finished => None,
        }
    }

    /// Number of decoded bytes returned so far.
    pub fn total_out(&self) -> u64 {
        self.total_out
    }

    /// Get a reference to the byte source.
    pub fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }

    /// Consume the decoder and return the byte source.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Step the state machine until output is available or the stream ends.
    fn refill(&mut self) -> Result<()> {
        debug_assert!(self.history.is_empty());

        while self.history.is_empty() && !self.is_finished() {
            self.step()?;
        }

        trace!(
            produced = self.history.available(),
            window = self.history.history_len(),
            "refilled history"
        );
        Ok(())
    }

    /// Advance the state machine by one transition or one production run.
    fn step(&mut self) -> Result<()> {
        if matches!(self.state, BlockState::BetweenBlocks) {
            return self.start_block();
        }

        let block_done = match &mut self.state {
            BlockState::Stored { remaining } => {
                copy_stored(&mut self.reader, &mut self.history, remaining)?
            }
            BlockState::Huffman {
                litlen, distance, ..
            } => inflate_huffman(&mut self.reader, &mut self.history, litlen, distance)?,
            BlockState::BetweenBlocks | BlockState::Finished => false,
        };

        if block_done {
            self.end_block();
        }
        Ok(())
    }

    /// Parse a block header and enter the block.
    fn start_block(&mut self) -> Result<()> {
        self.last_block = self.reader.read_bit()?;
        let block_type = BlockType::from_bits(self.reader.read_bits(2)?)?;
        self.blocks += 1;

        debug!(
            block = self.blocks,
            final_block = self.last_block,
            ?block_type,
            "block header"
        );

        self.state = match block_type {
            BlockType::Stored => BlockState::Stored {
                remaining: read_stored_header(&mut self.reader)?,
            },
            BlockType::Fixed => BlockState::Huffman {
                block_type,
                litlen: Cow::Borrowed(fixed_litlen_decoder()),
                distance: Cow::Borrowed(fixed_distance_decoder()),
            },
            BlockType::Dynamic => {
                let (litlen, distance) = read_dynamic_tables(&mut self.reader)?;
                BlockState::Huffman {
                    block_type,
                    litlen: Cow::Owned(litlen),
                    distance: Cow::Owned(distance),
                }
            }
        };

        Ok(())
    }

    fn end_block(&mut self) {
        if self.last_block {
            debug!(blocks = self.blocks, "deflate stream finished");
            self.state = BlockState::Finished;
        } else {
            self.state = BlockState::BetweenBlocks;
        }
    }
}

impl<R: Read> Iterator for DeflateDecoder<R> {
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_byte().transpose()
    }
}

/// Read the byte-aligned LEN/NLEN pair of a stored block.
fn read_stored_header<R: Read>(reader: &mut BitReader<R>) -> Result<u16> {
    reader.align_to_byte();

    let b1 = reader.read_bits(8)? as u16;
    let b2 = reader.read_bits(8)? as u16;
    let b3 = reader.read_bits(8)? as u16;
    let b4 = reader.read_bits(8)? as u16;

    let len = b1 | (b2 << 8);
    let nlen = b3 | (b4 << 8);

    if len != !nlen {
        return Err(KompressError::invalid_header(format!(
            "LEN/NLEN mismatch: {:#06x} vs {:#06x}",
            len, nlen
        )));
    }

    trace!(len, "stored block");
    Ok(len)
}

/// Copy stored bytes into the history while both input and space remain.
///
/// Returns `true` once the block is exhausted.
fn copy_stored<R: Read>(
    reader: &mut BitReader<R>,
    history: &mut CircularHistoryBuffer,
    remaining: &mut u16,
) -> Result<bool> {
    while *remaining > 0 && history.free() > 0 {
        let byte = reader
            .read_aligned_byte()?
            .ok_or_else(|| KompressError::unexpected_eof(reader.bit_position()))?;
        history.push(byte)?;
        *remaining -= 1;
    }

    Ok(*remaining == 0)
}

/// Decode literal/length/distance symbols into the history.
///
/// Runs while a maximum-length match still fits. Returns `true` when the
/// end-of-block symbol is reached.
fn inflate_huffman<R: Read>(
    reader: &mut BitReader<R>,
    history: &mut CircularHistoryBuffer,
    litlen: &HuffmanDecoder,
    distance: &HuffmanDecoder,
) -> Result<bool> {
    while history.free() > MAX_MATCH_LENGTH {
        let symbol = litlen.decode(reader)?;

        match symbol {
            0..=255 => history.push(symbol as u8)?,
            END_OF_BLOCK => return Ok(true),
            257..=285 => {
                let extra = reader.read_bits(length_extra_bits(symbol))? as u16;
                let length = decode_length(symbol, extra);

                let dist_code = distance.decode(reader)?;
                if dist_code >= 30 {
                    return Err(KompressError::invalid_huffman(reader.bit_position()));
                }
                let dist_extra = reader.read_bits(distance_extra_bits(dist_code))? as u16;
                let dist = decode_distance(dist_code, dist_extra);

                history.lookback(length as usize, dist as usize)?;
            }
            _ => return Err(KompressError::invalid_huffman(reader.bit_position())),
        }
    }

    Ok(false)
}

/// Read a dynamic block header and build its literal/length and distance
/// decoders.
fn read_dynamic_tables<R: Read>(
    reader: &mut BitReader<R>,
) -> Result<(HuffmanDecoder, HuffmanDecoder)> {
    let hlit = reader.read_bits(5)? as usize + 257; // literal/length codes
    let hdist = reader.read_bits(5)? as usize + 1; // distance codes
    let hclen = reader.read_bits(4)? as usize + 4; // code length codes

    debug!(hlit, hdist, hclen, "dynamic block header");

    let mut code_length_lengths = [0u8; CODELEN_ALPHABET_SIZE];
    for &symbol in CODE_LENGTH_ORDER.iter().take(hclen) {
        code_length_lengths[symbol] = reader.read_bits(3)? as u8;
    }
    let code_length_decoder = HuffmanDecoder::from_code_lengths(&code_length_lengths)?;

    let mut all_lengths = [0u8; MAX_LITLEN_CODES + MAX_DISTANCE_CODES];
    let all_lengths = &mut all_lengths[..hlit + hdist];
    read_code_lengths(reader, &code_length_decoder, all_lengths)?;

    let (litlen_lengths, dist_lengths) = all_lengths.split_at(hlit);
    if litlen_lengths[END_OF_BLOCK as usize] == 0 {
        return Err(KompressError::invalid_header("Missing end-of-block code"));
    }

    let litlen = HuffmanDecoder::from_code_lengths(litlen_lengths)?;
    let distance = HuffmanDecoder::from_code_lengths(dist_lengths)?;

    Ok((litlen, distance))
}

/// Fill `lengths` with run-length coded code lengths.
///
/// - 0-15: literal code length
/// - 16: repeat the previous length 3-6 times (2 extra bits)
/// - 17: repeat length 0 for 3-10 times (3 extra bits)
/// - 18: repeat length 0 for 11-138 times (7 extra bits)
fn read_code_lengths<R: Read>(
    reader: &mut BitReader<R>,
    code_length_decoder: &HuffmanDecoder,
    lengths: &mut [u8],
) -> Result<()> {
    let mut i = 0;

    while i < lengths.len() {
        let symbol = code_length_decoder.decode(reader)?;

        let (value, repeat) = match symbol {
            0..=15 => (symbol as u8, 1),
            16 => {
                if i == 0 {
                    return Err(KompressError::invalid_header(
                        "Repeat code 16 with no previous length",
                    ));
                }
                (lengths[i - 1], reader.read_bits(2)? as usize + 3)
            }
            17 => (0, reader.read_bits(3)? as usize + 3),
            18 => (0, reader.read_bits(7)? as usize + 11),
            _ => return Err(KompressError::invalid_huffman(reader.bit_position())),
        };

        if i + repeat > lengths.len() {
            return Err(KompressError::invalid_header(format!(
                "Code length run of {} overflows {} lengths",
                repeat,
                lengths.len()
            )));
        }

        lengths[i..i + repeat].fill(value);
        i += repeat;
    }

    Ok(())
}

/// Decompress raw DEFLATE data.
///
/// The first error aborts decoding and partial output is discarded.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = DeflateDecoder::new(data);
    let mut output = Vec::with_capacity(data.len().saturating_mul(2));

    while let Some(byte) = decoder.read_byte()? {
        output.push(byte);
    }

    Ok(output)
}

/// Decompress raw DEFLATE data, keeping whatever was read before an error.
pub fn decompress_partial(data: &[u8]) -> (Vec<u8>, Option<KompressError>) {
    let mut decoder = DeflateDecoder::new(data);
    let mut output = Vec::with_capacity(data.len().saturating_mul(2));

    loop {
        match decoder.read_byte() {
            Ok(Some(byte)) => output.push(byte),
            Ok(None) => return (output, None),
            Err(err) => return (output, Some(err)),
        }
    }
}
