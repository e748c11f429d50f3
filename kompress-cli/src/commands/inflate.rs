//! Inflate command implementation.

use crate::utils::{display_name, open_input, open_output};
use kompress_deflate::DeflateDecoder;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{info, warn};

/// Bytes collected before each write to the output.
const CHUNK_SIZE: usize = 64 * 1024;

/// Decode `input` into `output` (stdout if `None`).
///
/// A failed decode removes the output file, since whatever was written to it
/// is only a prefix. Bytes already sent to stdout cannot be taken back.
pub fn cmd_inflate(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let decoder = DeflateDecoder::new(open_input(input)?);
    let writer = open_output(output)?;

    let result = inflate_to(decoder, writer);

    if let (Err(e), Some(path)) = (&result, output) {
        warn!(output = %path.display(), error = %e, "removing partial output");
        if let Err(remove_err) = std::fs::remove_file(path) {
            warn!(
                output = %path.display(),
                error = %remove_err,
                "could not remove partial output"
            );
        }
    }

    let total = result?;
    info!(input = %display_name(input), bytes = total, "inflated");
    Ok(())
}

/// Copy every decoded byte to `writer`, returning the decoded size.
///
/// The writer is flushed and dropped before returning.
fn inflate_to<R: Read>(
    mut decoder: DeflateDecoder<R>,
    mut writer: Box<dyn Write>,
) -> Result<u64, Box<dyn std::error::Error>> {
    let mut chunk = Vec::with_capacity(CHUNK_SIZE);

    while let Some(byte) = decoder.read_byte()? {
        chunk.push(byte);
        if chunk.len() == CHUNK_SIZE {
            writer.write_all(&chunk)?;
            chunk.clear();
        }
    }
    writer.write_all(&chunk)?;
    writer.flush()?;

    Ok(decoder.total_out())
}
