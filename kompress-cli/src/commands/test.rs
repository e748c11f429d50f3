//! Test command implementation.

use crate::utils::{CountingReader, display_name, format_size, open_input};
use kompress_core::KompressError;
use kompress_deflate::DeflateDecoder;
use std::path::Path;

pub fn cmd_test(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let name = display_name(input);
    println!("Testing {}", name);

    let mut decoder = DeflateDecoder::new(CountingReader::new(open_input(input)?));

    loop {
        match decoder.read_byte() {
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(e) => {
                println!("  FAILED after {} bytes: {}", decoder.total_out(), e);
                if let Some(hint) = failure_hint(&e) {
                    println!("  ({})", hint);
                }
                return Err(e.into());
            }
        }
    }

    let compressed = decoder.get_ref().count();
    let decompressed = decoder.total_out();
    let ratio = if decompressed > 0 {
        compressed as f64 / decompressed as f64 * 100.0
    } else {
        0.0
    };

    println!(
        "  OK: {} -> {} ({:.1}%)",
        format_size(compressed),
        format_size(decompressed),
        ratio
    );
    Ok(())
}

fn failure_hint(err: &KompressError) -> Option<&'static str> {
    match err {
        e if e.is_truncation() => Some("input ends before the final block"),
        KompressError::InvalidDistance { .. } => {
            Some("back-reference points before the start of output")
        }
        KompressError::InvalidBlockHeader { .. } | KompressError::InvalidHuffmanCode { .. } => {
            Some("input is not a raw DEFLATE stream, or is corrupted")
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_hints() {
        assert!(failure_hint(&KompressError::unexpected_eof(10)).is_some());
        assert!(failure_hint(&KompressError::invalid_header("bad")).is_some());
        assert!(failure_hint(&KompressError::buffer_too_small(4, 2)).is_none());
    }
}
