//! Delta decompression.
//!
//! A delta stream reconstructs one object's payload from a base payload.
//! Layout:
//!
//! ```text
//! [base_size: varint] [result_size: varint] [instruction]*
//! ```
//!
//! Instructions:
//! - Copy:   `[1SSSOOOO] [offset bytes] [size bytes]` — bits select which of
//!   4 offset / 3 size bytes follow, little-endian; a zero size means 65536.
//! - Insert: `[0NNNNNNN] [N literal bytes]`
//! - A command byte of zero is reserved and rejected.

use crate::varint::read_size;
use crate::PackError;

/// Apply a delta stream to `base`, producing the reconstructed payload.
///
/// The declared base size must match `base.len()` and the output must reach
/// exactly the declared result size; anything else marks the stream corrupt.
pub fn apply_delta(base: &[u8], delta: &[u8]) -> Result<Vec<u8>, PackError> {
    let mut pos = 0;

    let (base_size, consumed) =
        read_size(delta).ok_or_else(|| bad("truncated base size"))?;
    pos += consumed;
    let (result_size, consumed) =
        read_size(&delta[pos..]).ok_or_else(|| bad("truncated result size"))?;
    pos += consumed;

    if base_size as usize != base.len() {
        return Err(bad(&format!(
            "base size mismatch: delta says {base_size}, base is {}",
            base.len()
        )));
    }

    let mut output = Vec::with_capacity(result_size as usize);

    while pos < delta.len() {
        let cmd = delta[pos];
        pos += 1;

        if cmd & 0x80 != 0 {
            // Copy: the low 7 bits select which offset/size bytes follow.
            let mut offset: usize = 0;
            let mut size: usize = 0;
            for (bit, shift) in [(0x01u8, 0), (0x02, 8), (0x04, 16), (0x08, 24)] {
                if cmd & bit != 0 {
                    let byte = *delta.get(pos).ok_or_else(|| bad("truncated copy offset"))?;
                    offset |= (byte as usize) << shift;
                    pos += 1;
                }
            }
            for (bit, shift) in [(0x10u8, 0), (0x20, 8), (0x40, 16)] {
                if cmd & bit != 0 {
                    let byte = *delta.get(pos).ok_or_else(|| bad("truncated copy size"))?;
                    size |= (byte as usize) << shift;
                    pos += 1;
                }
            }
            if size == 0 {
                size = 0x10000;
            }

            let end = offset
                .checked_add(size)
                .filter(|&e| e <= base.len())
                .ok_or_else(|| {
                    bad(&format!(
                        "copy out of bounds: offset={offset}, size={size}, base_len={}",
                        base.len()
                    ))
                })?;
            output.extend_from_slice(&base[offset..end]);
        } else if cmd != 0 {
            // Insert: the command byte is the literal length.
            let n = cmd as usize;
            if pos + n > delta.len() {
                return Err(bad("truncated insert data"));
            }
            output.extend_from_slice(&delta[pos..pos + n]);
            pos += n;
        } else {
            return Err(bad("reserved zero command byte"));
        }
    }

    if output.len() != result_size as usize {
        return Err(bad(&format!(
            "result size mismatch: delta says {result_size}, got {}",
            output.len()
        )));
    }

    Ok(output)
}

fn bad(reason: &str) -> PackError {
    PackError::BadDelta(reason.to_string())
}
