//! Loose object header parsing.

use crate::{ObjectError, ObjectType};

/// Parse a loose object header from decompressed bytes.
///
/// The header format is `"<type> <size>\0"`. Returns `(type, content_size,
/// header_length)` where `header_length` includes the null terminator.
pub fn parse_header(data: &[u8]) -> Result<(ObjectType, usize, usize), ObjectError> {
    let null_pos = data
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| ObjectError::InvalidHeader("missing null terminator".into()))?;

    let header = &data[..null_pos];
    let space_pos = header
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| ObjectError::InvalidHeader("missing space in header".into()))?;

    let obj_type = ObjectType::from_bytes(&header[..space_pos])?;

    let size_str = std::str::from_utf8(&header[space_pos + 1..])
        .map_err(|_| ObjectError::InvalidHeader("non-ASCII size".into()))?;
    let content_size: usize = size_str
        .parse()
        .map_err(|_| ObjectError::InvalidHeader(format!("invalid size: {size_str}")))?;

    Ok((obj_type, content_size, null_pos + 1))
}
