//! Pack entry header parsing.

use gitscope_hash::ObjectId;

use crate::varint;
use crate::{EntryKind, PackError};

/// A raw entry header read from a pack (before delta resolution).
#[derive(Debug, Clone)]
pub struct PackEntry {
    pub kind: EntryKind,
    /// Decompressed payload size declared by the header. For deltas this is
    /// the size of the delta instruction stream, not of the final object.
    pub size: usize,
    /// Absolute offset of the compressed payload within the pack.
    pub data_offset: u64,
}

/// Parse the entry header starting at `data[0]`.
///
/// `entry_offset` is the absolute offset of the entry in the pack file,
/// needed to resolve offset-delta backrefs into absolute base offsets.
pub fn parse_entry_header(data: &[u8], entry_offset: u64) -> Result<PackEntry, PackError> {
    let (type_code, size, mut pos) =
        varint::read_typed_header(data).ok_or(PackError::CorruptEntry(entry_offset))?;

    let kind = match type_code {
        1 => EntryKind::Commit,
        2 => EntryKind::Tree,
        3 => EntryKind::Blob,
        4 => EntryKind::Tag,
        6 => {
            let (displacement, consumed) = varint::read_backref(&data[pos..])
                .ok_or(PackError::CorruptEntry(entry_offset))?;
            pos += consumed;
            if displacement == 0 || displacement > entry_offset {
                return Err(PackError::CorruptEntry(entry_offset));
            }
            EntryKind::OfsDelta {
                base_offset: entry_offset - displacement,
            }
        }
        7 => {
            if pos + 20 > data.len() {
                return Err(PackError::CorruptEntry(entry_offset));
            }
            let base_id = ObjectId::from_bytes(&data[pos..pos + 20])
                .map_err(|_| PackError::CorruptEntry(entry_offset))?;
            pos += 20;
            EntryKind::RefDelta { base_id }
        }
        _ => return Err(PackError::CorruptEntry(entry_offset)),
    };

    Ok(PackEntry {
        kind,
        size: size as usize,
        data_offset: entry_offset + pos as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::varint::{write_backref, write_typed_header};

    #[test]
    fn parse_blob_header() {
        let data = write_typed_header(3, 100);
        let entry = parse_entry_header(&data, 0).unwrap();
        assert_eq!(entry.kind, EntryKind::Blob);
        assert_eq!(entry.size, 100);
        assert_eq!(entry.data_offset, data.len() as u64);
    }

    #[test]
    fn parse_commit_header_small_size() {
        // Commit type (1), size 5: single byte (1 << 4) | 5.
        let entry = parse_entry_header(&[0x15], 40).unwrap();
        assert_eq!(entry.kind, EntryKind::Commit);
        assert_eq!(entry.size, 5);
        assert_eq!(entry.data_offset, 41);
    }

    #[test]
    fn parse_large_size() {
        let data = write_typed_header(1, 1_000_000);
        let entry = parse_entry_header(&data, 0).unwrap();
        assert_eq!(entry.size, 1_000_000);
    }

    #[test]
    fn parse_ofs_delta() {
        let mut data = write_typed_header(6, 30);
        data.extend_from_slice(&write_backref(150));
        let entry = parse_entry_header(&data, 500).unwrap();
        assert_eq!(entry.kind, EntryKind::OfsDelta { base_offset: 350 });
        assert_eq!(entry.size, 30);
        assert_eq!(entry.data_offset, 500 + data.len() as u64);
    }

    #[test]
    fn ofs_delta_past_start_is_corrupt() {
        let mut data = write_typed_header(6, 30);
        data.extend_from_slice(&write_backref(150));
        // Displacement larger than the entry offset cannot point inside the pack.
        assert!(matches!(
            parse_entry_header(&data, 100),
            Err(PackError::CorruptEntry(100))
        ));
    }

    #[test]
    fn parse_ref_delta() {
        let mut base_id = [0u8; 20];
        base_id[0] = 0xab;
        let mut data = write_typed_header(7, 12);
        data.extend_from_slice(&base_id);

        let entry = parse_entry_header(&data, 64).unwrap();
        match entry.kind {
            EntryKind::RefDelta { base_id: id } => assert_eq!(id.as_bytes(), &base_id),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn ref_delta_truncated_base_id() {
        let mut data = write_typed_header(7, 12);
        data.extend_from_slice(&[0u8; 10]);
        assert!(parse_entry_header(&data, 64).is_err());
    }

    #[test]
    fn unknown_type_code_is_corrupt() {
        // Type code 5 is reserved.
        assert!(parse_entry_header(&[0x55], 0).is_err());
        // Type code 0 is invalid.
        assert!(parse_entry_header(&[0x05], 0).is_err());
    }

    #[test]
    fn truncated_header() {
        assert!(parse_entry_header(&[], 0).is_err());
        assert!(parse_entry_header(&[0x95], 0).is_err()); // continuation bit, no next byte
    }
}
