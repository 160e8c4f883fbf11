//! Pack index (v2) reading.
//!
//! The index maps sorted object ids to byte offsets in the pack data file.
//! Format:
//!
//! ```text
//! Header:  \xff tOc (4 bytes) | version (4 bytes = 2)
//! Fanout:  256 × 4-byte big-endian cumulative counts by first id byte
//! OIDs:    N × 20-byte sorted ids
//! CRC32:   N × 4-byte CRC32 values (not consulted by this reader)
//! Offsets: N × 4-byte offsets (high bit set → index into 64-bit table)
//! 64-bit:  M × 8-byte offsets (packs > 2 GiB)
//! Trailer: pack checksum | index checksum
//! ```

use std::path::{Path, PathBuf};

use gitscope_hash::ObjectId;
use memmap2::Mmap;

use crate::{PackError, IDX_SIGNATURE, IDX_VERSION};

const FANOUT_OFFSET: usize = 8;
const OID_OFFSET: usize = FANOUT_OFFSET + 256 * 4;
const TRAILER_LEN: usize = 2 * 20;

/// A memory-mapped pack index.
pub struct PackIndex {
    data: Mmap,
    num_objects: u32,
    offset32_offset: usize,
    offset64_offset: usize,
    path: PathBuf,
}

impl PackIndex {
    /// Open and validate a `.idx` file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PackError> {
        let path = path.as_ref().to_path_buf();
        let file = std::fs::File::open(&path)?;
        let data = unsafe { Mmap::map(&file)? };

        if data.len() < OID_OFFSET + TRAILER_LEN {
            return Err(PackError::BadIndex(format!(
                "{}: file too small",
                path.display()
            )));
        }
        if data[0..4] != IDX_SIGNATURE {
            return Err(PackError::BadIndex(format!(
                "{}: bad signature",
                path.display()
            )));
        }
        let version = be_u32(&data, 4);
        if version != IDX_VERSION {
            return Err(PackError::BadIndex(format!(
                "{}: unsupported version {version}, expected {IDX_VERSION}",
                path.display()
            )));
        }

        // Total object count is the last fan-out entry. The CRC32 table sits
        // between the ids and the 32-bit offsets; this reader skips over it.
        let num_objects = be_u32(&data, FANOUT_OFFSET + 255 * 4);
        let n = num_objects as usize;
        let offset32_offset = OID_OFFSET + n * 20 + n * 4;
        let offset64_offset = offset32_offset + n * 4;

        if data.len() < offset64_offset + TRAILER_LEN {
            return Err(PackError::BadIndex(format!(
                "{}: truncated tables for {num_objects} objects",
                path.display()
            )));
        }

        Ok(Self {
            data,
            num_objects,
            offset32_offset,
            offset64_offset,
            path,
        })
    }

    /// Total number of objects in this index.
    pub fn num_objects(&self) -> u32 {
        self.num_objects
    }

    /// Path to the `.idx` file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Object id at the given sorted position.
    pub fn oid_at(&self, index: u32) -> ObjectId {
        let start = OID_OFFSET + index as usize * 20;
        ObjectId::from_bytes(&self.data[start..start + 20]).expect("20 bytes in id table")
    }

    /// Pack data offset at the given sorted position.
    ///
    /// An offset with the top bit set indexes the 64-bit long-offset table.
    pub fn offset_at(&self, index: u32) -> u64 {
        let val = be_u32(&self.data, self.offset32_offset + index as usize * 4);
        if val & 0x8000_0000 != 0 {
            let idx64 = (val & 0x7fff_ffff) as usize;
            be_u64(&self.data, self.offset64_offset + idx64 * 8)
        } else {
            u64::from(val)
        }
    }

    /// Iterate all (id, offset) pairs in sorted id order.
    pub fn entries(&self) -> Entries<'_> {
        Entries {
            index: self,
            pos: 0,
        }
    }
}

fn be_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

fn be_u64(data: &[u8], pos: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[pos..pos + 8]);
    u64::from_be_bytes(bytes)
}

/// Iterator over (id, offset) pairs of a pack index.
pub struct Entries<'a> {
    index: &'a PackIndex,
    pos: u32,
}

impl Iterator for Entries<'_> {
    type Item = (ObjectId, u64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.index.num_objects {
            return None;
        }
        let item = (self.index.oid_at(self.pos), self.index.offset_at(self.pos));
        self.pos += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.index.num_objects - self.pos) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Entries<'_> {}
