//! Pack data file access.
//!
//! The data file is memory-mapped for its lifetime; the map is the long-lived
//! handle through which all entry reads seek.

use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::entry::{parse_entry_header, PackEntry};
use crate::inflate::inflate_exact;
use crate::{PackError, PACK_HEADER_SIZE, PACK_SIGNATURE, PACK_VERSION};

/// A memory-mapped pack data file.
pub struct PackData {
    data: Mmap,
    num_objects: u32,
    path: PathBuf,
}

impl PackData {
    /// Open and validate a `.pack` file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PackError> {
        let path = path.as_ref().to_path_buf();
        let file = std::fs::File::open(&path)?;
        let data = unsafe { Mmap::map(&file)? };

        if data.len() < PACK_HEADER_SIZE {
            return Err(PackError::BadPack(format!(
                "{}: file too small",
                path.display()
            )));
        }
        if &data[0..4] != PACK_SIGNATURE {
            return Err(PackError::BadPack(format!(
                "{}: bad signature",
                path.display()
            )));
        }
        let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        if version != PACK_VERSION {
            return Err(PackError::BadPack(format!(
                "{}: unsupported version {version}",
                path.display()
            )));
        }
        let num_objects = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);

        Ok(Self {
            data,
            num_objects,
            path,
        })
    }

    /// Parse the entry header at an absolute offset.
    pub fn entry_at(&self, offset: u64) -> Result<PackEntry, PackError> {
        let pos = offset as usize;
        if pos >= self.data.len() {
            return Err(PackError::CorruptEntry(offset));
        }
        parse_entry_header(&self.data[pos..], offset)
    }

    /// Inflate an entry's compressed payload to its declared size.
    pub fn inflate_body(&self, entry: &PackEntry) -> Result<Vec<u8>, PackError> {
        let pos = entry.data_offset as usize;
        if pos > self.data.len() {
            return Err(PackError::CorruptEntry(entry.data_offset));
        }
        inflate_exact(&self.data[pos..], entry.size)
            .map_err(|_| PackError::CorruptEntry(entry.data_offset))
    }

    /// Number of objects declared by the pack header.
    pub fn num_objects(&self) -> u32 {
        self.num_objects
    }

    /// Path to the `.pack` file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
