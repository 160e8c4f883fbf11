//! Packfile reading for the gitscope repository reader.
//!
//! A pack stores many objects in one file: a 12-byte header, a sequence of
//! entries (zlib-compressed payloads, some expressed as deltas against other
//! objects), and a trailing checksum. A sidecar `.idx` file (version 2) maps
//! object ids to byte offsets. This crate decodes the index, the entry
//! headers, and delta instruction streams; chain resolution across packs and
//! loose storage belongs to the object database.

pub mod data;
pub mod delta;
pub mod entry;
pub mod index;
pub mod inflate;
pub mod varint;

use gitscope_hash::ObjectId;
use gitscope_object::ObjectType;

/// Errors that can occur while reading packs.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("invalid pack index: {0}")]
    BadIndex(String),

    #[error("invalid pack data file: {0}")]
    BadPack(String),

    #[error("corrupt pack entry at offset {0}")]
    CorruptEntry(u64),

    #[error("invalid delta: {0}")]
    BadDelta(String),

    #[error("delta chain too deep (>{max} levels) at offset {offset}")]
    ChainTooDeep { offset: u64, max: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Kind of a packed entry, including the two transport-only delta kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Commit,
    Tree,
    Blob,
    Tag,
    /// Delta whose base lives earlier in the same pack.
    OfsDelta { base_offset: u64 },
    /// Delta whose base is named by object id (possibly another pack, or loose).
    RefDelta { base_id: ObjectId },
}

impl EntryKind {
    /// Convert a non-delta entry kind to a stored object type.
    pub fn to_object_type(self) -> Option<ObjectType> {
        match self {
            Self::Commit => Some(ObjectType::Commit),
            Self::Tree => Some(ObjectType::Tree),
            Self::Blob => Some(ObjectType::Blob),
            Self::Tag => Some(ObjectType::Tag),
            Self::OfsDelta { .. } | Self::RefDelta { .. } => None,
        }
    }
}

/// Pack data file constants.
pub const PACK_SIGNATURE: &[u8; 4] = b"PACK";
pub const PACK_VERSION: u32 = 2;
pub const PACK_HEADER_SIZE: usize = 12;

/// Pack index v2 constants.
pub const IDX_SIGNATURE: [u8; 4] = [0xff, 0x74, 0x4f, 0x63]; // "\xfftOc"
pub const IDX_VERSION: u32 = 2;

/// Maximum delta chain depth before bailing out on a corrupt pack.
pub const MAX_DELTA_DEPTH: usize = 512;
