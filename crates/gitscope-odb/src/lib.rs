//! Unified object database for the gitscope repository reader.
//!
//! At open time every pack index is loaded and the loose shard directories
//! are scanned, producing one id table mapping each object id to its physical
//! location. Reads then go straight to the right storage: loose files are
//! inflated whole; packed entries are inflated at their offset, with delta
//! chains resolved recursively — offset-deltas within the owning pack,
//! reference-deltas through the full read path so their base may live in any
//! pack or loose. Decoded objects are memoized in a bounded LRU cache.

mod cache;
mod loose;

pub use cache::ObjectCache;

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use gitscope_hash::ObjectId;
use gitscope_object::{Commit, Object, ObjectError, ObjectType};
use gitscope_pack::data::PackData;
use gitscope_pack::index::PackIndex;
use gitscope_pack::{EntryKind, PackError, MAX_DELTA_DEPTH};

/// Capacity of the decoded-object cache.
const CACHE_CAPACITY: usize = 1000;

/// Errors produced by object database operations.
#[derive(Debug, thiserror::Error)]
pub enum OdbError {
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    #[error("corrupt loose object {id}: {reason}")]
    CorruptLoose { id: ObjectId, reason: String },

    #[error(transparent)]
    Pack(#[from] PackError),

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Physical location of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// A zlib-compressed file under a two-hex-digit shard directory.
    Loose,
    /// An entry inside a pack data file.
    Packed { pack: usize, offset: u64 },
}

/// Read-only object database over loose and packed storage.
pub struct ObjectDatabase {
    objects_dir: PathBuf,
    packs: Vec<PackData>,
    locations: HashMap<ObjectId, Location>,
    cache: RefCell<ObjectCache>,
}

impl ObjectDatabase {
    /// Open the object database at the given `objects` directory.
    ///
    /// Loads every `pack/*.idx`, maps the corresponding `.pack` files, and
    /// scans the loose shards. Loose entries are installed last so that an id
    /// present in both storages reads loose — this keeps repositories
    /// readable while a repack is in flight.
    pub fn open(objects_dir: impl AsRef<Path>) -> Result<Self, OdbError> {
        let objects_dir = objects_dir.as_ref().to_path_buf();
        let mut packs = Vec::new();
        let mut locations = HashMap::new();

        for idx_path in discover_indexes(&objects_dir)? {
            let index = PackIndex::open(&idx_path)?;
            let pack_path = idx_path.with_extension("pack");
            let data = PackData::open(&pack_path)?;
            if data.num_objects() != index.num_objects() {
                return Err(OdbError::Pack(PackError::BadPack(format!(
                    "{}: pack has {} objects but index has {}",
                    pack_path.display(),
                    data.num_objects(),
                    index.num_objects()
                ))));
            }

            let ordinal = packs.len();
            for (id, offset) in index.entries() {
                locations.insert(
                    id,
                    Location::Packed {
                        pack: ordinal,
                        offset,
                    },
                );
            }
            packs.push(data);
        }

        for id in loose::scan(&objects_dir)? {
            locations.insert(id, Location::Loose);
        }

        Ok(Self {
            objects_dir,
            packs,
            locations,
            cache: RefCell::new(ObjectCache::new(CACHE_CAPACITY)),
        })
    }

    /// Path to the `objects` directory.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    /// Whether the id table knows this id.
    pub fn contains(&self, id: &ObjectId) -> bool {
        self.locations.contains_key(id)
    }

    /// Physical location of an object, if known.
    pub fn location(&self, id: &ObjectId) -> Option<Location> {
        self.locations.get(id).copied()
    }

    /// Number of objects in the id table.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Iterate every known object id, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.locations.keys()
    }

    /// Read and decode an object. Results are memoized; a failed read never
    /// populates the cache.
    pub fn read(&self, id: &ObjectId) -> Result<Object, OdbError> {
        if let Some(obj) = self.cache.borrow_mut().get(id) {
            return Ok(obj.clone());
        }

        let (obj_type, payload) = self.raw_at(id, 0)?;
        let obj = Object::parse_content(obj_type, *id, &payload)?;
        self.cache.borrow_mut().insert(*id, obj.clone());
        Ok(obj)
    }

    /// Read an object's resolved type and raw payload, bypassing the parsers.
    pub fn read_raw(&self, id: &ObjectId) -> Result<(ObjectType, Vec<u8>), OdbError> {
        self.raw_at(id, 0)
    }

    /// Answer an object's type without materializing its payload.
    ///
    /// Loose objects decompress only a small leading window; packed deltas
    /// chase their base headers without inflating any payload.
    pub fn probe_type(&self, id: &ObjectId) -> Result<ObjectType, OdbError> {
        self.probe_at(id, 0)
    }

    /// Enumerate every commit object in the repository.
    ///
    /// Packs are visited in load order with entries sorted by ascending pack
    /// offset (deltas tend to follow their bases, so resolution stays mostly
    /// sequential), then loose objects. Each candidate is type-probed and
    /// only commits are decoded.
    pub fn commit_objects(&self) -> CommitObjects<'_> {
        let mut ids: Vec<ObjectId> = Vec::new();

        for pack in 0..self.packs.len() {
            let mut in_pack: Vec<(u64, ObjectId)> = self
                .locations
                .iter()
                .filter_map(|(id, loc)| match loc {
                    Location::Packed { pack: p, offset } if *p == pack => Some((*offset, *id)),
                    _ => None,
                })
                .collect();
            in_pack.sort();
            ids.extend(in_pack.into_iter().map(|(_, id)| id));
        }

        let mut loose_ids: Vec<ObjectId> = self
            .locations
            .iter()
            .filter_map(|(id, loc)| matches!(loc, Location::Loose).then_some(*id))
            .collect();
        loose_ids.sort();
        ids.extend(loose_ids);

        CommitObjects {
            odb: self,
            ids,
            pos: 0,
        }
    }

    fn raw_at(&self, id: &ObjectId, depth: usize) -> Result<(ObjectType, Vec<u8>), OdbError> {
        match self.locations.get(id) {
            None => Err(OdbError::NotFound(*id)),
            Some(Location::Loose) => loose::read_raw(&self.objects_dir, id),
            Some(Location::Packed { pack, offset }) => self.packed_at(*pack, *offset, depth),
        }
    }

    fn packed_at(
        &self,
        pack: usize,
        offset: u64,
        depth: usize,
    ) -> Result<(ObjectType, Vec<u8>), OdbError> {
        if depth >= MAX_DELTA_DEPTH {
            return Err(OdbError::Pack(PackError::ChainTooDeep {
                offset,
                max: MAX_DELTA_DEPTH,
            }));
        }

        let data = &self.packs[pack];
        let entry = data.entry_at(offset)?;

        match entry.kind {
            EntryKind::Commit | EntryKind::Tree | EntryKind::Blob | EntryKind::Tag => {
                let payload = data.inflate_body(&entry)?;
                let obj_type = entry.kind.to_object_type().expect("non-delta kind");
                Ok((obj_type, payload))
            }
            EntryKind::OfsDelta { base_offset } => {
                let delta = data.inflate_body(&entry)?;
                let (obj_type, base) = self.packed_at(pack, base_offset, depth + 1)?;
                let result = gitscope_pack::delta::apply_delta(&base, &delta)?;
                Ok((obj_type, result))
            }
            EntryKind::RefDelta { base_id } => {
                let delta = data.inflate_body(&entry)?;
                let (obj_type, base) = self.raw_at(&base_id, depth + 1)?;
                let result = gitscope_pack::delta::apply_delta(&base, &delta)?;
                Ok((obj_type, result))
            }
        }
    }

    fn probe_at(&self, id: &ObjectId, depth: usize) -> Result<ObjectType, OdbError> {
        match self.locations.get(id) {
            None => Err(OdbError::NotFound(*id)),
            Some(Location::Loose) => loose::probe(&self.objects_dir, id),
            Some(Location::Packed { pack, offset }) => {
                self.probe_packed(*pack, *offset, depth)
            }
        }
    }

    fn probe_packed(
        &self,
        pack: usize,
        offset: u64,
        depth: usize,
    ) -> Result<ObjectType, OdbError> {
        if depth >= MAX_DELTA_DEPTH {
            return Err(OdbError::Pack(PackError::ChainTooDeep {
                offset,
                max: MAX_DELTA_DEPTH,
            }));
        }

        let entry = self.packs[pack].entry_at(offset)?;
        match entry.kind {
            EntryKind::OfsDelta { base_offset } => {
                self.probe_packed(pack, base_offset, depth + 1)
            }
            EntryKind::RefDelta { base_id } => self.probe_at(&base_id, depth + 1),
            kind => Ok(kind.to_object_type().expect("non-delta kind")),
        }
    }

    #[cfg(test)]
    fn cached_len(&self) -> usize {
        self.cache.borrow().len()
    }
}

/// List `pack/*.idx` files in deterministic (sorted) order.
fn discover_indexes(objects_dir: &Path) -> Result<Vec<PathBuf>, OdbError> {
    let pack_dir = objects_dir.join("pack");
    if !pack_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut indexes: Vec<PathBuf> = std::fs::read_dir(&pack_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "idx"))
        .collect();
    indexes.sort();
    Ok(indexes)
}

/// Lazy iterator over every commit object in the database.
pub struct CommitObjects<'a> {
    odb: &'a ObjectDatabase,
    ids: Vec<ObjectId>,
    pos: usize,
}

impl Iterator for CommitObjects<'_> {
    type Item = Result<Commit, OdbError>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.ids.len() {
            let id = self.ids[self.pos];
            self.pos += 1;

            match self.odb.probe_type(&id) {
                Ok(ObjectType::Commit) => {
                    return Some(self.odb.read(&id).map(|obj| match obj {
                        Object::Commit(c) => c,
                        _ => unreachable!("probe and read agree on type"),
                    }));
                }
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}
