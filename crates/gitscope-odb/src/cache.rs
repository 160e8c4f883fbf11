//! LRU cache for decoded objects.

use std::num::NonZeroUsize;

use gitscope_hash::ObjectId;
use gitscope_object::Object;
use lru::LruCache;

/// Bounded cache for decoded objects, keyed by the full 20-byte id.
pub struct ObjectCache {
    cache: LruCache<ObjectId, Object>,
}

impl ObjectCache {
    /// Create with the given capacity (number of objects).
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap()),
            ),
        }
    }

    /// Get a cached object (promotes it to most-recently-used).
    pub fn get(&mut self, id: &ObjectId) -> Option<&Object> {
        self.cache.get(id)
    }

    /// Insert an object, evicting the least-recently-used entry if full.
    pub fn insert(&mut self, id: ObjectId, obj: Object) {
        self.cache.push(id, obj);
    }

    /// Current number of cached objects.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
