//! Write-buffered component value cache.

use crate::types::{ComponentTypeId, EntityId};
use std::collections::{HashMap, HashSet};

/// Cache key: one component value on one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct CompKey {
    pub(crate) type_id: ComponentTypeId,
    pub(crate) entity: EntityId,
}

impl CompKey {
    pub(crate) fn new(type_id: ComponentTypeId, entity: EntityId) -> Self {
        Self { type_id, entity }
    }
}

/// Read-through, write-buffered map of encoded component payloads.
///
/// Values land here either because the caller staged a write or because
/// a read pulled the persisted bytes in; both are served from the buffer
/// for the rest of the transaction. The parallel delete-marker set
/// records keys that must be explicitly deleted from the backend at
/// flush time - distinct from "never cached". A marker outlives later
/// writes to the same key within one transaction; the flush emits
/// deletions before upserts, so a later write still wins.
#[derive(Debug, Default)]
pub(crate) struct ComponentValueCache {
    values: HashMap<CompKey, Vec<u8>>,
    deleted: HashSet<CompKey>,
}

impl ComponentValueCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the buffered bytes for a key, if any.
    pub(crate) fn get(&self, key: CompKey) -> Option<&[u8]> {
        self.values.get(&key).map(Vec::as_slice)
    }

    /// Buffers encoded bytes for a key.
    pub(crate) fn insert(&mut self, key: CompKey, bytes: Vec<u8>) {
        self.values.insert(key, bytes);
    }

    /// Drops any buffered value and records an explicit delete marker.
    pub(crate) fn mark_deleted(&mut self, key: CompKey) {
        self.values.remove(&key);
        self.deleted.insert(key);
    }

    /// Iterates buffered values.
    pub(crate) fn values(&self) -> impl Iterator<Item = (CompKey, &[u8])> {
        self.values.iter().map(|(&key, bytes)| (key, bytes.as_slice()))
    }

    /// Iterates delete markers.
    pub(crate) fn deletions(&self) -> impl Iterator<Item = CompKey> + '_ {
        self.deleted.iter().copied()
    }

    /// Clears both the buffer and the delete markers.
    pub(crate) fn clear(&mut self) {
        self.values.clear();
        self.deleted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(type_id: u32, entity: u64) -> CompKey {
        CompKey::new(ComponentTypeId::new(type_id), EntityId::new(entity))
    }

    #[test]
    fn insert_then_get() {
        let mut cache = ComponentValueCache::new();
        cache.insert(key(1, 0), vec![9, 9]);
        assert_eq!(cache.get(key(1, 0)), Some([9, 9].as_slice()));
        assert_eq!(cache.get(key(1, 1)), None);
    }

    #[test]
    fn mark_deleted_drops_buffered_value() {
        let mut cache = ComponentValueCache::new();
        cache.insert(key(1, 0), vec![1]);
        cache.mark_deleted(key(1, 0));
        assert_eq!(cache.get(key(1, 0)), None);
        assert_eq!(cache.deletions().count(), 1);
    }

    #[test]
    fn marker_survives_rewrite() {
        let mut cache = ComponentValueCache::new();
        cache.mark_deleted(key(1, 0));
        cache.insert(key(1, 0), vec![2]);
        assert_eq!(cache.deletions().count(), 1);
        assert_eq!(cache.get(key(1, 0)), Some([2].as_slice()));
    }

    #[test]
    fn clear_empties_everything() {
        let mut cache = ComponentValueCache::new();
        cache.insert(key(1, 0), vec![1]);
        cache.mark_deleted(key(2, 0));
        cache.clear();
        assert_eq!(cache.values().count(), 0);
        assert_eq!(cache.deletions().count(), 0);
    }
}
