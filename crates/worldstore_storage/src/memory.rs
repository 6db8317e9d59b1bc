//! In-memory key-value backend for testing.

use crate::backend::KeyValueBackend;
use crate::batch::{WriteBatch, WriteOp};
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::HashMap;

/// An in-memory key-value backend.
///
/// This backend stores all data in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Ephemeral worlds that don't need persistence
///
/// # Thread Safety
///
/// This backend is internally synchronized and can be shared across
/// threads behind an `Arc`. Batch application holds the write lock for
/// the whole batch, so a batch is observed either fully applied or not
/// at all.
///
/// # Example
///
/// ```rust
/// use worldstore_storage::{InMemoryBackend, KeyValueBackend};
///
/// let backend = InMemoryBackend::new();
/// backend.set("k", b"v").unwrap();
/// assert_eq!(backend.get("k").unwrap(), Some(b"v".to_vec()));
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of keys currently stored.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.data.read().len()
    }

    /// Returns a sorted copy of all stored keys.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.data.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Removes all keys from the backend.
    pub fn clear(&self) {
        self.data.write().clear();
    }
}

impl KeyValueBackend for InMemoryBackend {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.data.write().insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        self.data.write().remove(key);
        Ok(())
    }

    fn apply(&self, batch: WriteBatch) -> StorageResult<()> {
        // One write-lock acquisition for the whole batch keeps it atomic
        // with respect to concurrent readers.
        let mut data = self.data.write();
        for op in batch.into_ops() {
            match op {
                WriteOp::Set { key, value } => {
                    data.insert(key, value);
                }
                WriteOp::Delete { key } => {
                    data.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.key_count(), 0);
        assert!(backend.keys().is_empty());
    }

    #[test]
    fn memory_get_absent_key_is_none() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.get("missing").unwrap(), None);
    }

    #[test]
    fn memory_set_then_get() {
        let backend = InMemoryBackend::new();
        backend.set("k", b"value").unwrap();
        assert_eq!(backend.get("k").unwrap(), Some(b"value".to_vec()));
    }

    #[test]
    fn memory_set_overwrites() {
        let backend = InMemoryBackend::new();
        backend.set("k", b"one").unwrap();
        backend.set("k", b"two").unwrap();
        assert_eq!(backend.get("k").unwrap(), Some(b"two".to_vec()));
    }

    #[test]
    fn memory_delete_removes_key() {
        let backend = InMemoryBackend::new();
        backend.set("k", b"v").unwrap();
        backend.delete("k").unwrap();
        assert_eq!(backend.get("k").unwrap(), None);
    }

    #[test]
    fn memory_delete_absent_key_succeeds() {
        let backend = InMemoryBackend::new();
        assert!(backend.delete("missing").is_ok());
    }

    #[test]
    fn memory_apply_batch() {
        let backend = InMemoryBackend::new();
        backend.set("old", b"gone").unwrap();

        let mut batch = WriteBatch::new();
        batch.set("a", vec![1]);
        batch.set("b", vec![2]);
        batch.delete("old");
        backend.apply(batch).unwrap();

        assert_eq!(backend.get("a").unwrap(), Some(vec![1]));
        assert_eq!(backend.get("b").unwrap(), Some(vec![2]));
        assert_eq!(backend.get("old").unwrap(), None);
    }

    #[test]
    fn memory_apply_respects_op_order() {
        let backend = InMemoryBackend::new();

        let mut batch = WriteBatch::new();
        batch.delete("k");
        batch.set("k", vec![7]);
        backend.apply(batch).unwrap();

        assert_eq!(backend.get("k").unwrap(), Some(vec![7]));
    }

    #[test]
    fn memory_clear() {
        let backend = InMemoryBackend::new();
        backend.set("k", b"v").unwrap();
        backend.clear();
        assert_eq!(backend.key_count(), 0);
    }

    #[test]
    fn memory_keys_are_sorted() {
        let backend = InMemoryBackend::new();
        backend.set("b", b"2").unwrap();
        backend.set("a", b"1").unwrap();
        assert_eq!(backend.keys(), vec!["a".to_string(), "b".to_string()]);
    }
}
