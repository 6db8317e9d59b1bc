//! Key-value backend trait definition.

use crate::batch::WriteBatch;
use crate::error::StorageResult;

/// A low-level key-value backend for worldstore.
///
/// Backends are **opaque keyed byte stores**. They provide point reads,
/// point writes, and atomic batch application. The engine owns all key
/// shapes and value encodings - backends do not understand archetypes,
/// entities, or component payloads.
///
/// # Invariants
///
/// - `get` returns exactly the bytes most recently written to that key,
///   or `None` if the key has never been set (or was deleted)
/// - `apply` is all-or-nothing: either every operation in the batch takes
///   effect, or none do; a failed `apply` leaves the store unchanged
/// - Implementations are internally synchronized; a backend handle may be
///   shared between a writer and any number of read-only views
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing and ephemeral worlds
pub trait KeyValueBackend: Send + Sync {
    /// Reads the value stored at `key`.
    ///
    /// Returns `Ok(None)` if the key is absent; absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached or the read
    /// fails in transit.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Writes `value` to `key`, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    /// Deletes `key`. Deleting an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// Applies every operation in `batch` as one atomic unit.
    ///
    /// Operations are applied in insertion order. If an error is
    /// returned, none of the batch's writes are visible.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be applied; the store is then
    /// unchanged.
    fn apply(&self, batch: WriteBatch) -> StorageResult<()>;
}
