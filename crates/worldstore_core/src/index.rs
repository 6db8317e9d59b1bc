//! Per-archetype active-entity sets.

use crate::error::{CoreError, CoreResult};
use crate::keys;
use crate::types::{ArchetypeId, EntityId};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use worldstore_storage::KeyValueBackend;

/// The set of entities currently belonging to one archetype.
///
/// Order among entities is not meaningful and is not preserved across
/// removals. The `modified` flag marks the set dirty for the next flush;
/// it is never persisted itself.
#[derive(Debug, Default)]
pub(crate) struct ActiveEntities {
    pub(crate) ids: Vec<EntityId>,
    pub(crate) modified: bool,
}

impl ActiveEntities {
    /// Appends an entity and marks the set dirty.
    pub(crate) fn append(&mut self, id: EntityId) {
        self.ids.push(id);
        self.modified = true;
    }

    /// Removes an entity by overwriting it with the last element and
    /// truncating.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EntityNotFoundInSet`] if the entity is not in
    /// the set.
    pub(crate) fn swap_remove(&mut self, id: EntityId, archetype: ArchetypeId) -> CoreResult<()> {
        let pos = self
            .ids
            .iter()
            .position(|&candidate| candidate == id)
            .ok_or(CoreError::EntityNotFoundInSet {
                entity: id,
                archetype,
            })?;
        self.ids.swap_remove(pos);
        self.modified = true;
        Ok(())
    }
}

/// Lazily hydrated active-entity sets, keyed by archetype.
///
/// A set is loaded from storage on first access; an absent key means an
/// empty set, not an error. The whole index is transaction-scoped: a
/// discard clears it so the next access reloads the last durable state.
#[derive(Debug, Default)]
pub(crate) struct ActiveEntityIndex {
    sets: HashMap<ArchetypeId, ActiveEntities>,
}

impl ActiveEntityIndex {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the set for `archetype`, loading it from storage on first
    /// access.
    pub(crate) fn get_or_load(
        &mut self,
        backend: &dyn KeyValueBackend,
        archetype: ArchetypeId,
    ) -> CoreResult<&mut ActiveEntities> {
        match self.sets.entry(archetype) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let ids = match backend.get(&keys::active_entities_key(archetype))? {
                    Some(bytes) => worldstore_codec::decode::<Vec<EntityId>>(&bytes)?,
                    None => Vec::new(),
                };
                tracing::trace!(
                    archetype = archetype.as_i64(),
                    count = ids.len(),
                    "loaded active entity set"
                );
                Ok(entry.insert(ActiveEntities {
                    ids,
                    modified: false,
                }))
            }
        }
    }

    /// Iterates the sets that changed this transaction.
    pub(crate) fn modified_sets(&self) -> impl Iterator<Item = (ArchetypeId, &ActiveEntities)> {
        self.sets
            .iter()
            .filter(|(_, active)| active.modified)
            .map(|(&arch, active)| (arch, active))
    }

    /// Drops every loaded set, forcing a reload from durable state.
    pub(crate) fn clear(&mut self) {
        self.sets.clear();
    }
}
