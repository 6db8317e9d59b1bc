//! The pipelined flush protocol.
//!
//! All staged state is folded into a single [`WriteBatch`] and submitted
//! through [`KeyValueBackend::apply`], which is all-or-nothing: a failed
//! flush leaves both the backend and the staged state untouched, so the
//! same commit can be retried.
//!
//! [`KeyValueBackend::apply`]: worldstore_storage::KeyValueBackend::apply

use crate::buffer::CommandBuffer;
use crate::error::{CoreError, CoreResult};
use crate::keys;
use crate::types::{ArchetypeId, ComponentTypeId};
use std::collections::BTreeMap;
use worldstore_storage::WriteBatch;

impl CommandBuffer {
    /// Loads the persisted archetype mapping. Called at construction;
    /// an absent key means nothing has ever been committed.
    pub(crate) fn load_archetypes(&mut self) -> CoreResult<()> {
        let Some(bytes) = self.backend.get(keys::archetype_map_key())? else {
            return Ok(());
        };
        let persisted: BTreeMap<ArchetypeId, Vec<ComponentTypeId>> =
            worldstore_codec::decode(&bytes)?;
        self.archetypes.load_persisted(persisted, &self.registry)
    }

    /// Builds one atomic write batch from all staged state and submits
    /// it, in order: component upserts/deletes, the entity-ID counter,
    /// the archetype mapping, entity-to-archetype pointers, and modified
    /// active-entity sets.
    pub(crate) fn flush(&mut self) -> CoreResult<()> {
        if self.registry.is_empty() {
            return Err(CoreError::RegistrationRequired);
        }

        let mut batch = WriteBatch::new();
        self.stage_component_changes(&mut batch);
        self.stage_next_entity_id(&mut batch);
        self.stage_new_archetypes(&mut batch)?;
        self.stage_entity_pointers(&mut batch);
        self.stage_active_entities(&mut batch)?;

        tracing::debug!(ops = batch.len(), "flushing staged state");
        self.backend.apply(batch)?;
        Ok(())
    }

    /// Stages buffered component deletions, then upserts. Deletions go
    /// first so a value re-written after a delete marker survives.
    fn stage_component_changes(&self, batch: &mut WriteBatch) {
        for key in self.comp_values.deletions() {
            batch.delete(keys::component_value_key(key.type_id, key.entity));
        }
        for (key, bytes) in self.comp_values.values() {
            batch.set(
                keys::component_value_key(key.type_id, key.entity),
                bytes.to_vec(),
            );
        }
    }

    /// Stages the advanced entity-ID counter, if any IDs were allocated.
    fn stage_next_entity_id(&self, batch: &mut WriteBatch) {
        if let Some(counter) = self.allocator.counter_to_persist() {
            batch.set(keys::next_entity_id_key(), keys::format_u64(counter));
        }
    }

    /// Stages the archetype mapping blob, if any archetypes were created
    /// this transaction. The map is re-serialized wholesale each time it
    /// changes.
    fn stage_new_archetypes(&self, batch: &mut WriteBatch) -> CoreResult<()> {
        if !self.archetypes.has_pending() {
            return Ok(());
        }
        let bytes = worldstore_codec::encode(&self.archetypes.to_persisted())?;
        batch.set(keys::archetype_map_key(), bytes);
        Ok(())
    }

    /// Stages entity-to-archetype pointer updates for every entity
    /// touched this transaction.
    fn stage_entity_pointers(&self, batch: &mut WriteBatch) {
        for (&id, &origin) in &self.entity_to_origin_arch {
            let key = keys::entity_archetype_key(id);
            match self.entity_to_arch.get(&id) {
                // No longer attached to any archetype: removed.
                None => batch.delete(key),
                // Ended up back at its origin archetype: nothing to do.
                Some(&current) if current == origin => {}
                Some(&current) => batch.set(key, keys::format_i64(current.as_i64())),
            }
        }
    }

    /// Stages the full entity list of every archetype marked modified.
    fn stage_active_entities(&self, batch: &mut WriteBatch) -> CoreResult<()> {
        for (arch, active) in self.active.modified_sets() {
            let bytes = worldstore_codec::encode(&active.ids)?;
            batch.set(keys::active_entities_key(arch), bytes);
        }
        Ok(())
    }
}
