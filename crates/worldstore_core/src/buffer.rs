//! The transactional command buffer.

use crate::allocator::EntityIdAllocator;
use crate::archetype::{normalize, ArchetypeMap};
use crate::cache::{CompKey, ComponentValueCache};
use crate::error::{CoreError, CoreResult};
use crate::filter::ComponentFilter;
use crate::index::ActiveEntityIndex;
use crate::keys;
use crate::read_only::ReadOnlyView;
use crate::registry::{Component, Registry};
use crate::types::{ArchetypeId, ComponentTypeId, EntityId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use worldstore_storage::KeyValueBackend;

/// Queues a series of state changes and commits them atomically to the
/// backing key-value store.
///
/// All mutations - entity creation and removal, component add/remove,
/// component value writes - are staged in memory. Nothing touches the
/// backend until [`commit_pending`](Self::commit_pending) (or the
/// closure-wrapping [`atomic`](Self::atomic)) flushes everything as one
/// pipelined write. [`discard_pending`](Self::discard_pending) drops all
/// staged state instead, restoring the last durable view.
///
/// # Single writer
///
/// A buffer assumes serialized access: one logical writer drives
/// `atomic`/`commit_pending`/`discard_pending` one simulation step at a
/// time. Every mutation takes `&mut self`, so sharing a buffer requires
/// external coordination by construction. Running two buffers against
/// the same logical world concurrently is out of contract.
pub struct CommandBuffer {
    pub(crate) backend: Arc<dyn KeyValueBackend>,
    pub(crate) registry: Arc<Registry>,

    pub(crate) comp_values: ComponentValueCache,
    pub(crate) active: ActiveEntityIndex,
    pub(crate) allocator: EntityIdAllocator,

    pub(crate) entity_to_arch: HashMap<EntityId, ArchetypeId>,
    pub(crate) entity_to_origin_arch: HashMap<EntityId, ArchetypeId>,

    pub(crate) archetypes: ArchetypeMap,
}

impl CommandBuffer {
    /// Creates a command buffer bound to a backend, loading the persisted
    /// archetype mapping.
    ///
    /// The registry must already hold every component type the world
    /// uses: dense archetype IDs are only reproducible when the same
    /// components are registered in the same order on every startup.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ComponentMismatchWithSavedState`] if the
    /// persisted archetype mapping references an unregistered component
    /// type, or a storage/codec error if the mapping cannot be read.
    pub fn new(backend: Arc<dyn KeyValueBackend>, registry: Registry) -> CoreResult<Self> {
        let mut buffer = Self {
            backend,
            registry: Arc::new(registry),
            comp_values: ComponentValueCache::new(),
            active: ActiveEntityIndex::new(),
            allocator: EntityIdAllocator::new(),
            entity_to_arch: HashMap::new(),
            entity_to_origin_arch: HashMap::new(),
            archetypes: ArchetypeMap::new(),
        };
        buffer.load_archetypes()?;
        Ok(buffer)
    }

    /// Creates a single entity with the given set of components.
    pub fn create_entity(&mut self, components: &[ComponentTypeId]) -> CoreResult<EntityId> {
        let ids = self.create_many_entities(1, components)?;
        Ok(ids[0])
    }

    /// Creates `count` entities with the given set of components.
    ///
    /// Entity IDs are assigned speculatively; they only become durable
    /// on commit. The origin archetype of each new entity is recorded as
    /// [`ArchetypeId::NONE`], so a discard simply forgets them and
    /// rewinds the allocator.
    pub fn create_many_entities(
        &mut self,
        count: usize,
        components: &[ComponentTypeId],
    ) -> CoreResult<Vec<EntityId>> {
        let arch_id = self.resolve_or_create_archetype(components)?;

        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let id = self.allocator.next_id(self.backend.as_ref())?;
            self.entity_to_arch.insert(id, arch_id);
            self.entity_to_origin_arch.insert(id, ArchetypeId::NONE);
            ids.push(id);
        }

        let active = self.active.get_or_load(self.backend.as_ref(), arch_id)?;
        for &id in &ids {
            active.append(id);
        }
        Ok(ids)
    }

    /// Removes the given entity from the world.
    ///
    /// The entity is dropped from its archetype's active set and from the
    /// entity-to-archetype map, so later lookups within the same
    /// transaction see it as gone; a second removal fails with
    /// [`CoreError::EntityNotFoundInSet`].
    pub fn remove_entity(&mut self, id: EntityId) -> CoreResult<()> {
        let arch = self.archetype_for_entity(id)?;

        let active = self.active.get_or_load(self.backend.as_ref(), arch)?;
        active.swap_remove(id, arch)?;

        self.entity_to_origin_arch.entry(id).or_insert(arch);
        self.entity_to_arch.remove(&id);
        Ok(())
    }

    /// Adds a component to an entity, moving it to the matching
    /// archetype.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ComponentAlreadyOnEntity`] if the entity
    /// already has the component.
    pub fn add_component_to_entity(
        &mut self,
        type_id: ComponentTypeId,
        id: EntityId,
    ) -> CoreResult<()> {
        let from_comps = self.get_component_types_for_entity(id)?;
        if from_comps.contains(&type_id) {
            return Err(CoreError::ComponentAlreadyOnEntity {
                type_id,
                entity: id,
            });
        }

        let mut to_comps = from_comps.clone();
        to_comps.push(type_id);

        let from_arch = self.resolve_or_create_archetype(&from_comps)?;
        let to_arch = self.resolve_or_create_archetype(&to_comps)?;
        self.move_entity(from_arch, to_arch, id)
    }

    /// Removes a component from an entity, moving it to the matching
    /// archetype and staging a delete of the component's stored value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ComponentNotOnEntity`] if the entity lacks
    /// the component, or [`CoreError::CannotRemoveLastComponent`] if it
    /// is the entity's only component.
    pub fn remove_component_from_entity(
        &mut self,
        type_id: ComponentTypeId,
        id: EntityId,
    ) -> CoreResult<()> {
        let comps = self.get_component_types_for_entity(id)?;
        if !comps.contains(&type_id) {
            return Err(CoreError::ComponentNotOnEntity {
                type_id,
                entity: id,
            });
        }

        let new_comps: Vec<ComponentTypeId> =
            comps.iter().copied().filter(|&c| c != type_id).collect();
        if new_comps.is_empty() {
            return Err(CoreError::CannotRemoveLastComponent { entity: id });
        }

        self.comp_values.mark_deleted(CompKey::new(type_id, id));

        let from_arch = self.resolve_or_create_archetype(&comps)?;
        let to_arch = self.resolve_or_create_archetype(&new_comps)?;
        self.move_entity(from_arch, to_arch, id)
    }

    /// Sets the entity's value for component `T`.
    ///
    /// The value is encoded eagerly and buffered; the entity must
    /// already have the component.
    pub fn set_component_for_entity<T: Component>(
        &mut self,
        id: EntityId,
        value: &T,
    ) -> CoreResult<()> {
        let type_id = self.registry.type_id::<T>()?;
        let bytes = worldstore_codec::encode(value)?;
        self.set_component_raw(type_id, id, bytes)
    }

    /// Sets the entity's value for a component type from pre-encoded
    /// bytes.
    pub fn set_component_raw(
        &mut self,
        type_id: ComponentTypeId,
        id: EntityId,
        bytes: Vec<u8>,
    ) -> CoreResult<()> {
        let comps = self.get_component_types_for_entity(id)?;
        if !comps.contains(&type_id) {
            return Err(CoreError::ComponentNotOnEntity {
                type_id,
                entity: id,
            });
        }
        self.comp_values.insert(CompKey::new(type_id, id), bytes);
        Ok(())
    }

    /// Returns the entity's value for component `T`.
    ///
    /// A value that was never set decodes to `T::default()`.
    pub fn get_component_for_entity<T: Component>(&mut self, id: EntityId) -> CoreResult<T> {
        let type_id = self.registry.type_id::<T>()?;
        let bytes = self.get_component_raw(type_id, id)?;
        Ok(worldstore_codec::decode(&bytes)?)
    }

    /// Returns the entity's encoded value for a component type.
    ///
    /// Serves from the write buffer when possible; otherwise verifies
    /// membership, fetches the persisted bytes (falling back to the
    /// type's default for never-written values), and caches them for the
    /// rest of the transaction.
    pub fn get_component_raw(
        &mut self,
        type_id: ComponentTypeId,
        id: EntityId,
    ) -> CoreResult<Vec<u8>> {
        let key = CompKey::new(type_id, id);
        if let Some(bytes) = self.comp_values.get(key) {
            return Ok(bytes.to_vec());
        }

        let comps = self.get_component_types_for_entity(id)?;
        if !comps.contains(&type_id) {
            return Err(CoreError::ComponentNotOnEntity {
                type_id,
                entity: id,
            });
        }

        let bytes = match self.backend.get(&keys::component_value_key(type_id, id))? {
            Some(bytes) => bytes,
            None => self.registry.default_bytes(type_id)?,
        };
        self.comp_values.insert(key, bytes.clone());
        Ok(bytes)
    }

    /// Returns every component on the entity as (type, encoded bytes)
    /// pairs, in the archetype's normalized order.
    pub fn all_components_raw(
        &mut self,
        id: EntityId,
    ) -> CoreResult<Vec<(ComponentTypeId, Vec<u8>)>> {
        let comps = self.get_component_types_for_entity(id)?;
        let mut result = Vec::with_capacity(comps.len());
        for type_id in comps {
            let bytes = self.get_component_raw(type_id, id)?;
            result.push((type_id, bytes));
        }
        Ok(result)
    }

    /// Returns the component types currently on the given entity.
    pub fn get_component_types_for_entity(
        &mut self,
        id: EntityId,
    ) -> CoreResult<Vec<ComponentTypeId>> {
        let arch = self.archetype_for_entity(id)?;
        self.get_component_types_for_archetype(arch)
    }

    /// Returns the component types associated with an archetype.
    pub fn get_component_types_for_archetype(
        &self,
        archetype: ArchetypeId,
    ) -> CoreResult<Vec<ComponentTypeId>> {
        self.archetypes
            .components_for(archetype)
            .map(<[ComponentTypeId]>::to_vec)
            .ok_or(CoreError::ArchetypeNotFound)
    }

    /// Returns the archetype assigned to this set of components, without
    /// creating one.
    pub fn get_archetype_for_components(
        &self,
        components: &[ComponentTypeId],
    ) -> CoreResult<ArchetypeId> {
        let normalized = normalize(components.to_vec())?;
        self.archetypes.lookup(&normalized)
    }

    /// Returns all entities currently belonging to the given archetype.
    pub fn get_entities_for_archetype(
        &mut self,
        archetype: ArchetypeId,
    ) -> CoreResult<Vec<EntityId>> {
        let active = self.active.get_or_load(self.backend.as_ref(), archetype)?;
        Ok(active.ids.clone())
    }

    /// Returns the archetypes matching `filter`, scanning dense IDs
    /// upward from `start`.
    pub fn search_archetypes_from(
        &self,
        filter: &dyn ComponentFilter,
        start: usize,
    ) -> Vec<ArchetypeId> {
        let mut matches = Vec::new();
        for index in start..self.archetypes.count() {
            let arch = ArchetypeId::new(index as i64);
            if let Some(comps) = self.archetypes.components_for(arch) {
                if filter.matches(comps) {
                    matches.push(arch);
                }
            }
        }
        matches
    }

    /// Returns the number of archetypes that have been generated,
    /// including ones pending in the current transaction.
    #[must_use]
    pub fn archetype_count(&self) -> usize {
        self.archetypes.count()
    }

    /// Commits pending changes, runs `f`, then commits or discards what
    /// `f` staged.
    ///
    /// Committing up front means `f` starts from a clean, durable
    /// baseline, so an error inside `f` rolls back exactly the mutations
    /// `f` made.
    pub fn atomic<F>(&mut self, f: F) -> CoreResult<()>
    where
        F: FnOnce(&mut Self) -> CoreResult<()>,
    {
        self.commit_pending()?;
        match f(self) {
            Ok(()) => self.commit_pending(),
            Err(err) => {
                self.discard_pending();
                Err(err)
            }
        }
    }

    /// Commits all pending state changes to the backend.
    ///
    /// If an error is returned, the backend is unchanged and all staged
    /// state is kept, so the same commit may be retried.
    pub fn commit_pending(&mut self) -> CoreResult<()> {
        self.flush()?;

        // The flush is durable; fold speculative state into saved state
        // and stop tracking the changes locally.
        self.archetypes.commit_pending();
        self.allocator.commit();
        self.clear_transaction_state();
        Ok(())
    }

    /// Discards all pending state changes.
    ///
    /// Component writes and deletes are dropped, active sets reload from
    /// the last durable state on next access, archetype moves are undone,
    /// speculative entity IDs are rewound, and archetypes created this
    /// transaction are forgotten (their numeric IDs will be reused).
    pub fn discard_pending(&mut self) {
        self.archetypes.discard_pending();
        self.allocator.discard();
        self.clear_transaction_state();
    }

    /// Returns the component registry this buffer was constructed with.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Returns a write-free accessor bound to the same backend.
    ///
    /// The view maintains its own archetype mapping cache and does not
    /// see this buffer's staged state; it accepts bounded staleness in
    /// exchange for not coordinating with the writer.
    #[must_use]
    pub fn read_only_view(&self) -> ReadOnlyView {
        ReadOnlyView::new(Arc::clone(&self.backend), Arc::clone(&self.registry))
    }

    /// Returns the archetype the entity currently belongs to, consulting
    /// the persisted pointer on first access.
    fn archetype_for_entity(&mut self, id: EntityId) -> CoreResult<ArchetypeId> {
        if let Some(&arch) = self.entity_to_arch.get(&id) {
            return Ok(arch);
        }
        let bytes = self
            .backend
            .get(&keys::entity_archetype_key(id))?
            .ok_or(CoreError::EntityNotFound { entity: id })?;
        let arch = ArchetypeId::new(keys::parse_i64(&bytes)?);
        self.entity_to_arch.insert(id, arch);
        Ok(arch)
    }

    fn resolve_or_create_archetype(
        &mut self,
        components: &[ComponentTypeId],
    ) -> CoreResult<ArchetypeId> {
        let normalized = normalize(components.to_vec())?;
        Ok(self.archetypes.resolve_or_create(normalized))
    }

    /// Moves an entity between archetypes, recording its origin the
    /// first time it moves within the current transaction.
    fn move_entity(&mut self, from: ArchetypeId, to: ArchetypeId, id: EntityId) -> CoreResult<()> {
        self.entity_to_origin_arch.entry(id).or_insert(from);
        self.entity_to_arch.insert(id, to);

        let active = self.active.get_or_load(self.backend.as_ref(), from)?;
        active.swap_remove(id, from)?;

        let active = self.active.get_or_load(self.backend.as_ref(), to)?;
        active.append(id);
        Ok(())
    }

    fn clear_transaction_state(&mut self) {
        self.comp_values.clear();
        self.active.clear();

        // Archetype reassignments performed this transaction fall back
        // to the persisted mapping on next lookup.
        for id in self.entity_to_origin_arch.keys() {
            self.entity_to_arch.remove(id);
        }
        self.entity_to_origin_arch.clear();
    }
}

impl fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("archetype_count", &self.archetype_count())
            .finish_non_exhaustive()
    }
}
