//! Write-free world accessor.

use crate::archetype::normalize;
use crate::error::{CoreError, CoreResult};
use crate::filter::ComponentFilter;
use crate::keys;
use crate::registry::{Component, Registry};
use crate::types::{ArchetypeId, ComponentTypeId, EntityId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use worldstore_storage::KeyValueBackend;

/// A read-only accessor bound to the same backend as a
/// [`CommandBuffer`](crate::CommandBuffer).
///
/// The view has no write buffer and never invents archetypes. Its
/// archetype mapping is loaded lazily: the first query pulls the
/// persisted blob, and a lookup that misses the in-memory cache triggers
/// exactly one refresh from the backend before failing. Because the
/// mapping is append-only (an archetype ID always refers to the same
/// component set), caching it is safe; staleness is bounded by the
/// refresh-on-miss policy.
///
/// Used by components that only read world state (queries, inspectors)
/// without needing transaction controls.
pub struct ReadOnlyView {
    backend: Arc<dyn KeyValueBackend>,
    registry: Arc<Registry>,
    archetypes: Option<HashMap<ArchetypeId, Vec<ComponentTypeId>>>,
}

impl ReadOnlyView {
    pub(crate) fn new(backend: Arc<dyn KeyValueBackend>, registry: Arc<Registry>) -> Self {
        Self {
            backend,
            registry,
            archetypes: None,
        }
    }

    /// Returns the component registry this view was constructed with.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
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
    pub fn get_component_raw(
        &mut self,
        type_id: ComponentTypeId,
        id: EntityId,
    ) -> CoreResult<Vec<u8>> {
        let comps = self.get_component_types_for_entity(id)?;
        if !comps.contains(&type_id) {
            return Err(CoreError::ComponentNotOnEntity {
                type_id,
                entity: id,
            });
        }
        match self.backend.get(&keys::component_value_key(type_id, id))? {
            Some(bytes) => Ok(bytes),
            None => self.registry.default_bytes(type_id),
        }
    }

    /// Returns the component types currently on the given entity.
    ///
    /// The entity's archetype pointer is read from the backend on every
    /// call; only the archetype mapping itself is cached.
    pub fn get_component_types_for_entity(
        &mut self,
        id: EntityId,
    ) -> CoreResult<Vec<ComponentTypeId>> {
        let bytes = self
            .backend
            .get(&keys::entity_archetype_key(id))?
            .ok_or(CoreError::EntityNotFound { entity: id })?;
        let arch = ArchetypeId::new(keys::parse_i64(&bytes)?);
        self.get_component_types_for_archetype(arch)
    }

    /// Returns the component types associated with an archetype.
    pub fn get_component_types_for_archetype(
        &mut self,
        archetype: ArchetypeId,
    ) -> CoreResult<Vec<ComponentTypeId>> {
        if let Some(map) = &self.archetypes {
            if let Some(comps) = map.get(&archetype) {
                return Ok(comps.clone());
            }
        }
        self.refresh_archetypes()?;
        self.archetypes
            .as_ref()
            .and_then(|map| map.get(&archetype))
            .cloned()
            .ok_or(CoreError::ArchetypeNotFound)
    }

    /// Returns the archetype assigned to this set of components.
    ///
    /// A miss triggers one refresh from the backend before failing with
    /// [`CoreError::ArchetypeNotFound`].
    pub fn get_archetype_for_components(
        &mut self,
        components: &[ComponentTypeId],
    ) -> CoreResult<ArchetypeId> {
        let normalized = normalize(components.to_vec())?;
        for try_refresh in [false, true] {
            if try_refresh {
                self.refresh_archetypes()?;
            }
            if let Some(map) = &self.archetypes {
                for (&arch, comps) in map {
                    if comps.as_slice() == normalized.as_slice() {
                        return Ok(arch);
                    }
                }
            }
        }
        Err(CoreError::ArchetypeNotFound)
    }

    /// Returns all entities currently belonging to the given archetype.
    ///
    /// An absent key means no entities, not an error.
    pub fn get_entities_for_archetype(
        &self,
        archetype: ArchetypeId,
    ) -> CoreResult<Vec<EntityId>> {
        match self.backend.get(&keys::active_entities_key(archetype))? {
            Some(bytes) => Ok(worldstore_codec::decode(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    /// Returns the archetypes matching `filter`, scanning dense IDs
    /// upward from `start`.
    pub fn search_archetypes_from(
        &mut self,
        filter: &dyn ComponentFilter,
        start: usize,
    ) -> CoreResult<Vec<ArchetypeId>> {
        let map = self.archetype_map()?;
        let mut matches = Vec::new();
        for index in start..map.len() {
            let arch = ArchetypeId::new(index as i64);
            if let Some(comps) = map.get(&arch) {
                if filter.matches(comps) {
                    matches.push(arch);
                }
            }
        }
        Ok(matches)
    }

    /// Returns the number of persisted archetypes, refreshing the cached
    /// mapping from the backend.
    pub fn archetype_count(&mut self) -> CoreResult<usize> {
        self.refresh_archetypes()?;
        Ok(self.archetypes.as_ref().map_or(0, HashMap::len))
    }

    /// Reloads the archetype mapping from the persisted blob.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoArchetypeMappingFound`] if nothing has ever
    /// been persisted.
    fn refresh_archetypes(&mut self) -> CoreResult<()> {
        let bytes = self
            .backend
            .get(keys::archetype_map_key())?
            .ok_or(CoreError::NoArchetypeMappingFound)?;
        let persisted: BTreeMap<ArchetypeId, Vec<ComponentTypeId>> =
            worldstore_codec::decode(&bytes)?;
        for comps in persisted.values() {
            for &type_id in comps {
                if !self.registry.is_registered(type_id) {
                    return Err(CoreError::ComponentMismatchWithSavedState { type_id });
                }
            }
        }
        self.archetypes = Some(persisted.into_iter().collect());
        Ok(())
    }

    /// Returns the cached mapping, loading it on first use.
    fn archetype_map(&mut self) -> CoreResult<&HashMap<ArchetypeId, Vec<ComponentTypeId>>> {
        if self.archetypes.is_none() {
            self.refresh_archetypes()?;
        }
        match &self.archetypes {
            Some(map) => Ok(map),
            None => Err(CoreError::NoArchetypeMappingFound),
        }
    }
}

impl fmt::Debug for ReadOnlyView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOnlyView")
            .field(
                "cached_archetypes",
                &self.archetypes.as_ref().map_or(0, HashMap::len),
            )
            .finish_non_exhaustive()
    }
}
