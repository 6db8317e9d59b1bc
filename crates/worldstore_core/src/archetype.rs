//! Component-set normalization and archetype resolution.

use crate::error::{CoreError, CoreResult};
use crate::registry::Registry;
use crate::types::{ArchetypeId, ComponentTypeId};
use std::collections::{BTreeMap, HashMap};

/// Canonicalizes a component set: sorted ascending, no duplicates.
///
/// Every archetype lookup and creation goes through this, so
/// set-equality reduces to a positional comparison of two equal-length
/// sequences.
///
/// # Errors
///
/// Returns [`CoreError::EmptyComponentSet`] for an empty input and
/// [`CoreError::DuplicateComponentInSet`] if any type appears twice.
pub fn normalize(mut components: Vec<ComponentTypeId>) -> CoreResult<Vec<ComponentTypeId>> {
    if components.is_empty() {
        return Err(CoreError::EmptyComponentSet);
    }
    components.sort_unstable();
    for pair in components.windows(2) {
        if pair[0] == pair[1] {
            return Err(CoreError::DuplicateComponentInSet { type_id: pair[0] });
        }
    }
    Ok(components)
}

/// The archetype ID to component-types mapping.
///
/// This map is append-only in durable terms: once an archetype ID has
/// been committed, its component set never changes. IDs created during
/// the current transaction are tracked as *pending* so a discard can
/// remove them again, which keeps ID assignment deterministic across
/// retry as long as the sequence of successful commits is deterministic.
#[derive(Debug, Default)]
pub(crate) struct ArchetypeMap {
    components: HashMap<ArchetypeId, Vec<ComponentTypeId>>,
    pending: Vec<ArchetypeId>,
}

impl ArchetypeMap {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Finds the archetype assigned to a normalized component set.
    pub(crate) fn lookup(&self, normalized: &[ComponentTypeId]) -> CoreResult<ArchetypeId> {
        for (&arch_id, comps) in &self.components {
            if comps.as_slice() == normalized {
                return Ok(arch_id);
            }
        }
        Err(CoreError::ArchetypeNotFound)
    }

    /// Returns the archetype for a normalized component set, allocating
    /// the next dense ID if the set is new. Newly allocated IDs are
    /// pending until the next commit.
    pub(crate) fn resolve_or_create(&mut self, normalized: Vec<ComponentTypeId>) -> ArchetypeId {
        if let Ok(existing) = self.lookup(&normalized) {
            return existing;
        }
        let id = ArchetypeId::new(self.components.len() as i64);
        self.pending.push(id);
        self.components.insert(id, normalized);
        tracing::debug!(archetype_id = id.as_i64(), "new archetype created");
        id
    }

    pub(crate) fn components_for(&self, id: ArchetypeId) -> Option<&[ComponentTypeId]> {
        self.components.get(&id).map(Vec::as_slice)
    }

    pub(crate) fn count(&self) -> usize {
        self.components.len()
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Accepts pending IDs as durable. Called after a successful flush.
    pub(crate) fn commit_pending(&mut self) {
        self.pending.clear();
    }

    /// Removes every archetype created during the current transaction,
    /// so the next transaction reuses the same numeric IDs.
    pub(crate) fn discard_pending(&mut self) {
        for id in self.pending.drain(..) {
            self.components.remove(&id);
        }
    }

    /// Returns the full mapping in a deterministically ordered shape for
    /// serialization.
    pub(crate) fn to_persisted(&self) -> BTreeMap<ArchetypeId, Vec<ComponentTypeId>> {
        self.components
            .iter()
            .map(|(id, comps)| (*id, comps.clone()))
            .collect()
    }

    /// Installs a mapping decoded from storage.
    ///
    /// Every referenced component type must be registered, and the map
    /// must still be empty - a populated map means assigned IDs would be
    /// silently overwritten.
    pub(crate) fn load_persisted(
        &mut self,
        persisted: BTreeMap<ArchetypeId, Vec<ComponentTypeId>>,
        registry: &Registry,
    ) -> CoreResult<()> {
        if self.count() > 0 {
            return Err(CoreError::invalid_format(
                "assigned archetype IDs would be overwritten by stored mapping",
            ));
        }
        for (arch_id, comps) in persisted {
            for &type_id in &comps {
                if !registry.is_registered(type_id) {
                    return Err(CoreError::ComponentMismatchWithSavedState { type_id });
                }
            }
            self.components.insert(arch_id, comps);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(raw: &[u32]) -> Vec<ComponentTypeId> {
        raw.iter().copied().map(ComponentTypeId::new).collect()
    }

    #[test]
    fn normalize_sorts_ascending() {
        let normalized = normalize(ids(&[3, 1, 2])).unwrap();
        assert_eq!(normalized, ids(&[1, 2, 3]));
    }

    #[test]
    fn normalize_rejects_empty_set() {
        assert!(matches!(
            normalize(Vec::new()),
            Err(CoreError::EmptyComponentSet)
        ));
    }

    #[test]
    fn normalize_rejects_duplicates() {
        let result = normalize(ids(&[2, 1, 2]));
        assert!(matches!(
            result,
            Err(CoreError::DuplicateComponentInSet { type_id }) if type_id == ComponentTypeId::new(2)
        ));
    }

    #[test]
    fn resolve_assigns_dense_ids() {
        let mut map = ArchetypeMap::new();
        let a = map.resolve_or_create(ids(&[1]));
        let b = map.resolve_or_create(ids(&[1, 2]));
        assert_eq!(a, ArchetypeId::new(0));
        assert_eq!(b, ArchetypeId::new(1));
        assert_eq!(map.count(), 2);
    }

    #[test]
    fn resolve_returns_existing_id() {
        let mut map = ArchetypeMap::new();
        let first = map.resolve_or_create(ids(&[1, 2]));
        let second = map.resolve_or_create(ids(&[1, 2]));
        assert_eq!(first, second);
        assert_eq!(map.count(), 1);
    }

    #[test]
    fn lookup_does_not_create() {
        let map = ArchetypeMap::new();
        assert!(matches!(
            map.lookup(&ids(&[1])),
            Err(CoreError::ArchetypeNotFound)
        ));
    }

    #[test]
    fn discard_reuses_ids() {
        let mut map = ArchetypeMap::new();
        map.resolve_or_create(ids(&[1]));
        map.commit_pending();

        let discarded = map.resolve_or_create(ids(&[1, 2]));
        map.discard_pending();
        assert_eq!(map.count(), 1);

        // The same numeric ID comes back for the next new set.
        let reused = map.resolve_or_create(ids(&[1, 3]));
        assert_eq!(discarded, reused);
    }

    #[test]
    fn committed_ids_survive_discard() {
        let mut map = ArchetypeMap::new();
        let a = map.resolve_or_create(ids(&[1]));
        map.commit_pending();
        map.discard_pending();
        assert_eq!(map.lookup(&ids(&[1])).unwrap(), a);
    }

    #[test]
    fn load_persisted_rejects_unknown_component() {
        use crate::registry::{Component, Registry};
        use serde::{Deserialize, Serialize};

        #[derive(Debug, Default, Serialize, Deserialize)]
        struct Foo;
        impl Component for Foo {
            const NAME: &'static str = "foo";
        }

        let mut registry = Registry::new();
        registry.register::<Foo>().unwrap();

        let mut persisted = BTreeMap::new();
        persisted.insert(ArchetypeId::new(0), ids(&[1, 9]));

        let mut map = ArchetypeMap::new();
        let result = map.load_persisted(persisted, &registry);
        assert!(matches!(
            result,
            Err(CoreError::ComponentMismatchWithSavedState { type_id })
                if type_id == ComponentTypeId::new(9)
        ));
    }

    proptest! {
        #[test]
        fn set_equality_is_order_independent(mut raw in proptest::collection::vec(1u32..64, 1..8)) {
            raw.sort_unstable();
            raw.dedup();
            let mut map = ArchetypeMap::new();
            let forward = map.resolve_or_create(normalize(ids(&raw)).unwrap());
            let mut reversed = raw.clone();
            reversed.reverse();
            let backward = map.resolve_or_create(normalize(ids(&reversed)).unwrap());
            prop_assert_eq!(forward, backward);
            prop_assert_eq!(map.count(), 1);
        }
    }
}
