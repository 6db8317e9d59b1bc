//! Core type definitions for worldstore.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a component schema.
///
/// Component type IDs are assigned by the [`Registry`](crate::Registry)
/// in registration order, starting at 1, and are never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ComponentTypeId(pub u32);

impl ComponentTypeId {
    /// Creates a new component type ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ComponentTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "component-type:{}", self.0)
    }
}

/// Identifier of a single simulation entity.
///
/// Entity IDs are monotonically increasing and never reused within a
/// store's lifetime. [`EntityId::INVALID`] is reserved to mean
/// "invalid/not-found" and is never allocated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Sentinel value denoting an invalid or not-found entity.
    pub const INVALID: Self = Self(u64::MAX);

    /// Creates a new entity ID.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity:{}", self.0)
    }
}

/// Identifier of one distinct, sorted set of component types.
///
/// Archetype IDs are dense and non-negative: the Nth distinct component
/// set observed by a store is assigned ID N-1. Two component sets map to
/// the same archetype ID iff they contain exactly the same component
/// types, order-independent. [`ArchetypeId::NONE`] (-1) marks "no
/// archetype yet" and is used as the origin of entities created within
/// the current transaction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ArchetypeId(pub i64);

impl ArchetypeId {
    /// Sentinel value denoting "no archetype".
    pub const NONE: Self = Self(-1);

    /// Creates a new archetype ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ArchetypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "archetype:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_type_id_ordering() {
        let a = ComponentTypeId::new(1);
        let b = ComponentTypeId::new(2);
        assert!(a < b);
    }

    #[test]
    fn entity_id_display() {
        let id = EntityId::new(42);
        assert_eq!(format!("{id}"), "entity:42");
    }

    #[test]
    fn invalid_entity_id_is_never_ordinary() {
        assert!(EntityId::new(0) < EntityId::INVALID);
        assert_ne!(EntityId::new(u64::MAX - 1), EntityId::INVALID);
    }

    #[test]
    fn none_archetype_is_negative() {
        assert_eq!(ArchetypeId::NONE.as_i64(), -1);
        assert!(ArchetypeId::NONE < ArchetypeId::new(0));
    }

    #[test]
    fn ids_roundtrip_through_codec() {
        let id = EntityId::new(7);
        let bytes = worldstore_codec::encode(&id).unwrap();
        let decoded: EntityId = worldstore_codec::decode(&bytes).unwrap();
        assert_eq!(id, decoded);

        // Newtype IDs serialize as their raw integer.
        let raw: u64 = worldstore_codec::decode(&bytes).unwrap();
        assert_eq!(raw, 7);
    }
}
