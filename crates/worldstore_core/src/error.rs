//! Error types for worldstore core.

use crate::types::{ArchetypeId, ComponentTypeId, EntityId};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in worldstore core operations.
///
/// Precondition violations and lookup failures abort the single
/// operation without touching any buffered state. Storage and codec
/// failures abort an in-flight flush and leave all transaction-scoped
/// state untouched, so the caller may retry the same commit.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] worldstore_storage::StorageError),

    /// CBOR codec error.
    #[error("codec error: {0}")]
    Codec(#[from] worldstore_codec::CodecError),

    /// The component type is not registered.
    #[error("component {name:?} is not registered")]
    ComponentNotRegistered {
        /// Name of the component.
        name: String,
    },

    /// A component with this name is already registered.
    #[error("component {name:?} is already registered")]
    ComponentAlreadyRegistered {
        /// Name of the component.
        name: String,
    },

    /// The entity already has this component.
    #[error("component {type_id} is already on {entity}")]
    ComponentAlreadyOnEntity {
        /// The component type.
        type_id: ComponentTypeId,
        /// The entity.
        entity: EntityId,
    },

    /// The entity does not have this component.
    #[error("component {type_id} is not on {entity}")]
    ComponentNotOnEntity {
        /// The component type.
        type_id: ComponentTypeId,
        /// The entity.
        entity: EntityId,
    },

    /// An entity must keep at least one component.
    #[error("cannot remove the last component from {entity}")]
    CannotRemoveLastComponent {
        /// The entity.
        entity: EntityId,
    },

    /// A component type appears more than once in a component set.
    #[error("duplicate component {type_id} in component set")]
    DuplicateComponentInSet {
        /// The repeated component type.
        type_id: ComponentTypeId,
    },

    /// A component set must contain at least one component type.
    #[error("component set is empty")]
    EmptyComponentSet,

    /// No archetype has been assigned to this set of components.
    #[error("archetype for components not found")]
    ArchetypeNotFound,

    /// The entity does not exist in the store.
    #[error("{entity} does not exist")]
    EntityNotFound {
        /// The entity.
        entity: EntityId,
    },

    /// The entity is not in the archetype's active set.
    #[error("{entity} not found in active set of {archetype}")]
    EntityNotFoundInSet {
        /// The entity.
        entity: EntityId,
        /// The archetype whose active set was searched.
        archetype: ArchetypeId,
    },

    /// No archetype mapping has ever been persisted.
    #[error("no mapping of archetype IDs to components found")]
    NoArchetypeMappingFound,

    /// A persisted archetype references a component type that is not in
    /// the currently registered set.
    #[error("persisted {type_id} does not match any registered component")]
    ComponentMismatchWithSavedState {
        /// The unrecognized component type.
        type_id: ComponentTypeId,
    },

    /// Components must be registered before state can be flushed.
    #[error("components must be registered before flushing")]
    RegistrationRequired,

    /// Persisted data is malformed.
    #[error("invalid stored value: {message}")]
    InvalidFormat {
        /// Description of the format issue.
        message: String,
    },
}

impl CoreError {
    /// Creates a component-not-registered error.
    pub fn component_not_registered(name: impl Into<String>) -> Self {
        Self::ComponentNotRegistered { name: name.into() }
    }

    /// Creates an invalid-format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }
}
