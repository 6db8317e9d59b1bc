//! Component type registry.

use crate::error::{CoreError, CoreResult};
use crate::types::ComponentTypeId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use worldstore_codec::CodecResult;

/// A component schema that can be stored in a world.
///
/// Components are plain serde-serializable values with a stable name and
/// a default. The default supplies the payload for entities whose value
/// was never explicitly set.
///
/// # Example
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use worldstore_core::Component;
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct Position {
///     x: i64,
///     y: i64,
/// }
///
/// impl Component for Position {
///     const NAME: &'static str = "position";
/// }
/// ```
pub trait Component: Serialize + DeserializeOwned + Default + Send + Sync + 'static {
    /// Stable, unique name of this component schema.
    const NAME: &'static str;
}

type DefaultBytesFn = Box<dyn Fn() -> CodecResult<Vec<u8>> + Send + Sync>;

/// Capabilities recorded for one registered component type.
pub struct ComponentInfo {
    type_id: ComponentTypeId,
    name: &'static str,
    default_bytes: DefaultBytesFn,
}

impl ComponentInfo {
    /// Returns the component's type ID.
    #[must_use]
    pub fn type_id(&self) -> ComponentTypeId {
        self.type_id
    }

    /// Returns the component's registered name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Encodes the component type's default value.
    pub fn default_bytes(&self) -> CodecResult<Vec<u8>> {
        (self.default_bytes)()
    }
}

impl fmt::Debug for ComponentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInfo")
            .field("type_id", &self.type_id)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Maps component names to type IDs and per-type capabilities.
///
/// A registry is an explicit constructed value handed to
/// [`CommandBuffer::new`](crate::CommandBuffer::new) - never process-wide
/// state - so multiple engines with different schemas can coexist in one
/// process. Type IDs are dense and assigned in registration order,
/// starting at 1: registering the same components in the same order on
/// every startup reproduces the same IDs, which the persisted archetype
/// mapping depends on.
#[derive(Default)]
pub struct Registry {
    by_id: HashMap<ComponentTypeId, ComponentInfo>,
    by_name: HashMap<&'static str, ComponentTypeId>,
    next_id: u32,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a component type and assigns it the next dense type ID.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ComponentAlreadyRegistered`] if a component
    /// with the same name was registered before.
    pub fn register<T: Component>(&mut self) -> CoreResult<ComponentTypeId> {
        if self.by_name.contains_key(T::NAME) {
            return Err(CoreError::ComponentAlreadyRegistered {
                name: T::NAME.to_owned(),
            });
        }

        self.next_id += 1;
        let type_id = ComponentTypeId::new(self.next_id);

        self.by_name.insert(T::NAME, type_id);
        self.by_id.insert(
            type_id,
            ComponentInfo {
                type_id,
                name: T::NAME,
                default_bytes: Box::new(|| worldstore_codec::encode(&T::default())),
            },
        );

        Ok(type_id)
    }

    /// Returns the type ID assigned to component `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ComponentNotRegistered`] if `T` was never
    /// registered.
    pub fn type_id<T: Component>(&self) -> CoreResult<ComponentTypeId> {
        self.by_name
            .get(T::NAME)
            .copied()
            .ok_or_else(|| CoreError::component_not_registered(T::NAME))
    }

    /// Returns the capabilities recorded for a type ID.
    #[must_use]
    pub fn info(&self, type_id: ComponentTypeId) -> Option<&ComponentInfo> {
        self.by_id.get(&type_id)
    }

    /// Returns true if the type ID belongs to a registered component.
    #[must_use]
    pub fn is_registered(&self, type_id: ComponentTypeId) -> bool {
        self.by_id.contains_key(&type_id)
    }

    /// Encodes the default value of the given component type.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ComponentNotRegistered`] for an unknown type
    /// ID, or a codec error if the default cannot be encoded.
    pub fn default_bytes(&self, type_id: ComponentTypeId) -> CoreResult<Vec<u8>> {
        let info = self
            .by_id
            .get(&type_id)
            .ok_or_else(|| CoreError::component_not_registered(type_id.to_string()))?;
        Ok(info.default_bytes()?)
    }

    /// Returns the number of registered component types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns true if no component types have been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
