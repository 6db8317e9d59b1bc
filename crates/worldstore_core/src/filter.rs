//! Component filters: the boundary consumed by the query layer.

use crate::types::ComponentTypeId;

/// Decides whether an archetype's component set is of interest.
///
/// Implementations receive the archetype's normalized (sorted,
/// duplicate-free) component types.
pub trait ComponentFilter {
    /// Returns true if an archetype with these components matches.
    fn matches(&self, components: &[ComponentTypeId]) -> bool;
}

/// Matches every archetype.
#[derive(Debug, Clone, Copy, Default)]
pub struct All;

impl ComponentFilter for All {
    fn matches(&self, _components: &[ComponentTypeId]) -> bool {
        true
    }
}

/// Matches archetypes that contain every listed component type,
/// regardless of what else they contain.
#[derive(Debug, Clone)]
pub struct Contains {
    components: Vec<ComponentTypeId>,
}

impl Contains {
    /// Creates a filter requiring all of `components`.
    #[must_use]
    pub fn new(components: Vec<ComponentTypeId>) -> Self {
        Self { components }
    }
}

impl ComponentFilter for Contains {
    fn matches(&self, components: &[ComponentTypeId]) -> bool {
        self.components
            .iter()
            .all(|required| components.contains(required))
    }
}

/// Matches archetypes whose component set is exactly the listed one.
#[derive(Debug, Clone)]
pub struct Exact {
    components: Vec<ComponentTypeId>,
}

impl Exact {
    /// Creates a filter matching exactly `components`, order-independent.
    #[must_use]
    pub fn new(mut components: Vec<ComponentTypeId>) -> Self {
        components.sort_unstable();
        Self { components }
    }
}

impl ComponentFilter for Exact {
    fn matches(&self, components: &[ComponentTypeId]) -> bool {
        self.components.as_slice() == components
    }
}
