//! # Worldstore Core
//!
//! The storage core of an ECS game-state engine.
//!
//! This crate maps entities to archetypes (distinct component-type
//! combinations), stores component payloads per entity, and persists all
//! of it to a durable key-value backend, while presenting an
//! all-or-nothing transaction model to callers that mutate state within
//! one simulation step.
//!
//! The pieces:
//! - [`Registry`] - component schemas with dense type IDs and per-type
//!   encode/decode/default capabilities
//! - [`CommandBuffer`] - the transaction manager: stages mutations in
//!   memory, commits them as one pipelined write, or discards them
//! - [`ReadOnlyView`] - a write-free accessor for query paths
//! - [`ComponentFilter`] - the boundary consumed by the query layer
//!
//! ## Example
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//! use worldstore_core::{CommandBuffer, Component, Registry};
//! use worldstore_storage::InMemoryBackend;
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct Position {
//!     x: i64,
//!     y: i64,
//! }
//!
//! impl Component for Position {
//!     const NAME: &'static str = "position";
//! }
//!
//! let mut registry = Registry::new();
//! let position = registry.register::<Position>().unwrap();
//!
//! let mut world = CommandBuffer::new(Arc::new(InMemoryBackend::new()), registry).unwrap();
//! world
//!     .atomic(|w| {
//!         let id = w.create_entity(&[position])?;
//!         w.set_component_for_entity(id, &Position { x: 3, y: 4 })
//!     })
//!     .unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod allocator;
mod archetype;
mod buffer;
mod cache;
mod error;
mod filter;
mod flush;
mod index;
mod keys;
mod read_only;
mod registry;
mod types;

pub use archetype::normalize;
pub use buffer::CommandBuffer;
pub use error::{CoreError, CoreResult};
pub use filter::{All, ComponentFilter, Contains, Exact};
pub use read_only::ReadOnlyView;
pub use registry::{Component, ComponentInfo, Registry};
pub use types::{ArchetypeId, ComponentTypeId, EntityId};
