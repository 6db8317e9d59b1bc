//! # Worldstore Storage
//!
//! Key-value backend trait and implementations for worldstore.
//!
//! This crate provides the lowest-level storage abstraction for the
//! game-state engine. Backends are **opaque key-value stores** - they do
//! not interpret the values they hold. All key shapes and value encodings
//! are owned by the layers above.
//!
//! ## Design Principles
//!
//! - Backends are simple keyed byte stores (get, set, delete)
//! - A [`WriteBatch`] is applied as one all-or-nothing unit
//! - Backends are internally synchronized and shared by handle
//! - No knowledge of archetypes, entities, or component encodings
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral worlds
//!
//! Production deployments implement [`KeyValueBackend`] over their store
//! of choice (typically a networked client); the trait's contract is the
//! only thing the engine relies on.
//!
//! ## Example
//!
//! ```rust
//! use worldstore_storage::{InMemoryBackend, KeyValueBackend, WriteBatch};
//!
//! let backend = InMemoryBackend::new();
//! let mut batch = WriteBatch::new();
//! batch.set("greeting", b"hello".to_vec());
//! backend.apply(batch).unwrap();
//! assert_eq!(backend.get("greeting").unwrap(), Some(b"hello".to_vec()));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod batch;
mod error;
mod memory;

pub use backend::KeyValueBackend;
pub use batch::{WriteBatch, WriteOp};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryBackend;
