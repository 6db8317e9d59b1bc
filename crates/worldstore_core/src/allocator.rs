//! Speculative entity ID allocation.

use crate::error::CoreResult;
use crate::keys;
use crate::types::EntityId;
use worldstore_storage::KeyValueBackend;

/// Load state of the allocator.
///
/// `Unloaded` means the persisted counter has not been read this
/// transaction; the first allocation performs the read. Discarding a
/// transaction returns to `Unloaded`, which is safe because nothing
/// speculative was ever persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AllocatorState {
    Unloaded,
    Loaded {
        /// The persisted counter value at load (or last commit) time.
        saved: u64,
        /// IDs handed out since then, not yet durable.
        pending: u64,
    },
}

/// Produces monotonically increasing entity IDs.
///
/// IDs are handed out speculatively: nothing is written until the
/// enclosing transaction commits, at which point the advanced counter is
/// persisted as part of the flush batch.
#[derive(Debug)]
pub(crate) struct EntityIdAllocator {
    state: AllocatorState,
}

impl EntityIdAllocator {
    pub(crate) fn new() -> Self {
        Self {
            state: AllocatorState::Unloaded,
        }
    }

    /// Returns the next available entity ID.
    ///
    /// On first use the persisted counter is loaded, treating an absent
    /// key as 0.
    pub(crate) fn next_id(&mut self, backend: &dyn KeyValueBackend) -> CoreResult<EntityId> {
        let (saved, pending) = match self.state {
            AllocatorState::Loaded { saved, pending } => (saved, pending),
            AllocatorState::Unloaded => {
                let saved = match backend.get(keys::next_entity_id_key())? {
                    Some(bytes) => keys::parse_u64(&bytes)?,
                    None => 0,
                };
                (saved, 0)
            }
        };

        let id = EntityId::new(saved + pending);
        self.state = AllocatorState::Loaded {
            saved,
            pending: pending + 1,
        };
        Ok(id)
    }

    /// Returns the counter value to persist, or `None` if no IDs were
    /// allocated this transaction.
    pub(crate) fn counter_to_persist(&self) -> Option<u64> {
        match self.state {
            AllocatorState::Loaded { saved, pending } if pending > 0 => Some(saved + pending),
            _ => None,
        }
    }

    /// Folds speculative allocations into the saved counter. Called only
    /// after the flush that persisted the new counter succeeded.
    pub(crate) fn commit(&mut self) {
        if let AllocatorState::Loaded { saved, pending } = self.state {
            self.state = AllocatorState::Loaded {
                saved: saved + pending,
                pending: 0,
            };
        }
    }

    /// Drops speculative allocations and forces a re-read on next use.
    pub(crate) fn discard(&mut self) {
        self.state = AllocatorState::Unloaded;
    }
}
