//! Atomic write batches.

/// A single operation within a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Set a key to a value, creating it if absent.
    Set {
        /// The key to write.
        key: String,
        /// The value bytes.
        value: Vec<u8>,
    },
    /// Delete a key. Deleting an absent key is not an error.
    Delete {
        /// The key to delete.
        key: String,
    },
}

/// An ordered collection of writes applied as one all-or-nothing unit.
///
/// Batches are built up by the persistence layer and handed to
/// [`KeyValueBackend::apply`](crate::KeyValueBackend::apply). Operations
/// are applied in insertion order, so a `Set` following a `Delete` on the
/// same key leaves the key present.
#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a set operation.
    pub fn set(&mut self, key: impl Into<String>, value: Vec<u8>) {
        self.ops.push(WriteOp::Set {
            key: key.into(),
            value,
        });
    }

    /// Appends a delete operation.
    pub fn delete(&mut self, key: impl Into<String>) {
        self.ops.push(WriteOp::Delete { key: key.into() });
    }

    /// Returns the operations in insertion order.
    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consumes the batch, returning its operations.
    #[must_use]
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    /// Returns the number of operations in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if the batch holds no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_batch_is_empty() {
        let batch = WriteBatch::new();
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn ops_preserve_insertion_order() {
        let mut batch = WriteBatch::new();
        batch.delete("a");
        batch.set("a", vec![1]);
        batch.set("b", vec![2]);

        assert_eq!(batch.len(), 3);
        assert!(matches!(&batch.ops()[0], WriteOp::Delete { key } if key == "a"));
        assert!(matches!(&batch.ops()[1], WriteOp::Set { key, .. } if key == "a"));
        assert!(matches!(&batch.ops()[2], WriteOp::Set { key, .. } if key == "b"));
    }

    #[test]
    fn into_ops_consumes() {
        let mut batch = WriteBatch::new();
        batch.set("k", vec![9]);
        let ops = batch.into_ops();
        assert_eq!(ops.len(), 1);
    }
}
