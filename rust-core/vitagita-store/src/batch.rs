// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Atomic write batches.
//
// A `WriteBatch` collects set, delete and clear operations across any number
// of collections. Nothing touches the store until the batch is handed to
// `DocumentStore::commit`, which applies every operation or none of them.

use crate::Document;

/// A single operation queued in a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Replace (or create) the document at `collection/key` with `data`.
    Set {
        /// Target collection.
        collection: String,
        /// Target document key.
        key: String,
        /// Full document body.
        data: Document,
    },
    /// Remove the document at `collection/key`. Absent keys are ignored.
    Delete {
        /// Target collection.
        collection: String,
        /// Target document key.
        key: String,
    },
    /// Remove every document of `collection` that exists at commit time.
    ///
    /// Resolved by the store when the batch commits, so a concurrent writer
    /// cannot slip documents in between the enumeration and the delete.
    Clear {
        /// Target collection.
        collection: String,
    },
}

impl WriteOp {
    /// The collection this operation targets.
    pub fn collection(&self) -> &str {
        match self {
            WriteOp::Set { collection, .. }
            | WriteOp::Delete { collection, .. }
            | WriteOp::Clear { collection } => collection,
        }
    }
}

/// An ordered group of writes committed all-or-nothing.
///
/// Operations apply in insertion order, so a `set` queued after a `clear`
/// of the same collection survives the clear.
///
/// # Example
///
/// ```rust
/// use vitagita_store::batch::WriteBatch;
/// use serde_json::json;
///
/// let mut batch = WriteBatch::new();
/// batch
///     .clear("shloks")
///     .set("shloks", "shlok_0", json!({"text": "..."}).as_object().unwrap().clone())
///     .delete("users", "gone@example.com");
/// assert_eq!(batch.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Create an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a full-document write.
    pub fn set(&mut self, collection: &str, key: &str, data: Document) -> &mut Self {
        self.ops.push(WriteOp::Set {
            collection: collection.to_string(),
            key: key.to_string(),
            data,
        });
        self
    }

    /// Queue a document removal.
    pub fn delete(&mut self, collection: &str, key: &str) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.to_string(),
            key: key.to_string(),
        });
        self
    }

    /// Queue removal of everything currently in `collection`.
    pub fn clear(&mut self, collection: &str) -> &mut Self {
        self.ops.push(WriteOp::Clear {
            collection: collection.to_string(),
        });
        self
    }

    /// Number of queued operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True when nothing has been queued.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Borrow the queued operations in order.
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consume the batch, yielding its operations in order.
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}
