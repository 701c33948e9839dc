// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Store error types for the VitaGita document-store boundary.
//
// One enum covers every failure a document store may report: missing
// documents, payload (de)serialization, malformed stored data, an
// unreachable backend, oversized batches, requests the store refused, and
// keys the store cannot address.

use thiserror::Error;

/// Errors that can occur when talking to a document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed document does not exist.
    ///
    /// Only merge-updates report this; reads return `Ok(None)` and deletes
    /// are idempotent.
    #[error("document not found: {collection}/{key}")]
    NotFound {
        /// Collection the lookup was issued against.
        collection: String,
        /// Document key within the collection.
        key: String,
    },

    /// Failed to serialize or deserialize a document payload.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store returned data in a shape this layer cannot decode.
    #[error("corrupted data: {0}")]
    CorruptedData(String),

    /// The store could not be reached (connection refused, timeout, DNS).
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A batch carried more operations than the store accepts in one commit.
    #[error("batch too large: {ops} operations (max: {max})")]
    BatchTooLarge {
        /// Number of operations in the rejected batch.
        ops: usize,
        /// Maximum operations the store commits atomically.
        max: usize,
    },

    /// The store answered but refused the request.
    #[error("request rejected ({status}): {message}")]
    Rejected {
        /// Status code reported by the store.
        status: u16,
        /// Human-readable reason from the store.
        message: String,
    },

    /// The collection name or document key cannot be addressed.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

impl StoreError {
    /// Shorthand for a [`StoreError::NotFound`] on `collection/key`.
    pub fn not_found(collection: &str, key: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Crate-level result alias using [`StoreError`].
pub type Result<T> = std::result::Result<T, StoreError>;
