// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core document-store trait for VitaGita.
//
// Defines the `DocumentStore` trait every backend implements. Documents are
// schemaless JSON objects addressed by collection name plus string key.
// Besides point operations the trait exposes whole-collection enumeration
// and atomic batch commits, which is all the repositories above need.

use async_trait::async_trait;

use crate::batch::WriteBatch;
use crate::error::{Result, StoreError};
use crate::Document;

/// Default ceiling on operations per atomic batch (Firestore's limit).
pub const DEFAULT_MAX_BATCH_OPS: usize = 500;

/// Check that `segment` can name a collection or document in every backend.
///
/// Empty strings, `/`, and the relative segments `.` and `..` are refused
/// with [`StoreError::InvalidKey`]; `what` names the segment in the message.
pub fn validate_segment(what: &str, segment: &str) -> Result<()> {
    if segment.is_empty() || segment.contains('/') || segment == "." || segment == ".." {
        return Err(StoreError::InvalidKey(format!("{what} '{segment}'")));
    }
    Ok(())
}

/// A remote or local schemaless document store.
///
/// Implementations must be safe to share across threads and tokio tasks.
/// Retries, timeouts and credentials are the implementation's business; the
/// caller sees a single attempt per call.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the document at `collection/key`.
    ///
    /// Returns `Ok(None)` if the document does not exist, rather than an error.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>>;

    /// Enumerate every document of `collection` as `(key, body)` pairs.
    ///
    /// Order is backend-defined. An empty or unknown collection yields an
    /// empty vector.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>>;

    /// Write `data` at `collection/key`, replacing any existing document.
    async fn set(&self, collection: &str, key: &str, data: Document) -> Result<()>;

    /// Merge `fields` into the existing document at `collection/key`.
    ///
    /// Top-level fields present in `fields` overwrite, all others are kept.
    /// Fails with [`crate::StoreError::NotFound`] when the document is absent;
    /// an update never creates a document.
    async fn update(&self, collection: &str, key: &str, fields: Document) -> Result<()>;

    /// Delete the document at `collection/key`. Deleting an absent key succeeds.
    async fn delete(&self, collection: &str, key: &str) -> Result<()>;

    /// Apply every operation of `batch` atomically, in order.
    ///
    /// Either all operations are applied or none are. Batches with more than
    /// [`DocumentStore::max_batch_ops`] operations are refused with
    /// [`crate::StoreError::BatchTooLarge`].
    async fn commit(&self, batch: WriteBatch) -> Result<()>;

    /// Maximum operations accepted in one [`DocumentStore::commit`].
    fn max_batch_ops(&self) -> usize {
        DEFAULT_MAX_BATCH_OPS
    }

    /// A human-readable name for this backend, used in logging and metrics.
    fn name(&self) -> &str;

    /// Release connections and other resources. The store must not be used
    /// afterwards.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
