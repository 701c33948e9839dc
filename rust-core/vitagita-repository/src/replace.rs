// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Whole-collection replacement.
//!
//! A `save` on any repository swaps the entire collection for the given list.
//! When the work fits one batch it is committed as `clear` plus one `set`
//! per record, which the store resolves atomically: concurrent replacements
//! of the same collection end as exactly one of the inputs, never a mix.
//!
//! Lists too large for one batch are written in chunks: stale keys are
//! deleted first, then the new records are set. Each chunk is atomic on its
//! own; readers may observe the collection between chunks.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};
use vitagita_store::{Document, WriteBatch};

use crate::error::{RepositoryError, Result};
use crate::keys::{keyed_last_wins, DeriveKey};
use crate::record::to_document;
use crate::registry::CollectionHandle;

/// How a replacement was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceSummary {
    /// Records written.
    pub written: usize,
    /// Existing records that were not in the new list.
    pub removed: usize,
    /// Batches committed.
    pub batches: usize,
}

impl ReplaceSummary {
    /// True when the whole replacement went through one atomic batch.
    pub fn is_atomic(&self) -> bool {
        self.batches == 1
    }
}

/// Replace the contents of `collection` with `items`, keyed by [`DeriveKey`].
///
/// Duplicate keys collapse to the last occurrence. Every key is validated and
/// every item serialized before the first write.
pub async fn replace_collection<T>(
    collection: &CollectionHandle,
    items: &[T],
) -> Result<ReplaceSummary>
where
    T: DeriveKey + Serialize,
{
    let keyed = keyed_last_wins(items)?;
    let docs = keyed
        .into_iter()
        .map(|(key, item)| Ok((key, to_document(item)?)))
        .collect::<Result<Vec<_>>>()?;
    replace_documents(collection, docs).await
}

/// Replace the contents of `collection` with already-keyed documents.
///
/// Keys in `docs` must be unique.
pub async fn replace_documents(
    collection: &CollectionHandle,
    docs: Vec<(String, Document)>,
) -> Result<ReplaceSummary> {
    let name = collection.name().as_str();
    let max_ops = collection.store().max_batch_ops();

    let incoming: HashSet<&str> = docs.iter().map(|(key, _)| key.as_str()).collect();
    let stale: Vec<String> = collection
        .list()
        .await?
        .into_iter()
        .map(|(key, _)| key)
        .filter(|key| !incoming.contains(key.as_str()))
        .collect();
    drop(incoming);

    let written = docs.len();
    let removed = stale.len();

    // `clear` costs one op here, but stores that expand it into per-document
    // deletes need room for the stale keys as well.
    let single_batch_ops = (written + 1).max(written + removed);
    if single_batch_ops <= max_ops {
        let mut batch = WriteBatch::new();
        batch.clear(name);
        for (key, doc) in docs {
            batch.set(name, &key, doc);
        }
        commit(collection, batch).await?;

        info!(collection = name, written, removed, "replaced collection atomically");
        return Ok(ReplaceSummary {
            written,
            removed,
            batches: 1,
        });
    }

    warn!(
        collection = name,
        written,
        removed,
        max_ops,
        "replacement exceeds one batch, committing in chunks without cross-batch atomicity"
    );

    let mut batches = 0;
    for chunk in stale.chunks(max_ops) {
        let mut batch = WriteBatch::new();
        for key in chunk {
            batch.delete(name, key);
        }
        commit(collection, batch).await?;
        batches += 1;
    }

    let mut docs = docs.into_iter().peekable();
    while docs.peek().is_some() {
        let mut batch = WriteBatch::new();
        for (key, doc) in docs.by_ref().take(max_ops) {
            batch.set(name, &key, doc);
        }
        commit(collection, batch).await?;
        batches += 1;
    }

    info!(collection = name, written, removed, batches, "replaced collection in chunks");
    Ok(ReplaceSummary {
        written,
        removed,
        batches,
    })
}

async fn commit(collection: &CollectionHandle, batch: WriteBatch) -> Result<()> {
    let ops = batch.len();
    collection
        .store()
        .commit(batch)
        .await
        .map_err(|source| RepositoryError::BatchWrite {
            collection: collection.name().to_string(),
            source,
        })?;
    debug!(collection = %collection.name(), ops, "batch committed");
    Ok(())
}
