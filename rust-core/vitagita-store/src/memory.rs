// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory document store for VitaGita.
//
// Collections are `BTreeMap`s keyed by document key, all held in one outer
// map behind a single tokio `RwLock`. A batch commit validates every
// operation and then applies them under one write-lock acquisition, so no
// reader ever observes a half-applied batch. Intended for tests, local
// development and ephemeral deployments.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::{validate_segment, DocumentStore, DEFAULT_MAX_BATCH_OPS};
use crate::batch::{WriteBatch, WriteOp};
use crate::error::{Result, StoreError};
use crate::Document;

type Collections = BTreeMap<String, BTreeMap<String, Document>>;

/// An in-memory document store.
///
/// All data lives in process memory and is lost on drop. Clones share the
/// same underlying data, making it suitable for concurrent tokio tasks.
///
/// # Example
///
/// ```rust
/// use vitagita_store::memory::InMemoryStore;
/// use vitagita_store::backend::DocumentStore;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let store = InMemoryStore::new();
/// let doc = json!({"name": "Arjuna"}).as_object().unwrap().clone();
/// store.set("users", "arjuna@example.com", doc.clone()).await.unwrap();
/// assert_eq!(store.get("users", "arjuna@example.com").await.unwrap(), Some(doc));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    /// Collection name -> (document key -> document body).
    data: Arc<RwLock<Collections>>,
    /// Operations accepted per commit.
    max_batch_ops: usize,
}

impl InMemoryStore {
    /// Create a new, empty store with the default batch limit.
    pub fn new() -> Self {
        Self::with_max_batch_ops(DEFAULT_MAX_BATCH_OPS)
    }

    /// Create a new, empty store accepting at most `max_batch_ops` operations
    /// per commit.
    pub fn with_max_batch_ops(max_batch_ops: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(BTreeMap::new())),
            max_batch_ops: max_batch_ops.max(1),
        }
    }

    /// Number of documents currently held in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.data
            .read()
            .await
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// True if `collection` holds no documents.
    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_path(collection: &str, key: &str) -> Result<()> {
    validate_segment("collection name", collection)?;
    validate_segment(&format!("document key in {collection}"), key)
}

fn validate_op(op: &WriteOp) -> Result<()> {
    match op {
        WriteOp::Set {
            collection, key, ..
        }
        | WriteOp::Delete { collection, key } => validate_path(collection, key),
        WriteOp::Clear { collection } => validate_path(collection, "_"),
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let map = self.data.read().await;
        Ok(map.get(collection).and_then(|docs| docs.get(key)).cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>> {
        let map = self.data.read().await;
        let docs = map
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(key, doc)| (key.clone(), doc.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(docs)
    }

    async fn set(&self, collection: &str, key: &str, data: Document) -> Result<()> {
        validate_path(collection, key)?;
        let mut map = self.data.write().await;
        map.entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), data);
        Ok(())
    }

    async fn update(&self, collection: &str, key: &str, fields: Document) -> Result<()> {
        let mut map = self.data.write().await;
        let doc = map
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(key))
            .ok_or_else(|| StoreError::not_found(collection, key))?;
        for (field, value) in fields {
            doc.insert(field, value);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<()> {
        let mut map = self.data.write().await;
        if let Some(docs) = map.get_mut(collection) {
            docs.remove(key);
        }
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.len() > self.max_batch_ops {
            return Err(StoreError::BatchTooLarge {
                ops: batch.len(),
                max: self.max_batch_ops,
            });
        }
        for op in batch.ops() {
            validate_op(op)?;
        }

        let op_count = batch.len();
        let mut map = self.data.write().await;
        for op in batch.into_ops() {
            match op {
                WriteOp::Set {
                    collection,
                    key,
                    data,
                } => {
                    map.entry(collection).or_default().insert(key, data);
                }
                WriteOp::Delete { collection, key } => {
                    if let Some(docs) = map.get_mut(&collection) {
                        docs.remove(&key);
                    }
                }
                WriteOp::Clear { collection } => {
                    if let Some(docs) = map.get_mut(&collection) {
                        docs.clear();
                    }
                }
            }
        }
        debug!(ops = op_count, "committed in-memory batch");
        Ok(())
    }

    fn max_batch_ops(&self) -> usize {
        self.max_batch_ops
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
