// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Collection registry.
//!
//! Binds the four logical collections to handles on one shared document
//! store. Handles are cheap to clone and every repository holds its own.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::warn;
use vitagita_store::{Document, DocumentStore, StoreError};

use crate::error::{RepositoryError, Result};
use crate::record::{to_record, Record};

/// The closed set of collections this layer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionName {
    Users,
    Shloks,
    Videos,
    Analytics,
}

impl CollectionName {
    /// Every collection, in registry order.
    pub const ALL: [CollectionName; 4] = [
        CollectionName::Users,
        CollectionName::Shloks,
        CollectionName::Videos,
        CollectionName::Analytics,
    ];

    /// Literal name of the collection in the document store.
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionName::Users => "users",
            CollectionName::Shloks => "shloks",
            CollectionName::Videos => "videos",
            CollectionName::Analytics => "analytics",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One collection of the shared store.
#[derive(Clone)]
pub struct CollectionHandle {
    name: CollectionName,
    store: Arc<dyn DocumentStore>,
}

impl fmt::Debug for CollectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionHandle")
            .field("name", &self.name)
            .field("store", &self.store.name())
            .finish()
    }
}

impl CollectionHandle {
    /// Which collection this handle addresses.
    pub fn name(&self) -> CollectionName {
        self.name
    }

    /// The store shared by every handle of the registry.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Fetch the raw document at `key`.
    pub async fn get(&self, key: &str) -> Result<Option<Document>> {
        Ok(self.store.get(self.name.as_str(), key).await?)
    }

    /// Fetch `key` decoded as a [`Record`].
    pub async fn get_record<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Record<T>>> {
        match self.get(key).await? {
            Some(doc) => Ok(Some(to_record(self.name.as_str(), key.to_string(), doc)?)),
            None => Ok(None),
        }
    }

    /// Enumerate the collection as raw `(key, document)` pairs.
    pub async fn list(&self) -> Result<Vec<(String, Document)>> {
        Ok(self.store.list(self.name.as_str()).await?)
    }

    /// Enumerate the collection decoded as [`Record`]s.
    ///
    /// Documents that cannot be decoded as `T` are logged and skipped.
    pub async fn list_records<T: DeserializeOwned>(&self) -> Result<Vec<Record<T>>> {
        let mut records = Vec::new();
        for (key, doc) in self.list().await? {
            match to_record(self.name.as_str(), key, doc) {
                Ok(record) => records.push(record),
                Err(e) => warn!(collection = %self.name, error = %e, "skipping undecodable document"),
            }
        }
        Ok(records)
    }

    /// Write `data` at `key`, replacing any existing document.
    pub async fn set(&self, key: &str, data: Document) -> Result<()> {
        Ok(self.store.set(self.name.as_str(), key, data).await?)
    }

    /// Merge `fields` into the existing document at `key`.
    ///
    /// A missing document is [`RepositoryError::NotFound`]; nothing is created.
    pub async fn update(&self, key: &str, fields: Document) -> Result<()> {
        match self.store.update(self.name.as_str(), key, fields).await {
            Err(StoreError::NotFound { .. }) => Err(RepositoryError::NotFound {
                collection: self.name.to_string(),
                key: key.to_string(),
            }),
            other => Ok(other?),
        }
    }

    /// Remove `key`. Removing an absent document succeeds.
    pub async fn delete(&self, key: &str) -> Result<()> {
        Ok(self.store.delete(self.name.as_str(), key).await?)
    }
}

/// Holds one handle per [`CollectionName`], all over the same store.
#[derive(Clone)]
pub struct CollectionRegistry {
    store: Arc<dyn DocumentStore>,
    handles: [CollectionHandle; 4],
}

impl fmt::Debug for CollectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionRegistry")
            .field("store", &self.store.name())
            .field("collections", &CollectionName::ALL)
            .finish()
    }
}

impl CollectionRegistry {
    /// Bind every [`CollectionName`] to `store`.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let handles = CollectionName::ALL.map(|name| CollectionHandle {
            name,
            store: Arc::clone(&store),
        });
        Self { store, handles }
    }

    /// Handle for `name`. Total over [`CollectionName`].
    pub fn resolve(&self, name: CollectionName) -> CollectionHandle {
        self.handles[name as usize].clone()
    }

    /// The shared store behind every handle.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vitagita_store::InMemoryStore;

    #[test]
    fn test_store_names_are_fixed() {
        let names: Vec<&str> = CollectionName::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, vec!["users", "shloks", "videos", "analytics"]);
        assert_eq!(CollectionName::Shloks.to_string(), "shloks");
    }

    #[test]
    fn test_resolve_is_total_and_ordered() {
        let registry = CollectionRegistry::new(Arc::new(InMemoryStore::new()));
        for name in CollectionName::ALL {
            assert_eq!(registry.resolve(name).name(), name);
        }
    }

    #[tokio::test]
    async fn test_handles_share_one_store() {
        let store = InMemoryStore::new();
        let registry = CollectionRegistry::new(Arc::new(store.clone()));

        let doc = json!({"title": "x"}).as_object().cloned().unwrap();
        registry
            .resolve(CollectionName::Videos)
            .set("v", doc.clone())
            .await
            .unwrap();

        assert_eq!(store.get("videos", "v").await.unwrap(), Some(doc));
        assert!(registry
            .resolve(CollectionName::Shloks)
            .get("v")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_list_records_skips_undecodable_documents() {
        let store = InMemoryStore::new();
        let users = CollectionRegistry::new(Arc::new(store.clone())).resolve(CollectionName::Users);

        let good = json!({"email": "a@b.c"}).as_object().cloned().unwrap();
        let bad = json!({"name": "no email"}).as_object().cloned().unwrap();
        store.set("users", "a@b.c", good).await.unwrap();
        store.set("users", "broken", bad).await.unwrap();

        let records: Vec<Record<crate::record::User>> = users.list_records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "a@b.c");
    }
}
