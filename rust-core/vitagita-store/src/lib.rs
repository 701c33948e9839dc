// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// VitaGita Document Store Boundary
//
// This crate defines the contract between the VitaGita repositories and the
// schemaless document store they persist to. The `DocumentStore` trait is
// the whole surface the repositories rely on: point reads and writes,
// whole-collection enumeration, and atomic write batches.
//
// # Modules
//
// - [`backend`] -- The `DocumentStore` trait.
// - [`batch`] -- `WriteBatch`, the all-or-nothing group of writes.
// - [`error`] -- The `StoreError` enum covering all backend failure modes.
// - [`memory`] -- An in-memory backend for tests and ephemeral deployments.
// - [`firestore`] -- A Cloud Firestore backend over the REST API.
// - [`metrics`] -- A transparent wrapper that collects operation statistics.
//
// # Example
//
// ```rust
// use vitagita_store::backend::DocumentStore;
// use vitagita_store::batch::WriteBatch;
// use vitagita_store::memory::InMemoryStore;
// use vitagita_store::metrics::MetricsStore;
// use serde_json::json;
//
// # tokio_test::block_on(async {
// let store = MetricsStore::new(InMemoryStore::new());
//
// let mut batch = WriteBatch::new();
// batch
//     .clear("videos")
//     .set("videos", "intro", json!({"title": "Intro"}).as_object().unwrap().clone());
// store.commit(batch).await.unwrap();
//
// let videos = store.list("videos").await.unwrap();
// assert_eq!(videos[0].0, "intro");
// # });
// ```

pub mod backend;
pub mod batch;
pub mod error;
pub mod firestore;
pub mod memory;
pub mod metrics;

/// A schemaless document body: field name to JSON value.
pub type Document = serde_json::Map<String, serde_json::Value>;

// Re-export the most commonly used types at the crate root for convenience.
pub use backend::{validate_segment, DocumentStore, DEFAULT_MAX_BATCH_OPS};
pub use batch::{WriteBatch, WriteOp};
pub use error::{Result, StoreError};
pub use firestore::{FirestoreConfig, FirestoreStore};
pub use memory::InMemoryStore;
pub use metrics::{MetricsStore, StoreStats};
