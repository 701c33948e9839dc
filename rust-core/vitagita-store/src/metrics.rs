// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Metrics-collecting wrapper for VitaGita document stores.
//
// Wraps any `DocumentStore` and transparently counts reads, writes and batch
// commits, along with read/commit latency and document volume. The
// `vitagita-db` binary logs these on shutdown.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::DocumentStore;
use crate::batch::WriteBatch;
use crate::error::Result;
use crate::Document;

/// Accumulated statistics for a document store.
///
/// All counters are monotonically increasing for the lifetime of the
/// [`MetricsStore`] that owns them, until [`MetricsStore::reset_stats`].
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    /// Number of `get` calls.
    pub get_count: u64,
    /// Number of `list` calls.
    pub list_count: u64,
    /// Number of `set` and `update` calls.
    pub write_count: u64,
    /// Number of `delete` calls.
    pub delete_count: u64,
    /// Number of successful batch commits.
    pub commit_count: u64,
    /// Number of failed batch commits.
    pub failed_commit_count: u64,
    /// Operations carried by successful batch commits.
    pub committed_ops: u64,
    /// Documents returned by `get` and `list`.
    pub documents_read: u64,
    /// Cumulative wall-clock latency of `get` and `list`, in milliseconds.
    pub read_latency_sum_ms: f64,
    /// Cumulative wall-clock latency of `commit`, in milliseconds.
    pub commit_latency_sum_ms: f64,
}

/// A document store wrapper that collects operation metrics.
///
/// Delegates every operation to an inner store while measuring latency and
/// counting invocations.
///
/// # Example
///
/// ```rust
/// use vitagita_store::memory::InMemoryStore;
/// use vitagita_store::metrics::MetricsStore;
/// use vitagita_store::backend::DocumentStore;
///
/// # tokio_test::block_on(async {
/// let metered = MetricsStore::new(InMemoryStore::new());
///
/// metered.set("users", "a@b.c", Default::default()).await.unwrap();
/// metered.get("users", "a@b.c").await.unwrap();
///
/// let stats = metered.stats().await;
/// assert_eq!(stats.write_count, 1);
/// assert_eq!(stats.get_count, 1);
/// # });
/// ```
pub struct MetricsStore<S: DocumentStore> {
    /// The wrapped store that performs the actual operations.
    inner: S,
    /// Shared, mutable statistics accumulator.
    stats: Arc<RwLock<StoreStats>>,
}

impl<S: DocumentStore> MetricsStore<S> {
    /// Wrap `inner` with metrics collection.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            stats: Arc::new(RwLock::new(StoreStats::default())),
        }
    }

    /// Return a snapshot of the current statistics.
    pub async fn stats(&self) -> StoreStats {
        self.stats.read().await.clone()
    }

    /// Reset all statistics to zero.
    pub async fn reset_stats(&self) {
        let mut s = self.stats.write().await;
        *s = StoreStats::default();
    }

    /// Return a reference to the inner store.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for MetricsStore<S> {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let start = Instant::now();
        let result = self.inner.get(collection, key).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut s = self.stats.write().await;
        s.get_count += 1;
        s.read_latency_sum_ms += elapsed_ms;
        if let Ok(Some(_)) = result {
            s.documents_read += 1;
        }

        result
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>> {
        let start = Instant::now();
        let result = self.inner.list(collection).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut s = self.stats.write().await;
        s.list_count += 1;
        s.read_latency_sum_ms += elapsed_ms;
        if let Ok(ref docs) = result {
            s.documents_read += docs.len() as u64;
        }

        result
    }

    async fn set(&self, collection: &str, key: &str, data: Document) -> Result<()> {
        self.stats.write().await.write_count += 1;
        self.inner.set(collection, key, data).await
    }

    async fn update(&self, collection: &str, key: &str, fields: Document) -> Result<()> {
        self.stats.write().await.write_count += 1;
        self.inner.update(collection, key, fields).await
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<()> {
        self.stats.write().await.delete_count += 1;
        self.inner.delete(collection, key).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let ops = batch.len() as u64;
        let start = Instant::now();
        let result = self.inner.commit(batch).await;
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

        let mut s = self.stats.write().await;
        s.commit_latency_sum_ms += elapsed_ms;
        if result.is_ok() {
            s.commit_count += 1;
            s.committed_ops += ops;
        } else {
            s.failed_commit_count += 1;
        }

        result
    }

    fn max_batch_ops(&self) -> usize {
        self.inner.max_batch_ops()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;

    #[tokio::test]
    async fn test_reads_increment_counts() {
        let metered = MetricsStore::new(InMemoryStore::new());

        metered.set("c", "a", Document::new()).await.unwrap();
        metered.set("c", "b", Document::new()).await.unwrap();
        metered.get("c", "a").await.unwrap();
        metered.get("c", "missing").await.unwrap();
        metered.list("c").await.unwrap();

        let stats = metered.stats().await;
        assert_eq!(stats.get_count, 2);
        assert_eq!(stats.list_count, 1);
        assert_eq!(stats.write_count, 2);
        // One hit from get, two documents from list.
        assert_eq!(stats.documents_read, 3);
    }

    #[tokio::test]
    async fn test_commit_counts_ops_and_failures() {
        let metered = MetricsStore::new(InMemoryStore::with_max_batch_ops(2));

        let mut ok = WriteBatch::new();
        ok.clear("c").set("c", "a", Document::new());
        metered.commit(ok).await.unwrap();

        let mut too_big = WriteBatch::new();
        too_big
            .set("c", "1", Document::new())
            .set("c", "2", Document::new())
            .set("c", "3", Document::new());
        assert!(metered.commit(too_big).await.is_err());

        let stats = metered.stats().await;
        assert_eq!(stats.commit_count, 1);
        assert_eq!(stats.committed_ops, 2);
        assert_eq!(stats.failed_commit_count, 1);
        assert!(stats.commit_latency_sum_ms >= 0.0);
    }

    #[tokio::test]
    async fn test_update_and_delete_counts() {
        let metered = MetricsStore::new(InMemoryStore::new());
        metered.set("c", "a", Document::new()).await.unwrap();
        metered.update("c", "a", Document::new()).await.unwrap();
        metered.delete("c", "a").await.unwrap();
        metered.delete("c", "a").await.unwrap();

        let stats = metered.stats().await;
        assert_eq!(stats.write_count, 2);
        assert_eq!(stats.delete_count, 2);
    }

    #[tokio::test]
    async fn test_reset_stats() {
        let metered = MetricsStore::new(InMemoryStore::new());
        metered.get("c", "a").await.unwrap();
        metered.reset_stats().await;

        let stats = metered.stats().await;
        assert_eq!(stats.get_count, 0);
        assert_eq!(stats.documents_read, 0);
    }

    #[tokio::test]
    async fn test_delegates_name_and_limit() {
        let metered = MetricsStore::new(InMemoryStore::with_max_batch_ops(7));
        assert_eq!(metered.name(), "in-memory");
        assert_eq!(metered.max_batch_ops(), 7);
        assert_eq!(metered.inner().name(), "in-memory");
    }
}
