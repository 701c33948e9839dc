// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Analytics repository.
//!
//! A deployment holds exactly one snapshot, stored at the fixed key
//! [`STATS_KEY`]. Reading a missing snapshot yields a zeroed default without
//! writing it; saving always overwrites the whole record.

use tracing::debug;

use crate::error::Result;
use crate::record::{from_document, timestamp_now, to_document, AnalyticsSnapshot};
use crate::registry::CollectionHandle;

/// Key of the single analytics document.
pub const STATS_KEY: &str = "stats";

/// Access to the single snapshot in the `analytics` collection.
#[derive(Debug, Clone)]
pub struct AnalyticsRepository {
    collection: CollectionHandle,
}

impl AnalyticsRepository {
    /// Wrap the handle for this repository's collection.
    pub fn new(collection: CollectionHandle) -> Self {
        Self { collection }
    }

    /// The stored snapshot, or [`AnalyticsSnapshot::zeroed`] if none exists.
    pub async fn get(&self) -> Result<AnalyticsSnapshot> {
        match self.collection.get(STATS_KEY).await? {
            Some(doc) => from_document(self.collection.name().as_str(), STATS_KEY, doc),
            None => {
                debug!("no analytics snapshot stored, using zeroed default");
                Ok(AnalyticsSnapshot::zeroed())
            }
        }
    }

    /// Overwrite the snapshot with `snapshot`, stamping `lastUpdated` now.
    ///
    /// Returns the snapshot as stored.
    pub async fn save(&self, snapshot: &AnalyticsSnapshot) -> Result<AnalyticsSnapshot> {
        let stored = AnalyticsSnapshot {
            last_updated: timestamp_now(),
            ..snapshot.clone()
        };
        self.collection.set(STATS_KEY, to_document(&stored)?).await?;
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CollectionName, CollectionRegistry};
    use serde_json::json;
    use std::sync::Arc;
    use vitagita_store::InMemoryStore;

    fn setup() -> (InMemoryStore, AnalyticsRepository) {
        let store = InMemoryStore::new();
        let registry = CollectionRegistry::new(Arc::new(store.clone()));
        (store, AnalyticsRepository::new(registry.resolve(CollectionName::Analytics)))
    }

    #[tokio::test]
    async fn test_missing_snapshot_reads_zeroed_without_writing() {
        let (store, analytics) = setup();

        let snapshot = analytics.get().await.unwrap();
        assert_eq!(snapshot.total_users, 0);
        assert_eq!(snapshot.new_users_today, 0);
        assert!(!snapshot.last_updated.is_empty());

        assert!(store.is_empty("analytics").await);
    }

    #[tokio::test]
    async fn test_save_overwrites_and_restamps() {
        let (_store, analytics) = setup();

        let mut first = AnalyticsSnapshot::zeroed();
        first.total_users = 10;
        first.extra.insert("peakHour".into(), json!(21));
        analytics.save(&first).await.unwrap();

        let mut second = AnalyticsSnapshot::zeroed();
        second.total_shloks = 700;
        second.last_updated = "1999-01-01T00:00:00.000Z".to_string();
        let stored = analytics.save(&second).await.unwrap();

        let read = analytics.get().await.unwrap();
        assert_eq!(read, stored);
        // Full replace: nothing from the first save survives.
        assert_eq!(read.total_users, 0);
        assert!(read.extra.is_empty());
        assert_eq!(read.total_shloks, 700);
        assert!(read.last_updated.as_str() > "1999-01-01T00:00:00.000Z");
    }
}
