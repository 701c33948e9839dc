// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! VitaGita database check binary
//!
//! Connects to the configured document store, reports the default admin,
//! logs collection sizes and the analytics snapshot, then closes.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use vitagita_repository::{initialize_default_admin, AppConfig, Database, StoreBackend};
use vitagita_store::{DocumentStore, FirestoreStore, InMemoryStore, MetricsStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("reading configuration")?;
    info!(backend = ?config.backend, "starting vitagita-db");

    match config.backend {
        StoreBackend::Memory => run(MetricsStore::new(InMemoryStore::new()), &config).await,
        StoreBackend::Firestore => {
            let store = FirestoreStore::connect(config.firestore.clone())
                .context("building Firestore client")?;
            run(MetricsStore::new(store), &config).await
        }
    }
}

async fn run<S>(store: MetricsStore<S>, config: &AppConfig) -> anyhow::Result<()>
where
    S: DocumentStore + 'static,
{
    let store = Arc::new(store);
    let db = Database::connect(store.clone())
        .await
        .context("connecting to document store")?;

    initialize_default_admin(&config.admin);

    let users = db.users().get_all().await.context("listing users")?;
    let shloks = db.shloks().get_all().await.context("listing shloks")?;
    let videos = db.videos().get_all().await.context("listing videos")?;
    info!(
        users = users.len(),
        shloks = shloks.len(),
        videos = videos.len(),
        "collection sizes"
    );

    let snapshot = db.analytics().get().await.context("reading analytics")?;
    info!(
        total_users = snapshot.total_users,
        total_shloks = snapshot.total_shloks,
        total_videos = snapshot.total_videos,
        new_users_today = snapshot.new_users_today,
        last_updated = %snapshot.last_updated,
        "analytics snapshot"
    );

    let stats = store.stats().await;
    info!(
        gets = stats.get_count,
        lists = stats.list_count,
        documents_read = stats.documents_read,
        read_latency_ms = stats.read_latency_sum_ms,
        "store statistics"
    );

    db.close().await.context("closing document store")?;
    Ok(())
}
