// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Database handle: one connected store and the four repositories over it.

use std::sync::Arc;

use tracing::{info, instrument};
use vitagita_store::DocumentStore;

use crate::analytics::{AnalyticsRepository, STATS_KEY};
use crate::error::{RepositoryError, Result};
use crate::registry::{CollectionName, CollectionRegistry};
use crate::shloks::ShloksRepository;
use crate::users::UsersRepository;
use crate::videos::VideosRepository;

/// Entry point for application code.
///
/// Built with [`Database::connect`], which verifies the store answers before
/// handing out repositories.
#[derive(Debug, Clone)]
pub struct Database {
    registry: CollectionRegistry,
    users: UsersRepository,
    shloks: ShloksRepository,
    videos: VideosRepository,
    analytics: AnalyticsRepository,
}

impl Database {
    /// Check `store` answers a read and wire up the repositories.
    ///
    /// A store that cannot be read fails with
    /// [`RepositoryError::Connection`]; the process should not continue.
    #[instrument(skip(store), fields(backend = store.name()))]
    pub async fn connect(store: Arc<dyn DocumentStore>) -> Result<Self> {
        store
            .get(CollectionName::Analytics.as_str(), STATS_KEY)
            .await
            .map_err(|source| RepositoryError::Connection {
                backend: store.name().to_string(),
                source,
            })?;
        info!(backend = store.name(), "document store connected");

        let registry = CollectionRegistry::new(store);
        Ok(Self {
            users: UsersRepository::new(registry.resolve(CollectionName::Users)),
            shloks: ShloksRepository::new(registry.resolve(CollectionName::Shloks)),
            videos: VideosRepository::new(registry.resolve(CollectionName::Videos)),
            analytics: AnalyticsRepository::new(registry.resolve(CollectionName::Analytics)),
            registry,
        })
    }

    /// Users, keyed by email.
    pub fn users(&self) -> &UsersRepository {
        &self.users
    }

    /// Verses, replaced wholesale on save.
    pub fn shloks(&self) -> &ShloksRepository {
        &self.shloks
    }

    /// Videos, replaced wholesale on save.
    pub fn videos(&self) -> &VideosRepository {
        &self.videos
    }

    /// The single analytics snapshot.
    pub fn analytics(&self) -> &AnalyticsRepository {
        &self.analytics
    }

    /// The collection registry behind every repository.
    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    /// Release the store.
    pub async fn close(self) -> Result<()> {
        let store = Arc::clone(self.registry.store());
        store.close().await?;
        info!(backend = store.name(), "document store closed");
        Ok(())
    }
}
