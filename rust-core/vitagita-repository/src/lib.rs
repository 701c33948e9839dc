// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! VitaGita data access layer.
//!
//! Four repositories (users, shloks, videos, analytics) over one shared
//! [`DocumentStore`](vitagita_store::DocumentStore). Users are keyed by
//! email, shloks and videos are replaced wholesale on every save, and
//! analytics is a single snapshot document.
//!
//! ```
//! use std::sync::Arc;
//! use vitagita_repository::{Database, User};
//! use vitagita_store::InMemoryStore;
//!
//! # tokio_test::block_on(async {
//! let db = Database::connect(Arc::new(InMemoryStore::new())).await.unwrap();
//!
//! db.users().create(User::new("arjuna@kurukshetra.in")).await.unwrap();
//! let found = db.users().find_by_email("arjuna@kurukshetra.in").await.unwrap();
//! assert!(found.is_some());
//!
//! let stats = db.analytics().get().await.unwrap();
//! assert_eq!(stats.total_users, 0);
//! # });
//! ```

pub mod analytics;
pub mod bootstrap;
pub mod config;
pub mod database;
pub mod error;
pub mod keys;
pub mod record;
pub mod registry;
pub mod replace;
pub mod shloks;
pub mod users;
pub mod videos;

pub use analytics::{AnalyticsRepository, STATS_KEY};
pub use bootstrap::{generate_id, initialize_default_admin};
pub use config::{AdminConfig, AppConfig, StoreBackend};
pub use database::Database;
pub use error::{RepositoryError, Result};
pub use keys::DeriveKey;
pub use record::{timestamp_now, AnalyticsSnapshot, Fields, Record, Shlok, User, Video};
pub use registry::{CollectionHandle, CollectionName, CollectionRegistry};
pub use replace::ReplaceSummary;
pub use shloks::ShloksRepository;
pub use users::UsersRepository;
pub use videos::VideosRepository;
