// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Runtime configuration.
//!
//! Read from the environment at startup:
//!
//! | Variable                  | Default              |
//! |---------------------------|----------------------|
//! | `VITAGITA_STORE`          | `firestore`          |
//! | `FIRESTORE_PROJECT_ID`    | `vitagita`           |
//! | `FIRESTORE_DATABASE_ID`   | `(default)`          |
//! | `FIRESTORE_ACCESS_TOKEN`  | unset                |
//! | `FIRESTORE_EMULATOR_HOST` | unset                |
//! | `FIRESTORE_TIMEOUT_SECS`  | `30`                 |
//! | `DEFAULT_ADMIN_EMAIL`     | `admin@gitagita.com` |
//! | `DEFAULT_ADMIN_PASSWORD`  | `Admin@123456`       |

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vitagita_store::FirestoreConfig;

use crate::bootstrap::{DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD};
use crate::error::{RepositoryError, Result};

/// Which document store backs the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store; contents vanish on exit.
    Memory,
    /// Google Cloud Firestore over REST.
    #[default]
    Firestore,
}

impl FromStr for StoreBackend {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            "firestore" => Ok(StoreBackend::Firestore),
            other => Err(RepositoryError::Config(format!(
                "unknown store backend '{other}' (expected memory or firestore)"
            ))),
        }
    }
}

/// Credentials for the default administrator account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminConfig {
    /// `DEFAULT_ADMIN_EMAIL`.
    pub email: String,
    /// `DEFAULT_ADMIN_PASSWORD`. Never serialized.
    #[serde(skip_serializing, default)]
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

/// Everything the process needs to start.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// `VITAGITA_STORE`.
    pub backend: StoreBackend,
    /// The `FIRESTORE_*` settings; ignored by the memory backend.
    pub firestore: FirestoreConfig,
    /// Default administrator credentials.
    pub admin: AdminConfig,
}

impl AppConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = AppConfig::default();

        if let Some(backend) = var("VITAGITA_STORE") {
            config.backend = backend.parse()?;
        }

        if let Some(project_id) = var("FIRESTORE_PROJECT_ID") {
            config.firestore.project_id = project_id;
        }
        if let Some(database_id) = var("FIRESTORE_DATABASE_ID") {
            config.firestore.database_id = database_id;
        }
        config.firestore.access_token = var("FIRESTORE_ACCESS_TOKEN");
        config.firestore.emulator_host = var("FIRESTORE_EMULATOR_HOST");
        if let Some(secs) = var("FIRESTORE_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                RepositoryError::Config(format!("FIRESTORE_TIMEOUT_SECS must be whole seconds, got '{secs}'"))
            })?;
            config.firestore.timeout = Duration::from_secs(secs);
        }

        if let Some(email) = var("DEFAULT_ADMIN_EMAIL") {
            config.admin.email = email;
        }
        if let Some(password) = var("DEFAULT_ADMIN_PASSWORD") {
            config.admin.password = password;
        }

        Ok(config)
    }
}
