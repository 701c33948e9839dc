// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Repository error types.
//!
//! Absence on a point lookup is not an error: `find_by_email` returns
//! `Ok(None)`. Everything here is a genuine failure the caller must handle.

use thiserror::Error;
use vitagita_store::StoreError;

/// Errors surfaced by the collection registry and repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The store could not be reached at startup. Fatal: the process
    /// cannot run without it.
    #[error("store connection failed ({backend}): {source}")]
    Connection {
        /// Backend name reported by the store.
        backend: String,
        #[source]
        source: StoreError,
    },

    /// A bulk replacement could not be committed. The failed batch left no
    /// trace; the whole `save` should be retried.
    #[error("batch write to '{collection}' failed: {source}")]
    BatchWrite {
        /// Collection being replaced.
        collection: String,
        #[source]
        source: StoreError,
    },

    /// A merge-update targeted a document that does not exist.
    #[error("{collection}/{key} not found")]
    NotFound {
        /// Collection the update was issued against.
        collection: String,
        /// Missing document key.
        key: String,
    },

    /// A record cannot be stored as given (empty key, key drift, non-object).
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The advisory admin bootstrap failed. Logged, never propagated.
    #[error("admin initialization failed: {0}")]
    AdminInit(String),

    /// Any other store failure on a single-document operation or read.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Crate-level result alias using [`RepositoryError`].
pub type Result<T> = std::result::Result<T, RepositoryError>;
