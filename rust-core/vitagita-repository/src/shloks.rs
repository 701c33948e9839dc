// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Shloks (verses) repository.
//!
//! The collection is only ever replaced wholesale. Keys are `shlok_<n>` by
//! input position, reassigned from zero on every save.

use tracing::instrument;

use crate::error::Result;
use crate::record::{Record, Shlok};
use crate::registry::CollectionHandle;
use crate::replace::{replace_collection, ReplaceSummary};

/// Bulk access to the `shloks` collection.
#[derive(Debug, Clone)]
pub struct ShloksRepository {
    collection: CollectionHandle,
}

impl ShloksRepository {
    /// Wrap the handle for this repository's collection.
    pub fn new(collection: CollectionHandle) -> Self {
        Self { collection }
    }

    /// Every stored verse, in store-defined order.
    pub async fn get_all(&self) -> Result<Vec<Record<Shlok>>> {
        self.collection.list_records().await
    }

    /// Replace all verses with `shloks`, keyed by position.
    #[instrument(skip(self, shloks), fields(count = shloks.len()))]
    pub async fn save(&self, shloks: &[Shlok]) -> Result<ReplaceSummary> {
        replace_collection(&self.collection, shloks).await
    }
}
