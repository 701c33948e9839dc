// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Videos repository.
//!
//! Replaced wholesale like shloks. A video's explicit `key` gives it a
//! stable document key across saves; videos without one fall back to
//! `video_<n>` by position. Two videos sharing a key: last write wins
//! within the batch.

use tracing::instrument;

use crate::error::Result;
use crate::record::{Record, Video};
use crate::registry::CollectionHandle;
use crate::replace::{replace_collection, ReplaceSummary};

/// Bulk access to the `videos` collection.
#[derive(Debug, Clone)]
pub struct VideosRepository {
    collection: CollectionHandle,
}

impl VideosRepository {
    /// Wrap the handle for this repository's collection.
    pub fn new(collection: CollectionHandle) -> Self {
        Self { collection }
    }

    /// Every stored video, in store-defined order.
    pub async fn get_all(&self) -> Result<Vec<Record<Video>>> {
        self.collection.list_records().await
    }

    /// Replace all videos with `videos`.
    #[instrument(skip(self, videos), fields(count = videos.len()))]
    pub async fn save(&self, videos: &[Video]) -> Result<ReplaceSummary> {
        replace_collection(&self.collection, videos).await
    }
}
