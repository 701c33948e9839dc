// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Document key derivation.
//!
//! Every bulk-saved entity gets its key from a pure function of the item and
//! its position in the input list. Ordinal keys (`shlok_<n>`, `video_<n>`)
//! are therefore only stable within a single `save` call.

use std::collections::HashMap;

use vitagita_store::validate_segment;

use crate::error::{RepositoryError, Result};
use crate::record::{Shlok, User, Video};

/// Key derivation for entities saved in bulk.
pub trait DeriveKey {
    /// Key for this item at position `index` of the list being saved.
    fn derive_key(&self, index: usize) -> String;
}

impl DeriveKey for User {
    fn derive_key(&self, _index: usize) -> String {
        self.email.clone()
    }
}

impl DeriveKey for Shlok {
    fn derive_key(&self, index: usize) -> String {
        format!("shlok_{index}")
    }
}

impl DeriveKey for Video {
    fn derive_key(&self, index: usize) -> String {
        match self.key.as_deref() {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => format!("video_{index}"),
        }
    }
}

/// Check that `key` can address a document in any store backend.
pub fn validate_key(key: &str) -> Result<()> {
    validate_segment("document key", key)
        .map_err(|e| RepositoryError::InvalidRecord(e.to_string()))
}

/// Derive keys for `items`, collapsing duplicates.
///
/// When two items share a key the later one wins and takes the position of
/// its last occurrence. Fails before anything is written if any key is
/// unusable.
pub fn keyed_last_wins<T: DeriveKey>(items: &[T]) -> Result<Vec<(String, &T)>> {
    let keys = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let key = item.derive_key(index);
            validate_key(&key)?;
            Ok(key)
        })
        .collect::<Result<Vec<_>>>()?;

    let last_seen: HashMap<&str, usize> = keys
        .iter()
        .enumerate()
        .map(|(index, key)| (key.as_str(), index))
        .collect();

    Ok(keys
        .iter()
        .zip(items)
        .enumerate()
        .filter(|(index, (key, _))| last_seen[key.as_str()] == *index)
        .map(|(_, (key, item))| (key.clone(), item))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shlok_keys_are_ordinal() {
        let shlok = Shlok::default();
        assert_eq!(shlok.derive_key(0), "shlok_0");
        assert_eq!(shlok.derive_key(17), "shlok_17");
    }

    #[test]
    fn test_video_key_prefers_explicit_key() {
        assert_eq!(Video::keyed("intro").derive_key(4), "intro");
        assert_eq!(Video::default().derive_key(4), "video_4");
        // An empty explicit key falls back like a missing one.
        assert_eq!(Video::keyed("").derive_key(2), "video_2");
    }

    #[test]
    fn test_user_key_is_email() {
        assert_eq!(User::new("a@b.c").derive_key(9), "a@b.c");
    }

    #[test]
    fn test_last_occurrence_wins_at_its_position() {
        let videos = vec![
            Video::keyed("a").with_field("n", 1),
            Video::keyed("b").with_field("n", 2),
            Video::keyed("a").with_field("n", 3),
        ];
        let keyed = keyed_last_wins(&videos).unwrap();
        let summary: Vec<(&str, &serde_json::Value)> = keyed
            .iter()
            .map(|(key, video)| (key.as_str(), &video.fields["n"]))
            .collect();
        assert_eq!(
            summary,
            vec![("b", &serde_json::json!(2)), ("a", &serde_json::json!(3))]
        );
    }

    #[test]
    fn test_mixed_explicit_and_ordinal_video_keys() {
        let videos = vec![Video::default(), Video::keyed("x"), Video::default()];
        let keys: Vec<String> = keyed_last_wins(&videos)
            .unwrap()
            .into_iter()
            .map(|(key, _)| key)
            .collect();
        assert_eq!(keys, vec!["video_0", "x", "video_2"]);
    }

    #[test]
    fn test_unusable_keys_are_rejected() {
        assert!(keyed_last_wins(&[User::new("")]).is_err());
        assert!(keyed_last_wins(&[Video::keyed("a/b")]).is_err());
        assert!(keyed_last_wins(&[Video::keyed(".")]).is_err());
        assert!(keyed_last_wins(&[User::new("..")]).is_err());
        assert!(keyed_last_wins::<Shlok>(&[]).unwrap().is_empty());
    }
}
