// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Users repository.
//!
//! Users are keyed by email: the email is the document key and there is no
//! separate generated id. `create` is an upsert, so uniqueness is only
//! enforced by the key itself (last write wins between concurrent creates).

use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{RepositoryError, Result};
use crate::keys::validate_key;
use crate::record::{to_document, timestamp_now, Fields, Record, User};
use crate::registry::CollectionHandle;
use crate::replace::{replace_collection, ReplaceSummary};

/// Field stamped on every update.
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// CRUD access to the `users` collection.
#[derive(Debug, Clone)]
pub struct UsersRepository {
    collection: CollectionHandle,
}

impl UsersRepository {
    /// Wrap the handle for the `users` collection.
    pub fn new(collection: CollectionHandle) -> Self {
        Self { collection }
    }

    /// Every stored user, in store-defined order.
    pub async fn get_all(&self) -> Result<Vec<Record<User>>> {
        self.collection.list_records().await
    }

    /// Replace the whole collection with `users`, keyed by email.
    ///
    /// Duplicate emails collapse to the last occurrence.
    #[instrument(skip(self, users), fields(count = users.len()))]
    pub async fn save(&self, users: &[User]) -> Result<ReplaceSummary> {
        replace_collection(&self.collection, users).await
    }

    /// Point lookup. `Ok(None)` when no user has this email.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Record<User>>> {
        if validate_key(email).is_err() {
            return Ok(None);
        }
        self.collection.get_record(email).await
    }

    /// Store `user` at its email, overwriting any existing record.
    pub async fn create(&self, user: User) -> Result<Record<User>> {
        validate_key(&user.email)?;
        let doc = to_document(&user)?;
        self.collection.set(&user.email, doc).await?;
        debug!(email = %user.email, "user stored");
        Ok(Record {
            id: user.email.clone(),
            data: user,
        })
    }

    /// Merge `updates` into the user at `email` and stamp `updatedAt`.
    ///
    /// Fails with [`RepositoryError::NotFound`] if the user does not exist,
    /// and with [`RepositoryError::InvalidRecord`] if `updates` tries to move
    /// the user to a different email.
    pub async fn update(&self, email: &str, mut updates: Fields) -> Result<()> {
        if validate_key(email).is_err() {
            return Err(RepositoryError::NotFound {
                collection: self.collection.name().to_string(),
                key: email.to_string(),
            });
        }
        match updates.get("email") {
            Some(Value::String(new_email)) if new_email == email => {}
            Some(other) => {
                return Err(RepositoryError::InvalidRecord(format!(
                    "cannot change email of {email} to {other}"
                )));
            }
            None => {}
        }

        updates.insert(UPDATED_AT_FIELD.to_string(), Value::String(timestamp_now()));
        self.collection.update(email, updates).await?;
        debug!(email, "user updated");
        Ok(())
    }

    /// Remove the user at `email`. Removing an unknown email succeeds.
    pub async fn delete(&self, email: &str) -> Result<()> {
        if validate_key(email).is_err() {
            return Ok(());
        }
        self.collection.delete(email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CollectionName, CollectionRegistry};
    use serde_json::json;
    use std::sync::Arc;
    use vitagita_store::InMemoryStore;

    fn repo() -> UsersRepository {
        let registry = CollectionRegistry::new(Arc::new(InMemoryStore::new()));
        UsersRepository::new(registry.resolve(CollectionName::Users))
    }

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_then_find() {
        let users = repo();
        let user = User::new("arjuna@kurukshetra.in").with_field("name", "Arjuna");

        let created = users.create(user.clone()).await.unwrap();
        assert_eq!(created.id, "arjuna@kurukshetra.in");

        let found = users.find_by_email("arjuna@kurukshetra.in").await.unwrap().unwrap();
        assert_eq!(found, Record { id: user.email.clone(), data: user });
    }

    #[tokio::test]
    async fn test_create_overwrites_silently() {
        let users = repo();
        users.create(User::new("a@b.c").with_field("v", 1)).await.unwrap();
        users.create(User::new("a@b.c").with_field("w", 2)).await.unwrap();

        let all = users.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].data.profile.get("v").is_none());
        assert_eq!(all[0].data.profile.get("w"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_email() {
        let err = repo().create(User::new("")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidRecord(_)));
    }

    #[tokio::test]
    async fn test_find_missing_is_none() {
        let users = repo();
        assert!(users.find_by_email("nobody@nowhere").await.unwrap().is_none());
        assert!(users.find_by_email("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_merges_and_stamps() {
        let users = repo();
        users
            .create(User::new("a@b.c").with_field("name", "A").with_field("age", 20))
            .await
            .unwrap();

        let before = timestamp_now();
        users.update("a@b.c", fields(json!({"age": 21}))).await.unwrap();

        let user = users.find_by_email("a@b.c").await.unwrap().unwrap().data;
        assert_eq!(user.profile.get("name"), Some(&json!("A")));
        assert_eq!(user.profile.get("age"), Some(&json!(21)));
        let stamped = user.updated_at.unwrap();
        // Same fixed-width ISO-8601 format, so lexical order is time order.
        assert!(stamped >= before);
    }

    #[tokio::test]
    async fn test_update_missing_user_fails() {
        let err = repo()
            .update("ghost@b.c", fields(json!({"x": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { ref key, .. } if key == "ghost@b.c"));
    }

    #[tokio::test]
    async fn test_update_cannot_move_email() {
        let users = repo();
        users.create(User::new("a@b.c")).await.unwrap();

        let err = users
            .update("a@b.c", fields(json!({"email": "z@b.c"})))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::InvalidRecord(_)));

        // Restating the same email is harmless.
        users
            .update("a@b.c", fields(json!({"email": "a@b.c"})))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_relative_segment_emails_are_absent() {
        let users = repo();
        for email in [".", ".."] {
            assert!(users.find_by_email(email).await.unwrap().is_none());
            users.delete(email).await.unwrap();
            assert!(matches!(
                users.update(email, Fields::new()).await,
                Err(RepositoryError::NotFound { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_update_keeps_caller_id_attribute() {
        let users = repo();
        users.create(User::new("a@b.c")).await.unwrap();
        users
            .update("a@b.c", fields(json!({"id": "legacy-7"})))
            .await
            .unwrap();

        let found = users.find_by_email("a@b.c").await.unwrap().unwrap();
        assert_eq!(found.id, "a@b.c");
        assert_eq!(found.data.profile.get("id"), Some(&json!("legacy-7")));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let users = repo();
        users.create(User::new("a@b.c")).await.unwrap();
        users.delete("a@b.c").await.unwrap();
        users.delete("a@b.c").await.unwrap();
        assert!(users.find_by_email("a@b.c").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_everything() {
        let users = repo();
        users.create(User::new("old@b.c")).await.unwrap();

        users
            .save(&[User::new("x@b.c"), User::new("y@b.c")])
            .await
            .unwrap();

        let mut emails: Vec<String> = users
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect();
        emails.sort();
        assert_eq!(emails, vec!["x@b.c", "y@b.c"]);
    }
}
