// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//! Typed records over schemaless documents.
//!
//! Each entity keeps the fields this layer relies on as typed struct members
//! and carries everything else in an open [`Fields`] map flattened into the
//! same JSON object, so callers may store arbitrary attributes. Bodies are
//! stored exactly as given; the document key is never written into them.
//!
//! Decoding is lenient where the store is: a typed field holding a value of
//! an unexpected shape is kept in the open map instead of failing the read.

use chrono::{SecondsFormat, Utc};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::ser::{self, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vitagita_store::{Document, StoreError};

use crate::error::{RepositoryError, Result};

/// Open attribute map.
pub type Fields = serde_json::Map<String, Value>;

/// Field name carrying the document key when a [`Record`] is serialized.
pub const ID_FIELD: &str = "id";

const EMAIL_FIELD: &str = "email";
const UPDATED_AT_FIELD: &str = "updatedAt";
const VIDEO_KEY_FIELD: &str = "key";

/// A stored entity together with its document key.
///
/// Serializes as one flat object `{"id": key, ..data}`. When the body has an
/// `id` attribute of its own, the body's value is the one emitted; the key
/// stays available in [`Record::id`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Record<T> {
    /// Document key.
    pub id: String,
    /// Entity body.
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> Serialize for Record<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut flat = Fields::new();
        flat.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        match serde_json::to_value(&self.data).map_err(<S::Error as ser::Error>::custom)? {
            Value::Object(body) => flat.extend(body),
            other => {
                return Err(<S::Error as ser::Error>::custom(format!(
                    "record body must be an object, got {other}"
                )))
            }
        }
        flat.serialize(serializer)
    }
}

/// A user profile, keyed by email.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    /// Primary key.
    pub email: String,
    /// Set on every update.
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Any other profile attributes.
    #[serde(flatten)]
    pub profile: Fields,
}

impl User {
    /// A user with only an email and an empty profile.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            updated_at: None,
            profile: Fields::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.profile.insert(name.to_string(), value.into());
        self
    }
}

impl<'de> Deserialize<'de> for User {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut profile = Fields::deserialize(deserializer)?;
        let email = match profile.remove(EMAIL_FIELD) {
            Some(Value::String(email)) => email,
            Some(other) => {
                return Err(de::Error::custom(format!("email must be a string, got {other}")))
            }
            None => return Err(de::Error::missing_field(EMAIL_FIELD)),
        };
        let updated_at = match profile.remove(UPDATED_AT_FIELD) {
            Some(Value::String(stamp)) => Some(stamp),
            Some(Value::Null) | None => None,
            Some(other) => {
                profile.insert(UPDATED_AT_FIELD.to_string(), other);
                None
            }
        };
        Ok(User {
            email,
            updated_at,
            profile,
        })
    }
}

/// A verse. Entirely caller-defined; keyed by position at save time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Shlok {
    #[serde(flatten)]
    pub fields: Fields,
}

impl Shlok {
    /// Builder-style attribute setter.
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }
}

/// A video, keyed by `key` when the caller supplies one.
///
/// A stored `key` that is not a string stays in [`Video::fields`] and the
/// video is treated as unkeyed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Video {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Video {
    /// A video with an explicit document key.
    pub fn keyed(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            fields: Fields::new(),
        }
    }

    /// Builder-style attribute setter.
    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }
}

impl<'de> Deserialize<'de> for Video {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut fields = Fields::deserialize(deserializer)?;
        let key = match fields.remove(VIDEO_KEY_FIELD) {
            Some(Value::String(key)) => Some(key),
            Some(other) => {
                fields.insert(VIDEO_KEY_FIELD.to_string(), other);
                None
            }
            None => None,
        };
        Ok(Video { key, fields })
    }
}

/// Deployment-wide aggregate statistics, stored once under `stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_users: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_shloks: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_videos: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub new_users_today: u64,
    /// ISO-8601, refreshed on every save.
    #[serde(default)]
    pub last_updated: String,
    /// Caller-supplied extras, stored verbatim.
    #[serde(flatten)]
    pub extra: Fields,
}

impl AnalyticsSnapshot {
    /// All counters at zero, stamped with the current time.
    pub fn zeroed() -> Self {
        Self {
            total_users: 0,
            total_shloks: 0,
            total_videos: 0,
            new_users_today: 0,
            last_updated: timestamp_now(),
            extra: Fields::new(),
        }
    }
}

/// Read a counter written by any client: integers, whole doubles such as
/// `12.0`, numeric strings, and `null` (as zero).
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(0),
        Value::Number(n) => {
            if let Some(count) = n.as_u64() {
                return Ok(count);
            }
            match n.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
                _ => Err(de::Error::custom(format!(
                    "expected a non-negative whole count, got {n}"
                ))),
            }
        }
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected a count, got \"{s}\""))),
        other => Err(de::Error::custom(format!("expected a count, got {other}"))),
    }
}

/// Current UTC time as ISO-8601 with millisecond precision, e.g.
/// `2024-05-01T09:30:00.123Z`.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Serialize an entity into a storable document, unchanged.
pub(crate) fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value).map_err(StoreError::from)? {
        Value::Object(doc) => Ok(doc),
        other => Err(RepositoryError::InvalidRecord(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Decode a stored document into an entity.
pub(crate) fn from_document<T: DeserializeOwned>(
    collection: &str,
    key: &str,
    doc: Document,
) -> Result<T> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| {
        StoreError::CorruptedData(format!("{collection}/{key}: {e}")).into()
    })
}

/// Decode a stored document into a [`Record`] carrying its key.
pub(crate) fn to_record<T: DeserializeOwned>(
    collection: &str,
    key: String,
    doc: Document,
) -> Result<Record<T>> {
    let data = from_document(collection, &key, doc)?;
    Ok(Record { id: key, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_user_round_trips_open_profile() {
        let user = User::new("a@b.c")
            .with_field("name", "Arjuna")
            .with_field("role", "admin");
        let doc = to_document(&user).unwrap();
        assert_eq!(
            Value::Object(doc.clone()),
            json!({"email": "a@b.c", "name": "Arjuna", "role": "admin"})
        );

        let back: User = from_document("users", "a@b.c", doc).unwrap();
        assert_eq!(back, user);
    }

    #[test]
    fn test_record_serializes_flat_with_id() {
        let record = Record {
            id: "video_0".to_string(),
            data: Video::default().with_field("title", "Intro"),
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"id": "video_0", "title": "Intro"})
        );
    }

    #[test]
    fn test_body_id_is_stored_and_wins_when_flattened() {
        let shlok = Shlok::default().with_field("id", 47).with_field("text", "dharma");
        let doc = to_document(&shlok).unwrap();
        assert_eq!(doc.get("id"), Some(&json!(47)));

        let record: Record<Shlok> = to_record("shloks", "shlok_0".to_string(), doc).unwrap();
        assert_eq!(record.id, "shlok_0");
        assert_eq!(record.data, shlok);
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"id": 47, "text": "dharma"})
        );
    }

    #[test]
    fn test_user_without_email_is_corrupted() {
        let doc = fields(json!({"name": "nobody"}));
        let err = from_document::<User>("users", "k", doc).unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::Store(StoreError::CorruptedData(_))
        ));
    }

    #[test]
    fn test_non_string_updated_at_stays_in_profile() {
        let doc = fields(json!({"email": "a@b.c", "updatedAt": 1700000000}));
        let user: User = from_document("users", "a@b.c", doc.clone()).unwrap();
        assert!(user.updated_at.is_none());
        assert_eq!(user.profile.get("updatedAt"), Some(&json!(1700000000)));
        assert_eq!(to_document(&user).unwrap(), doc);
    }

    #[test]
    fn test_non_string_video_key_stays_in_fields() {
        let doc = fields(json!({"key": 3, "title": "Intro"}));
        let video: Video = from_document("videos", "video_3", doc.clone()).unwrap();
        assert!(video.key.is_none());
        assert_eq!(video.fields.get("key"), Some(&json!(3)));
        assert_eq!(to_document(&video).unwrap(), doc);

        let keyed: Video = from_document("videos", "intro", fields(json!({"key": "intro"}))).unwrap();
        assert_eq!(keyed.key.as_deref(), Some("intro"));
    }

    #[test]
    fn test_analytics_snapshot_camel_case_and_extras() {
        let doc = fields(json!({
            "totalUsers": 3,
            "totalShloks": 700,
            "lastUpdated": "2024-01-01T00:00:00.000Z",
            "topChapter": 2
        }));
        let snapshot: AnalyticsSnapshot = from_document("analytics", "stats", doc).unwrap();
        assert_eq!(snapshot.total_users, 3);
        assert_eq!(snapshot.total_shloks, 700);
        assert_eq!(snapshot.total_videos, 0);
        assert_eq!(snapshot.extra.get("topChapter"), Some(&json!(2)));
    }

    #[test]
    fn test_analytics_counters_accept_whole_doubles() {
        let doc = fields(json!({
            "totalUsers": 12.0,
            "totalShloks": "700",
            "totalVideos": null,
            "newUsersToday": 4
        }));
        let snapshot: AnalyticsSnapshot = from_document("analytics", "stats", doc).unwrap();
        assert_eq!(
            (snapshot.total_users, snapshot.total_shloks, snapshot.total_videos, snapshot.new_users_today),
            (12, 700, 0, 4)
        );

        for bad in [json!(1.5), json!(-2), json!("many"), json!([1])] {
            let doc = fields(json!({ "totalUsers": bad }));
            assert!(from_document::<AnalyticsSnapshot>("analytics", "stats", doc).is_err());
        }
    }

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp_now();
        assert!(ts.ends_with('Z'));
        assert_eq!(ts.len(), "2024-05-01T09:30:00.123Z".len());
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn test_zeroed_snapshot() {
        let snapshot = AnalyticsSnapshot::zeroed();
        assert_eq!(
            (snapshot.total_users, snapshot.total_shloks, snapshot.total_videos, snapshot.new_users_today),
            (0, 0, 0, 0)
        );
        assert!(!snapshot.last_updated.is_empty());
    }
}
