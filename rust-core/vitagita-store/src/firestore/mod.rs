// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Firestore REST backend for VitaGita.
//
// Speaks the public Firestore v1 REST API with `reqwest`. Credentials are
// supplied from outside as an already-minted OAuth bearer token; when an
// emulator host is configured the driver talks plain HTTP without auth, the
// same convention the official SDKs follow for `FIRESTORE_EMULATOR_HOST`.
//
// # Mapping
//
// - `get`    -> `GET    {doc}`            (404 means absent)
// - `list`   -> `GET    {collection}`     (paged by `nextPageToken`)
// - `set`    -> `PATCH  {doc}`            (no mask: full replace, upsert)
// - `update` -> `PATCH  {doc}?updateMask.fieldPaths=..&currentDocument.exists=true`
// - `delete` -> `DELETE {doc}`            (absent documents succeed)
// - `commit` -> `POST   documents:commit`, wrapped in
//   `beginTransaction` when the batch carries a `clear`.

pub mod value;

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::backend::{validate_segment, DocumentStore, DEFAULT_MAX_BATCH_OPS};
use crate::batch::{WriteBatch, WriteOp};
use crate::error::{Result, StoreError};
use crate::Document;

/// Production REST endpoint.
pub const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com/v1/";

/// Documents requested per `list` page.
const LIST_PAGE_SIZE: usize = 300;

/// Connection settings for [`FirestoreStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirestoreConfig {
    /// Google Cloud project id.
    pub project_id: String,
    /// Firestore database id, `(default)` for the default database.
    pub database_id: String,
    /// OAuth bearer token sent with every request.
    #[serde(skip_serializing)]
    pub access_token: Option<String>,
    /// `host:port` of a Firestore emulator. Switches to plain HTTP, no auth.
    pub emulator_host: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Operations accepted per commit.
    pub max_batch_ops: usize,
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            project_id: "vitagita".to_string(),
            database_id: "(default)".to_string(),
            access_token: None,
            emulator_host: None,
            timeout: Duration::from_secs(30),
            max_batch_ops: DEFAULT_MAX_BATCH_OPS,
        }
    }
}

/// A [`DocumentStore`] backed by Cloud Firestore (or its emulator).
pub struct FirestoreStore {
    /// REST root, e.g. `https://firestore.googleapis.com/v1/`.
    base_url: Url,
    /// Underlying `reqwest` HTTP client (connection-pooled, TLS-capable).
    http: reqwest::Client,
    /// Bearer token, absent against the emulator.
    access_token: Option<String>,
    project_id: String,
    database_id: String,
    max_batch_ops: usize,
}

impl std::fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreStore")
            .field("base_url", &self.base_url.as_str())
            .field("project_id", &self.project_id)
            .field("database_id", &self.database_id)
            .field("authenticated", &self.access_token.is_some())
            .finish()
    }
}

/// A document as returned by the REST API.
#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BeginTransactionResponse {
    transaction: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl FirestoreStore {
    /// Build a store from `config`.
    ///
    /// No request is sent; the first call against the store is the first
    /// network round trip.
    pub fn connect(config: FirestoreConfig) -> Result<Self> {
        let (base_url, access_token) = match &config.emulator_host {
            Some(host) => (format!("http://{host}/v1/"), None),
            None => (FIRESTORE_ENDPOINT.to_string(), config.access_token.clone()),
        };
        let base_url = Url::parse(&base_url)
            .map_err(|e| StoreError::BackendUnavailable(format!("invalid endpoint {base_url}: {e}")))?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::BackendUnavailable(format!("http client: {e}")))?;

        debug!(
            endpoint = %base_url,
            project = %config.project_id,
            database = %config.database_id,
            "configured firestore backend"
        );

        Ok(Self {
            base_url,
            http,
            access_token,
            project_id: config.project_id,
            database_id: config.database_id,
            max_batch_ops: config.max_batch_ops.max(1),
        })
    }

    // -- Resource names -----------------------------------------------------

    /// `projects/{p}/databases/{d}/documents`
    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database_id
        )
    }

    /// Full resource name of `collection/key`, as used in request bodies.
    fn document_name(&self, collection: &str, key: &str) -> Result<String> {
        validate_segment("collection name", collection)?;
        validate_segment("document key", key)?;
        Ok(format!("{}/{}/{}", self.documents_root(), collection, key))
    }

    /// URL built from percent-encoded path segments under the REST root.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::BackendUnavailable(format!("endpoint {} cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend([
                "projects",
                self.project_id.as_str(),
                "databases",
                self.database_id.as_str(),
            ])
            .extend(segments);
        Ok(url)
    }

    fn document_url(&self, collection: &str, key: &str) -> Result<Url> {
        validate_segment("collection name", collection)?;
        validate_segment("document key", key)?;
        self.url(&["documents", collection, key])
    }

    // -- HTTP helpers -------------------------------------------------------

    fn request(&self, method: Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.access_token {
            Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        builder
            .send()
            .await
            .map_err(|e| StoreError::BackendUnavailable(e.to_string()))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let body = response
            .text()
            .await
            .map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;
        serde_json::from_str(&body)
            .map_err(|e| StoreError::CorruptedData(format!("unexpected response body: {e}")))
    }

    /// Turn a non-2xx response into [`StoreError::Rejected`].
    async fn rejection(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StoreError::Rejected {
            status,
            message: error_message(status, &body),
        }
    }

    // -- Transactions -------------------------------------------------------

    async fn begin_transaction(&self) -> Result<String> {
        let url = self.url(&["documents:beginTransaction"])?;
        let response = self
            .send(self.request(Method::POST, url).json(&json!({})))
            .await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        let begun: BeginTransactionResponse = Self::read_json(response).await?;
        Ok(begun.transaction)
    }

    async fn rollback(&self, transaction: &str) {
        let result = async {
            let url = self.url(&["documents:rollback"])?;
            self.send(
                self.request(Method::POST, url)
                    .json(&json!({ "transaction": transaction })),
            )
            .await
        }
        .await;
        if let Err(e) = result {
            warn!(error = %e, "firestore rollback failed");
        }
    }

    /// List every document of `collection`, optionally inside `transaction`.
    async fn list_documents(
        &self,
        collection: &str,
        transaction: Option<&str>,
    ) -> Result<Vec<(String, Document)>> {
        validate_segment("collection name", collection)?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.url(&["documents", collection])?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("pageSize", &LIST_PAGE_SIZE.to_string());
                if let Some(token) = &page_token {
                    query.append_pair("pageToken", token);
                }
                if let Some(tx) = transaction {
                    query.append_pair("transaction", tx);
                }
            }

            let response = self.send(self.request(Method::GET, url)).await?;
            if response.status() == StatusCode::NOT_FOUND {
                break;
            }
            if !response.status().is_success() {
                return Err(Self::rejection(response).await);
            }

            let page: ListResponse = Self::read_json(response).await?;
            for raw in page.documents {
                let key = document_key(&raw.name).to_string();
                documents.push((key, value::decode_fields(&raw.fields)?));
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(documents)
    }

    /// Post `writes` to `documents:commit`.
    async fn commit_writes(&self, writes: Vec<Value>, transaction: Option<&str>) -> Result<()> {
        let mut body = json!({ "writes": writes });
        if let Some(tx) = transaction {
            body["transaction"] = Value::String(tx.to_string());
        }
        let url = self.url(&["documents:commit"])?;
        let response = self
            .send(self.request(Method::POST, url).json(&body))
            .await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        Ok(())
    }

    /// Resolve `clear` ops inside a transaction and commit with it.
    async fn commit_transactional(&self, ops: Vec<WriteOp>) -> Result<()> {
        let transaction = self.begin_transaction().await?;

        let result = async {
            let mut cleared = Vec::new();
            for op in &ops {
                if let WriteOp::Clear { collection } = op {
                    let keys = self
                        .list_documents(collection, Some(&transaction))
                        .await?
                        .into_iter()
                        .map(|(key, _)| key)
                        .collect::<Vec<_>>();
                    cleared.push(keys);
                }
            }

            let writes = self.expand_writes(&ops, cleared)?;
            if writes.len() > self.max_batch_ops {
                return Err(StoreError::BatchTooLarge {
                    ops: writes.len(),
                    max: self.max_batch_ops,
                });
            }
            self.commit_writes(writes, Some(&transaction)).await
        }
        .await;

        if result.is_err() {
            self.rollback(&transaction).await;
        }
        result
    }

    /// Turn batch ops into REST `Write` objects.
    ///
    /// `cleared` holds, per `Clear` op in order, the keys that existed when the
    /// transaction read them. Deletes for keys that a later `Set` in the same
    /// batch overwrites are dropped; the set replaces the whole document anyway.
    fn expand_writes(&self, ops: &[WriteOp], cleared: Vec<Vec<String>>) -> Result<Vec<Value>> {
        let mut cleared = cleared.into_iter();
        let mut writes = Vec::with_capacity(ops.len());

        for (index, op) in ops.iter().enumerate() {
            match op {
                WriteOp::Set {
                    collection,
                    key,
                    data,
                } => writes.push(json!({
                    "update": {
                        "name": self.document_name(collection, key)?,
                        "fields": value::encode_fields(data),
                    }
                })),
                WriteOp::Delete { collection, key } => writes.push(json!({
                    "delete": self.document_name(collection, key)?,
                })),
                WriteOp::Clear { collection } => {
                    let rewritten: HashSet<&str> = ops[index + 1..]
                        .iter()
                        .filter_map(|later| match later {
                            WriteOp::Set {
                                collection: c, key, ..
                            } if c == collection => Some(key.as_str()),
                            _ => None,
                        })
                        .collect();
                    for key in cleared.next().unwrap_or_default() {
                        if !rewritten.contains(key.as_str()) {
                            writes.push(json!({
                                "delete": self.document_name(collection, &key)?,
                            }));
                        }
                    }
                }
            }
        }

        Ok(writes)
    }
}

/// Last path segment of a resource name.
fn document_key(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Extract the human-readable reason from a REST error body.
fn error_message(status: u16, body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if !parsed.error.status.is_empty() => {
            format!("{}: {}", parsed.error.status, parsed.error.message)
        }
        Ok(parsed) if !parsed.error.message.is_empty() => parsed.error.message,
        _ => format!("HTTP {status}"),
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Document>> {
        let url = self.document_url(collection, key)?;
        let response = self.send(self.request(Method::GET, url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        let raw: RawDocument = Self::read_json(response).await?;
        Ok(Some(value::decode_fields(&raw.fields)?))
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Document)>> {
        self.list_documents(collection, None).await
    }

    async fn set(&self, collection: &str, key: &str, data: Document) -> Result<()> {
        let url = self.document_url(collection, key)?;
        let body = json!({ "fields": value::encode_fields(&data) });
        let response = self
            .send(self.request(Method::PATCH, url).json(&body))
            .await?;
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        Ok(())
    }

    async fn update(&self, collection: &str, key: &str, fields: Document) -> Result<()> {
        // An empty mask would turn the PATCH into a full replace.
        if fields.is_empty() {
            return match self.get(collection, key).await? {
                Some(_) => Ok(()),
                None => Err(StoreError::not_found(collection, key)),
            };
        }

        let mut url = self.document_url(collection, key)?;
        {
            let mut query = url.query_pairs_mut();
            for name in fields.keys() {
                query.append_pair("updateMask.fieldPaths", &value::field_path(name));
            }
            query.append_pair("currentDocument.exists", "true");
        }
        let body = json!({ "fields": value::encode_fields(&fields) });
        let response = self
            .send(self.request(Method::PATCH, url).json(&body))
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(collection, key));
        }
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<()> {
        let url = self.document_url(collection, key)?;
        let response = self.send(self.request(Method::DELETE, url)).await?;
        if response.status().is_success() || response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(Self::rejection(response).await)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        if batch.len() > self.max_batch_ops {
            return Err(StoreError::BatchTooLarge {
                ops: batch.len(),
                max: self.max_batch_ops,
            });
        }
        if batch.is_empty() {
            return Ok(());
        }

        let ops = batch.into_ops();
        let needs_transaction = ops.iter().any(|op| matches!(op, WriteOp::Clear { .. }));
        let collections: BTreeSet<&str> = ops.iter().map(WriteOp::collection).collect();
        debug!(
            ops = ops.len(),
            ?collections,
            transactional = needs_transaction,
            "committing firestore batch"
        );

        if needs_transaction {
            self.commit_transactional(ops).await
        } else {
            let writes = self.expand_writes(&ops, Vec::new())?;
            self.commit_writes(writes, None).await
        }
    }

    fn max_batch_ops(&self) -> usize {
        self.max_batch_ops
    }

    fn name(&self) -> &str {
        "firestore"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> FirestoreStore {
        FirestoreStore::connect(FirestoreConfig {
            project_id: "demo".to_string(),
            emulator_host: Some("localhost:8080".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_emulator_uses_plain_http_without_auth() {
        let store = FirestoreStore::connect(FirestoreConfig {
            access_token: Some("secret".to_string()),
            emulator_host: Some("127.0.0.1:9000".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(store.base_url.as_str(), "http://127.0.0.1:9000/v1/");
        assert!(store.access_token.is_none());
    }

    #[test]
    fn test_production_endpoint_keeps_token() {
        let store = FirestoreStore::connect(FirestoreConfig {
            access_token: Some("secret".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(store.base_url.as_str(), FIRESTORE_ENDPOINT);
        assert_eq!(store.access_token.as_deref(), Some("secret"));
        // The token never leaks into debug output.
        assert!(!format!("{store:?}").contains("secret"));
    }

    #[test]
    fn test_document_url_encodes_key() {
        let url = store().document_url("users", "a b?c@x.org").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents/users/a%20b%3Fc@x.org"
        );
    }

    #[test]
    fn test_document_name_rejects_bad_segments() {
        let store = store();
        assert!(matches!(
            store.document_name("users", ""),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(matches!(
            store.document_name("users", "a/b"),
            Err(StoreError::InvalidKey(_))
        ));
        assert_eq!(
            store.document_name("analytics", "stats").unwrap(),
            "projects/demo/databases/(default)/documents/analytics/stats"
        );
    }

    #[test]
    fn test_expand_writes_without_clear() {
        let store = store();
        let mut batch = WriteBatch::new();
        let mut data = Document::new();
        data.insert("n".into(), json!(1));
        batch.set("videos", "a", data).delete("videos", "b");

        let writes = store.expand_writes(batch.ops(), Vec::new()).unwrap();
        assert_eq!(
            writes,
            vec![
                json!({"update": {
                    "name": "projects/demo/databases/(default)/documents/videos/a",
                    "fields": {"n": {"integerValue": "1"}}
                }}),
                json!({"delete": "projects/demo/databases/(default)/documents/videos/b"}),
            ]
        );
    }

    #[test]
    fn test_expand_clear_skips_rewritten_keys() {
        let store = store();
        let mut batch = WriteBatch::new();
        batch
            .clear("shloks")
            .set("shloks", "shlok_0", Document::new())
            .set("videos", "shlok_1", Document::new());

        let existing = vec![vec!["shlok_0".to_string(), "shlok_1".to_string()]];
        let writes = store.expand_writes(batch.ops(), existing).unwrap();

        // shlok_0 is overwritten, so only shlok_1 needs an explicit delete;
        // the set into "videos" does not shield the shloks document.
        assert_eq!(writes.len(), 3);
        assert_eq!(
            writes[0],
            json!({"delete": "projects/demo/databases/(default)/documents/shloks/shlok_1"})
        );
        assert!(writes[1].get("update").is_some());
        assert!(writes[2].get("update").is_some());
    }

    #[test]
    fn test_parse_list_response() {
        let body = r#"{
            "documents": [
                {"name": "projects/p/databases/(default)/documents/users/a@b.c",
                 "fields": {"email": {"stringValue": "a@b.c"}},
                 "createTime": "2024-01-01T00:00:00Z"}
            ],
            "nextPageToken": "tok"
        }"#;
        let page: ListResponse = serde_json::from_str(body).unwrap();
        assert_eq!(page.next_page_token.as_deref(), Some("tok"));
        assert_eq!(document_key(&page.documents[0].name), "a@b.c");

        let empty: ListResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.documents.is_empty());
        assert!(empty.next_page_token.is_none());
    }

    #[test]
    fn test_error_message_extraction() {
        let body = r#"{"error": {"code": 403, "message": "Missing permissions", "status": "PERMISSION_DENIED"}}"#;
        assert_eq!(error_message(403, body), "PERMISSION_DENIED: Missing permissions");
        assert_eq!(error_message(502, "<html>bad gateway</html>"), "HTTP 502");
    }

    #[tokio::test]
    async fn test_oversized_commit_refused_before_any_request() {
        let store = FirestoreStore::connect(FirestoreConfig {
            emulator_host: Some("localhost:1".to_string()),
            max_batch_ops: 1,
            ..Default::default()
        })
        .unwrap();
        let mut batch = WriteBatch::new();
        batch.delete("c", "a").delete("c", "b");
        let err = store.commit(batch).await.unwrap_err();
        assert!(matches!(err, StoreError::BatchTooLarge { ops: 2, max: 1 }));
    }

    #[tokio::test]
    async fn test_unreachable_emulator_is_backend_unavailable() {
        let store = FirestoreStore::connect(FirestoreConfig {
            emulator_host: Some("127.0.0.1:1".to_string()),
            timeout: Duration::from_secs(2),
            ..Default::default()
        })
        .unwrap();
        let err = store.get("analytics", "stats").await.unwrap_err();
        assert!(matches!(err, StoreError::BackendUnavailable(_)));
    }
}
