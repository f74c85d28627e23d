//! In-memory model store.
//!
//! Holds the documents templates can look up: requests with their groups and
//! workspaces, stored responses with their bodies, cookie jars and tokens.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tessera_application::{ModelError, ModelStore};
use tessera_domain::{
    CookieJar, ModelDoc, OAuth2Token, Request, RequestGroup, Response, Workspace, generate_id,
};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use crate::serialization::{SerializationError, from_json_bytes};

/// Error type for reading snapshot files.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// IO error while reading the file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a valid snapshot.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),
}

/// A response together with its body text, as kept in snapshot files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredResponse {
    /// Response metadata.
    #[serde(flatten)]
    pub response: Response,
    /// Body text, if one was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Serializable contents of a model store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelSnapshot {
    /// Workspaces, request groups and requests.
    pub documents: Vec<ModelDoc>,
    /// Recorded responses.
    pub responses: Vec<StoredResponse>,
    /// Cookie jars, one per workspace.
    pub cookie_jars: Vec<CookieJar>,
    /// `OAuth2` tokens, keyed by their request.
    pub oauth2_tokens: Vec<OAuth2Token>,
}

impl ModelSnapshot {
    /// Reads a snapshot from a JSON file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub async fn read(path: &Path) -> Result<Self, SnapshotError> {
        let content = fs::read(path).await?;
        Ok(from_json_bytes(&content)?)
    }
}

#[derive(Debug, Default)]
struct Documents {
    docs: HashMap<String, ModelDoc>,
    responses: HashMap<String, Vec<Response>>,
    bodies: HashMap<String, Vec<u8>>,
    jars: HashMap<String, CookieJar>,
    tokens: HashMap<String, OAuth2Token>,
}

/// Thread-safe in-memory [`ModelStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryModelStore {
    inner: Arc<RwLock<Documents>>,
}

impl InMemoryModelStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the contents of a snapshot.
    pub async fn from_snapshot(snapshot: ModelSnapshot) -> Self {
        let store = Self::new();
        for doc in snapshot.documents {
            store.insert(doc).await;
        }
        for stored in snapshot.responses {
            store
                .insert_response(stored.response, stored.body.map(String::into_bytes))
                .await;
        }
        for jar in snapshot.cookie_jars {
            store.insert_cookie_jar(jar).await;
        }
        for token in snapshot.oauth2_tokens {
            store.insert_token(token).await;
        }
        store
    }

    /// Stores a document, replacing one with the same id.
    pub async fn insert(&self, doc: ModelDoc) {
        let mut inner = self.inner.write().await;
        inner.docs.insert(doc.id().to_string(), doc);
    }

    /// Stores a workspace.
    pub async fn insert_workspace(&self, workspace: Workspace) {
        self.insert(ModelDoc::Workspace(workspace)).await;
    }

    /// Stores a request group.
    pub async fn insert_request_group(&self, group: RequestGroup) {
        self.insert(ModelDoc::RequestGroup(group)).await;
    }

    /// Stores a request.
    pub async fn insert_request(&self, request: Request) {
        self.insert(ModelDoc::Request(request)).await;
    }

    /// Records a response and its body.
    pub async fn insert_response(&self, response: Response, body: Option<Vec<u8>>) {
        let mut inner = self.inner.write().await;
        if let Some(body) = body {
            inner.bodies.insert(response.id.clone(), body);
        }
        let responses = inner.responses.entry(response.parent_id.clone()).or_default();
        responses.retain(|r| r.id != response.id);
        responses.push(response);
    }

    /// Stores a cookie jar, replacing the workspace's previous one.
    pub async fn insert_cookie_jar(&self, jar: CookieJar) {
        let mut inner = self.inner.write().await;
        inner.jars.insert(jar.parent_id.clone(), jar);
    }

    /// Stores an `OAuth2` token for its request.
    pub async fn insert_token(&self, token: OAuth2Token) {
        let mut inner = self.inner.write().await;
        inner.tokens.insert(token.parent_id.clone(), token);
    }
}

#[async_trait]
impl ModelStore for InMemoryModelStore {
    async fn request_by_id(&self, id: &str) -> Result<Option<Request>, ModelError> {
        let inner = self.inner.read().await;
        Ok(match inner.docs.get(id) {
            Some(ModelDoc::Request(request)) => Some(request.clone()),
            _ => None,
        })
    }

    async fn with_ancestors(&self, id: &str) -> Result<Vec<ModelDoc>, ModelError> {
        let inner = self.inner.read().await;
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut next = Some(id.to_string());
        while let Some(current) = next.take() {
            if !seen.insert(current.clone()) {
                return Err(ModelError::Store(format!(
                    "parent cycle detected at {current}"
                )));
            }
            let Some(doc) = inner.docs.get(&current) else {
                break;
            };
            next = doc.parent_id().map(ToString::to_string);
            chain.push(doc.clone());
        }
        Ok(chain)
    }

    async fn workspace_by_id(&self, id: &str) -> Result<Option<Workspace>, ModelError> {
        let inner = self.inner.read().await;
        Ok(match inner.docs.get(id) {
            Some(ModelDoc::Workspace(workspace)) => Some(workspace.clone()),
            _ => None,
        })
    }

    async fn oauth2_token_by_parent_id(
        &self,
        parent_id: &str,
    ) -> Result<Option<OAuth2Token>, ModelError> {
        Ok(self.inner.read().await.tokens.get(parent_id).cloned())
    }

    async fn cookie_jar_for_workspace(
        &self,
        workspace_id: &str,
    ) -> Result<CookieJar, ModelError> {
        let mut inner = self.inner.write().await;
        let jar = inner
            .jars
            .entry(workspace_id.to_string())
            .or_insert_with(|| {
                debug!(workspace = %workspace_id, "Creating cookie jar");
                CookieJar::new(generate_id("jar"), workspace_id)
            });
        Ok(jar.clone())
    }

    async fn responses_for_request(
        &self,
        request_id: &str,
        environment_id: Option<&str>,
    ) -> Result<Vec<Response>, ModelError> {
        let inner = self.inner.read().await;
        let mut responses: Vec<Response> = inner
            .responses
            .get(request_id)
            .into_iter()
            .flatten()
            .filter(|r| r.is_available_for(environment_id))
            .cloned()
            .collect();
        responses.sort_by(|a, b| b.created.cmp(&a.created));
        Ok(responses)
    }

    async fn response_body(&self, response_id: &str) -> Result<Option<Vec<u8>>, ModelError> {
        Ok(self.inner.read().await.bodies.get(response_id).cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use tessera_domain::ModelKind;

    async fn seeded() -> InMemoryModelStore {
        let store = InMemoryModelStore::new();
        store.insert_workspace(Workspace::new("wrk_1", "Main")).await;
        store
            .insert_request_group(RequestGroup::new("fld_1", "wrk_1", "Users"))
            .await;
        store
            .insert_request(Request::new("req_1", "fld_1", "List users"))
            .await;
        store
    }

    #[tokio::test]
    async fn test_ancestor_chain_nearest_first() {
        let store = seeded().await;
        let chain = store.with_ancestors("req_1").await.unwrap();
        let kinds: Vec<ModelKind> = chain.iter().map(ModelDoc::kind).collect();
        assert_eq!(
            kinds,
            vec![ModelKind::Request, ModelKind::RequestGroup, ModelKind::Workspace]
        );
        assert!(store.with_ancestors("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_parent_cycle_is_an_error() {
        let store = InMemoryModelStore::new();
        store.insert_request_group(RequestGroup::new("a", "b", "A")).await;
        store.insert_request_group(RequestGroup::new("b", "a", "B")).await;
        assert!(store.with_ancestors("a").await.is_err());
    }

    #[tokio::test]
    async fn test_typed_lookups() {
        let store = seeded().await;
        assert!(store.request_by_id("req_1").await.unwrap().is_some());
        assert!(store.request_by_id("fld_1").await.unwrap().is_none());
        assert_eq!(store.workspace_by_id("wrk_1").await.unwrap().unwrap().name, "Main");
    }

    #[tokio::test]
    async fn test_responses_newest_first_and_scoped() {
        let store = seeded().await;
        let now = Utc::now();
        store
            .insert_response(
                Response::new("res_old", "req_1", 200).with_created(now - Duration::minutes(5)),
                Some(b"old".to_vec()),
            )
            .await;
        store
            .insert_response(
                Response::new("res_new", "req_1", 201)
                    .with_environment("env_b")
                    .with_created(now),
                Some(b"new".to_vec()),
            )
            .await;

        let all = store.responses_for_request("req_1", None).await.unwrap();
        assert_eq!(all[0].id, "res_new");
        let latest = store
            .latest_response_for_request("req_1", Some("env_a"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.id, "res_old");
        assert_eq!(store.response_body("res_old").await.unwrap(), Some(b"old".to_vec()));
    }

    #[tokio::test]
    async fn test_cookie_jar_created_once() {
        let store = seeded().await;
        let first = store.cookie_jar_for_workspace("wrk_1").await.unwrap();
        let second = store.cookie_jar_for_workspace("wrk_1").await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(first.id.starts_with("jar_"));
    }

    #[tokio::test]
    async fn test_snapshot_loading() {
        let snapshot: ModelSnapshot = serde_json::from_str(
            r#"{
                "documents": [
                    {"type": "workspace", "id": "wrk_1", "name": "Main"},
                    {"type": "request", "id": "req_1", "parentId": "wrk_1", "name": "Login"}
                ],
                "responses": [
                    {"id": "res_1", "parentId": "req_1", "statusCode": 200,
                     "created": "2024-01-01T00:00:00Z", "body": "{\"token\":\"abc\"}"}
                ]
            }"#,
        )
        .unwrap();
        let store = InMemoryModelStore::from_snapshot(snapshot).await;
        assert_eq!(store.with_ancestors("req_1").await.unwrap().len(), 2);
        assert_eq!(
            store.response_body("res_1").await.unwrap(),
            Some(br#"{"token":"abc"}"#.to_vec())
        );
    }
}
