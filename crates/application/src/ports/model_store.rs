//! Model store port
//!
//! Read-only access to the documents filters and tags may look up while a
//! template renders.

use async_trait::async_trait;
use tessera_domain::{CookieJar, ModelDoc, OAuth2Token, Request, Response, Workspace};

/// Errors that can occur during model lookups.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Document not found where one was required.
    #[error("document not found: {0}")]
    NotFound(String),

    /// The backing store failed.
    #[error("store error: {0}")]
    Store(String),
}

/// Data-access collaborator consumed by the render context.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Looks up a request by id.
    async fn request_by_id(&self, id: &str) -> Result<Option<Request>, ModelError>;

    /// Returns the document with `id` followed by its ancestors, nearest first.
    ///
    /// The chain includes the document itself; callers filter it out when
    /// they only want ancestors.
    async fn with_ancestors(&self, id: &str) -> Result<Vec<ModelDoc>, ModelError>;

    /// Looks up a workspace by id.
    async fn workspace_by_id(&self, id: &str) -> Result<Option<Workspace>, ModelError>;

    /// Looks up the `OAuth2` token stored for a request.
    async fn oauth2_token_by_parent_id(
        &self,
        parent_id: &str,
    ) -> Result<Option<OAuth2Token>, ModelError>;

    /// Returns the cookie jar of a workspace, creating an empty one if needed.
    async fn cookie_jar_for_workspace(&self, workspace_id: &str)
    -> Result<CookieJar, ModelError>;

    /// Lists responses for a request usable under `environment_id`, newest first.
    async fn responses_for_request(
        &self,
        request_id: &str,
        environment_id: Option<&str>,
    ) -> Result<Vec<Response>, ModelError>;

    /// Returns the newest response for a request usable under `environment_id`.
    async fn latest_response_for_request(
        &self,
        request_id: &str,
        environment_id: Option<&str>,
    ) -> Result<Option<Response>, ModelError> {
        Ok(self
            .responses_for_request(request_id, environment_id)
            .await?
            .into_iter()
            .next())
    }

    /// Returns the stored body bytes of a response.
    async fn response_body(&self, response_id: &str) -> Result<Option<Vec<u8>>, ModelError>;
}
