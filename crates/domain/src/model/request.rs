//! Request documents and their ancestors.

use serde::{Deserialize, Serialize};

use super::workspace::Workspace;

/// A request header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHeader {
    /// Header name.
    pub name: String,
    /// Header value, possibly templated.
    pub value: String,
    /// Disabled headers are kept but not sent.
    #[serde(default)]
    pub disabled: bool,
}

/// A saved request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    /// Document id.
    pub id: String,
    /// Id of the owning request group or workspace.
    pub parent_id: String,
    /// Display name.
    pub name: String,
    /// HTTP method.
    #[serde(default = "default_method")]
    pub method: String,
    /// Request URL, possibly templated.
    #[serde(default)]
    pub url: String,
    /// Request headers.
    #[serde(default)]
    pub headers: Vec<RequestHeader>,
    /// Raw body text, possibly templated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

impl Request {
    /// Creates a GET request under `parent_id`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        parent_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            name: name.into(),
            method: default_method(),
            url: String::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Sets the URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the method.
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }
}

/// A folder of requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestGroup {
    /// Document id.
    pub id: String,
    /// Id of the owning request group or workspace.
    pub parent_id: String,
    /// Display name.
    pub name: String,
}

impl RequestGroup {
    /// Creates a request group.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        parent_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            name: name.into(),
        }
    }
}

/// The kind of a document in an ancestor chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelKind {
    /// A request.
    Request,
    /// A request group.
    RequestGroup,
    /// A workspace.
    Workspace,
}

/// Any document that can appear in a request's ancestor chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ModelDoc {
    /// A request.
    Request(Request),
    /// A request group.
    RequestGroup(RequestGroup),
    /// A workspace.
    Workspace(Workspace),
}

impl ModelDoc {
    /// Document id.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Request(r) => &r.id,
            Self::RequestGroup(g) => &g.id,
            Self::Workspace(w) => &w.id,
        }
    }

    /// Parent id; workspaces have none.
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.parent_id),
            Self::RequestGroup(g) => Some(&g.parent_id),
            Self::Workspace(_) => None,
        }
    }

    /// Document kind.
    #[must_use]
    pub const fn kind(&self) -> ModelKind {
        match self {
            Self::Request(_) => ModelKind::Request,
            Self::RequestGroup(_) => ModelKind::RequestGroup,
            Self::Workspace(_) => ModelKind::Workspace,
        }
    }
}
