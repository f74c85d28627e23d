//! Stored responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of a response received for a request. The body is stored separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Document id.
    pub id: String,
    /// Id of the request this response belongs to.
    pub parent_id: String,
    /// Environment active when the request was sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_id: Option<String>,
    /// HTTP status code.
    pub status_code: u16,
    /// HTTP status message.
    #[serde(default)]
    pub status_message: String,
    /// Final URL.
    #[serde(default)]
    pub url: String,
    /// Content-Type header value.
    #[serde(default)]
    pub content_type: String,
    /// Round-trip time in milliseconds.
    #[serde(default)]
    pub elapsed_ms: f64,
    /// When the response was received.
    pub created: DateTime<Utc>,
}

impl Response {
    /// Creates a response received now.
    #[must_use]
    pub fn new(id: impl Into<String>, parent_id: impl Into<String>, status_code: u16) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            environment_id: None,
            status_code,
            status_message: String::new(),
            url: String::new(),
            content_type: String::new(),
            elapsed_ms: 0.0,
            created: Utc::now(),
        }
    }

    /// Sets the environment the response was received under.
    #[must_use]
    pub fn with_environment(mut self, environment_id: impl Into<String>) -> Self {
        self.environment_id = Some(environment_id.into());
        self
    }

    /// Sets the received timestamp.
    #[must_use]
    pub const fn with_created(mut self, created: DateTime<Utc>) -> Self {
        self.created = created;
        self
    }

    /// Whether the response is usable under `environment_id`.
    ///
    /// Responses recorded without an environment are available everywhere.
    #[must_use]
    pub fn is_available_for(&self, environment_id: Option<&str>) -> bool {
        match (&self.environment_id, environment_id) {
            (None, _) | (_, None) => true,
            (Some(own), Some(wanted)) => own == wanted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability() {
        let global = Response::new("res_1", "req_1", 200);
        let scoped = Response::new("res_2", "req_1", 200).with_environment("env_a");

        assert!(global.is_available_for(Some("env_b")));
        assert!(scoped.is_available_for(Some("env_a")));
        assert!(!scoped.is_available_for(Some("env_b")));
        assert!(scoped.is_available_for(None));
    }
}
