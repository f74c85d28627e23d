//! `OAuth2` tokens stored per request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An `OAuth2` token obtained for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2Token {
    /// Document id.
    pub id: String,
    /// Id of the request the token was obtained for.
    pub parent_id: String,
    /// The access token string.
    pub access_token: String,
    /// Token type (usually "Bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// When the token expires (if known).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Refresh token for obtaining new access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Identity token, for OpenID Connect flows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_token: Option<String>,
    /// When this token was obtained.
    pub obtained_at: DateTime<Utc>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl OAuth2Token {
    /// Creates a bearer token obtained now, optionally expiring after `expires_in_secs`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        parent_id: impl Into<String>,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            access_token: access_token.into(),
            token_type: default_token_type(),
            expires_at: expires_in_secs.map(|secs| now + chrono::Duration::seconds(secs)),
            refresh_token: None,
            identity_token: None,
            obtained_at: now,
        }
    }

    /// Check if the token is expired or will expire within the given buffer.
    #[must_use]
    pub fn is_expired_or_expiring(&self, buffer_seconds: i64) -> bool {
        self.expires_at.is_some_and(|expires_at| {
            let buffer = chrono::Duration::seconds(buffer_seconds);
            Utc::now() + buffer >= expires_at
        })
    }

    /// Returns the Authorization header value.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}
