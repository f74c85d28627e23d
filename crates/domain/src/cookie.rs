//! Cookie jars owned by workspaces.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// A single HTTP cookie.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Domain the cookie belongs to.
    pub domain: String,
    /// Path the cookie applies to.
    #[serde(default = "default_path")]
    pub path: String,
    /// Expiration time (None for session cookies).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
    /// `HttpOnly` flag.
    #[serde(default)]
    pub http_only: bool,
    /// Secure flag.
    #[serde(default)]
    pub secure: bool,
}

fn default_path() -> String {
    "/".to_string()
}

impl Cookie {
    /// Create a new cookie.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
            path: default_path(),
            expires: None,
            http_only: false,
            secure: false,
        }
    }

    /// Set the path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the expiration.
    #[must_use]
    pub const fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Set Secure flag.
    #[must_use]
    pub const fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Check if the cookie is expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires.is_some_and(|exp| exp < Utc::now())
    }

    /// Check if the cookie applies to a given URL.
    ///
    /// URLs that don't parse or have no host never match.
    #[must_use]
    pub fn applies_to(&self, url: &str) -> bool {
        let Ok(url) = Url::parse(url) else {
            return false;
        };
        if self.secure && url.scheme() != "https" {
            return false;
        }
        url.host_str()
            .is_some_and(|host| domain_matches(&self.domain, host))
            && url.path().starts_with(&self.path)
    }
}

/// The cookie jar of one workspace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CookieJar {
    /// Document id.
    pub id: String,
    /// Id of the owning workspace.
    pub parent_id: String,
    /// Stored cookies.
    #[serde(default)]
    pub cookies: Vec<Cookie>,
}

impl CookieJar {
    /// Create an empty jar for a workspace.
    #[must_use]
    pub fn new(id: impl Into<String>, workspace_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            parent_id: workspace_id.into(),
            cookies: Vec::new(),
        }
    }

    /// Add a cookie, replacing one with the same name, domain and path.
    pub fn add(&mut self, cookie: Cookie) {
        self.cookies.retain(|c| {
            c.name != cookie.name || c.domain != cookie.domain || c.path != cookie.path
        });
        self.cookies.push(cookie);
    }

    /// Get all live cookies that apply to a URL.
    #[must_use]
    pub fn get_for_url(&self, url: &str) -> Vec<&Cookie> {
        self.cookies
            .iter()
            .filter(|c| !c.is_expired() && c.applies_to(url))
            .collect()
    }

    /// Find the value of a named cookie applying to a URL.
    ///
    /// When several match, the one with the longest path wins.
    #[must_use]
    pub fn value_for(&self, url: &str, name: &str) -> Option<&str> {
        self.get_for_url(url)
            .into_iter()
            .filter(|c| c.name == name)
            .max_by_key(|c| c.path.len())
            .map(|c| c.value.as_str())
    }
}

/// Check if a cookie domain matches a request host.
fn domain_matches(cookie_domain: &str, request_host: &str) -> bool {
    let cookie_domain = cookie_domain.trim_start_matches('.').to_lowercase();
    let request_host = request_host.to_lowercase();

    request_host == cookie_domain || request_host.ends_with(&format!(".{cookie_domain}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_expired() {
        let cookie = Cookie::new("test", "value", "example.com")
            .with_expires(Utc::now() - chrono::Duration::hours(1));
        assert!(cookie.is_expired());

        let cookie = Cookie::new("test", "value", "example.com")
            .with_expires(Utc::now() + chrono::Duration::hours(1));
        assert!(!cookie.is_expired());
    }

    #[test]
    fn test_applies_to() {
        let cookie = Cookie::new("sid", "1", "example.com").with_path("/api");
        assert!(cookie.applies_to("https://example.com/api/users"));
        assert!(cookie.applies_to("http://sub.example.com/api"));
        assert!(!cookie.applies_to("https://example.com/web"));
        assert!(!cookie.applies_to("https://other.com/api"));

        let secure = Cookie::new("sid", "1", "example.com").with_secure(true);
        assert!(!secure.applies_to("http://example.com/"));
        assert!(secure.applies_to("https://EXAMPLE.com:8443/?q=1"));
        assert!(!secure.applies_to("not a url"));
    }

    #[test]
    fn test_jar_value_for() {
        let mut jar = CookieJar::new("jar_1", "wrk_1");
        jar.add(Cookie::new("sid", "root", "example.com"));
        jar.add(Cookie::new("sid", "api", "example.com").with_path("/api"));
        jar.add(Cookie::new("sid", "replaced", "example.com"));

        assert_eq!(jar.cookies.len(), 2);
        assert_eq!(jar.value_for("https://example.com/api/x", "sid"), Some("api"));
        assert_eq!(jar.value_for("https://example.com/", "sid"), Some("replaced"));
        assert_eq!(jar.value_for("https://example.com/", "missing"), None);
    }
}
