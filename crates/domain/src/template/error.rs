//! Render error shape.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Line/column of the construct that failed, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
}

impl Location {
    /// Creates a location.
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Computes the location of a byte offset within `text`.
    #[must_use]
    pub fn of_offset(text: &str, offset: usize) -> Self {
        let before = text.get(..offset).unwrap_or(text);
        let line = before.matches('\n').count() + 1;
        let column = before
            .rsplit_once('\n')
            .map_or(before, |(_, tail)| tail)
            .chars()
            .count()
            + 1;
        Self { line, column }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Which stage rejected the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorType {
    /// Malformed template syntax.
    Parse,
    /// Evaluation failed.
    Render,
}

/// Why evaluation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ErrorReason {
    /// A null or undefined value reached the output under strict mode.
    Undefined,
    /// Any other failure.
    #[default]
    Error,
}

/// The single structured error a render rejects with.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct RenderError {
    /// Sanitized human-readable message.
    pub message: String,
    /// Caller-supplied path (for example `request.url`), empty when none.
    pub path: String,
    /// Where the failing construct starts, `None` until it is known.
    ///
    /// Serialized as a concrete location, line 1 column 1 when unknown.
    #[serde(default, with = "known_location")]
    pub location: Option<Location>,
    /// Parse or render failure.
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    /// Undefined-output or generic failure.
    pub reason: ErrorReason,
}

impl RenderError {
    /// Creates a render-stage error with a generic reason.
    #[must_use]
    pub fn render(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: String::new(),
            location: None,
            error_type: ErrorType::Render,
            reason: ErrorReason::Error,
        }
    }

    /// Creates a parse-stage error.
    #[must_use]
    pub fn parse(message: impl Into<String>, location: Location) -> Self {
        Self {
            message: message.into(),
            path: String::new(),
            location: Some(location),
            error_type: ErrorType::Parse,
            reason: ErrorReason::Error,
        }
    }

    /// Sets the reason.
    #[must_use]
    pub const fn with_reason(mut self, reason: ErrorReason) -> Self {
        self.reason = reason;
        self
    }

    /// Sets the location.
    #[must_use]
    pub const fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// The reported location, line 1 column 1 when unknown.
    #[must_use]
    pub fn location(&self) -> Location {
        self.location.unwrap_or_default()
    }

    /// Sets the caller path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Whether the failure was a strict-undefined violation.
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        self.reason == ErrorReason::Undefined
    }
}

mod known_location {
    use super::{Deserialize, Deserializer, Location, Serialize, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(
        location: &Option<Location>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        location.unwrap_or_default().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Location>, D::Error> {
        Location::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_location_of_offset() {
        let text = "line one\nline {{ two }}";
        let offset = text.find("{{").unwrap_or_default();
        assert_eq!(Location::of_offset(text, offset), Location::new(2, 6));
        assert_eq!(Location::of_offset(text, 0), Location::new(1, 1));
    }

    #[test]
    fn test_wire_shape() {
        let err = RenderError::render("attempted to output null or undefined value")
            .with_reason(ErrorReason::Undefined)
            .with_path("url")
            .with_location(Location::new(1, 4));
        let value = serde_json::to_value(&err).unwrap_or_default();
        assert_eq!(
            value,
            json!({
                "message": "attempted to output null or undefined value",
                "path": "url",
                "location": {"line": 1, "column": 4},
                "type": "render",
                "reason": "undefined",
            })
        );
        assert!(err.is_undefined());
        assert_eq!(err.to_string(), "attempted to output null or undefined value");
    }

    #[test]
    fn test_unknown_location_reported_as_origin() {
        let err = RenderError::render("boom");
        assert_eq!(err.location, None);
        assert_eq!(err.location(), Location::new(1, 1));
        let value = serde_json::to_value(&err).unwrap_or_default();
        assert_eq!(value["location"], json!({"line": 1, "column": 1}));
    }
}
