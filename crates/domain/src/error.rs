//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or processing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A render mode name is not one of `all`, `variables` or `tags`.
    #[error("unknown render mode: {0}")]
    UnknownRenderMode(String),

    /// A variable path is malformed.
    #[error("invalid variable path: {0}")]
    InvalidVariablePath(String),

    /// A delimiter is empty or collides with another delimiter.
    #[error("invalid delimiter: {0}")]
    InvalidDelimiter(String),

    /// `max_render_depth` must allow at least one render.
    #[error("max_render_depth must be at least 1")]
    InvalidRenderDepth,

    /// An identifier is invalid or empty.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
