//! Application error types

use tessera_domain::DomainError;
use thiserror::Error;

use crate::ports::PluginError;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The plugin subsystem failed to provide tags or filters.
    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
