//! Errors surfaced by the command-line tool.

use tessera_application::ApplicationError;
use tessera_domain::RenderError;
use tessera_infrastructure::{ConfigError, SerializationError, SnapshotError};

/// Everything that can stop a CLI run.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The template failed to render.
    #[error("{0}")]
    Render(#[from] RenderError),

    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The model snapshot could not be loaded.
    #[error("Failed to load models: {0}")]
    Snapshot(#[from] SnapshotError),

    /// The engine could not be set up.
    #[error(transparent)]
    Application(#[from] ApplicationError),

    /// The context file is not a JSON object.
    #[error("Invalid context file: {0}")]
    Context(String),

    /// Output could not be serialized.
    #[error(transparent)]
    Serialization(#[from] SerializationError),

    /// Reading input or writing output failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
