//! Tessera Infrastructure - Adapters around the rendering engine
//!
//! This crate implements what the application layer leaves open:
//! - The default template filters (JMESPath, JSON diff/path, XML, numbers, strings)
//! - An in-memory plugin source with the bundled tag plugins
//! - An in-memory model store and the configuration file repository

pub mod filters;
pub mod persistence;
pub mod plugins;
pub mod serialization;

pub use filters::default_filters;
pub use persistence::{
    ConfigError, ConfigRepository, InMemoryModelStore, ModelSnapshot, SnapshotError,
    StoredResponse,
};
pub use plugins::{Plugin, PluginRegistry, bundled_plugins};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
