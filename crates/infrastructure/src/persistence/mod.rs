//! Storage adapters: the in-memory model store and the config file.

mod config_repository;
mod memory_store;

pub use config_repository::{ConfigError, ConfigRepository};
pub use memory_store::{InMemoryModelStore, ModelSnapshot, SnapshotError, StoredResponse};
