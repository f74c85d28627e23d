//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the rendering core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod model_store;
mod plugin_source;

pub use model_store::{ModelError, ModelStore};
pub use plugin_source::{
    PluginError, PluginInfo, PluginSource, PluginTemplateFilter, PluginTemplateTag,
};
