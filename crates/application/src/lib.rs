//! Tessera Application - Template rendering engine
//!
//! This crate contains the rendering pipeline and the ports it depends on.
//! It orchestrates domain types and defines the interfaces (ports) that
//! infrastructure adapters implement: the plugin source that supplies tags
//! and filters, and the model store read by `util.models`.

pub mod error;
pub mod ports;
pub mod templating;

pub use error::{ApplicationError, ApplicationResult};
pub use ports::{
    ModelError, ModelStore, PluginError, PluginInfo, PluginSource, PluginTemplateFilter,
    PluginTemplateTag,
};
pub use templating::{
    ExtensionError, FilterDefinition, FilterRun, HelperContext, RenderContext,
    RenderContextBuilder, RenderEngine, RenderOptions, TagDefinition, TagRun,
};
