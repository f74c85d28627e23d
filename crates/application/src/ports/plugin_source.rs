//! Plugin source port
//!
//! The engine consumes template tags and filters from an external plugin
//! subsystem. It never discovers or loads plugins itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::templating::{FilterDefinition, TagDefinition};

/// Identity of a plugin that contributed tags or filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PluginInfo {
    /// Unique plugin identifier.
    pub name: String,
    /// Plugin version.
    #[serde(default)]
    pub version: String,
}

impl PluginInfo {
    /// Creates a plugin identity.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// A tag extension paired with the plugin that owns it.
#[derive(Debug, Clone)]
pub struct PluginTemplateTag {
    /// Owning plugin.
    pub plugin: PluginInfo,
    /// The tag itself.
    pub tag: TagDefinition,
}

/// A template filter paired with the plugin that owns it.
#[derive(Debug, Clone)]
pub struct PluginTemplateFilter {
    /// Owning plugin.
    pub plugin: PluginInfo,
    /// The filter itself.
    pub filter: FilterDefinition,
}

/// Errors that can occur while reading from the plugin subsystem.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// A plugin could not be loaded.
    #[error("failed to load plugin {name}: {reason}")]
    Load {
        /// Plugin identifier.
        name: String,
        /// Failure description.
        reason: String,
    },

    /// The plugin subsystem is not available.
    #[error("plugin source unavailable: {0}")]
    Unavailable(String),
}

/// Source of plugin-supplied template tags and filters.
///
/// Listings include every installed plugin. The engine applies its
/// deny-list to what it receives.
#[async_trait]
pub trait PluginSource: Send + Sync {
    /// Lists the template tags of every installed plugin, in declaration order.
    ///
    /// # Errors
    /// Returns an error if the plugin subsystem cannot be read.
    async fn template_tags(&self) -> Result<Vec<PluginTemplateTag>, PluginError>;

    /// Lists the template filters of every installed plugin, in declaration order.
    ///
    /// # Errors
    /// Returns an error if the plugin subsystem cannot be read.
    async fn template_filters(&self) -> Result<Vec<PluginTemplateFilter>, PluginError>;
}
