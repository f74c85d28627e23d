//! In-memory plugin source.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use tessera_application::{
    FilterDefinition, PluginError, PluginInfo, PluginSource, PluginTemplateFilter,
    PluginTemplateTag, TagDefinition,
};
use tracing::{debug, warn};

/// A plugin: an identity plus the tags and filters it contributes.
#[derive(Debug, Clone)]
pub struct Plugin {
    info: PluginInfo,
    tags: Vec<TagDefinition>,
    filters: Vec<FilterDefinition>,
}

impl Plugin {
    /// Creates a plugin contributing nothing yet.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            info: PluginInfo::new(name, version),
            tags: Vec::new(),
            filters: Vec::new(),
        }
    }

    /// Adds a template tag.
    #[must_use]
    pub fn with_tag(mut self, tag: TagDefinition) -> Self {
        self.tags.push(tag);
        self
    }

    /// Adds a template filter.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterDefinition) -> Self {
        self.filters.push(filter);
        self
    }

    /// The plugin's identity.
    #[must_use]
    pub const fn info(&self) -> &PluginInfo {
        &self.info
    }

    /// Contributed tags, in declaration order.
    #[must_use]
    pub fn tags(&self) -> &[TagDefinition] {
        &self.tags
    }

    /// Contributed filters, in declaration order.
    #[must_use]
    pub fn filters(&self) -> &[FilterDefinition] {
        &self.filters
    }
}

/// Plugins held in memory, listed in the order they were added.
///
/// Changes become visible to a render engine after it reloads.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: RwLock<Vec<Plugin>>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the bundled plugins.
    #[must_use]
    pub fn with_bundled() -> Self {
        let registry = Self::new();
        for plugin in super::bundled_plugins() {
            if let Err(err) = registry.add(plugin) {
                warn!(%err, "Bundled plugin not added");
            }
        }
        registry
    }

    /// Adds a plugin.
    ///
    /// # Errors
    /// Returns [`PluginError::Load`] if a plugin with the same name is present.
    pub fn add(&self, plugin: Plugin) -> Result<(), PluginError> {
        let mut plugins = self.plugins.write().unwrap_or_else(PoisonError::into_inner);
        if plugins.iter().any(|p| p.info.name == plugin.info.name) {
            return Err(PluginError::Load {
                name: plugin.info.name,
                reason: "a plugin with this name is already installed".to_string(),
            });
        }
        debug!(
            plugin = %plugin.info.name,
            tags = plugin.tags.len(),
            filters = plugin.filters.len(),
            "Plugin added"
        );
        plugins.push(plugin);
        Ok(())
    }

    /// Removes a plugin, returning whether it was present.
    pub fn remove(&self, name: &str) -> bool {
        let mut plugins = self.plugins.write().unwrap_or_else(PoisonError::into_inner);
        let before = plugins.len();
        plugins.retain(|p| p.info.name != name);
        before != plugins.len()
    }

    /// Identities of every installed plugin.
    #[must_use]
    pub fn plugins(&self) -> Vec<PluginInfo> {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|p| p.info.clone())
            .collect()
    }

    fn snapshot(&self) -> Vec<Plugin> {
        self.plugins
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PluginSource for PluginRegistry {
    async fn template_tags(&self) -> Result<Vec<PluginTemplateTag>, PluginError> {
        Ok(self
            .snapshot()
            .into_iter()
            .flat_map(|plugin| {
                let info = plugin.info;
                plugin.tags.into_iter().map(move |tag| PluginTemplateTag {
                    plugin: info.clone(),
                    tag,
                })
            })
            .collect())
    }

    async fn template_filters(&self) -> Result<Vec<PluginTemplateFilter>, PluginError> {
        Ok(self
            .snapshot()
            .into_iter()
            .flat_map(|plugin| {
                let info = plugin.info;
                plugin.filters.into_iter().map(move |filter| PluginTemplateFilter {
                    plugin: info.clone(),
                    filter,
                })
            })
            .collect())
    }
}
