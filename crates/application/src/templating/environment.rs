//! Render environments
//!
//! A render environment is the compiled, read-only state one render mode
//! needs: its delimiter syntax and the merged filter, tag and test tables.

use std::sync::Arc;

use tessera_domain::{RenderMode, TemplateSyntax, TemplatingConfig};
use tracing::{debug, warn};

use super::builtins::BuiltinFilters;
use super::extension::FilterDefinition;
use super::filter_registry::{FilterOrigin, FilterRegistry};
use super::predicates::TestRegistry;
use super::tag_registry::TagRegistry;
use crate::error::ApplicationResult;
use crate::ports::{PluginInfo, PluginSource};

/// Compiled state for one render mode.
#[derive(Debug)]
pub struct RenderEnvironment {
    mode: RenderMode,
    syntax: TemplateSyntax,
    filters: FilterRegistry,
    tags: TagRegistry,
    tests: TestRegistry,
}

impl RenderEnvironment {
    /// The mode this environment was built for.
    #[must_use]
    pub const fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Delimiters active in this mode.
    #[must_use]
    pub const fn syntax(&self) -> &TemplateSyntax {
        &self.syntax
    }

    /// Registered filters.
    #[must_use]
    pub const fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    /// Registered tags.
    #[must_use]
    pub const fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    /// Registered test predicates.
    #[must_use]
    pub const fn tests(&self) -> &TestRegistry {
        &self.tests
    }
}

/// Builds environments from configuration, default filters and plugins.
#[derive(Clone)]
pub(crate) struct EnvironmentFactory {
    pub(crate) config: TemplatingConfig,
    pub(crate) plugins: Option<Arc<dyn PluginSource>>,
    pub(crate) default_filters: Vec<FilterDefinition>,
}

impl EnvironmentFactory {
    /// Builds the environment for `mode`.
    ///
    /// Registration order is core built-ins, default filters, plugin tags,
    /// plugin filters. Duplicate names keep the first registration.
    pub(crate) async fn build(&self, mode: RenderMode) -> ApplicationResult<RenderEnvironment> {
        let mut filters = FilterRegistry::new();
        for definition in BuiltinFilters::all() {
            if let Err(conflict) = filters.register(definition, FilterOrigin::Builtin) {
                warn!(%conflict, "Duplicate built-in filter ignored");
            }
        }
        for definition in &self.default_filters {
            if let Err(conflict) = filters.register(definition.clone(), FilterOrigin::Default) {
                warn!(%conflict, "Default filter shadowed by a built-in");
            }
        }

        let mut tags = TagRegistry::new();
        if let Some(plugins) = &self.plugins {
            let plugin_tags = plugins.template_tags().await?;
            let plugin_filters = plugins.template_filters().await?;

            for entry in plugin_tags {
                if self.is_ignored(&entry.plugin) {
                    continue;
                }
                let plugin = entry.plugin.name.clone();
                if let Err(conflict) = tags.register(entry.tag, Some(entry.plugin)) {
                    warn!(%conflict, %plugin, "Duplicate template tag ignored");
                }
            }
            for entry in plugin_filters {
                if self.is_ignored(&entry.plugin) {
                    continue;
                }
                let plugin = entry.plugin.name.clone();
                if let Err(conflict) =
                    filters.register(entry.filter, FilterOrigin::Plugin(entry.plugin))
                {
                    warn!(%conflict, %plugin, "Duplicate template filter ignored");
                }
            }
        }

        debug!(
            mode = %mode,
            filters = filters.len(),
            tags = tags.len(),
            "Built render environment"
        );

        Ok(RenderEnvironment {
            mode,
            syntax: self.config.syntax.for_mode(mode),
            filters,
            tags,
            tests: TestRegistry::with_builtins(),
        })
    }

    /// Whether the deny-list excludes `plugin` from this build.
    fn is_ignored(&self, plugin: &PluginInfo) -> bool {
        let ignored = self.config.ignored_plugins.contains(&plugin.name);
        if ignored {
            debug!(plugin = %plugin.name, "Skipping ignored plugin");
        }
        ignored
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::ports::{PluginError, PluginTemplateFilter, PluginTemplateTag};
    use crate::templating::extension::{FilterRun, TagDefinition, TagRun};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSource {
        listings: Mutex<usize>,
        fail: bool,
    }

    #[async_trait]
    impl PluginSource for RecordingSource {
        async fn template_tags(&self) -> Result<Vec<PluginTemplateTag>, PluginError> {
            if self.fail {
                return Err(PluginError::Unavailable("offline".to_string()));
            }
            *self.listings.lock().unwrap() += 1;
            Ok(vec![
                PluginTemplateTag {
                    plugin: PluginInfo::new("tags", "1"),
                    tag: TagDefinition::new("hello", TagRun::sync(|_, _| Ok("hi".to_string()))),
                },
                PluginTemplateTag {
                    plugin: PluginInfo::new("other", "1"),
                    tag: TagDefinition::new("hello", TagRun::sync(|_, _| Ok("dup".to_string()))),
                },
                PluginTemplateTag {
                    plugin: PluginInfo::new("insomnia-plugin-kong-portal", "1"),
                    tag: TagDefinition::new("portal", TagRun::sync(|_, _| Ok(String::new()))),
                },
            ])
        }

        async fn template_filters(&self) -> Result<Vec<PluginTemplateFilter>, PluginError> {
            Ok(vec![
                PluginTemplateFilter {
                    plugin: PluginInfo::new("filters", "1"),
                    filter: FilterDefinition::new("shout", FilterRun::sync(|_, v, _| Ok(v))),
                },
                PluginTemplateFilter {
                    plugin: PluginInfo::new("filters", "1"),
                    filter: FilterDefinition::new("upper", FilterRun::sync(|_, _, _| Ok(Value::Null))),
                },
                PluginTemplateFilter {
                    plugin: PluginInfo::new("insomnia-plugin-kong-declarative-config", "1"),
                    filter: FilterDefinition::new("kong", FilterRun::sync(|_, v, _| Ok(v))),
                },
            ])
        }
    }

    fn factory(source: Arc<RecordingSource>) -> EnvironmentFactory {
        EnvironmentFactory {
            config: TemplatingConfig::default(),
            plugins: Some(source),
            default_filters: vec![FilterDefinition::new(
                "json_parse",
                FilterRun::sync(|_, v, _| Ok(v)),
            )],
        }
    }

    #[tokio::test]
    async fn test_build_registers_in_order() {
        let source = Arc::new(RecordingSource::default());
        let env = factory(Arc::clone(&source)).build(RenderMode::All).await.unwrap();

        let names: Vec<&str> = env.filters().list().iter().map(|f| f.definition.name.as_str()).collect();
        assert_eq!(names.first(), Some(&"upper"));
        assert_eq!(names.last(), Some(&"shout"));
        assert!(names.contains(&"json_parse"));
        assert_eq!(env.filters().resolve("upper").map(|f| f.is_plugin()), Some(false));
        assert_eq!(env.filters().resolve("shout").map(|f| f.is_plugin()), Some(true));

        assert_eq!(env.tags().len(), 1);
        assert_eq!(
            env.tags().resolve("hello").and_then(|t| t.plugin.as_ref()).map(|p| p.name.as_str()),
            Some("tags")
        );
    }

    #[tokio::test]
    async fn test_deny_listed_plugins_skipped() {
        let source = Arc::new(RecordingSource::default());
        let env = factory(Arc::clone(&source)).build(RenderMode::All).await.unwrap();

        assert!(env.tags().resolve("portal").is_none());
        assert!(env.filters().resolve("kong").is_none());
        assert_eq!(*source.listings.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_listing_failure_fails_build() {
        let source = Arc::new(RecordingSource {
            fail: true,
            ..RecordingSource::default()
        });
        assert!(factory(source).build(RenderMode::All).await.is_err());
    }

    #[tokio::test]
    async fn test_mode_syntax() {
        let env = EnvironmentFactory {
            config: TemplatingConfig::default(),
            plugins: None,
            default_filters: Vec::new(),
        }
        .build(RenderMode::Variables)
        .await
        .unwrap();
        assert_eq!(env.mode(), RenderMode::Variables);
        assert_eq!(env.syntax().block_start, tessera_domain::template::NEVER_MATCH_START);
        assert!(env.tags().is_empty());
    }
}
