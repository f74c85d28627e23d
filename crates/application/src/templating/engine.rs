//! Render engine
//!
//! Orchestrates parsing and evaluation of whole templates. The engine is a
//! cheap handle; clones share the environment cache, the plugin source and
//! the model store.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tessera_domain::{
    ErrorReason, FilterApplication, FilterDescriptor, Location, ParsedVariable, RenderError,
    RenderMode, TagDescriptor, TemplatingConfig,
};
use tracing::{debug, info};

use super::context::RenderContext;
use super::environment::{EnvironmentFactory, RenderEnvironment};
use super::evaluator::{Evaluation, UNDEFINED_OUTPUT};
use super::extension::FilterDefinition;
use super::manager::EnvironmentManager;
use super::parser::{ParseError, TemplateNode, parse_template};
use crate::error::ApplicationResult;
use crate::ports::{ModelStore, PluginSource};

static LOCATION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[Line (\d+), Column (\d+)\]").expect("valid regex"));

/// Options of a single render call.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Variables and metadata.
    pub context: RenderContext,
    /// Caller label reported in errors (for example `request.url`).
    pub path: Option<String>,
    /// Which constructs are evaluated.
    pub mode: RenderMode,
}

impl RenderOptions {
    /// Creates options rendering every construct against `context`.
    #[must_use]
    pub fn new(context: RenderContext) -> Self {
        Self {
            context,
            ..Self::default()
        }
    }

    /// Sets the caller path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the render mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }
}

struct EngineInner {
    factory: EnvironmentFactory,
    manager: EnvironmentManager,
    models: Option<Arc<dyn ModelStore>>,
}

/// Renders templates.
#[derive(Clone)]
pub struct RenderEngine {
    inner: Arc<EngineInner>,
}

impl fmt::Debug for RenderEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderEngine")
            .field("config", &self.inner.factory.config)
            .field("manager", &self.inner.manager)
            .field("has_plugins", &self.inner.factory.plugins.is_some())
            .field("has_models", &self.inner.models.is_some())
            .finish_non_exhaustive()
    }
}

/// Assembles a [`RenderEngine`].
#[derive(Default)]
pub struct RenderEngineBuilder {
    config: TemplatingConfig,
    plugins: Option<Arc<dyn PluginSource>>,
    default_filters: Vec<FilterDefinition>,
    models: Option<Arc<dyn ModelStore>>,
}

impl RenderEngineBuilder {
    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: TemplatingConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the plugin source consulted on every environment build.
    #[must_use]
    pub fn plugin_source(mut self, plugins: Arc<dyn PluginSource>) -> Self {
        self.plugins = Some(plugins);
        self
    }

    /// Adds default filters, registered after the core built-ins.
    #[must_use]
    pub fn default_filters(mut self, filters: impl IntoIterator<Item = FilterDefinition>) -> Self {
        self.default_filters.extend(filters);
        self
    }

    /// Sets the model store behind `util.models`.
    #[must_use]
    pub fn model_store(mut self, models: Arc<dyn ModelStore>) -> Self {
        self.models = Some(models);
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    /// Returns an error if the delimiter configuration is invalid.
    pub fn build(self) -> ApplicationResult<RenderEngine> {
        self.config.validate()?;
        Ok(RenderEngine {
            inner: Arc::new(EngineInner {
                factory: EnvironmentFactory {
                    config: self.config,
                    plugins: self.plugins,
                    default_filters: self.default_filters,
                },
                manager: EnvironmentManager::new(),
                models: self.models,
            }),
        })
    }
}

impl RenderEngine {
    /// Returns a builder with the default configuration.
    #[must_use]
    pub fn builder() -> RenderEngineBuilder {
        RenderEngineBuilder::default()
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &TemplatingConfig {
        &self.inner.factory.config
    }

    /// The environment cache.
    #[must_use]
    pub fn manager(&self) -> &EnvironmentManager {
        &self.inner.manager
    }

    pub(crate) fn model_store(&self) -> Option<Arc<dyn ModelStore>> {
        self.inner.models.clone()
    }

    /// Returns the environment for `mode`, building it if needed.
    ///
    /// # Errors
    /// Returns an error if the plugin source cannot be read.
    pub async fn environment(&self, mode: RenderMode) -> ApplicationResult<Arc<RenderEnvironment>> {
        let factory = &self.inner.factory;
        self.inner
            .manager
            .get_or_build(mode, || factory.build(mode))
            .await
    }

    /// Renders `text`.
    ///
    /// Undefined or null output is a failure, never an empty substitution.
    ///
    /// # Errors
    /// Returns a [`RenderError`] carrying the caller path, the location of the
    /// failing construct and whether the failure was an undefined output.
    pub async fn render(&self, text: &str, options: RenderOptions) -> Result<String, RenderError> {
        let RenderOptions {
            context,
            path,
            mode,
        } = options;

        self.render_at_depth(text, context, mode, 0)
            .await
            .map_err(|err| {
                let err = sanitize(err).with_path(path.unwrap_or_default());
                debug!(
                    path = %err.path,
                    line = err.location().line,
                    column = err.location().column,
                    reason = ?err.reason,
                    "Render failed: {}",
                    err.message
                );
                err
            })
    }

    /// Renders a fragment from inside a filter or tag, always in ALL mode.
    pub(crate) fn render_nested(
        &self,
        text: String,
        context: RenderContext,
        depth: usize,
    ) -> Pin<Box<dyn Future<Output = Result<String, RenderError>> + Send>> {
        let engine = self.clone();
        Box::pin(async move {
            let max = engine.config().max_render_depth;
            if depth > max {
                return Err(RenderError::render(format!(
                    "maximum render depth of {max} exceeded"
                )));
            }
            engine
                .render_at_depth(&text, context, RenderMode::All, depth)
                .await
        })
    }

    async fn render_at_depth(
        &self,
        text: &str,
        context: RenderContext,
        mode: RenderMode,
        depth: usize,
    ) -> Result<String, RenderError> {
        let environment = self
            .environment(mode)
            .await
            .map_err(|e| RenderError::render(e.to_string()))?;
        let nodes = parse_template(text, environment.syntax())?;
        let evaluation = Evaluation::new(&environment, self, Arc::new(context), depth);
        evaluation.validate(&nodes)?;
        evaluation.render(&nodes).await
    }

    /// Invalidates every cached environment. The next render rebuilds.
    pub fn reload(&self) {
        self.inner.manager.invalidate_all();
        info!("Template environments invalidated");
    }

    /// Lists non-deprecated tags of the ALL-mode environment by priority.
    ///
    /// # Errors
    /// Returns an error if the environment cannot be built.
    pub async fn tag_definitions(&self) -> ApplicationResult<Vec<TagDescriptor>> {
        let environment = self.environment(RenderMode::All).await?;
        Ok(environment
            .tags()
            .list_sorted()
            .into_iter()
            .map(|tag| tag.definition.descriptor(tag.priority))
            .collect())
    }

    /// Lists visible filters of the ALL-mode environment in registration order.
    ///
    /// # Errors
    /// Returns an error if the environment cannot be built.
    pub async fn filter_definitions(&self) -> ApplicationResult<Vec<FilterDescriptor>> {
        Ok(self.environment(RenderMode::All).await?.filters().descriptors())
    }

    /// Lists test predicate names of the ALL-mode environment.
    ///
    /// # Errors
    /// Returns an error if the environment cannot be built.
    pub async fn test_definitions(&self) -> ApplicationResult<Vec<String>> {
        Ok(self.environment(RenderMode::All).await?.tests().names().to_vec())
    }

    /// Lists filter applications of `expression` unknown to the ALL-mode environment.
    ///
    /// # Errors
    /// Returns an error if the environment cannot be built.
    pub async fn unmatched_filters(
        &self,
        expression: &ParsedVariable,
    ) -> ApplicationResult<Vec<FilterApplication>> {
        let environment = self.environment(RenderMode::All).await?;
        Ok(environment
            .filters()
            .unmatched(expression)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Parses `text` with the delimiters of `mode` without evaluating it.
    ///
    /// # Errors
    /// Returns the first unclosed or malformed construct.
    pub fn parse_template(&self, text: &str, mode: RenderMode) -> Result<Vec<TemplateNode>, ParseError> {
        parse_template(text, &self.config().syntax.for_mode(mode))
    }
}

/// Strips location noise from a message and classifies undefined output.
fn sanitize(mut err: RenderError) -> RenderError {
    let mut message = err.message.replace("(unknown path)", "");

    if let Some(captures) = LOCATION_MARKER.captures(&message) {
        if err.location.is_none() {
            let line = captures.get(1).and_then(|m| m.as_str().parse().ok());
            let column = captures.get(2).and_then(|m| m.as_str().parse().ok());
            if let (Some(line), Some(column)) = (line, column) {
                err.location = Some(Location::new(line, column));
            }
        }
        message = LOCATION_MARKER.replace_all(&message, "").into_owned();
    }

    let message = message.trim();
    let message = message.strip_prefix("Error:").unwrap_or(message).trim();
    if message.contains(UNDEFINED_OUTPUT) {
        err.reason = ErrorReason::Undefined;
    }
    err.message = message.to_string();
    err
}
