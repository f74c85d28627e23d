//! Render context
//!
//! A [`RenderContext`] is built fresh for every render call and never mutated
//! afterwards. Filters and tags see it through a [`HelperContext`], which adds
//! metadata, model lookups and a way to render nested fragments.

use std::sync::Arc;

use serde_json::{Map, Value};
use tessera_domain::{
    ArgumentValue, CookieJar, Environment, ModelDoc, ModelKind, OAuth2Token, PathSegment,
    RenderError, Request, Response, VariablePath, Workspace, merge_environments,
};

use super::engine::RenderEngine;
use super::extension::ExtensionError;
use super::parser::parse_arguments;
use crate::ports::{ModelError, ModelStore, PluginInfo};

/// Key under which the variables are duplicated for dashed-name access.
pub const ALIAS_KEY: &str = "_";

/// Environment id reported when the render has none.
pub const NO_ENVIRONMENT: &str = "n/a";

/// Render-time metadata attached by the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderMeta {
    /// Active environment.
    pub environment_id: Option<String>,
    /// Why the render happens (for example `send` or `preview`).
    pub purpose: Option<String>,
    /// Any other entries, such as `requestId`.
    pub extra: Map<String, Value>,
}

impl RenderMeta {
    /// Returns the metadata as the object filters see as `meta`.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        map.insert(
            "environmentId".to_string(),
            Value::String(
                self.environment_id
                    .clone()
                    .unwrap_or_else(|| NO_ENVIRONMENT.to_string()),
            ),
        );
        map.insert(
            "purpose".to_string(),
            self.purpose.clone().map_or(Value::Null, Value::String),
        );
        Value::Object(map)
    }

    /// Returns the `requestId` entry, if set.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.extra.get("requestId").and_then(Value::as_str)
    }
}

/// The variable namespace of one render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    variables: Map<String, Value>,
    scope: Value,
    meta: RenderMeta,
}

impl RenderContext {
    /// Creates a context from a variable map with empty metadata.
    #[must_use]
    pub fn new(variables: Map<String, Value>) -> Self {
        Self::with_meta(variables, RenderMeta::default())
    }

    fn with_meta(variables: Map<String, Value>, meta: RenderMeta) -> Self {
        let mut scope = variables.clone();
        scope.insert(ALIAS_KEY.to_string(), Value::Object(variables.clone()));
        Self {
            variables,
            scope: Value::Object(scope),
            meta,
        }
    }

    /// Creates an empty context.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Map::new())
    }

    /// Returns a builder.
    #[must_use]
    pub fn builder() -> RenderContextBuilder {
        RenderContextBuilder::default()
    }

    /// Caller-supplied variables, without the alias.
    #[must_use]
    pub const fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    /// The templating scope: variables plus the `_` alias.
    #[must_use]
    pub const fn scope(&self) -> &Value {
        &self.scope
    }

    /// Render-time metadata.
    #[must_use]
    pub const fn meta(&self) -> &RenderMeta {
        &self.meta
    }

    /// Resolves a path against the scope.
    #[must_use]
    pub fn lookup(&self, path: &VariablePath) -> Option<&Value> {
        path.segments()
            .iter()
            .try_fold(&self.scope, |current, segment| match (segment, current) {
                (PathSegment::Key(key), Value::Object(map)) => map.get(key),
                (PathSegment::Index(index), Value::Array(items)) => items.get(*index),
                (PathSegment::Key(key), Value::Array(items)) => {
                    key.parse::<usize>().ok().and_then(|i| items.get(i))
                }
                _ => None,
            })
            .filter(|value| !value.is_null())
    }

    /// Resolves an argument. Missing variables resolve to `null`.
    #[must_use]
    pub fn resolve_argument(&self, argument: &ArgumentValue) -> Value {
        match argument {
            ArgumentValue::Literal { value } => value.to_value(),
            ArgumentValue::Variable { name } => self.lookup(name).cloned().unwrap_or(Value::Null),
        }
    }

    /// Returns a copy with `extra` layered over the variables.
    #[must_use]
    pub fn merged(&self, extra: &Map<String, Value>) -> Self {
        let mut variables = self.variables.clone();
        for (key, value) in extra {
            variables.insert(key.clone(), value.clone());
        }
        Self::with_meta(variables, self.meta.clone())
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::empty()
    }
}

/// Assembles a [`RenderContext`].
#[derive(Debug, Clone, Default)]
pub struct RenderContextBuilder {
    variables: Map<String, Value>,
    environments: Vec<Environment>,
    meta: RenderMeta,
}

impl RenderContextBuilder {
    /// Adds caller variables; they override environment values.
    #[must_use]
    pub fn variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables.extend(variables);
        self
    }

    /// Sets one caller variable.
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    /// Adds an environment. Later environments override earlier ones.
    #[must_use]
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environments.push(environment);
        self
    }

    /// Sets the active environment id.
    #[must_use]
    pub fn environment_id(mut self, id: impl Into<String>) -> Self {
        self.meta.environment_id = Some(id.into());
        self
    }

    /// Sets the render purpose.
    #[must_use]
    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.meta.purpose = Some(purpose.into());
        self
    }

    /// Attaches a metadata entry.
    #[must_use]
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.extra.insert(key.into(), value.into());
        self
    }

    /// Builds the context.
    ///
    /// Without an explicit environment id, the last environment's id is used.
    #[must_use]
    pub fn build(self) -> RenderContext {
        let mut variables = merge_environments(&self.environments);
        variables.extend(self.variables);

        let mut meta = self.meta;
        if meta.environment_id.is_none() {
            meta.environment_id = self.environments.last().map(|e| e.id.clone());
        }
        RenderContext::with_meta(variables, meta)
    }
}

/// Read-only model lookups available to filters and tags.
#[derive(Clone, Default)]
pub struct ModelAccessors {
    store: Option<Arc<dyn ModelStore>>,
    environment_id: Option<String>,
}

impl ModelAccessors {
    /// Creates accessors over a store, scoped to an environment.
    #[must_use]
    pub fn new(store: Option<Arc<dyn ModelStore>>, environment_id: Option<String>) -> Self {
        Self {
            store,
            environment_id,
        }
    }

    fn store(&self) -> Result<&dyn ModelStore, ModelError> {
        self.store
            .as_deref()
            .ok_or_else(|| ModelError::Store("no model store configured".to_string()))
    }

    /// Looks up a request.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn request_by_id(&self, id: &str) -> Result<Option<Request>, ModelError> {
        self.store()?.request_by_id(id).await
    }

    /// Returns the request groups and workspace above a request, nearest first.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn request_ancestors(&self, request_id: &str) -> Result<Vec<ModelDoc>, ModelError> {
        let chain = self.store()?.with_ancestors(request_id).await?;
        Ok(chain
            .into_iter()
            .filter(|doc| doc.id() != request_id)
            .filter(|doc| matches!(doc.kind(), ModelKind::RequestGroup | ModelKind::Workspace))
            .collect())
    }

    /// Returns the workspace a request belongs to.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn workspace_for_request(
        &self,
        request_id: &str,
    ) -> Result<Option<Workspace>, ModelError> {
        Ok(self
            .request_ancestors(request_id)
            .await?
            .into_iter()
            .find_map(|doc| match doc {
                ModelDoc::Workspace(workspace) => Some(workspace),
                ModelDoc::Request(_) | ModelDoc::RequestGroup(_) => None,
            }))
    }

    /// Looks up a workspace.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn workspace_by_id(&self, id: &str) -> Result<Option<Workspace>, ModelError> {
        self.store()?.workspace_by_id(id).await
    }

    /// Looks up the `OAuth2` token of a request.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn oauth2_token_by_request_id(
        &self,
        request_id: &str,
    ) -> Result<Option<OAuth2Token>, ModelError> {
        self.store()?.oauth2_token_by_parent_id(request_id).await
    }

    /// Returns the cookie jar of a workspace, creating it if needed.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn cookie_jar_for_workspace(&self, workspace_id: &str) -> Result<CookieJar, ModelError> {
        self.store()?.cookie_jar_for_workspace(workspace_id).await
    }

    /// Lists the responses of a request usable in the active environment.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn available_responses(&self, request_id: &str) -> Result<Vec<Response>, ModelError> {
        self.store()?
            .responses_for_request(request_id, self.environment_id.as_deref())
            .await
    }

    /// Returns the newest usable response of a request.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn latest_response(&self, request_id: &str) -> Result<Option<Response>, ModelError> {
        self.store()?
            .latest_response_for_request(request_id, self.environment_id.as_deref())
            .await
    }

    /// Returns the body bytes of a response.
    ///
    /// # Errors
    /// Returns an error if the store fails.
    pub async fn response_body(&self, response_id: &str) -> Result<Option<Vec<u8>>, ModelError> {
        self.store()?.response_body(response_id).await
    }
}

impl std::fmt::Debug for ModelAccessors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelAccessors")
            .field("store", &self.store.is_some())
            .field("environment_id", &self.environment_id)
            .finish()
    }
}

/// What a filter or tag receives alongside its input.
#[derive(Clone, Debug)]
pub struct HelperContext {
    context: Arc<RenderContext>,
    plugin: Option<PluginInfo>,
    models: ModelAccessors,
    engine: Option<RenderEngine>,
    depth: usize,
}

impl HelperContext {
    pub(crate) fn new(
        context: Arc<RenderContext>,
        plugin: Option<PluginInfo>,
        engine: RenderEngine,
        depth: usize,
    ) -> Self {
        let models = ModelAccessors::new(
            engine.model_store(),
            context.meta().environment_id.clone(),
        );
        Self {
            context,
            plugin,
            models,
            engine: Some(engine),
            depth,
        }
    }

    /// A helper with an empty context, no models and no nested rendering.
    ///
    /// Useful for calling filters outside a render.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            context: Arc::new(RenderContext::empty()),
            plugin: None,
            models: ModelAccessors::default(),
            engine: None,
            depth: 0,
        }
    }

    /// Metadata attached to the render.
    #[must_use]
    pub fn meta(&self) -> &RenderMeta {
        self.context.meta()
    }

    /// The render's variables.
    #[must_use]
    pub fn variables(&self) -> &Map<String, Value> {
        self.context.variables()
    }

    /// The full render context.
    #[must_use]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// The plugin owning the running filter or tag, if any.
    #[must_use]
    pub const fn plugin(&self) -> Option<&PluginInfo> {
        self.plugin.as_ref()
    }

    /// Model lookups.
    #[must_use]
    pub const fn models(&self) -> &ModelAccessors {
        &self.models
    }

    /// Nesting depth of the render this helper belongs to.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Parses raw tag arguments and resolves them against the context.
    ///
    /// # Errors
    /// Returns an error if the argument text is malformed.
    pub fn resolve_arguments(&self, raw: &str) -> Result<Vec<Value>, ExtensionError> {
        let arguments =
            parse_arguments(raw).map_err(|e| ExtensionError::new(format!("invalid arguments: {e}")))?;
        Ok(arguments
            .iter()
            .map(|argument| self.context.resolve_argument(argument))
            .collect())
    }

    /// Renders a fragment in ALL mode against this context merged with `extra`.
    ///
    /// # Errors
    /// Returns the nested render's error, or a depth error past the configured limit.
    pub async fn render(
        &self,
        fragment: &str,
        extra: Option<&Map<String, Value>>,
    ) -> Result<String, RenderError> {
        let Some(engine) = &self.engine else {
            return Err(RenderError::render("nested rendering is not available"));
        };
        let context = extra.map_or_else(|| (*self.context).clone(), |extra| self.context.merged(extra));
        engine
            .render_nested(fragment.to_string(), context, self.depth + 1)
            .await
    }
}
