//! Filter and tag definitions
//!
//! A definition is a plain capability record: identity, argument schema and a
//! `run` function stored by value. The function is either synchronous or
//! returns a boxed future, and the registries never need to know which.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tessera_domain::{
    ArgDefinition, ErrorReason, FilterDescriptor, RenderError, TagAction, TagDescriptor,
};
use thiserror::Error;

use super::context::HelperContext;
use crate::ports::ModelError;

/// Failure raised by a filter or tag body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ExtensionError {
    /// Human-readable message.
    pub message: String,
    /// Undefined-output or generic failure.
    pub reason: ErrorReason,
}

impl ExtensionError {
    /// Creates a generic failure.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reason: ErrorReason::Error,
        }
    }

    /// Creates a failure for a value that is unexpectedly missing.
    #[must_use]
    pub fn undefined(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reason: ErrorReason::Undefined,
        }
    }
}

impl From<RenderError> for ExtensionError {
    fn from(err: RenderError) -> Self {
        Self {
            message: err.message,
            reason: err.reason,
        }
    }
}

impl From<ModelError> for ExtensionError {
    fn from(err: ModelError) -> Self {
        Self::new(err.to_string())
    }
}

/// Boxed future returned by asynchronous filters and tags.
pub type ExtensionFuture<T> = Pin<Box<dyn Future<Output = Result<T, ExtensionError>> + Send>>;

type SyncFilterFn =
    dyn Fn(&HelperContext, Value, Vec<Value>) -> Result<Value, ExtensionError> + Send + Sync;
type AsyncFilterFn = dyn Fn(HelperContext, Value, Vec<Value>) -> ExtensionFuture<Value> + Send + Sync;
type SyncTagFn = dyn Fn(&HelperContext, &str) -> Result<String, ExtensionError> + Send + Sync;
type AsyncTagFn = dyn Fn(HelperContext, String) -> ExtensionFuture<String> + Send + Sync;

/// The `run` function of a filter.
///
/// Receives the helper context, the upstream value and the resolved arguments.
#[derive(Clone)]
pub enum FilterRun {
    /// Completes immediately.
    Sync(Arc<SyncFilterFn>),
    /// Suspends; the engine awaits it before the next filter runs.
    Async(Arc<AsyncFilterFn>),
}

impl FilterRun {
    /// Wraps a synchronous function.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&HelperContext, Value, Vec<Value>) -> Result<Value, ExtensionError>
            + Send
            + Sync
            + 'static,
    {
        Self::Sync(Arc::new(f))
    }

    /// Wraps an asynchronous function.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(HelperContext, Value, Vec<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ExtensionError>> + Send + 'static,
    {
        Self::Async(Arc::new(move |helper, input, args| Box::pin(f(helper, input, args))))
    }

    /// Runs the filter to completion.
    ///
    /// # Errors
    /// Returns whatever the filter body fails with.
    pub async fn call(
        &self,
        helper: &HelperContext,
        input: Value,
        args: Vec<Value>,
    ) -> Result<Value, ExtensionError> {
        match self {
            Self::Sync(f) => f(helper, input, args),
            Self::Async(f) => f(helper.clone(), input, args).await,
        }
    }
}

impl fmt::Debug for FilterRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("FilterRun::Sync"),
            Self::Async(_) => f.write_str("FilterRun::Async"),
        }
    }
}

/// The `run` function of a tag.
///
/// Receives the helper context and the raw, unparsed argument text.
#[derive(Clone)]
pub enum TagRun {
    /// Completes immediately.
    Sync(Arc<SyncTagFn>),
    /// Suspends; the engine awaits it before continuing.
    Async(Arc<AsyncTagFn>),
}

impl TagRun {
    /// Wraps a synchronous function.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&HelperContext, &str) -> Result<String, ExtensionError> + Send + Sync + 'static,
    {
        Self::Sync(Arc::new(f))
    }

    /// Wraps an asynchronous function.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn(HelperContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ExtensionError>> + Send + 'static,
    {
        Self::Async(Arc::new(move |helper, raw| Box::pin(f(helper, raw))))
    }

    /// Runs the tag to completion.
    ///
    /// # Errors
    /// Returns whatever the tag body fails with.
    pub async fn call(&self, helper: &HelperContext, raw_args: &str) -> Result<String, ExtensionError> {
        match self {
            Self::Sync(f) => f(helper, raw_args),
            Self::Async(f) => f(helper.clone(), raw_args.to_string()).await,
        }
    }
}

impl fmt::Debug for TagRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("TagRun::Sync"),
            Self::Async(_) => f.write_str("TagRun::Async"),
        }
    }
}

/// A named, chainable value transformation.
#[derive(Debug, Clone)]
pub struct FilterDefinition {
    /// Name used in templates; unique per environment.
    pub name: String,
    /// Label shown in pickers.
    pub display_name: String,
    /// Help text.
    pub description: String,
    /// Positional argument schema.
    pub args: Vec<ArgDefinition>,
    /// Excluded from listings while staying usable.
    pub hidden: bool,
    /// The transformation.
    pub run: FilterRun,
}

impl FilterDefinition {
    /// Creates a filter whose display name is its name.
    #[must_use]
    pub fn new(name: impl Into<String>, run: FilterRun) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            description: String::new(),
            args: Vec::new(),
            hidden: false,
            run,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends an argument to the schema.
    #[must_use]
    pub fn with_arg(mut self, arg: ArgDefinition) -> Self {
        self.args.push(arg);
        self
    }

    /// Hides the filter from listings.
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Builds the introspection record.
    #[must_use]
    pub fn descriptor(&self, is_plugin: bool) -> FilterDescriptor {
        FilterDescriptor {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            description: self.description.clone(),
            args: self.args.clone(),
            is_plugin,
        }
    }
}

/// A `{% name args %}` extension.
#[derive(Debug, Clone)]
pub struct TagDefinition {
    /// Tag keyword.
    pub name: String,
    /// Label shown in pickers.
    pub display_name: String,
    /// Label template shown while previewing.
    pub live_display_name: Option<String>,
    /// Help text.
    pub description: String,
    /// Explicit listing priority; `None` or `0` means declaration order.
    pub priority: Option<i64>,
    /// Hidden from listings, still invocable.
    pub deprecated: bool,
    /// Disables live preview in editors.
    pub disable_preview: bool,
    /// Positional argument schema.
    pub args: Vec<ArgDefinition>,
    /// Editor actions.
    pub actions: Vec<TagAction>,
    /// The evaluation behavior.
    pub run: TagRun,
}

impl TagDefinition {
    /// Creates a tag whose display name is its keyword.
    #[must_use]
    pub fn new(name: impl Into<String>, run: TagRun) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            live_display_name: None,
            description: String::new(),
            priority: None,
            deprecated: false,
            disable_preview: false,
            args: Vec::new(),
            actions: Vec::new(),
            run,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets an explicit priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Marks the tag as deprecated.
    #[must_use]
    pub const fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Appends an argument to the schema.
    #[must_use]
    pub fn with_arg(mut self, arg: ArgDefinition) -> Self {
        self.args.push(arg);
        self
    }

    /// Appends an editor action.
    #[must_use]
    pub fn with_action(mut self, name: impl Into<String>, icon: Option<&str>) -> Self {
        self.actions.push(TagAction {
            name: name.into(),
            icon: icon.map(ToString::to_string),
        });
        self
    }

    /// Builds the introspection record with the resolved priority.
    #[must_use]
    pub fn descriptor(&self, priority: i64) -> TagDescriptor {
        TagDescriptor {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            live_display_name: self.live_display_name.clone(),
            description: self.description.clone(),
            disable_preview: self.disable_preview,
            priority,
            args: self.args.clone(),
            actions: self.actions.clone(),
        }
    }
}
