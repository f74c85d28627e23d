//! Template rendering pipeline
//!
//! Parsing, registries, render context, cached environments and the engine
//! that ties them together.

mod builtins;
mod context;
mod engine;
mod environment;
mod evaluator;
mod extension;
mod filter_registry;
mod lexer;
mod manager;
mod parser;
mod predicates;
mod tag_registry;

pub use builtins::{BuiltinFilters, display_text};
pub use context::{
    ALIAS_KEY, HelperContext, ModelAccessors, NO_ENVIRONMENT, RenderContext, RenderContextBuilder,
    RenderMeta,
};
pub use engine::{RenderEngine, RenderEngineBuilder, RenderOptions};
pub use environment::RenderEnvironment;
pub use evaluator::UNDEFINED_OUTPUT;
pub use extension::{
    ExtensionError, ExtensionFuture, FilterDefinition, FilterRun, TagDefinition, TagRun,
};
pub use filter_registry::{FilterOrigin, FilterRegistry, RegisteredFilter, RegistrationConflict};
pub use lexer::{Token, tokenize};
pub use manager::EnvironmentManager;
pub use parser::{
    ParseError, TemplateNode, parse_arguments, parse_expression, parse_path, parse_tag,
    parse_template, parse_variable_and_filter,
};
pub use predicates::{TestFn, TestRegistry, is_truthy};
pub use tag_registry::{PRIORITY_STEP, RegisteredTag, TagRegistry};
