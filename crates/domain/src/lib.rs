//! Tessera Domain - Core template and model types
//!
//! This crate defines the data model of the template rendering pipeline:
//! parsed expressions, render modes, delimiter syntax, definition metadata,
//! the render error shape, and the documents templates can read.
//! All types here are pure Rust with no I/O dependencies.

pub mod config;
pub mod cookie;
pub mod error;
pub mod id;
pub mod model;
pub mod template;
pub mod token;

pub use config::{DEFAULT_IGNORED_PLUGINS, DEFAULT_MAX_RENDER_DEPTH, TemplatingConfig};
pub use cookie::{Cookie, CookieJar};
pub use error::{DomainError, DomainResult};
pub use id::generate_id;
pub use model::{
    Environment, ModelDoc, ModelKind, Request, RequestGroup, RequestHeader, Response, Workspace,
    merge_environments,
};
pub use template::{
    ArgDefinition, ArgType, ArgumentValue, ErrorReason, ErrorType, FilterApplication,
    FilterDescriptor, Location, ParsedExpression, ParsedVariable, PathSegment, Primitive,
    RenderError, RenderMode, TagAction, TagDescriptor, TagInvocation, TemplateSyntax, TestClause,
    VariablePath,
};
pub use token::OAuth2Token;
