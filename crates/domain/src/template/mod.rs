//! Template data model.

mod definition;
mod error;
mod expression;
mod mode;
mod syntax;

pub use definition::{
    ArgDefinition, ArgHidePredicate, ArgOption, ArgType, ArgValidator, FilterDescriptor,
    TagAction, TagDescriptor,
};
pub use error::{ErrorReason, ErrorType, Location, RenderError};
pub use expression::{
    ArgumentValue, FilterApplication, ParsedExpression, ParsedVariable, PathSegment, Primitive,
    TagInvocation, TestClause, VariablePath, is_identifier,
};
pub use mode::RenderMode;
pub use syntax::{NEVER_MATCH_END, NEVER_MATCH_START, TemplateSyntax};
