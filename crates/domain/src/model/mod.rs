//! Documents read through the model collaborator.
//!
//! The rendering pipeline never writes these; the store that owns them sits
//! behind the `ModelStore` port in the application crate.

mod environment;
mod request;
mod response;
mod workspace;

pub use environment::{Environment, merge_environments};
pub use request::{ModelDoc, ModelKind, Request, RequestGroup, RequestHeader};
pub use response::Response;
pub use workspace::Workspace;
