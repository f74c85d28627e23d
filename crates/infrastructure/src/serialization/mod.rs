//! Deterministic JSON serialization for configuration and snapshot files.
//!
//! Written files use 2-space indentation and end with a newline so they
//! diff cleanly under version control.

mod json;

pub use json::*;
