//! Default template filters.
//!
//! Every adapter here is a plain [`FilterDefinition`]. String inputs that
//! carry JSON are decoded first, so `'{"a":1}' | jmespath("a")` and
//! `obj | jmespath("a")` produce the same value.

mod json;
mod number;
mod query;
mod request;
mod text;
mod xml;

use serde_json::Value;
use tessera_application::templating::display_text;
use tessera_application::{ExtensionError, FilterDefinition};

pub use json::{JsonDiff, diff_values, json_diff_filter, json_parse_filter};
pub use number::number_filter;
pub use query::{jmespath_filter, json_path_filter, query_json_path};
pub use request::current_request_filter;
pub use text::{string_replace_filter, uri_filter};
pub use xml::{xml_to_json, xml_to_json_filter};

/// Returns the filters registered in every environment after the core built-ins.
#[must_use]
pub fn default_filters() -> Vec<FilterDefinition> {
    vec![
        jmespath_filter(),
        json_parse_filter(),
        json_diff_filter(),
        json_path_filter(),
        xml_to_json_filter(),
        number_filter(),
        uri_filter(),
        string_replace_filter(),
        current_request_filter(),
    ]
}

/// Decodes JSON carried in a string; other values pass through untouched.
pub(crate) fn decode_json(value: Value) -> Result<Value, ExtensionError> {
    match value {
        Value::String(text) => serde_json::from_str(&text)
            .map_err(|e| ExtensionError::new(format!("invalid JSON input: {e}"))),
        other => Ok(other),
    }
}

/// The textual form of an argument or input; `null` becomes empty.
pub(crate) fn text_of(value: &Value) -> String {
    display_text(value).unwrap_or_default()
}

/// A string argument, treating a missing or `null` one as absent.
pub(crate) fn string_arg(args: &[Value], index: usize) -> Option<String> {
    args.get(index)
        .filter(|v| !v.is_null())
        .map(text_of)
}
