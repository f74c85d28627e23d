//! Access to the request being rendered.

use serde_json::Value;
use tessera_application::{ExtensionError, FilterDefinition, FilterRun, HelperContext};

/// Key under which `currentRequest` keeps the filter input.
pub const PREVIOUS_VALUE_KEY: &str = "__previousValue";

/// `value | currentRequest`
///
/// Looks up the request named by `meta.requestId` and returns it as an
/// object, with the upstream value stored under `__previousValue`.
#[must_use]
pub fn current_request_filter() -> FilterDefinition {
    FilterDefinition::new("currentRequest", FilterRun::from_async(current_request))
        .with_display_name("Get current request")
        .with_description("Replace the value with the request being rendered")
}

async fn current_request(
    helper: HelperContext,
    input: Value,
    _args: Vec<Value>,
) -> Result<Value, ExtensionError> {
    let Some(request_id) = helper.meta().request_id() else {
        return Err(ExtensionError::undefined("no request is being rendered"));
    };
    let Some(request) = helper.models().request_by_id(request_id).await? else {
        return Err(ExtensionError::undefined(format!(
            "request not found: {request_id}"
        )));
    };

    let mut value =
        serde_json::to_value(&request).map_err(|e| ExtensionError::new(e.to_string()))?;
    if let Value::Object(fields) = &mut value {
        fields.insert(PREVIOUS_VALUE_KEY.to_string(), input);
    }
    Ok(value)
}
