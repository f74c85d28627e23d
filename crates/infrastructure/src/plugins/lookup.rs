//! Tags that read stored documents through `util.models`.

use tessera_application::templating::display_text;
use tessera_application::{ExtensionError, HelperContext, TagDefinition, TagRun};
use tessera_domain::ArgDefinition;

use crate::filters::{query_json_path, string_arg};

/// `{% response "req_123", "$.token" %}`
///
/// Reads the body of the newest response of a request usable in the active
/// environment, optionally narrowed with a JSON path.
#[must_use]
pub fn response_tag() -> TagDefinition {
    TagDefinition::new("response", TagRun::from_async(response))
        .with_display_name("Response")
        .with_description("Reference the body of another request's latest response")
        .with_arg(ArgDefinition::string("Request id").with_placeholder("req_..."))
        .with_arg(
            ArgDefinition::string("JSON path")
                .with_placeholder("$.data.token")
                .with_validate(|value| match value.as_str() {
                    Some(path) if !path.is_empty() && !path.starts_with('$') => {
                        Some("JSON path must start with '$'".to_string())
                    }
                    _ => None,
                }),
        )
}

async fn response(helper: HelperContext, raw: String) -> Result<String, ExtensionError> {
    let args = helper.resolve_arguments(&raw)?;
    let Some(request_id) = string_arg(&args, 0).filter(|id| !id.is_empty()) else {
        return Err(ExtensionError::new("no request specified"));
    };

    let models = helper.models();
    let Some(latest) = models.latest_response(&request_id).await? else {
        return Err(ExtensionError::new(format!(
            "no responses for request {request_id}"
        )));
    };
    let Some(bytes) = models.response_body(&latest.id).await? else {
        return Err(ExtensionError::new(format!(
            "response {} has no stored body",
            latest.id
        )));
    };
    let body = String::from_utf8_lossy(&bytes).into_owned();

    match string_arg(&args, 1).filter(|path| !path.is_empty()) {
        None => Ok(body),
        Some(path) => {
            let json: serde_json::Value = serde_json::from_str(&body)
                .map_err(|e| ExtensionError::new(format!("response body is not JSON: {e}")))?;
            let found = query_json_path(&json, &path).map_err(ExtensionError::new)?;
            display_text(&found)
                .ok_or_else(|| ExtensionError::new(format!("no match for path: {path}")))
        }
    }
}

/// `{% cookie "https://example.com", "session" %}`
#[must_use]
pub fn cookie_tag() -> TagDefinition {
    TagDefinition::new("cookie", TagRun::from_async(cookie))
        .with_display_name("Cookie")
        .with_description("Reference a cookie value from the workspace cookie jar")
        .with_arg(ArgDefinition::string("Cookie URL").with_placeholder("https://example.com"))
        .with_arg(ArgDefinition::string("Cookie name").with_placeholder("session"))
}

async fn cookie(helper: HelperContext, raw: String) -> Result<String, ExtensionError> {
    let args = helper.resolve_arguments(&raw)?;
    let url = string_arg(&args, 0).unwrap_or_default();
    let name = string_arg(&args, 1).unwrap_or_default();
    let Some(request_id) = helper.meta().request_id() else {
        return Err(ExtensionError::new("cookies are only available while rendering a request"));
    };

    let models = helper.models();
    let Some(workspace) = models.workspace_for_request(request_id).await? else {
        return Err(ExtensionError::new(format!(
            "no workspace found for request {request_id}"
        )));
    };
    let jar = models.cookie_jar_for_workspace(&workspace.id).await?;
    jar.value_for(&url, &name)
        .map(ToString::to_string)
        .ok_or_else(|| ExtensionError::new(format!("no cookie with name \"{name}\" for {url}")))
}
