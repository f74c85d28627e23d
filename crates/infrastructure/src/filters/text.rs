//! String search-and-replace and URI component transforms.

use regex::Regex;
use serde_json::Value;
use tessera_application::{ExtensionError, FilterDefinition, FilterRun};
use tessera_domain::ArgDefinition;

use super::{string_arg, text_of};

/// `value | string_replace("a", "b", "text")`
#[must_use]
pub fn string_replace_filter() -> FilterDefinition {
    FilterDefinition::new(
        "string_replace",
        FilterRun::sync(|_, input, args| {
            let text = text_of(&input);
            let search = string_arg(&args, 0).unwrap_or_default();
            let replacement = string_arg(&args, 1).unwrap_or_default();
            let mode = string_arg(&args, 2).unwrap_or_else(|| "text".to_string());
            replace(&text, &search, &replacement, &mode).map(Value::String)
        }),
    )
    .with_display_name("String replace")
    .with_description("Replace every occurrence of a string or pattern")
    .with_arg(ArgDefinition::string("Search").with_placeholder("Text or pattern to find"))
    .with_arg(ArgDefinition::string("Replacement"))
    .with_arg(ArgDefinition::enumeration(
        "Mode",
        &[("Plain text", "text"), ("Regular expression", "regex")],
    ))
}

fn replace(text: &str, search: &str, replacement: &str, mode: &str) -> Result<String, ExtensionError> {
    match mode {
        "text" if search.is_empty() => Ok(text.to_string()),
        "text" => Ok(text.replace(search, replacement)),
        "regex" => {
            let pattern = Regex::new(search)
                .map_err(|e| ExtensionError::new(format!("invalid pattern: {e}")))?;
            Ok(pattern.replace_all(text, replacement).into_owned())
        }
        other => Err(ExtensionError::new(format!("unknown replace mode: {other}"))),
    }
}

/// `value | uri("encode")`
#[must_use]
pub fn uri_filter() -> FilterDefinition {
    FilterDefinition::new(
        "uri",
        FilterRun::sync(|_, input, args| {
            let text = text_of(&input);
            match string_arg(&args, 0).as_deref().unwrap_or("encode") {
                "encode" => Ok(Value::String(urlencoding::encode(&text).into_owned())),
                "decode" => urlencoding::decode(&text)
                    .map(|decoded| Value::String(decoded.into_owned()))
                    .map_err(|e| ExtensionError::new(format!("invalid URI component: {e}"))),
                other => Err(ExtensionError::new(format!("unknown URI operation: {other}"))),
            }
        }),
    )
    .with_display_name("URI component")
    .with_description("Encode or decode a URI component")
    .with_arg(ArgDefinition::enumeration(
        "Operation",
        &[("Encode", "encode"), ("Decode", "decode")],
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tessera_application::HelperContext;

    fn run(filter: &FilterDefinition, input: Value, args: Vec<Value>) -> Result<Value, ExtensionError> {
        let FilterRun::Sync(f) = &filter.run else {
            panic!("expected a sync filter");
        };
        f(&HelperContext::detached(), input, args)
    }

    #[test]
    fn test_plain_replace_all() {
        assert_eq!(replace("a-b-c", "-", "+", "text").unwrap(), "a+b+c");
        assert_eq!(replace("abc", "", "x", "text").unwrap(), "abc");
    }

    #[test]
    fn test_regex_replace_with_groups() {
        assert_eq!(
            replace("2024-01-31", r"(\d+)-(\d+)-(\d+)", "$3/$2/$1", "regex").unwrap(),
            "31/01/2024"
        );
        assert!(replace("x", "(", "", "regex").is_err());
        assert!(replace("x", "x", "", "glob").is_err());
    }

    #[test]
    fn test_replace_filter_stringifies_input() {
        let result = run(&string_replace_filter(), json!(1001), vec![json!("0"), json!("_")]).unwrap();
        assert_eq!(result, json!("1__1"));
    }

    #[test]
    fn test_uri_round_trip() {
        let filter = uri_filter();
        let encoded = run(&filter, json!("a b&c/é"), vec![json!("encode")]).unwrap();
        assert_eq!(encoded, json!("a%20b%26c%2F%C3%A9"));
        let decoded = run(&filter, encoded, vec![json!("decode")]).unwrap();
        assert_eq!(decoded, json!("a b&c/é"));
        assert!(run(&filter, json!("x"), vec![json!("rot13")]).is_err());
    }
}
