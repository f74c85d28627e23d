//! Core built-in filters
//!
//! The small set of general-purpose filters every environment registers
//! before default adapters and plugin filters.

use serde_json::{Number, Value};
use tessera_domain::{ArgDefinition, ArgType};

use super::extension::{ExtensionError, FilterDefinition, FilterRun};
use super::predicates::is_truthy;

/// Provides the core filters.
pub struct BuiltinFilters;

impl BuiltinFilters {
    /// Returns every core filter in registration order.
    #[must_use]
    pub fn all() -> Vec<FilterDefinition> {
        vec![
            text_filter("upper", "Uppercase", str::to_uppercase),
            text_filter("lower", "Lowercase", str::to_lowercase),
            text_filter("capitalize", "Capitalize", capitalize),
            text_filter("title", "Title Case", title_case),
            text_filter("trim", "Trim", |s| s.trim().to_string()),
            FilterDefinition::new("length", FilterRun::sync(|_, v, _| Ok(length(&v))))
                .with_display_name("Length")
                .with_description("Number of characters, items or keys"),
            FilterDefinition::new("default", FilterRun::sync(|_, v, args| Ok(default(v, &args))))
                .with_display_name("Default")
                .with_description("Fallback for a missing value")
                .with_arg(ArgDefinition::string("Fallback"))
                .with_arg(
                    ArgDefinition::new("Also replace falsy", ArgType::Boolean).with_default(false),
                ),
            FilterDefinition::new("join", FilterRun::sync(|_, v, args| join(&v, &args)))
                .with_display_name("Join")
                .with_arg(ArgDefinition::string("Separator")),
            FilterDefinition::new("first", FilterRun::sync(|_, v, _| Ok(first_or_last(v, true))))
                .with_display_name("First"),
            FilterDefinition::new("last", FilterRun::sync(|_, v, _| Ok(first_or_last(v, false))))
                .with_display_name("Last"),
            FilterDefinition::new("reverse", FilterRun::sync(|_, v, _| Ok(reverse(v))))
                .with_display_name("Reverse"),
            FilterDefinition::new("replace", FilterRun::sync(|_, v, args| Ok(replace(v, &args))))
                .with_display_name("Replace")
                .with_arg(ArgDefinition::string("Search"))
                .with_arg(ArgDefinition::string("Replacement"))
                .with_arg(ArgDefinition::number("Max count")),
            FilterDefinition::new(
                "urlencode",
                FilterRun::sync(|_, v, _| {
                    Ok(display_text(&v).map_or(Value::Null, |s| {
                        Value::String(urlencoding::encode(&s).into_owned())
                    }))
                }),
            )
            .with_display_name("URL Encode"),
            FilterDefinition::new("dump", FilterRun::sync(|_, v, args| dump(&v, &args)))
                .with_display_name("Dump JSON")
                .with_arg(ArgDefinition::number("Indent")),
            FilterDefinition::new("int", FilterRun::sync(|_, v, args| Ok(to_int(&v, &args))))
                .with_display_name("Integer")
                .with_arg(ArgDefinition::number("Fallback")),
            FilterDefinition::new("float", FilterRun::sync(|_, v, args| Ok(to_float(&v, &args))))
                .with_display_name("Float")
                .with_arg(ArgDefinition::number("Fallback")),
            FilterDefinition::new("abs", FilterRun::sync(|_, v, _| abs(&v)))
                .with_display_name("Absolute"),
            FilterDefinition::new("round", FilterRun::sync(|_, v, args| round(&v, &args)))
                .with_display_name("Round")
                .with_arg(ArgDefinition::number("Precision"))
                .with_arg(ArgDefinition::enumeration(
                    "Method",
                    &[("Common", "common"), ("Ceil", "ceil"), ("Floor", "floor")],
                )),
            FilterDefinition::new(
                "string",
                FilterRun::sync(|_, v, _| Ok(display_text(&v).map_or(Value::Null, Value::String))),
            )
            .with_display_name("String"),
            FilterDefinition::new("debug", FilterRun::sync(|_, v, _| Ok(v)))
                .with_description("Returns its input unchanged"),
        ]
    }
}

/// Renders a value the way it appears in template output.
///
/// Strings are verbatim, other scalars and containers use their compact JSON
/// form. `null` has no text form.
#[must_use]
pub fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn text_filter(name: &str, display_name: &str, f: fn(&str) -> String) -> FilterDefinition {
    FilterDefinition::new(
        name,
        FilterRun::sync(move |_, v, _| {
            Ok(display_text(&v).map_or(Value::Null, |s| Value::String(f(&s))))
        }),
    )
    .with_display_name(display_name)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
    })
}

fn title_case(s: &str) -> String {
    s.split(' ').map(capitalize).collect::<Vec<_>>().join(" ")
}

fn length(value: &Value) -> Value {
    let len = match value {
        Value::String(s) => s.chars().count(),
        Value::Array(a) => a.len(),
        Value::Object(o) => o.len(),
        _ => 0,
    };
    Value::from(len)
}

fn default(value: Value, args: &[Value]) -> Value {
    let fallback = args.first().cloned().unwrap_or(Value::Null);
    let falsy_too = args.get(1).is_some_and(is_truthy);
    if value.is_null() || (falsy_too && !is_truthy(&value)) {
        fallback
    } else {
        value
    }
}

fn join(value: &Value, args: &[Value]) -> Result<Value, ExtensionError> {
    let separator = args.first().and_then(Value::as_str).unwrap_or("");
    let Value::Array(items) = value else {
        return Err(ExtensionError::new("join expects an array"));
    };
    let parts: Vec<String> = items.iter().map(|v| display_text(v).unwrap_or_default()).collect();
    Ok(Value::String(parts.join(separator)))
}

fn first_or_last(value: Value, first: bool) -> Value {
    match value {
        Value::Array(items) => {
            let item = if first { items.into_iter().next() } else { items.into_iter().last() };
            item.unwrap_or(Value::Null)
        }
        Value::String(s) => {
            let ch = if first { s.chars().next() } else { s.chars().last() };
            ch.map_or(Value::Null, |c| Value::String(c.to_string()))
        }
        _ => Value::Null,
    }
}

fn reverse(value: Value) -> Value {
    match value {
        Value::Array(mut items) => {
            items.reverse();
            Value::Array(items)
        }
        Value::String(s) => Value::String(s.chars().rev().collect()),
        other => other,
    }
}

fn replace(value: Value, args: &[Value]) -> Value {
    let Some(text) = display_text(&value) else {
        return Value::Null;
    };
    let search = args.first().and_then(display_text).unwrap_or_default();
    let replacement = args.get(1).and_then(display_text).unwrap_or_default();
    let max = args
        .get(2)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
        .filter(|n| *n > 0);
    let replaced = match max {
        _ if search.is_empty() => text,
        Some(n) => text.replacen(&search, &replacement, n),
        None => text.replace(&search, &replacement),
    };
    Value::String(replaced)
}

fn dump(value: &Value, args: &[Value]) -> Result<Value, ExtensionError> {
    let indent = args.first().and_then(Value::as_u64).unwrap_or(0);
    let text = if indent > 0 {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| ExtensionError::new(format!("dump failed: {e}")))?;
    Ok(Value::String(text))
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_int(value: &Value, args: &[Value]) -> Value {
    if let Some(n) = value.as_i64() {
        return Value::from(n);
    }
    as_number(value).filter(|f| f.is_finite()).map_or_else(
        || args.first().cloned().unwrap_or_else(|| Value::from(0)),
        |f| Value::from(f.trunc() as i64),
    )
}

fn to_float(value: &Value, args: &[Value]) -> Value {
    as_number(value)
        .and_then(Number::from_f64)
        .map_or_else(
            || args.first().cloned().unwrap_or_else(|| Value::from(0.0)),
            Value::Number,
        )
}

fn abs(value: &Value) -> Result<Value, ExtensionError> {
    if let Some(n) = value.as_i64() {
        return Ok(Value::from(n.unsigned_abs()));
    }
    as_number(value)
        .and_then(|f| Number::from_f64(f.abs()))
        .map(Value::Number)
        .ok_or_else(|| ExtensionError::new(format!("abs expects a number, got {value}")))
}

#[allow(clippy::cast_possible_truncation)]
fn round(value: &Value, args: &[Value]) -> Result<Value, ExtensionError> {
    let Some(number) = as_number(value) else {
        return Err(ExtensionError::new(format!("round expects a number, got {value}")));
    };
    let precision = args.first().and_then(Value::as_i64).unwrap_or(0).clamp(0, 15) as i32;
    let factor = 10f64.powi(precision);
    let scaled = number * factor;
    let rounded = match args.get(1).and_then(Value::as_str).unwrap_or("common") {
        "ceil" => scaled.ceil(),
        "floor" => scaled.floor(),
        _ => scaled.round(),
    } / factor;
    Number::from_f64(rounded)
        .map(Value::Number)
        .ok_or_else(|| ExtensionError::new("round produced a non-finite number"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn run(name: &str, input: Value, args: Vec<Value>) -> Result<Value, ExtensionError> {
        let filter = BuiltinFilters::all()
            .into_iter()
            .find(|f| f.name == name)
            .expect("filter exists");
        match filter.run {
            FilterRun::Sync(f) => f(&crate::templating::HelperContext::detached(), input, args),
            FilterRun::Async(_) => panic!("core filters are synchronous"),
        }
    }

    #[test]
    fn test_text_filters() {
        assert_eq!(run("upper", json!("abc"), vec![]).unwrap(), json!("ABC"));
        assert_eq!(run("capitalize", json!("hELLO"), vec![]).unwrap(), json!("Hello"));
        assert_eq!(run("title", json!("hello big world"), vec![]).unwrap(), json!("Hello Big World"));
        assert_eq!(run("trim", json!("  x "), vec![]).unwrap(), json!("x"));
        assert_eq!(run("upper", Value::Null, vec![]).unwrap(), Value::Null);
    }

    #[test]
    fn test_default() {
        assert_eq!(run("default", Value::Null, vec![json!("x")]).unwrap(), json!("x"));
        assert_eq!(run("default", json!(""), vec![json!("x")]).unwrap(), json!(""));
        assert_eq!(run("default", json!(""), vec![json!("x"), json!(true)]).unwrap(), json!("x"));
    }

    #[test]
    fn test_collections() {
        assert_eq!(run("length", json!([1, 2, 3]), vec![]).unwrap(), json!(3));
        assert_eq!(run("join", json!(["a", 1, true]), vec![json!("-")]).unwrap(), json!("a-1-true"));
        assert!(run("join", json!("a"), vec![]).is_err());
        assert_eq!(run("first", json!([4, 5]), vec![]).unwrap(), json!(4));
        assert_eq!(run("last", json!("xyz"), vec![]).unwrap(), json!("z"));
        assert_eq!(run("reverse", json!([1, 2]), vec![]).unwrap(), json!([2, 1]));
    }

    #[test]
    fn test_replace_and_encode() {
        assert_eq!(
            run("replace", json!("a-b-c"), vec![json!("-"), json!("+"), json!(1)]).unwrap(),
            json!("a+b-c")
        );
        assert_eq!(run("urlencode", json!("a b&c"), vec![]).unwrap(), json!("a%20b%26c"));
        assert_eq!(run("dump", json!({"a": 1}), vec![]).unwrap(), json!(r#"{"a":1}"#));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(run("int", json!("42.9"), vec![]).unwrap(), json!(42));
        assert_eq!(run("int", json!("nope"), vec![json!(7)]).unwrap(), json!(7));
        assert_eq!(run("float", json!("1.5"), vec![]).unwrap(), json!(1.5));
        assert_eq!(run("abs", json!(-3), vec![]).unwrap(), json!(3));
        assert_eq!(run("round", json!(2.345), vec![json!(1)]).unwrap(), json!(2.3));
        assert_eq!(run("round", json!(2.31), vec![json!(1), json!("ceil")]).unwrap(), json!(2.4));
        assert!(run("round", json!("x"), vec![]).is_err());
    }

    #[test]
    fn test_debug_is_listed_identity() {
        let debug = BuiltinFilters::all().into_iter().find(|f| f.name == "debug").expect("exists");
        assert!(!debug.hidden);
        assert_eq!(run("debug", json!({"k": [1]}), vec![]).unwrap(), json!({"k": [1]}));
    }
}
