//! JMESPath and JSON path queries.

use serde_json::Value;
use tessera_application::{ExtensionError, FilterDefinition, FilterRun};
use tessera_domain::ArgDefinition;

use super::{decode_json, string_arg};

/// `value | jmespath("query")`
#[must_use]
pub fn jmespath_filter() -> FilterDefinition {
    FilterDefinition::new(
        "jmespath",
        FilterRun::sync(|_, input, args| {
            let query = string_arg(&args, 0).unwrap_or_default();
            let data = decode_json(input)?;
            search(&query, data)
        }),
    )
    .with_display_name("JMESPath")
    .with_description("Query a JSON value with a JMESPath expression")
    .with_arg(ArgDefinition::string("Query path").with_placeholder("Query path"))
}

fn search(query: &str, data: Value) -> Result<Value, ExtensionError> {
    let expression = jmespath::compile(query)
        .map_err(|e| ExtensionError::new(format!("invalid JMESPath query: {e}")))?;
    let result = expression
        .search(data)
        .map_err(|e| ExtensionError::new(format!("JMESPath search failed: {e}")))?;
    serde_json::to_value(&*result).map_err(|e| ExtensionError::new(e.to_string()))
}

/// `value | json_path("$.items[*].id")`
#[must_use]
pub fn json_path_filter() -> FilterDefinition {
    FilterDefinition::new(
        "json_path",
        FilterRun::sync(|_, input, args| {
            let path = string_arg(&args, 0).unwrap_or_else(|| "$".to_string());
            let data = decode_json(input)?;
            query_json_path(&data, &path).map_err(ExtensionError::new)
        }),
    )
    .with_display_name("JSONPath")
    .with_description("Extract values with a $-rooted JSON path")
    .with_arg(ArgDefinition::string("Path").with_default("$").with_placeholder("$.store.books[*].title"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Key(String),
    Index(usize),
    Wildcard,
}

/// Evaluates a `$`-rooted JSON path.
///
/// Supports `.field`, `[n]`, `["key"]` and the `[*]` / `.*` wildcard. A path
/// without wildcards yields the single match or `null`; once a wildcard is
/// crossed the result is the array of every match.
///
/// # Errors
/// Returns an error if the path is malformed.
pub fn query_json_path(json: &Value, path: &str) -> Result<Value, String> {
    let steps = parse_steps(path)?;
    let wildcard = steps.contains(&Step::Wildcard);

    let mut matches: Vec<&Value> = vec![json];
    for step in &steps {
        matches = matches
            .into_iter()
            .flat_map(|value| step_into(step, value))
            .collect();
    }

    if wildcard {
        Ok(Value::Array(matches.into_iter().cloned().collect()))
    } else {
        Ok(matches.first().map_or(Value::Null, |v| (*v).clone()))
    }
}

fn step_into<'a>(step: &Step, value: &'a Value) -> Vec<&'a Value> {
    match (step, value) {
        (Step::Key(key), Value::Object(map)) => map.get(key).into_iter().collect(),
        (Step::Index(index), Value::Array(items)) => items.get(*index).into_iter().collect(),
        (Step::Wildcard, Value::Array(items)) => items.iter().collect(),
        (Step::Wildcard, Value::Object(map)) => map.values().collect(),
        _ => Vec::new(),
    }
}

fn parse_steps(path: &str) -> Result<Vec<Step>, String> {
    let path = path.trim();
    let Some(rest) = path.strip_prefix('$') else {
        return Err("JSON path must start with '$'".to_string());
    };

    let chars: Vec<char> = rest.chars().collect();
    let mut steps = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        match chars[pos] {
            '.' => {
                pos += 1;
                let start = pos;
                while pos < chars.len() && chars[pos] != '.' && chars[pos] != '[' {
                    pos += 1;
                }
                let name: String = chars[start..pos].iter().collect();
                match name.as_str() {
                    "" => return Err(format!("empty segment in JSON path: {path}")),
                    "*" => steps.push(Step::Wildcard),
                    _ => steps.push(Step::Key(name)),
                }
            }
            '[' => {
                let Some(close) = bracket_end(&chars, pos + 1) else {
                    return Err(format!("unclosed bracket in JSON path: {path}"));
                };
                let inner: String = chars[pos + 1..close].iter().collect();
                steps.push(bracket_step(inner.trim())?);
                pos = close + 1;
            }
            other => return Err(format!("unexpected '{other}' in JSON path: {path}")),
        }
    }
    Ok(steps)
}

/// Finds the `]` closing a bracket, skipping over a quoted key.
fn bracket_end(chars: &[char], from: usize) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut pos = from;
    while pos < chars.len() {
        let c = chars[pos];
        match quote {
            Some(_) if c == '\\' => pos += 1,
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '\'' => quote = Some(c),
            None if c == ']' => return Some(pos),
            None => {}
        }
        pos += 1;
    }
    None
}

fn bracket_step(inner: &str) -> Result<Step, String> {
    if inner == "*" {
        return Ok(Step::Wildcard);
    }
    for quote in ['"', '\''] {
        if let Some(key) = inner
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return Ok(Step::Key(key.replace(&format!("\\{quote}"), &quote.to_string())));
        }
    }
    inner
        .parse()
        .map(Step::Index)
        .map_err(|_| format!("Invalid array index: {inner}"))
}
