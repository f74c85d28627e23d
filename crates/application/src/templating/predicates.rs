//! Test predicates for `is` clauses

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use super::filter_registry::RegistrationConflict;

/// A predicate over a value and its resolved arguments.
pub type TestFn = Arc<dyn Fn(&Value, &[Value]) -> bool + Send + Sync>;

/// Named predicates usable as `value is name(args)`.
#[derive(Clone, Default)]
pub struct TestRegistry {
    names: Vec<String>,
    tests: HashMap<String, TestFn>,
}

impl TestRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the core predicates.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for (name, test) in builtin_tests() {
            if let Err(conflict) = registry.register(name, test) {
                warn!(%conflict, "Duplicate test predicate ignored");
            }
        }
        registry
    }

    /// Registers a predicate.
    ///
    /// # Errors
    /// Returns [`RegistrationConflict`] if the name is taken.
    pub fn register(&mut self, name: &str, test: TestFn) -> Result<(), RegistrationConflict> {
        if self.tests.contains_key(name) {
            return Err(RegistrationConflict {
                kind: "test",
                name: name.to_string(),
            });
        }
        self.names.push(name.to_string());
        self.tests.insert(name.to_string(), test);
        Ok(())
    }

    /// Looks up a predicate.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&TestFn> {
        self.tests.get(name)
    }

    /// Returns predicate names in registration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl fmt::Debug for TestRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRegistry").field("names", &self.names).finish()
    }
}

/// Truthiness: `null`, `false`, `0`, `""` and `NaN` are falsy; everything else is truthy.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn test(f: impl Fn(&Value, &[Value]) -> bool + Send + Sync + 'static) -> TestFn {
    Arc::new(f)
}

fn compare(value: &Value, args: &[Value], accept: fn(std::cmp::Ordering) -> bool) -> bool {
    let Some(other) = args.first() else {
        return false;
    };
    let ordering = match (value, other) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .zip(b.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    };
    ordering.is_some_and(accept)
}

fn integer(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
}

fn builtin_tests() -> Vec<(&'static str, TestFn)> {
    vec![
        ("defined", test(|v, _| !v.is_null())),
        ("undefined", test(|v, _| v.is_null())),
        ("null", test(|v, _| v.is_null())),
        ("none", test(|v, _| v.is_null())),
        ("number", test(|v, _| v.is_number())),
        ("string", test(|v, _| v.is_string())),
        ("boolean", test(|v, _| v.is_boolean())),
        ("mapping", test(|v, _| v.is_object())),
        ("iterable", test(|v, _| v.is_array() || v.is_string() || v.is_object())),
        ("odd", test(|v, _| integer(v).is_some_and(|n| n % 2 != 0))),
        ("even", test(|v, _| integer(v).is_some_and(|n| n % 2 == 0))),
        (
            "divisibleby",
            test(|v, args| {
                match (integer(v), args.first().and_then(integer)) {
                    (Some(n), Some(d)) if d != 0 => n % d == 0,
                    _ => false,
                }
            }),
        ),
        ("equalto", test(|v, args| args.first() == Some(v))),
        ("sameas", test(|v, args| args.first() == Some(v))),
        ("ne", test(|v, args| args.first() != Some(v))),
        ("gt", test(|v, args| compare(v, args, std::cmp::Ordering::is_gt))),
        ("ge", test(|v, args| compare(v, args, std::cmp::Ordering::is_ge))),
        ("lt", test(|v, args| compare(v, args, std::cmp::Ordering::is_lt))),
        ("le", test(|v, args| compare(v, args, std::cmp::Ordering::is_le))),
        ("truthy", test(|v, _| is_truthy(v))),
        ("falsy", test(|v, _| !is_truthy(v))),
        (
            "lower",
            test(|v, _| v.as_str().is_some_and(|s| s.to_lowercase() == s)),
        ),
        (
            "upper",
            test(|v, _| v.as_str().is_some_and(|s| s.to_uppercase() == s)),
        ),
    ]
}
