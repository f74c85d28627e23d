//! Environment documents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named set of template variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    /// Document id.
    pub id: String,
    /// Id of the owning workspace or base environment.
    pub parent_id: String,
    /// Display name.
    pub name: String,
    /// Variable values; nested objects and arrays are allowed.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Environment {
    /// Creates an empty environment.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        parent_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parent_id: parent_id.into(),
            name: name.into(),
            data: Map::new(),
        }
    }

    /// Sets a variable.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }
}

/// Merges environments in order; later keys override earlier ones.
///
/// Objects are merged key by key, anything else is replaced wholesale.
#[must_use]
pub fn merge_environments<'a>(
    environments: impl IntoIterator<Item = &'a Environment>,
) -> Map<String, Value> {
    let mut merged = Map::new();
    for environment in environments {
        for (key, value) in &environment.data {
            merge_value(&mut merged, key, value);
        }
    }
    merged
}

fn merge_value(target: &mut Map<String, Value>, key: &str, value: &Value) {
    match (target.get_mut(key), value) {
        (Some(Value::Object(existing)), Value::Object(incoming)) => {
            for (k, v) in incoming {
                merge_value(existing, k, v);
            }
        }
        _ => {
            target.insert(key.to_string(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_later_environment_wins() {
        let base = Environment::new("env_base", "wrk_1", "Base")
            .with_variable("host", "localhost")
            .with_variable("auth", json!({"user": "admin", "realm": "dev"}));
        let staging = Environment::new("env_stg", "env_base", "Staging")
            .with_variable("host", "staging.test")
            .with_variable("auth", json!({"user": "robot"}));

        let merged = merge_environments([&base, &staging]);
        assert_eq!(merged["host"], json!("staging.test"));
        assert_eq!(merged["auth"], json!({"user": "robot", "realm": "dev"}));
    }
}
