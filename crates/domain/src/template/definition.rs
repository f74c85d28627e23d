//! Metadata records describing filters and tags to editors.
//!
//! These are the plain-data halves of filter and tag definitions. The
//! executable halves live next to the registries in the application crate.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Predicate deciding whether an argument is hidden, given all current argument values.
pub type ArgHidePredicate = Arc<dyn Fn(&[Value]) -> bool + Send + Sync>;

/// Validator returning an error message for an invalid argument value.
pub type ArgValidator = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Data type of a filter or tag argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    /// Free text.
    #[default]
    String,
    /// A number.
    Number,
    /// A checkbox.
    Boolean,
    /// One of a fixed set of options.
    Enum,
    /// A document picked from the model store.
    Model,
}

/// One choice of an `enum` argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgOption {
    /// Label shown to the user.
    pub display_name: String,
    /// Value passed to the filter or tag.
    pub value: Value,
}

/// Schema entry for one positional argument.
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ArgDefinition {
    /// Label shown to the user.
    pub display_name: String,
    /// Argument data type.
    #[serde(rename = "type")]
    pub arg_type: ArgType,
    /// Value used when the user supplies nothing.
    #[serde(default)]
    pub default_value: Value,
    /// Input placeholder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Choices for `enum` arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<ArgOption>,
    /// Model type for `model` arguments (for example `request`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Hides the argument depending on the other values.
    #[serde(skip)]
    pub hide: Option<ArgHidePredicate>,
    /// Validates a value entered for this argument.
    #[serde(skip)]
    pub validate: Option<ArgValidator>,
}

impl ArgDefinition {
    /// Creates an argument of the given type.
    #[must_use]
    pub fn new(display_name: impl Into<String>, arg_type: ArgType) -> Self {
        Self {
            display_name: display_name.into(),
            arg_type,
            ..Self::default()
        }
    }

    /// Creates a string argument.
    #[must_use]
    pub fn string(display_name: impl Into<String>) -> Self {
        Self::new(display_name, ArgType::String).with_default("")
    }

    /// Creates a number argument.
    #[must_use]
    pub fn number(display_name: impl Into<String>) -> Self {
        Self::new(display_name, ArgType::Number).with_default(0)
    }

    /// Creates an enum argument; the first option is the default.
    #[must_use]
    pub fn enumeration(display_name: impl Into<String>, options: &[(&str, &str)]) -> Self {
        let options: Vec<ArgOption> = options
            .iter()
            .map(|(label, value)| ArgOption {
                display_name: (*label).to_string(),
                value: Value::String((*value).to_string()),
            })
            .collect();
        let default_value = options.first().map(|o| o.value.clone()).unwrap_or_default();
        Self {
            display_name: display_name.into(),
            arg_type: ArgType::Enum,
            default_value,
            options,
            ..Self::default()
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = value.into();
        self
    }

    /// Sets the placeholder.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Sets the help text.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the hide predicate.
    #[must_use]
    pub fn with_hide(mut self, hide: impl Fn(&[Value]) -> bool + Send + Sync + 'static) -> Self {
        self.hide = Some(Arc::new(hide));
        self
    }

    /// Sets the validator.
    #[must_use]
    pub fn with_validate(
        mut self,
        validate: impl Fn(&Value) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.validate = Some(Arc::new(validate));
        self
    }

    /// Whether the argument should be hidden for the given values.
    #[must_use]
    pub fn is_hidden(&self, values: &[Value]) -> bool {
        self.hide.as_ref().is_some_and(|hide| hide(values))
    }

    /// Returns the validation message for a value, if it is invalid.
    #[must_use]
    pub fn validation_error(&self, value: &Value) -> Option<String> {
        self.validate.as_ref().and_then(|validate| validate(value))
    }
}

impl fmt::Debug for ArgDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgDefinition")
            .field("display_name", &self.display_name)
            .field("arg_type", &self.arg_type)
            .field("default_value", &self.default_value)
            .field("placeholder", &self.placeholder)
            .field("options", &self.options)
            .field("model", &self.model)
            .field("hide", &self.hide.is_some())
            .field("validate", &self.validate.is_some())
            .finish_non_exhaustive()
    }
}

/// Introspection record for one filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDescriptor {
    /// Name used in templates.
    pub name: String,
    /// Label shown in pickers.
    pub display_name: String,
    /// Help text.
    pub description: String,
    /// Argument schema.
    pub args: Vec<ArgDefinition>,
    /// Whether the filter was supplied by a plugin.
    pub is_plugin: bool,
}

/// An action button attached to a tag in the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAction {
    /// Action label.
    pub name: String,
    /// Optional icon name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Introspection record for one tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDescriptor {
    /// Tag keyword used in templates.
    pub name: String,
    /// Label shown in pickers.
    pub display_name: String,
    /// Label template shown while the tag is previewed inline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_display_name: Option<String>,
    /// Help text.
    pub description: String,
    /// Whether live preview is disabled for this tag.
    pub disable_preview: bool,
    /// Resolved listing priority.
    pub priority: i64,
    /// Argument schema.
    pub args: Vec<ArgDefinition>,
    /// Editor actions.
    pub actions: Vec<TagAction>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_enum_default_is_first_option() {
        let arg = ArgDefinition::enumeration("Mode", &[("Text", "text"), ("Regex", "regex")]);
        assert_eq!(arg.arg_type, ArgType::Enum);
        assert_eq!(arg.default_value, json!("text"));
        assert_eq!(arg.options.len(), 2);
    }

    #[test]
    fn test_hide_and_validate() {
        let arg = ArgDefinition::number("Digits")
            .with_hide(|values| values.first() == Some(&json!("int")))
            .with_validate(|v| (!v.is_number()).then(|| "must be a number".to_string()));

        assert!(arg.is_hidden(&[json!("int")]));
        assert!(!arg.is_hidden(&[json!("fixed")]));
        assert_eq!(arg.validation_error(&json!("x")).as_deref(), Some("must be a number"));
        assert!(arg.validation_error(&json!(2)).is_none());
    }

    #[test]
    fn test_serialization_skips_predicates() {
        let arg = ArgDefinition::string("Query").with_placeholder("a.b").with_hide(|_| true);
        let json = serde_json::to_value(&arg).unwrap_or_default();
        assert_eq!(json["displayName"], "Query");
        assert_eq!(json["type"], "string");
        assert_eq!(json["placeholder"], "a.b");
        assert!(json.get("hide").is_none());
    }
}
