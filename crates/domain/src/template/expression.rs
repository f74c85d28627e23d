//! Parsed expression model.
//!
//! A `{{ }}` fragment parses into a [`ParsedVariable`]: a variable path
//! followed by an ordered filter chain and an optional test clause. A
//! `{% %}` fragment parses into a [`TagInvocation`]. The `Display`
//! implementations are the stringify half of the parser: printing a parsed
//! expression yields source text that parses back to an equal structure.

use std::fmt::{self, Write as _};

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// One step of a variable path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Object member access, `.name` or `["name"]`.
    Key(String),
    /// Array element access, `[0]`.
    Index(usize),
}

/// A dotted/bracketed path into the render context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariablePath {
    segments: Vec<PathSegment>,
}

impl VariablePath {
    /// Creates a path with a single root key.
    #[must_use]
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Key(root.into())],
        }
    }

    /// Appends a member access.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(PathSegment::Key(key.into()));
        self
    }

    /// Appends an element access.
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(PathSegment::Index(index));
        self
    }

    /// Returns the root variable name.
    #[must_use]
    pub fn root(&self) -> &str {
        match self.segments.first() {
            Some(PathSegment::Key(key)) => key,
            _ => "",
        }
    }

    /// Returns all segments, root included.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Builds a path from raw segments. The first segment must be a key.
    #[must_use]
    pub fn from_segments(segments: Vec<PathSegment>) -> Option<Self> {
        match segments.first() {
            Some(PathSegment::Key(_)) => Some(Self { segments }),
            _ => None,
        }
    }
}

impl fmt::Display for VariablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => f.write_str(key)?,
                PathSegment::Key(key) if is_identifier(key) => write!(f, ".{key}")?,
                PathSegment::Key(key) => write!(f, "[{}]", quote(key))?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// A literal value written directly in a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    /// `null` or `none`.
    Null,
    /// `true` or `false`.
    Boolean(bool),
    /// A JSON number.
    Number(Number),
    /// A quoted string.
    String(String),
}

impl Primitive {
    /// Converts the literal into a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Boolean(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(&quote(s)),
        }
    }
}

/// A positional filter, test or tag argument.
///
/// Variable arguments are looked up in the render context right before the
/// filter runs, never at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ArgumentValue {
    /// A literal primitive.
    Literal {
        /// The literal itself.
        value: Primitive,
    },
    /// A reference into the render context.
    Variable {
        /// The referenced path.
        name: VariablePath,
    },
}

impl ArgumentValue {
    /// Creates a literal string argument.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal {
            value: Primitive::String(value.into()),
        }
    }

    /// Creates a literal number argument.
    #[must_use]
    pub fn number(value: impl Into<Number>) -> Self {
        Self::Literal {
            value: Primitive::Number(value.into()),
        }
    }

    /// Creates a variable reference argument.
    #[must_use]
    pub fn variable(path: VariablePath) -> Self {
        Self::Variable { name: path }
    }
}

impl fmt::Display for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal { value } => write!(f, "{value}"),
            Self::Variable { name } => write!(f, "{name}"),
        }
    }
}

/// One `| name(args)` step of a filter chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterApplication {
    /// Filter name as written.
    pub name: String,
    /// Positional arguments, in order.
    #[serde(default)]
    pub args: Vec<ArgumentValue>,
}

impl FilterApplication {
    /// Creates a filter application without arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, arg: ArgumentValue) -> Self {
        self.args.push(arg);
        self
    }
}

impl fmt::Display for FilterApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            write_args(f, &self.args)?;
        }
        Ok(())
    }
}

/// A trailing `is [not] name(args)` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestClause {
    /// Test name.
    pub name: String,
    /// Whether the result is inverted with `not`.
    #[serde(default)]
    pub negated: bool,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<ArgumentValue>,
}

impl fmt::Display for TestClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("is ")?;
        if self.negated {
            f.write_str("not ")?;
        }
        f.write_str(&self.name)?;
        if !self.args.is_empty() {
            write_args(f, &self.args)?;
        }
        Ok(())
    }
}

/// A variable expression: path, filter chain, optional test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedVariable {
    /// The variable being output.
    pub variable: VariablePath,
    /// Filters applied left to right.
    #[serde(default)]
    pub filters: Vec<FilterApplication>,
    /// Optional test clause, applied after the last filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<TestClause>,
    /// Source text from the first filter segment that could not be parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remainder: Option<String>,
}

impl ParsedVariable {
    /// Creates an expression that outputs a variable unchanged.
    #[must_use]
    pub fn new(variable: VariablePath) -> Self {
        Self {
            variable,
            filters: Vec::new(),
            test: None,
            remainder: None,
        }
    }

    /// Appends a filter to the chain.
    #[must_use]
    pub fn filter(mut self, filter: FilterApplication) -> Self {
        self.filters.push(filter);
        self
    }

    /// Whether every filter segment was parsed.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.remainder.is_none()
    }

    /// Wraps the expression in the given variable delimiters.
    #[must_use]
    pub fn to_fragment(&self, start: &str, end: &str) -> String {
        format!("{start} {self} {end}")
    }
}

impl fmt::Display for ParsedVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.variable)?;
        for filter in &self.filters {
            write!(f, " | {filter}")?;
        }
        if let Some(remainder) = &self.remainder {
            write!(f, " | {remainder}")?;
        }
        if let Some(test) = &self.test {
            write!(f, " {test}")?;
        }
        Ok(())
    }
}

/// A `{% name args %}` invocation. Arguments stay raw; tags interpret them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagInvocation {
    /// Tag keyword.
    pub name: String,
    /// Unparsed argument text, trimmed.
    #[serde(default)]
    pub raw_args: String,
}

impl fmt::Display for TagInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.raw_args.is_empty() {
            write!(f, " {}", self.raw_args)?;
        }
        Ok(())
    }
}

/// Structured form of a single template construct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParsedExpression {
    /// A `{{ }}` construct.
    Variable(ParsedVariable),
    /// A `{% %}` construct.
    Tag(TagInvocation),
}

/// Returns true if `name` can be written as a bare identifier.
///
/// Identifiers start with a letter, `_` or `$` and continue with
/// alphanumerics, `_` or `$`. Dashed names need the `_["name"]` form.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_alphabetic() && first != '_' && first != '$' {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[ArgumentValue]) -> fmt::Result {
    f.write_char('(')?;
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{arg}")?;
    }
    f.write_char(')')
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
