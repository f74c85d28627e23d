//! Expression parser
//!
//! Parses the inside of `{{ }}` and `{% %}` constructs into the structured
//! forms defined in the domain crate:
//! - `path | filter | filter(arg, arg) is [not] test(args)` for variables
//! - `name raw-args` for tags
//!
//! A malformed filter segment does not fail the parse. Parsing stops there and
//! the rest of the source is kept in [`ParsedVariable::remainder`] so callers
//! can decide how to report it.

use serde_json::Number;
use tessera_domain::{
    ArgumentValue, FilterApplication, Location, ParsedExpression, ParsedVariable, PathSegment,
    Primitive, RenderError, TagInvocation, TemplateSyntax, TestClause, VariablePath,
};
use thiserror::Error;

use super::lexer::{Token, tokenize};

/// Error type for template parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A construct was opened but never closed.
    #[error("unexpected end of template, expected '{expected}'")]
    Unclosed {
        /// The missing end delimiter.
        expected: String,
        /// Where the construct starts.
        location: Location,
    },
    /// The inside of a construct is malformed.
    #[error("{message}")]
    InvalidSyntax {
        /// What went wrong.
        message: String,
        /// Where the construct starts.
        location: Location,
    },
}

impl ParseError {
    fn syntax(message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            message: message.into(),
            location: Location::default(),
        }
    }

    /// Returns where the failing construct starts.
    #[must_use]
    pub const fn location(&self) -> Location {
        match self {
            Self::Unclosed { location, .. } | Self::InvalidSyntax { location, .. } => *location,
        }
    }

    /// Sets the location of a syntax error found inside a construct.
    #[must_use]
    pub fn at(self, location: Location) -> Self {
        match self {
            Self::InvalidSyntax { message, .. } => Self::InvalidSyntax { message, location },
            unclosed @ Self::Unclosed { .. } => unclosed,
        }
    }
}

impl From<ParseError> for RenderError {
    fn from(err: ParseError) -> Self {
        let location = err.location();
        Self::parse(err.to_string(), location)
    }
}

/// One node of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateNode {
    /// Literal text.
    Text(String),
    /// A variable or tag construct.
    Expression {
        /// The parsed construct.
        expression: ParsedExpression,
        /// Where the construct starts.
        location: Location,
    },
}

/// Parses a whole template into text and expression nodes.
///
/// # Errors
/// Returns the first unclosed or malformed construct.
pub fn parse_template(text: &str, syntax: &TemplateSyntax) -> Result<Vec<TemplateNode>, ParseError> {
    tokenize(text, syntax)?
        .into_iter()
        .map(|token| match token {
            Token::Text(text) => Ok(TemplateNode::Text(text.to_string())),
            Token::Variable { source, location } => parse_variable_and_filter(source)
                .map(|parsed| TemplateNode::Expression {
                    expression: ParsedExpression::Variable(parsed),
                    location,
                })
                .map_err(|e| e.at(location)),
            Token::Tag { source, location } => parse_tag(source)
                .map(|tag| TemplateNode::Expression {
                    expression: ParsedExpression::Tag(tag),
                    location,
                })
                .map_err(|e| e.at(location)),
        })
        .collect()
}

/// Parses a raw fragment that still carries its delimiters.
///
/// # Errors
/// Returns an error if the fragment is not a single variable or tag construct.
pub fn parse_expression(fragment: &str, syntax: &TemplateSyntax) -> Result<ParsedExpression, ParseError> {
    let mut nodes = parse_template(fragment.trim(), syntax)?.into_iter();
    match (nodes.next(), nodes.next()) {
        (Some(TemplateNode::Expression { expression, .. }), None) => Ok(expression),
        _ => Err(ParseError::syntax(format!(
            "expected a single '{}' or '{}' construct",
            syntax.variable_start, syntax.block_start
        ))),
    }
}

/// Parses the inside of a variable construct.
///
/// # Errors
/// Returns an error if the variable path or the test clause is malformed.
/// Malformed filter segments end up in the remainder instead.
pub fn parse_variable_and_filter(source: &str) -> Result<ParsedVariable, ParseError> {
    let source = source.trim();
    if source.is_empty() {
        return Err(ParseError::syntax("expected a variable name"));
    }

    let (head, test) = match find_test_keyword(source) {
        Some(idx) => (&source[..idx], Some(parse_test_clause(&source[idx + 2..])?)),
        None => (source, None),
    };

    let segments = split_top_level(head, '|');
    let mut segments = segments.into_iter();
    let Some((_, path_source)) = segments.next() else {
        return Err(ParseError::syntax("expected a variable name"));
    };
    let variable = parse_path(path_source)?;

    let mut parsed = ParsedVariable::new(variable);
    parsed.test = test;
    for (offset, segment) in segments {
        match parse_filter_segment(segment) {
            Some(filter) => parsed.filters.push(filter),
            None => {
                parsed.remainder = Some(head[offset..].trim().to_string());
                break;
            }
        }
    }
    Ok(parsed)
}

/// Parses the inside of a block construct.
///
/// # Errors
/// Returns an error if the construct has no tag name.
pub fn parse_tag(source: &str) -> Result<TagInvocation, ParseError> {
    let source = source.trim();
    let name_end = source
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$' || c == '-'))
        .unwrap_or(source.len());
    let name = &source[..name_end];
    if name.is_empty() {
        return Err(ParseError::syntax("expected a tag name"));
    }
    Ok(TagInvocation {
        name: name.to_string(),
        raw_args: source[name_end..].trim().to_string(),
    })
}

/// Parses a comma-separated argument list.
///
/// Quoted text becomes a string literal, `true`/`false`/`null`/`none` and
/// numbers become literals, anything else must be a variable path.
///
/// # Errors
/// Returns an error on empty or malformed arguments.
pub fn parse_arguments(raw: &str) -> Result<Vec<ArgumentValue>, ParseError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    split_top_level(raw, ',')
        .into_iter()
        .map(|(_, arg)| parse_argument(arg))
        .collect()
}

fn parse_argument(raw: &str) -> Result<ArgumentValue, ParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ParseError::syntax("empty argument"));
    }

    if raw.starts_with('"') || raw.starts_with('\'') {
        let mut scanner = Scanner::new(raw);
        let value = scanner.quoted()?;
        if !scanner.at_end() {
            return Err(ParseError::syntax(format!("unexpected text after string: {raw}")));
        }
        return Ok(ArgumentValue::string(value));
    }

    let literal = match raw {
        "true" => Some(Primitive::Boolean(true)),
        "false" => Some(Primitive::Boolean(false)),
        "null" | "none" => Some(Primitive::Null),
        _ if raw.starts_with(|c: char| c.is_ascii_digit() || c == '-') => {
            let number = serde_json::from_str::<Number>(raw)
                .map_err(|_| ParseError::syntax(format!("invalid number: {raw}")))?;
            Some(Primitive::Number(number))
        }
        _ => None,
    };
    match literal {
        Some(value) => Ok(ArgumentValue::Literal { value }),
        None => Ok(ArgumentValue::variable(parse_path(raw)?)),
    }
}

/// Parses a dotted/bracketed variable path such as `_["my-var"][0].name`.
///
/// # Errors
/// Returns an error if the path is malformed.
pub fn parse_path(raw: &str) -> Result<VariablePath, ParseError> {
    let mut scanner = Scanner::new(raw.trim());
    let root = scanner.identifier();
    if root.is_empty() {
        return Err(ParseError::syntax(format!("invalid variable name: {}", raw.trim())));
    }

    let mut segments = vec![PathSegment::Key(root.to_string())];
    while let Some(ch) = scanner.peek() {
        match ch {
            '.' => {
                scanner.bump();
                let key = scanner.identifier();
                if key.is_empty() {
                    return Err(ParseError::syntax(format!("expected a name after '.' in {raw}")));
                }
                segments.push(PathSegment::Key(key.to_string()));
            }
            '[' => {
                scanner.bump();
                scanner.skip_whitespace();
                let segment = match scanner.peek() {
                    Some('"' | '\'') => PathSegment::Key(scanner.quoted()?),
                    _ => {
                        let digits = scanner.take_while(|c| c.is_ascii_digit());
                        let index = digits
                            .parse()
                            .map_err(|_| ParseError::syntax(format!("invalid index in {raw}")))?;
                        PathSegment::Index(index)
                    }
                };
                scanner.skip_whitespace();
                if scanner.bump() != Some(']') {
                    return Err(ParseError::syntax(format!("expected ']' in {raw}")));
                }
                segments.push(segment);
            }
            _ => return Err(ParseError::syntax(format!("unexpected '{ch}' in {raw}"))),
        }
    }

    VariablePath::from_segments(segments)
        .ok_or_else(|| ParseError::syntax(format!("invalid variable name: {raw}")))
}

fn parse_filter_segment(segment: &str) -> Option<FilterApplication> {
    let mut scanner = Scanner::new(segment.trim());
    let name = scanner.identifier();
    if name.is_empty() {
        return None;
    }
    let mut filter = FilterApplication::new(name);
    scanner.skip_whitespace();
    if scanner.at_end() {
        return Some(filter);
    }
    let rest = scanner.rest();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    filter.args = parse_arguments(inner).ok()?;
    Some(filter)
}

fn parse_test_clause(raw: &str) -> Result<TestClause, ParseError> {
    let mut scanner = Scanner::new(raw.trim());
    let mut name = scanner.identifier();
    let negated = name == "not";
    if negated {
        scanner.skip_whitespace();
        name = scanner.identifier();
    }
    if name.is_empty() {
        return Err(ParseError::syntax("expected a test name after 'is'"));
    }

    scanner.skip_whitespace();
    let args = if scanner.at_end() {
        Vec::new()
    } else {
        let inner = scanner
            .rest()
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(|| ParseError::syntax(format!("malformed test: is {}", raw.trim())))?;
        parse_arguments(inner)?
    };

    Ok(TestClause {
        name: name.to_string(),
        negated,
        args,
    })
}

/// Finds a top-level ` is ` keyword.
fn find_test_keyword(source: &str) -> Option<usize> {
    let bytes = source.as_bytes();
    top_level_positions(source).into_iter().find(|&i| {
        source[i..].starts_with("is")
            && i > 0
            && bytes[i - 1].is_ascii_whitespace()
            && bytes.get(i + 2).is_none_or(u8::is_ascii_whitespace)
    })
}

/// Splits on `separator` outside strings, parentheses and brackets.
fn split_top_level(source: &str, separator: char) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut start = 0;
    for i in top_level_positions(source) {
        if source[i..].starts_with(separator) {
            parts.push((start, &source[start..i]));
            start = i + separator.len_utf8();
        }
    }
    parts.push((start, &source[start..]));
    parts
}

/// Byte offsets of every character outside strings, parentheses and brackets.
fn top_level_positions(source: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escape_next = false;

    for (i, ch) in source.char_indices() {
        if let Some(q) = quote {
            if escape_next {
                escape_next = false;
            } else if ch == '\\' {
                escape_next = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => positions.push(i),
            _ => {}
        }
    }
    positions
}

/// Character cursor over a source fragment.
struct Scanner<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    const fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    const fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(&predicate) {
            self.bump();
        }
        &self.source[start..self.pos]
    }

    fn skip_whitespace(&mut self) {
        self.take_while(char::is_whitespace);
    }

    fn identifier(&mut self) -> &'a str {
        let start = self.pos;
        if self
            .peek()
            .is_some_and(|c| c.is_alphabetic() || c == '_' || c == '$')
        {
            self.take_while(|c| c.is_alphanumeric() || c == '_' || c == '$');
        }
        &self.source[start..self.pos]
    }

    fn quoted(&mut self) -> Result<String, ParseError> {
        let Some(quote) = self.bump() else {
            return Err(ParseError::syntax("expected a string"));
        };
        let mut value = String::new();
        loop {
            match self.bump() {
                None => return Err(ParseError::syntax("unterminated string")),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some(other) => value.push(other),
                    None => return Err(ParseError::syntax("unterminated string")),
                },
                Some(ch) if ch == quote => return Ok(value),
                Some(ch) => value.push(ch),
            }
        }
    }
}
