//! Template tokenizer
//!
//! Splits a template into literal text and delimited constructs. Delimiters
//! come from a [`TemplateSyntax`], so a mode that neutralizes a construct
//! simply never finds its start marker.

use tessera_domain::{Location, TemplateSyntax};

use super::parser::ParseError;

/// A slice of a template: literal text or the inside of a delimited construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Literal text, emitted unchanged.
    Text(&'a str),
    /// The inside of a variable construct, untrimmed.
    Variable {
        /// Source between the delimiters.
        source: &'a str,
        /// Position of the start delimiter.
        location: Location,
    },
    /// The inside of a block construct, untrimmed.
    Tag {
        /// Source between the delimiters.
        source: &'a str,
        /// Position of the start delimiter.
        location: Location,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Construct {
    Variable,
    Block,
    Comment,
}

/// Splits `text` into tokens. Comments are dropped.
///
/// # Errors
/// Returns [`ParseError::Unclosed`] when a construct has no end delimiter.
pub fn tokenize<'a>(text: &'a str, syntax: &TemplateSyntax) -> Result<Vec<Token<'a>>, ParseError> {
    let markers = [
        (Construct::Variable, syntax.variable_start.as_str(), syntax.variable_end.as_str()),
        (Construct::Block, syntax.block_start.as_str(), syntax.block_end.as_str()),
        (Construct::Comment, syntax.comment_start.as_str(), syntax.comment_end.as_str()),
    ];

    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];

        // Earliest start marker wins; on a tie the longer marker wins.
        let next = markers
            .iter()
            .filter_map(|(construct, start, end)| {
                rest.find(start).map(|offset| (offset, *construct, *start, *end))
            })
            .min_by(|a, b| a.0.cmp(&b.0).then(b.2.len().cmp(&a.2.len())));

        let Some((offset, construct, start, end)) = next else {
            tokens.push(Token::Text(rest));
            break;
        };

        if offset > 0 {
            tokens.push(Token::Text(&rest[..offset]));
        }

        let open = pos + offset;
        let inner_start = open + start.len();
        let inner = &text[inner_start..];
        let location = Location::of_offset(text, open);

        let close = if construct == Construct::Comment {
            inner.find(end)
        } else {
            find_end_skipping_strings(inner, end)
        };
        let Some(close) = close else {
            return Err(ParseError::Unclosed {
                expected: end.to_string(),
                location,
            });
        };

        let source = &inner[..close];
        match construct {
            Construct::Variable => tokens.push(Token::Variable { source, location }),
            Construct::Block => tokens.push(Token::Tag { source, location }),
            Construct::Comment => {}
        }
        pos = inner_start + close + end.len();
    }

    Ok(tokens)
}

/// Finds `end` in `inner`, ignoring occurrences inside quoted strings.
fn find_end_skipping_strings(inner: &str, end: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    let mut escape_next = false;

    for (i, ch) in inner.char_indices() {
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
            _ if inner[i..].starts_with(end) => return Some(i),
            _ => {}
        }
    }
    None
}
