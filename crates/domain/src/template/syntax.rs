//! Delimiter configuration.

use serde::{Deserialize, Serialize};

use super::mode::RenderMode;
use crate::error::{DomainError, DomainResult};

/// Start marker substituted for a disabled construct. Never occurs in real text.
pub const NEVER_MATCH_START: &str = "<[{[{[{[{[$%";

/// End marker substituted for a disabled construct. Never occurs in real text.
pub const NEVER_MATCH_END: &str = "%$]}]}]}]}]>";

/// The six delimiters recognized by the template tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSyntax {
    /// Opens a variable expression.
    pub variable_start: String,
    /// Closes a variable expression.
    pub variable_end: String,
    /// Opens a tag invocation.
    pub block_start: String,
    /// Closes a tag invocation.
    pub block_end: String,
    /// Opens a comment.
    pub comment_start: String,
    /// Closes a comment.
    pub comment_end: String,
}

impl Default for TemplateSyntax {
    fn default() -> Self {
        Self {
            variable_start: "{{".to_string(),
            variable_end: "}}".to_string(),
            block_start: "{%".to_string(),
            block_end: "%}".to_string(),
            comment_start: "{#".to_string(),
            comment_end: "#}".to_string(),
        }
    }
}

impl TemplateSyntax {
    /// Returns a copy with the delimiters of the foreign construct neutralized.
    ///
    /// Comments stay active in every mode.
    #[must_use]
    pub fn for_mode(&self, mode: RenderMode) -> Self {
        let mut syntax = self.clone();
        if !mode.renders_tags() {
            syntax.block_start = NEVER_MATCH_START.to_string();
            syntax.block_end = NEVER_MATCH_END.to_string();
        }
        if !mode.renders_variables() {
            syntax.variable_start = NEVER_MATCH_START.to_string();
            syntax.variable_end = NEVER_MATCH_END.to_string();
        }
        syntax
    }

    /// Checks that no delimiter is empty and the start markers are distinct.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidDelimiter` describing the first problem found.
    pub fn validate(&self) -> DomainResult<()> {
        let all = [
            ("variable_start", &self.variable_start),
            ("variable_end", &self.variable_end),
            ("block_start", &self.block_start),
            ("block_end", &self.block_end),
            ("comment_start", &self.comment_start),
            ("comment_end", &self.comment_end),
        ];
        if let Some((name, _)) = all.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(DomainError::InvalidDelimiter(format!("{name} is empty")));
        }

        let starts = [&self.variable_start, &self.block_start, &self.comment_start];
        for (i, a) in starts.iter().enumerate() {
            if starts.iter().skip(i + 1).any(|b| a == b) {
                return Err(DomainError::InvalidDelimiter(format!(
                    "start marker '{a}' is used twice"
                )));
            }
        }
        Ok(())
    }
}
