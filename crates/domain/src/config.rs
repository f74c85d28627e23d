//! Templating configuration.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::template::TemplateSyntax;

/// Plugins excluded from tag and filter registration on every environment build.
pub const DEFAULT_IGNORED_PLUGINS: [&str; 3] = [
    "insomnia-plugin-kong-declarative-config",
    "insomnia-plugin-kong-kubernetes-config",
    "insomnia-plugin-kong-portal",
];

/// Default limit on nested `util.render` calls.
pub const DEFAULT_MAX_RENDER_DEPTH: usize = 8;

/// Settings for the rendering pipeline. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplatingConfig {
    /// Delimiters used by the ALL-mode environment.
    pub syntax: TemplateSyntax,
    /// Plugin identifiers skipped while building environments.
    pub ignored_plugins: Vec<String>,
    /// Maximum nesting of renders spawned from filters or tags.
    pub max_render_depth: usize,
}

impl Default for TemplatingConfig {
    fn default() -> Self {
        Self {
            syntax: TemplateSyntax::default(),
            ignored_plugins: DEFAULT_IGNORED_PLUGINS.iter().map(ToString::to_string).collect(),
            max_render_depth: DEFAULT_MAX_RENDER_DEPTH,
        }
    }
}

impl TemplatingConfig {
    /// Validates the delimiters and the render depth limit.
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self) -> DomainResult<()> {
        if self.max_render_depth == 0 {
            return Err(DomainError::InvalidRenderDepth);
        }
        self.syntax.validate()
    }
}
