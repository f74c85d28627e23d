//! Render modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Controls which delimiter pairs are active for a compiled environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Variables and tags are both evaluated.
    #[default]
    All,
    /// Only `{{ }}` constructs are evaluated; tags pass through as text.
    Variables,
    /// Only `{% %}` constructs are evaluated; variables pass through as text.
    Tags,
}

impl RenderMode {
    /// Every mode, in slot order.
    pub const ALL_MODES: [Self; 3] = [Self::All, Self::Variables, Self::Tags];

    /// Returns the wire name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Variables => "variables",
            Self::Tags => "tags",
        }
    }

    /// Whether `{{ }}` constructs are evaluated in this mode.
    #[must_use]
    pub const fn renders_variables(self) -> bool {
        matches!(self, Self::All | Self::Variables)
    }

    /// Whether `{% %}` constructs are evaluated in this mode.
    #[must_use]
    pub const fn renders_tags(self) -> bool {
        matches!(self, Self::All | Self::Tags)
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "variables" | "vars" => Ok(Self::Variables),
            "tags" => Ok(Self::Tags),
            other => Err(DomainError::UnknownRenderMode(other.to_string())),
        }
    }
}
