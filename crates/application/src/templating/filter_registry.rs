//! Filter registry
//!
//! Maps filter names to definitions for one render environment. Entries keep
//! registration order: core built-ins, default adapters, then plugin filters.

use std::collections::HashMap;

use tessera_domain::{FilterApplication, FilterDescriptor, ParsedVariable};
use thiserror::Error;

use super::extension::FilterDefinition;
use crate::ports::PluginInfo;

/// Two registrations declared the same name. The first one is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} '{name}' is already registered")]
pub struct RegistrationConflict {
    /// `filter`, `tag` or `test`.
    pub kind: &'static str,
    /// The duplicated name.
    pub name: String,
}

/// Where a filter came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOrigin {
    /// Core built-in filter.
    Builtin,
    /// Default adapter supplied by the host application.
    Default,
    /// Supplied by a plugin.
    Plugin(PluginInfo),
}

/// A filter together with its origin.
#[derive(Debug, Clone)]
pub struct RegisteredFilter {
    /// The definition.
    pub definition: FilterDefinition,
    /// Where it came from.
    pub origin: FilterOrigin,
}

impl RegisteredFilter {
    /// Whether a plugin supplied the filter.
    #[must_use]
    pub const fn is_plugin(&self) -> bool {
        matches!(self.origin, FilterOrigin::Plugin(_))
    }

    /// Returns the owning plugin, if any.
    #[must_use]
    pub const fn plugin(&self) -> Option<&PluginInfo> {
        match &self.origin {
            FilterOrigin::Plugin(info) => Some(info),
            FilterOrigin::Builtin | FilterOrigin::Default => None,
        }
    }
}

/// Name-indexed, ordered filter table.
#[derive(Debug, Clone, Default)]
pub struct FilterRegistry {
    filters: Vec<RegisteredFilter>,
    index: HashMap<String, usize>,
}

impl FilterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a filter under its name.
    ///
    /// # Errors
    /// Returns [`RegistrationConflict`] if the name is taken; the existing
    /// filter stays registered.
    pub fn register(
        &mut self,
        definition: FilterDefinition,
        origin: FilterOrigin,
    ) -> Result<(), RegistrationConflict> {
        if self.index.contains_key(&definition.name) {
            return Err(RegistrationConflict {
                kind: "filter",
                name: definition.name,
            });
        }
        self.index.insert(definition.name.clone(), self.filters.len());
        self.filters.push(RegisteredFilter { definition, origin });
        Ok(())
    }

    /// Looks up a filter by name.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&RegisteredFilter> {
        self.index.get(name).and_then(|&i| self.filters.get(i))
    }

    /// Returns every filter in registration order, hidden ones included.
    #[must_use]
    pub fn list(&self) -> &[RegisteredFilter] {
        &self.filters
    }

    /// Builds introspection records for the visible filters.
    #[must_use]
    pub fn descriptors(&self) -> Vec<FilterDescriptor> {
        self.filters
            .iter()
            .filter(|f| !f.definition.hidden)
            .map(|f| f.definition.descriptor(f.is_plugin()))
            .collect()
    }

    /// Lists the filter applications of `expression` with no registered filter.
    #[must_use]
    pub fn unmatched<'a>(&self, expression: &'a ParsedVariable) -> Vec<&'a FilterApplication> {
        expression
            .filters
            .iter()
            .filter(|f| !self.index.contains_key(&f.name))
            .collect()
    }

    /// Returns the number of registered filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns true if no filter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
