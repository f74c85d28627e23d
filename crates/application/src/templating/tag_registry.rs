//! Tag registry
//!
//! Tags are listed by ascending priority. Ties keep registration order.
//! Deprecated tags stay invocable but are never listed.

use std::collections::HashMap;

use super::extension::TagDefinition;
use super::filter_registry::RegistrationConflict;
use crate::ports::PluginInfo;

/// Priority step applied per declaration when a tag sets none.
pub const PRIORITY_STEP: i64 = 100;

/// A tag together with its resolved priority and owner.
#[derive(Debug, Clone)]
pub struct RegisteredTag {
    /// The definition.
    pub definition: TagDefinition,
    /// Owning plugin, if any.
    pub plugin: Option<PluginInfo>,
    /// Resolved listing priority.
    pub priority: i64,
}

/// Name-indexed tag table.
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    tags: Vec<RegisteredTag>,
    index: HashMap<String, usize>,
    declared: usize,
}

impl TagRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tag.
    ///
    /// A missing or zero priority becomes `declaration index * 100`; every
    /// call counts as a declaration, rejected ones included.
    ///
    /// # Errors
    /// Returns [`RegistrationConflict`] if the keyword is taken.
    pub fn register(
        &mut self,
        definition: TagDefinition,
        plugin: Option<PluginInfo>,
    ) -> Result<(), RegistrationConflict> {
        let declared = i64::try_from(self.declared).unwrap_or(i64::MAX / PRIORITY_STEP);
        self.declared += 1;

        if self.index.contains_key(&definition.name) {
            return Err(RegistrationConflict {
                kind: "tag",
                name: definition.name,
            });
        }

        let priority = definition
            .priority
            .filter(|p| *p != 0)
            .unwrap_or(declared * PRIORITY_STEP);
        self.index.insert(definition.name.clone(), self.tags.len());
        self.tags.push(RegisteredTag {
            definition,
            plugin,
            priority,
        });
        Ok(())
    }

    /// Looks up a tag by keyword, deprecated ones included.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&RegisteredTag> {
        self.index.get(name).and_then(|&i| self.tags.get(i))
    }

    /// Returns non-deprecated tags sorted by ascending priority.
    #[must_use]
    pub fn list_sorted(&self) -> Vec<&RegisteredTag> {
        let mut tags: Vec<&RegisteredTag> =
            self.tags.iter().filter(|t| !t.definition.deprecated).collect();
        tags.sort_by_key(|t| t.priority);
        tags
    }

    /// Returns the number of registered tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Returns true if no tag is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
