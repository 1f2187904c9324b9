//! Name-indexed registry of qualifier type constructors.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use serde_json::Value as JsonValue;

use crate::builtins::{StringEqualsMatcher, StringListMatcher, StringPrefixMatcher};
use crate::error::QualifierError;
use crate::matcher::QualifierMatcher;

type MatcherBuilder =
    Arc<dyn Fn(&JsonValue) -> Result<Arc<dyn QualifierMatcher>, QualifierError> + Send + Sync>;

/// Registry mapping qualifier type names to matcher constructors.
///
/// A compiled collection addresses qualifier types by name; the loader asks
/// the registry to instantiate each one with the config blob the collection
/// carries. Registration happens before loading, after which the registry
/// is only read.
#[derive(Clone)]
pub struct QualifierTypeRegistry {
    builders: HashMap<String, MatcherBuilder>,
}

impl QualifierTypeRegistry {
    /// An empty registry with no types registered.
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// A registry pre-populated with the built-in matchers
    /// (`string-equals`, `string-list`, `string-prefix`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(StringEqualsMatcher::NAME, |config| {
            Ok(Arc::new(StringEqualsMatcher::from_config(config)?))
        });
        registry.register(StringListMatcher::NAME, |config| {
            Ok(Arc::new(StringListMatcher::from_config(config)?))
        });
        registry.register(StringPrefixMatcher::NAME, |config| {
            Ok(Arc::new(StringPrefixMatcher::from_config(config)?))
        });
        registry
    }

    /// Register a constructor under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, builder: F)
    where
        F: Fn(&JsonValue) -> Result<Arc<dyn QualifierMatcher>, QualifierError>
            + Send
            + Sync
            + 'static,
    {
        self.builders.insert(name.into(), Arc::new(builder));
    }

    /// Whether a type is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }

    /// Registered type names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.builders.keys().map(String::as_str)
    }

    /// Build a configured matcher for the type registered under `name`.
    pub fn instantiate(
        &self,
        name: &str,
        config: &JsonValue,
    ) -> Result<Arc<dyn QualifierMatcher>, QualifierError> {
        let builder = self
            .builders
            .get(name)
            .ok_or_else(|| QualifierError::UnknownType(name.to_string()))?;
        builder(config)
    }
}

impl Default for QualifierTypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// Builders are plain closures, so Debug lists the registered names instead.
impl fmt::Debug for QualifierTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("QualifierTypeRegistry")
            .field("types", &names)
            .finish()
    }
}
