//! Workspace umbrella crate for qualified resource resolution (qres).
//!
//! The `qres` crate re-exports the qualifier, collection, and resolver
//! layers so applications can drive the whole engine through a single
//! dependency, and adds the one-call helpers [`load_collection_from_json`]
//! and [`load_collection_from_value`] for going straight from a compiled
//! collection document to a shared [`ResourceCollection`] handle.
//!
//! ## Quick start
//!
//! A compiled collection is a JSON object of dense entity arrays (see
//! [`CompiledCollection`]); qualifier types in it are resolved by name
//! against a [`QualifierTypeRegistry`]. Load once, then build one resolver
//! per runtime context:
//!
//! ```
//! use qres::{
//!     load_collection_from_value, QualifierTypeRegistry, ResolverOptions,
//!     ResourceResolver, RuntimeContext,
//! };
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = QualifierTypeRegistry::with_builtins();
//! let collection = load_collection_from_value(
//!     json!({
//!         "qualifierTypes": [{ "name": "string-equals" }],
//!         "qualifiers": [{ "name": "language", "type": 0, "defaultPriority": 100 }],
//!         "resourceTypes": [{ "name": "json" }],
//!         "conditions": [
//!             { "qualifierIndex": 0, "value": "en", "priority": 100 },
//!             { "qualifierIndex": 0, "value": "fr", "priority": 100 }
//!         ],
//!         "conditionSets": [{ "conditions": [0] }, { "conditions": [1] }],
//!         "decisions": [{ "conditionSets": [0, 1] }],
//!         "resources": [{
//!             "id": "app.greeting", "type": 0, "decision": 0,
//!             "candidates": [
//!                 { "json": { "text": "Hello" } },
//!                 { "json": { "text": "Bonjour" } }
//!             ]
//!         }]
//!     }),
//!     &registry,
//! )?;
//!
//! let context = RuntimeContext::with_values(collection, [("language", "fr")])?;
//! let mut resolver = ResourceResolver::new(context, ResolverOptions::default());
//! assert_eq!(
//!     resolver.resolve_composed_by_id("app.greeting")?,
//!     json!({ "text": "Bonjour" })
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Observability
//!
//! Cache activity (hits, misses, errors, clears, context failures) is
//! observable by installing a [`CacheListener`] through
//! [`ResolverOptions::with_cache_listener`]; [`CacheMetrics`] is a
//! ready-made lock-free aggregate. Structured logs are emitted via
//! `tracing` on the load path and, at trace level, the resolution path.
//!
//! ## Errors
//!
//! Each layer exposes typed errors (`LoadError`, `ContextError`,
//! `ResolveError`, `TreeResolveError`); the helpers here converge on
//! [`CollectionLoadError`] so callers can distinguish a malformed JSON
//! document from a structurally invalid collection without depending on
//! the individual workspace crates.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

pub use collection::{
    load_collection, CollectionError, CompiledCollection, Condition, ConditionIndex,
    ConditionSet, ConditionSetIndex, Decision, DecisionIndex, LoadError, LoadIssue, MergeMethod,
    Qualifier, QualifierIndex, QualifierType, QualifierTypeIndex, Resource, ResourceCandidate,
    ResourceCollection, ResourceIndex, ResourceTree, ResourceTreeBranch, ResourceTreeLeaf,
    ResourceTreeNode, ResourceType, ResourceTypeIndex,
};
pub use qualifier::{
    Operator, QualifierError, QualifierMatcher, QualifierTypeRegistry, StringEqualsMatcher,
    StringListMatcher, StringPrefixMatcher,
};
pub use resolver::{
    CacheKind, CacheListener, CacheMetrics, CacheStats, CompositionError, ConditionMatch,
    ConditionSetMatch, ContextError, DecisionMatch, EmptyBranchPolicy, MatchKind,
    NoopCacheListener, ResolveError, ResolverOptions, ResourceErrorPolicy, ResourceResolver,
    RuntimeContext, TreeFailure, TreeResolveError, TreeResolveOptions,
};

/// Errors from the one-call load helpers: the document failed to parse as
/// a compiled collection, or parsed but failed structural validation.
#[derive(Debug)]
pub enum CollectionLoadError {
    Parse(serde_json::Error),
    Load(LoadError),
}

impl fmt::Display for CollectionLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionLoadError::Parse(err) => {
                write!(f, "compiled collection is not valid JSON: {err}")
            }
            CollectionLoadError::Load(err) => err.fmt(f),
        }
    }
}

impl Error for CollectionLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CollectionLoadError::Parse(err) => Some(err),
            CollectionLoadError::Load(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for CollectionLoadError {
    fn from(value: serde_json::Error) -> Self {
        CollectionLoadError::Parse(value)
    }
}

impl From<LoadError> for CollectionLoadError {
    fn from(value: LoadError) -> Self {
        CollectionLoadError::Load(value)
    }
}

/// Parse a compiled collection from JSON text and load it.
pub fn load_collection_from_json(
    json: &str,
    registry: &QualifierTypeRegistry,
) -> Result<Arc<ResourceCollection>, CollectionLoadError> {
    let wire: CompiledCollection = serde_json::from_str(json)?;
    Ok(Arc::new(load_collection(wire, registry)?))
}

/// Load a compiled collection from an already-parsed JSON value.
pub fn load_collection_from_value(
    value: serde_json::Value,
    registry: &QualifierTypeRegistry,
) -> Result<Arc<ResourceCollection>, CollectionLoadError> {
    let wire: CompiledCollection = serde_json::from_value(value)?;
    Ok(Arc::new(load_collection(wire, registry)?))
}
