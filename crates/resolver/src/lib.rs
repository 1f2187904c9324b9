//! Context-aware resource resolution for the qres engine.
//!
//! A [`ResourceResolver`] binds a loaded
//! [`collection::ResourceCollection`] to one [`RuntimeContext`] and answers
//! three questions about any resource:
//!
//! - [`resolve_resource`] - the single best candidate under the context;
//! - [`resolve_all_candidates`] - every matching candidate, best first;
//! - [`resolve_composed`] - the candidates merged into one JSON value,
//!   with partial candidates layered over the best full candidate and
//!   `null` acting as a key deletion (configurable).
//!
//! Whole subtrees compose through [`resolve_composed_tree`], with policies
//! for failed leaves and empty branches.
//!
//! ## Caching
//!
//! Results are cached per condition, condition set, and decision in dense
//! arrays keyed by entity index, so repeat lookups are O(1) and the second
//! resolution of anything is a cache hit. A context never changes under a
//! live resolver: build a new one with
//! [`ResourceResolver::with_context`] or wipe the caches with
//! [`ResourceResolver::clear_cache`]. Cache activity is observable through
//! the [`CacheListener`] trait; [`CacheMetrics`] is a ready-made aggregate
//! with per-kind hit/miss/error/clear counters.
//!
//! [`resolve_resource`]: ResourceResolver::resolve_resource
//! [`resolve_all_candidates`]: ResourceResolver::resolve_all_candidates
//! [`resolve_composed`]: ResourceResolver::resolve_composed
//! [`resolve_composed_tree`]: ResourceResolver::resolve_composed_tree

mod context;
mod engine;
mod error;
mod listener;
mod merge;
mod tree;
mod types;

pub use crate::context::RuntimeContext;
pub use crate::engine::{ResolverOptions, ResourceResolver};
pub use crate::error::{
    CompositionError, ContextError, ResolveError, TreeFailure, TreeResolveError,
};
pub use crate::listener::{CacheKind, CacheListener, CacheMetrics, CacheStats, NoopCacheListener};
pub use crate::tree::{
    EmptyBranchHandler, EmptyBranchPolicy, ResourceErrorHandler, ResourceErrorPolicy,
    TreeResolveOptions,
};
pub use crate::types::{ConditionMatch, ConditionSetMatch, DecisionMatch, MatchKind};
