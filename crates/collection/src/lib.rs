//! Compiled resource collections for the qres resolution engine.
//!
//! This is where a compiled collection enters the engine. The wire format
//! ([`CompiledCollection`]) is a single JSON object of dense entity arrays;
//! [`load_collection`] validates it against a
//! [`qualifier::QualifierTypeRegistry`] and reconstructs the
//! [`ResourceCollection`] arena the resolver runs against.
//!
//! ## What lives here
//!
//! - **Strongly-typed indices** - one newtype per entity kind, dense and
//!   assigned in wire order, so cross-kind mixups are compile errors and
//!   resolver caches can be plain arrays.
//! - **The arena** - contiguous, immutable entity storage with
//!   bounds-checked `*_at` accessors and an O(1) `resource_by_id` map.
//! - **The loader** - dependency-ordered reconstruction that aggregates
//!   every violation (bad references, broken dedup, malformed ids) into a
//!   single [`LoadError`] instead of stopping at the first.
//! - **The resource tree** - a lazily built, memoized hierarchy over
//!   dotted resource ids for subtree composition.
//!
//! Everything is read-only after a successful load; share the collection
//! behind an `Arc` and hand it to as many resolvers as needed.

mod arena;
mod error;
mod index;
mod loader;
mod model;
mod tree;
mod wire;

pub use crate::arena::ResourceCollection;
pub use crate::error::{CollectionError, LoadError, LoadIssue};
pub use crate::index::{
    ConditionIndex, ConditionSetIndex, DecisionIndex, QualifierIndex, QualifierTypeIndex,
    ResourceIndex, ResourceTypeIndex,
};
pub use crate::loader::load_collection;
pub use crate::model::{
    BinaryCondition, Condition, ConditionSet, Decision, MergeMethod, Qualifier, QualifierType,
    Resource, ResourceCandidate, ResourceType, UnconditionalCondition,
};
pub use crate::tree::{ResourceTree, ResourceTreeBranch, ResourceTreeLeaf, ResourceTreeNode};
pub use crate::wire::{
    CompiledCollection, WireCandidate, WireCondition, WireConditionSet, WireDecision,
    WireQualifier, WireQualifierType, WireResource, WireResourceType,
};
