//! Recursive composition of resource subtrees into JSON documents.
//!
//! A branch becomes an object with one key per child; a leaf becomes the
//! composed value of its resource. Two policies control the awkward cases:
//! what to do when a leaf fails to resolve, and what a branch whose
//! children all dropped out should become. In the default `fail` mode,
//! failures are collected with their dotted paths and the whole composition
//! fails once, at the end, with every message.

use std::fmt;
use std::sync::Arc;

use collection::{ResourceTreeBranch, ResourceTreeLeaf, ResourceTreeNode};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::engine::ResourceResolver;
use crate::error::{ResolveError, TreeFailure, TreeResolveError};

/// Callback deciding the fate of a failed leaf: substitute a value, drop
/// the leaf (`Ok(None)`), or fail with a custom message.
pub type ResourceErrorHandler =
    dyn Fn(&str, &ResolveError) -> Result<Option<JsonValue>, String> + Send + Sync;

/// Callback deciding what an all-empty branch becomes; `None` drops it.
pub type EmptyBranchHandler = dyn Fn(&str) -> Option<JsonValue> + Send + Sync;

/// Policy for a leaf whose resolution fails.
#[derive(Clone, Default)]
pub enum ResourceErrorPolicy {
    /// Collect the failure and fail the whole composition at the end.
    #[default]
    Fail,
    /// Drop the leaf from its parent.
    Ignore,
    /// Hand the failure to a callback.
    Handle(Arc<ResourceErrorHandler>),
}

impl fmt::Debug for ResourceErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceErrorPolicy::Fail => f.write_str("Fail"),
            ResourceErrorPolicy::Ignore => f.write_str("Ignore"),
            ResourceErrorPolicy::Handle(_) => f.write_str("Handle(..)"),
        }
    }
}

/// Policy for a branch whose children all produced nothing.
#[derive(Clone, Default)]
pub enum EmptyBranchPolicy {
    /// Keep the branch as an empty object.
    #[default]
    Allow,
    /// Drop the branch from its parent.
    Omit,
    /// Ask a callback for a replacement value.
    Handle(Arc<EmptyBranchHandler>),
}

impl fmt::Debug for EmptyBranchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmptyBranchPolicy::Allow => f.write_str("Allow"),
            EmptyBranchPolicy::Omit => f.write_str("Omit"),
            EmptyBranchPolicy::Handle(_) => f.write_str("Handle(..)"),
        }
    }
}

/// Options for one tree composition.
#[derive(Debug, Clone, Default)]
pub struct TreeResolveOptions {
    pub on_resource_error: ResourceErrorPolicy,
    pub on_empty_branch: EmptyBranchPolicy,
}

impl TreeResolveOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_on_resource_error(mut self, policy: ResourceErrorPolicy) -> Self {
        self.on_resource_error = policy;
        self
    }

    pub fn with_on_empty_branch(mut self, policy: EmptyBranchPolicy) -> Self {
        self.on_empty_branch = policy;
        self
    }
}

impl ResourceResolver {
    /// Compose the subtree rooted at `id` into a single JSON document.
    ///
    /// `Ok(None)` means the root node itself was omitted by policy.
    pub fn resolve_composed_tree(
        &mut self,
        id: &str,
        options: &TreeResolveOptions,
    ) -> Result<Option<JsonValue>, TreeResolveError> {
        let tree = self.collection().resource_tree();
        let node = tree
            .get_by_id(id)
            .ok_or_else(|| TreeResolveError::UnknownId(id.to_string()))?;
        self.resolve_composed_node(node, options)
    }

    /// Compose the subtree rooted at an already-located tree node.
    pub fn resolve_composed_node(
        &mut self,
        node: &ResourceTreeNode,
        options: &TreeResolveOptions,
    ) -> Result<Option<JsonValue>, TreeResolveError> {
        let mut failures = Vec::new();
        let value = self.resolve_node(node, options, &mut failures);
        if failures.is_empty() {
            Ok(value)
        } else {
            Err(TreeResolveError::Failed(failures))
        }
    }

    fn resolve_node(
        &mut self,
        node: &ResourceTreeNode,
        options: &TreeResolveOptions,
        failures: &mut Vec<TreeFailure>,
    ) -> Option<JsonValue> {
        match node {
            ResourceTreeNode::Leaf(leaf) => self.resolve_leaf(leaf, options, failures),
            ResourceTreeNode::Branch(branch) => self.resolve_branch(branch, options, failures),
        }
    }

    fn resolve_leaf(
        &mut self,
        leaf: &ResourceTreeLeaf,
        options: &TreeResolveOptions,
        failures: &mut Vec<TreeFailure>,
    ) -> Option<JsonValue> {
        let collection = self.collection().clone();
        let resource = match collection.resource_at(leaf.resource()) {
            Ok(resource) => resource,
            Err(err) => {
                failures.push(TreeFailure {
                    path: leaf.path().to_string(),
                    message: err.to_string(),
                });
                return None;
            }
        };
        match self.resolve_composed(resource) {
            Ok(value) => Some(value),
            Err(err) => match &options.on_resource_error {
                ResourceErrorPolicy::Fail => {
                    failures.push(TreeFailure {
                        path: leaf.path().to_string(),
                        message: err.to_string(),
                    });
                    None
                }
                ResourceErrorPolicy::Ignore => {
                    debug!(path = leaf.path(), error = %err, "leaf dropped from composition");
                    None
                }
                ResourceErrorPolicy::Handle(handler) => match handler(leaf.path(), &err) {
                    Ok(replacement) => replacement,
                    Err(message) => {
                        failures.push(TreeFailure {
                            path: leaf.path().to_string(),
                            message,
                        });
                        None
                    }
                },
            },
        }
    }

    fn resolve_branch(
        &mut self,
        branch: &ResourceTreeBranch,
        options: &TreeResolveOptions,
        failures: &mut Vec<TreeFailure>,
    ) -> Option<JsonValue> {
        let mut composed = Map::new();
        for (name, child) in branch.children() {
            if let Some(value) = self.resolve_node(child, options, failures) {
                composed.insert(name.to_string(), value);
            }
        }
        if composed.is_empty() {
            match &options.on_empty_branch {
                EmptyBranchPolicy::Allow => Some(JsonValue::Object(Map::new())),
                EmptyBranchPolicy::Omit => None,
                EmptyBranchPolicy::Handle(handler) => handler(branch.path()),
            }
        } else {
            Some(JsonValue::Object(composed))
        }
    }
}
