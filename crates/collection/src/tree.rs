//! Hierarchical view over resources by dotted id.
//!
//! Resource ids define a forest: `app.greeting` and `app.farewell` hang off
//! an `app` branch. The tree is built lazily from the arena on first
//! request ([`crate::ResourceCollection::resource_tree`]) and is immutable
//! afterwards; branch children keep the insertion order of the underlying
//! resource array.

use indexmap::IndexMap;

use crate::arena::ResourceCollection;
use crate::index::ResourceIndex;

/// A node in the resource tree: an interior branch or a resource leaf.
#[derive(Debug, Clone)]
pub enum ResourceTreeNode {
    Branch(ResourceTreeBranch),
    Leaf(ResourceTreeLeaf),
}

impl ResourceTreeNode {
    /// Last path segment of the node.
    pub fn name(&self) -> &str {
        match self {
            ResourceTreeNode::Branch(b) => &b.name,
            ResourceTreeNode::Leaf(l) => &l.name,
        }
    }

    /// Full dotted path of the node.
    pub fn path(&self) -> &str {
        match self {
            ResourceTreeNode::Branch(b) => &b.path,
            ResourceTreeNode::Leaf(l) => &l.path,
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, ResourceTreeNode::Branch(_))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, ResourceTreeNode::Leaf(_))
    }
}

/// An interior node with insertion-ordered children.
#[derive(Debug, Clone)]
pub struct ResourceTreeBranch {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) children: IndexMap<String, ResourceTreeNode>,
}

impl ResourceTreeBranch {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &ResourceTreeNode)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn child(&self, name: &str) -> Option<&ResourceTreeNode> {
        self.children.get(name)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// A terminal node referencing exactly one resource.
#[derive(Debug, Clone)]
pub struct ResourceTreeLeaf {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) resource: ResourceIndex,
}

impl ResourceTreeLeaf {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn resource(&self) -> ResourceIndex {
        self.resource
    }
}

/// The forest of all resources in a collection, keyed by dotted path.
#[derive(Debug, Clone, Default)]
pub struct ResourceTree {
    roots: IndexMap<String, ResourceTreeNode>,
}

impl ResourceTree {
    /// Build the tree from the arena's resource array, in index order.
    ///
    /// The loader guarantees every id has non-empty segments and that no id
    /// is a dotted prefix of another, so insertion cannot conflict.
    pub(crate) fn build(collection: &ResourceCollection) -> Self {
        let mut tree = Self::default();
        for resource in collection.resources() {
            tree.insert(&resource.id, resource.index);
        }
        tree
    }

    fn insert(&mut self, id: &str, resource: ResourceIndex) {
        let mut segments = id.split('.').peekable();
        let mut current = &mut self.roots;
        let mut prefix = String::with_capacity(id.len());
        while let Some(segment) = segments.next() {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            if segments.peek().is_none() {
                current.insert(
                    segment.to_string(),
                    ResourceTreeNode::Leaf(ResourceTreeLeaf {
                        name: segment.to_string(),
                        path: id.to_string(),
                        resource,
                    }),
                );
                return;
            }
            let node = current.entry(segment.to_string()).or_insert_with(|| {
                ResourceTreeNode::Branch(ResourceTreeBranch {
                    name: segment.to_string(),
                    path: prefix.clone(),
                    children: IndexMap::new(),
                })
            });
            current = match node {
                ResourceTreeNode::Branch(branch) => &mut branch.children,
                ResourceTreeNode::Leaf(_) => {
                    debug_assert!(false, "leaf/branch collision at {prefix}; ids are validated");
                    return;
                }
            };
        }
    }

    /// Walk the tree to the node at `id`, branch or leaf.
    pub fn get_by_id(&self, id: &str) -> Option<&ResourceTreeNode> {
        let mut segments = id.split('.');
        let first = segments.next()?;
        let mut node = self.roots.get(first)?;
        for segment in segments {
            node = match node {
                ResourceTreeNode::Branch(branch) => branch.children.get(segment)?,
                ResourceTreeNode::Leaf(_) => return None,
            };
        }
        Some(node)
    }

    /// Top-level nodes in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = (&str, &ResourceTreeNode)> {
        self.roots.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
