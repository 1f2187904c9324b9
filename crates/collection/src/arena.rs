//! Densely indexed, immutable storage for one loaded collection.

use std::fmt;
use std::sync::{Arc, OnceLock};

use hashbrown::HashMap;

use crate::error::CollectionError;
use crate::index::{
    ConditionIndex, ConditionSetIndex, DecisionIndex, QualifierIndex, QualifierTypeIndex,
    ResourceIndex, ResourceTypeIndex,
};
use crate::model::{
    Condition, ConditionSet, Decision, Qualifier, QualifierType, Resource, ResourceType,
};
use crate::tree::ResourceTree;

/// The entity arena reconstructed from a compiled collection.
///
/// Arrays are contiguous and keyed by the matching index type; for every
/// entity, `entity.index` equals its array position (the loader fails
/// closed otherwise). The arena exclusively owns all entities and is
/// read-only after construction, so any number of resolvers can share it
/// behind an `Arc` without synchronization.
pub struct ResourceCollection {
    pub(crate) qualifier_types: Vec<QualifierType>,
    pub(crate) qualifiers: Vec<Qualifier>,
    pub(crate) resource_types: Vec<ResourceType>,
    pub(crate) conditions: Vec<Condition>,
    pub(crate) condition_sets: Vec<ConditionSet>,
    pub(crate) decisions: Vec<Decision>,
    pub(crate) resources: Vec<Resource>,
    pub(crate) resources_by_id: HashMap<String, ResourceIndex>,
    pub(crate) tree: OnceLock<Arc<ResourceTree>>,
}

macro_rules! indexed_accessors {
    ($at:ident, $count:ident, $all:ident, $field:ident, $index:ty, $entity:ty, $kind:literal) => {
        pub fn $at(&self, index: $index) -> Result<&$entity, CollectionError> {
            self.$field
                .get(index.as_usize())
                .ok_or(CollectionError::IndexOutOfRange {
                    kind: $kind,
                    index: index.as_usize(),
                    size: self.$field.len(),
                })
        }

        pub fn $count(&self) -> usize {
            self.$field.len()
        }

        pub fn $all(&self) -> &[$entity] {
            &self.$field
        }
    };
}

impl ResourceCollection {
    indexed_accessors!(
        qualifier_type_at,
        qualifier_type_count,
        qualifier_types,
        qualifier_types,
        QualifierTypeIndex,
        QualifierType,
        "qualifier type"
    );
    indexed_accessors!(
        qualifier_at,
        qualifier_count,
        qualifiers,
        qualifiers,
        QualifierIndex,
        Qualifier,
        "qualifier"
    );
    indexed_accessors!(
        resource_type_at,
        resource_type_count,
        resource_types,
        resource_types,
        ResourceTypeIndex,
        ResourceType,
        "resource type"
    );
    indexed_accessors!(
        condition_at,
        condition_count,
        conditions,
        conditions,
        ConditionIndex,
        Condition,
        "condition"
    );
    indexed_accessors!(
        condition_set_at,
        condition_set_count,
        condition_sets,
        condition_sets,
        ConditionSetIndex,
        ConditionSet,
        "condition set"
    );
    indexed_accessors!(
        decision_at,
        decision_count,
        decisions,
        decisions,
        DecisionIndex,
        Decision,
        "decision"
    );
    indexed_accessors!(
        resource_at,
        resource_count,
        resources,
        resources,
        ResourceIndex,
        Resource,
        "resource"
    );

    /// The qualifier type a qualifier binds to. The reference was
    /// validated at load, so this indexes directly.
    pub fn qualifier_type_of(&self, qualifier: &Qualifier) -> &QualifierType {
        &self.qualifier_types[qualifier.qualifier_type.as_usize()]
    }

    /// O(1) lookup of a resource by its full dotted id.
    pub fn resource_by_id(&self, id: &str) -> Option<&Resource> {
        let index = *self.resources_by_id.get(id)?;
        self.resources.get(index.as_usize())
    }

    /// Case-sensitive lookup of a qualifier by name. Collections carry a
    /// handful of qualifiers, so a scan beats a second map.
    pub fn qualifier_by_name(&self, name: &str) -> Option<&Qualifier> {
        self.qualifiers.iter().find(|q| q.name == name)
    }

    /// The hierarchical view over resource ids, built on first request and
    /// memoized. The returned handle is shared-immutable.
    pub fn resource_tree(&self) -> Arc<ResourceTree> {
        self.tree
            .get_or_init(|| Arc::new(ResourceTree::build(self)))
            .clone()
    }
}

impl fmt::Debug for ResourceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceCollection")
            .field("qualifier_types", &self.qualifier_types.len())
            .field("qualifiers", &self.qualifiers.len())
            .field("resource_types", &self.resource_types.len())
            .field("conditions", &self.conditions.len())
            .field("condition_sets", &self.condition_sets.len())
            .field("decisions", &self.decisions.len())
            .field("resources", &self.resources.len())
            .finish()
    }
}
