//! Entity model for a loaded collection.
//!
//! All entities are immutable after load and carry the dense index they
//! were assigned from their wire position.

use std::fmt;
use std::sync::Arc;

use qualifier::{Operator, QualifierError, QualifierMatcher};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::index::{
    ConditionIndex, ConditionSetIndex, DecisionIndex, QualifierIndex, QualifierTypeIndex,
    ResourceIndex, ResourceTypeIndex,
};

/// A qualifier type bound to this collection: the registered matcher
/// instantiated with the collection's config blob.
pub struct QualifierType {
    pub index: QualifierTypeIndex,
    pub name: String,
    pub config: JsonValue,
    matcher: Arc<dyn QualifierMatcher>,
}

impl QualifierType {
    pub(crate) fn new(
        index: QualifierTypeIndex,
        name: String,
        config: JsonValue,
        matcher: Arc<dyn QualifierMatcher>,
    ) -> Self {
        Self {
            index,
            name,
            config,
            matcher,
        }
    }

    /// Score `context_value` against `condition_value`. `0.0` is no match.
    pub fn matches(&self, condition_value: &str, context_value: &str, operator: Operator) -> f32 {
        self.matcher
            .matches(condition_value, context_value, operator)
    }

    /// Whether `value` is a legal context value for this type.
    pub fn validate_value(&self, value: &str) -> Result<(), QualifierError> {
        self.matcher.validate_value(value)
    }
}

impl fmt::Debug for QualifierType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QualifierType")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// A named dimension of the runtime context (`language`, `platform`, ...).
#[derive(Debug, Clone)]
pub struct Qualifier {
    pub index: QualifierIndex,
    pub name: String,
    pub qualifier_type: QualifierTypeIndex,
    pub default_priority: u16,
}

/// How a candidate expects to be combined with lower-priority candidates.
///
/// Authoring metadata carried through the wire format; composition is
/// driven by [`ResourceCandidate::is_partial`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    Augment,
    #[default]
    Replace,
    Delete,
}

/// A single constraint evaluated against the runtime context.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Constant-result condition: always matches, or never does.
    Unconditional(UnconditionalCondition),
    /// Qualifier comparison with a priority and an optional default score.
    Binary(BinaryCondition),
}

#[derive(Debug, Clone)]
pub struct UnconditionalCondition {
    pub index: ConditionIndex,
    pub always: bool,
}

#[derive(Debug, Clone)]
pub struct BinaryCondition {
    pub index: ConditionIndex,
    pub qualifier: QualifierIndex,
    pub operator: Operator,
    pub value: String,
    pub priority: u16,
    /// Score to report when the comparison itself scores zero; turns the
    /// condition into a default ("match as default") instead of a miss.
    pub score_as_default: Option<f32>,
}

impl Condition {
    pub fn index(&self) -> ConditionIndex {
        match self {
            Condition::Unconditional(c) => c.index,
            Condition::Binary(c) => c.index,
        }
    }

    /// Priority used in candidate ordering. Unconditional conditions rank
    /// below any qualified comparison.
    pub fn priority(&self) -> u16 {
        match self {
            Condition::Unconditional(_) => 0,
            Condition::Binary(c) => c.priority,
        }
    }

    pub(crate) fn key(&self) -> ConditionKey {
        match self {
            Condition::Unconditional(c) => ConditionKey::Unconditional { always: c.always },
            Condition::Binary(c) => ConditionKey::Binary {
                qualifier: c.qualifier.as_u32(),
                operator: c.operator,
                value: c.value.clone(),
                priority: c.priority,
                score_as_default: c.score_as_default.map(f32::to_bits),
            },
        }
    }
}

/// Identity key for condition equality. `score_as_default` is compared by
/// bit pattern so the key can be hashed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum ConditionKey {
    Unconditional {
        always: bool,
    },
    Binary {
        qualifier: u32,
        operator: Operator,
        value: String,
        priority: u16,
        score_as_default: Option<u32>,
    },
}

/// An ordered conjunction of conditions.
///
/// Equal sets (as multisets of condition indices) are deduplicated at build
/// time; the loader verifies the dedup survived the trip over the wire.
#[derive(Debug, Clone)]
pub struct ConditionSet {
    pub index: ConditionSetIndex,
    pub conditions: Vec<ConditionIndex>,
}

impl ConditionSet {
    /// Order-normalized identity key.
    pub(crate) fn key(&self) -> Vec<u32> {
        let mut key: Vec<u32> = self.conditions.iter().map(|c| c.as_u32()).collect();
        key.sort_unstable();
        key
    }
}

/// One candidate-selection slot per resource candidate, each tied to a
/// condition set. Slot order mirrors the owning resource's candidate order.
#[derive(Debug, Clone)]
pub struct Decision {
    pub index: DecisionIndex,
    pub condition_sets: Vec<ConditionSetIndex>,
}

impl Decision {
    /// Ordered identity key (decision equality is position-sensitive).
    pub(crate) fn key(&self) -> Vec<u32> {
        self.condition_sets.iter().map(|c| c.as_u32()).collect()
    }
}

/// A named resource type with its configuration blob.
#[derive(Debug, Clone)]
pub struct ResourceType {
    pub index: ResourceTypeIndex,
    pub name: String,
    pub config: JsonValue,
}

/// One alternative value for a resource.
#[derive(Debug, Clone)]
pub struct ResourceCandidate {
    pub json: JsonValue,
    /// Partial candidates merge onto the best non-partial below them
    /// instead of standing alone.
    pub is_partial: bool,
    pub merge_method: MergeMethod,
}

/// A resolvable resource: dotted id, leaf name, type, decision, candidates.
#[derive(Debug, Clone)]
pub struct Resource {
    pub index: ResourceIndex,
    /// Full dotted path (`"app.greeting"`).
    pub id: String,
    /// Last path segment (`"greeting"`).
    pub name: String,
    pub resource_type: ResourceTypeIndex,
    pub decision: DecisionIndex,
    pub candidates: Vec<ResourceCandidate>,
}
