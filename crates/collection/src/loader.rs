//! Reconstruction of a [`ResourceCollection`] from its wire format.
//!
//! Entities are built in dependency order: qualifier types, qualifiers,
//! resource types, conditions, condition sets, decisions, resources.
//! Validation does not stop at the first problem; every violation is
//! collected with its wire position and the whole batch is returned as one
//! [`LoadError`] so authors can fix a broken collection in a single pass.

use std::sync::{Arc, OnceLock};

use hashbrown::{HashMap, HashSet};
use qualifier::{Operator, QualifierMatcher, QualifierTypeRegistry};
use tracing::debug;

use crate::arena::ResourceCollection;
use crate::error::{LoadError, LoadIssue};
use crate::index::{
    ConditionIndex, ConditionSetIndex, DecisionIndex, QualifierIndex, QualifierTypeIndex,
    ResourceIndex, ResourceTypeIndex,
};
use crate::model::{
    BinaryCondition, Condition, ConditionKey, ConditionSet, Decision, Qualifier, QualifierType,
    Resource, ResourceCandidate, ResourceType, UnconditionalCondition,
};
use crate::wire::{CompiledCollection, WireCondition};

/// Reserved id prefix for unsaved authoring-side placeholders. Compiled
/// collections must never contain it.
const RESERVED_ID_PREFIX: &str = "new-resource-";

#[derive(Default)]
struct IssueCollector {
    issues: Vec<LoadIssue>,
}

impl IssueCollector {
    fn push(&mut self, position: String, message: impl Into<String>) {
        self.issues.push(LoadIssue {
            position,
            message: message.into(),
        });
    }

    fn finish(self) -> Result<(), LoadError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(LoadError::new(self.issues))
        }
    }
}

/// Stand-in matcher for qualifier types that failed to instantiate. The
/// load already failed at that point; the placeholder only keeps indices
/// dense so later entries still validate against the right positions.
struct UnresolvedMatcher;

impl QualifierMatcher for UnresolvedMatcher {
    fn matches(&self, _condition_value: &str, _context_value: &str, _operator: Operator) -> f32 {
        0.0
    }
}

/// Validate a dotted resource id: one or more non-empty segments, no
/// reserved prefix.
fn validate_resource_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("id must not be empty".to_string());
    }
    if id.starts_with(RESERVED_ID_PREFIX) {
        return Err(format!("id must not start with '{RESERVED_ID_PREFIX}'"));
    }
    if id.split('.').any(str::is_empty) {
        return Err(format!("id '{id}' contains an empty path segment"));
    }
    Ok(())
}

fn audit_indices(
    issues: &mut IssueCollector,
    kind: &str,
    assigned: impl Iterator<Item = usize>,
) {
    for (position, index) in assigned.enumerate() {
        if index != position {
            issues.push(
                format!("{kind}[{position}]"),
                format!("assigned index {index} does not match wire position"),
            );
        }
    }
}

/// Build the entity arena from a compiled collection.
///
/// Qualifier type names are resolved against `registry`; each gets its own
/// matcher instance configured with the collection's config blob. Any
/// violation fails the whole load.
pub fn load_collection(
    wire: CompiledCollection,
    registry: &QualifierTypeRegistry,
) -> Result<ResourceCollection, LoadError> {
    let mut issues = IssueCollector::default();

    // Qualifier types resolve against the registry.
    let mut qualifier_types: Vec<QualifierType> = Vec::with_capacity(wire.qualifier_types.len());
    let mut seen_names: HashSet<String> = HashSet::new();
    for (i, wt) in wire.qualifier_types.into_iter().enumerate() {
        let position = format!("qualifierTypes[{i}]");
        if wt.name.is_empty() {
            issues.push(position.clone(), "name must not be empty");
        } else if !seen_names.insert(wt.name.clone()) {
            issues.push(position.clone(), format!("duplicate name '{}'", wt.name));
        }
        let matcher = match registry.instantiate(&wt.name, &wt.config) {
            Ok(matcher) => matcher,
            Err(err) => {
                issues.push(position, err.to_string());
                Arc::new(UnresolvedMatcher)
            }
        };
        qualifier_types.push(QualifierType::new(
            QualifierTypeIndex::from_usize(i),
            wt.name,
            wt.config,
            matcher,
        ));
    }

    // Qualifiers reference qualifier types by index.
    let mut qualifiers: Vec<Qualifier> = Vec::with_capacity(wire.qualifiers.len());
    let mut seen_names: HashSet<String> = HashSet::new();
    for (i, wq) in wire.qualifiers.into_iter().enumerate() {
        let position = format!("qualifiers[{i}]");
        if wq.name.is_empty() {
            issues.push(position.clone(), "name must not be empty");
        } else if !seen_names.insert(wq.name.clone()) {
            issues.push(position.clone(), format!("duplicate name '{}'", wq.name));
        }
        if wq.qualifier_type.as_usize() >= qualifier_types.len() {
            issues.push(
                position,
                format!(
                    "qualifier type index {} is out of range ({} defined)",
                    wq.qualifier_type,
                    qualifier_types.len()
                ),
            );
        }
        qualifiers.push(Qualifier {
            index: QualifierIndex::from_usize(i),
            name: wq.name,
            qualifier_type: wq.qualifier_type,
            default_priority: wq.default_priority,
        });
    }

    let mut resource_types: Vec<ResourceType> = Vec::with_capacity(wire.resource_types.len());
    let mut seen_names: HashSet<String> = HashSet::new();
    for (i, wt) in wire.resource_types.into_iter().enumerate() {
        let position = format!("resourceTypes[{i}]");
        if wt.name.is_empty() {
            issues.push(position.clone(), "name must not be empty");
        } else if !seen_names.insert(wt.name.clone()) {
            issues.push(position, format!("duplicate name '{}'", wt.name));
        }
        resource_types.push(ResourceType {
            index: ResourceTypeIndex::from_usize(i),
            name: wt.name,
            config: wt.config,
        });
    }

    // Conditions reference qualifiers by index. Like sets and decisions
    // below, equal conditions collapse at build time, so a surviving
    // duplicate is a self-inconsistency.
    let mut conditions: Vec<Condition> = Vec::with_capacity(wire.conditions.len());
    let mut condition_keys: HashMap<ConditionKey, usize> = HashMap::new();
    for (i, wc) in wire.conditions.into_iter().enumerate() {
        let position = format!("conditions[{i}]");
        let index = ConditionIndex::from_usize(i);
        let condition = match wc {
            WireCondition::Binary {
                qualifier_index,
                operator,
                value,
                priority,
                score_as_default,
            } => {
                if qualifier_index.as_usize() >= qualifiers.len() {
                    issues.push(
                        position.clone(),
                        format!(
                            "qualifier index {} is out of range ({} defined)",
                            qualifier_index,
                            qualifiers.len()
                        ),
                    );
                }
                if value.is_empty() {
                    issues.push(position.clone(), "value must not be empty");
                }
                if let Some(score) = score_as_default {
                    if !(0.0..=1.0).contains(&score) {
                        issues.push(
                            position.clone(),
                            format!("scoreAsDefault {score} must be within [0.0, 1.0]"),
                        );
                    }
                }
                Condition::Binary(BinaryCondition {
                    index,
                    qualifier: qualifier_index,
                    operator,
                    value,
                    priority,
                    score_as_default,
                })
            }
            WireCondition::Unconditional { always } => {
                Condition::Unconditional(UnconditionalCondition { index, always })
            }
        };
        if let Some(&first) = condition_keys.get(&condition.key()) {
            issues.push(
                position,
                format!("duplicate of conditions[{first}]; equal conditions must share one index"),
            );
        } else {
            condition_keys.insert(condition.key(), i);
        }
        conditions.push(condition);
    }

    // Condition sets: add-or-get. A set equal to an earlier one would have
    // collapsed to that index at build time, so a surviving duplicate means
    // the wire format is self-inconsistent.
    let mut condition_sets: Vec<ConditionSet> = Vec::with_capacity(wire.condition_sets.len());
    let mut set_keys: HashMap<Vec<u32>, usize> = HashMap::new();
    for (i, ws) in wire.condition_sets.into_iter().enumerate() {
        let position = format!("conditionSets[{i}]");
        for condition in &ws.conditions {
            if condition.as_usize() >= conditions.len() {
                issues.push(
                    position.clone(),
                    format!(
                        "condition index {} is out of range ({} defined)",
                        condition,
                        conditions.len()
                    ),
                );
            }
        }
        let set = ConditionSet {
            index: ConditionSetIndex::from_usize(i),
            conditions: ws.conditions,
        };
        if let Some(&first) = set_keys.get(&set.key()) {
            issues.push(
                position,
                format!("duplicate of conditionSets[{first}]; equal sets must share one index"),
            );
        } else {
            set_keys.insert(set.key(), i);
        }
        condition_sets.push(set);
    }

    // Decisions: same add-or-get rule over ordered condition-set tuples.
    let mut decisions: Vec<Decision> = Vec::with_capacity(wire.decisions.len());
    let mut decision_keys: HashMap<Vec<u32>, usize> = HashMap::new();
    for (i, wd) in wire.decisions.into_iter().enumerate() {
        let position = format!("decisions[{i}]");
        for condition_set in &wd.condition_sets {
            if condition_set.as_usize() >= condition_sets.len() {
                issues.push(
                    position.clone(),
                    format!(
                        "condition set index {} is out of range ({} defined)",
                        condition_set,
                        condition_sets.len()
                    ),
                );
            }
        }
        let decision = Decision {
            index: DecisionIndex::from_usize(i),
            condition_sets: wd.condition_sets,
        };
        if let Some(&first) = decision_keys.get(&decision.key()) {
            issues.push(
                position,
                format!("duplicate of decisions[{first}]; equal decisions must share one index"),
            );
        } else {
            decision_keys.insert(decision.key(), i);
        }
        decisions.push(decision);
    }

    // Resources reference resource types and decisions; candidate counts
    // must line up with the decision's slots.
    let mut resources: Vec<Resource> = Vec::with_capacity(wire.resources.len());
    let mut resources_by_id: HashMap<String, ResourceIndex> = HashMap::new();
    for (i, wr) in wire.resources.into_iter().enumerate() {
        let position = format!("resources[{i}]");
        if let Err(message) = validate_resource_id(&wr.id) {
            issues.push(position.clone(), message);
        }
        if wr.resource_type.as_usize() >= resource_types.len() {
            issues.push(
                position.clone(),
                format!(
                    "resource type index {} is out of range ({} defined)",
                    wr.resource_type,
                    resource_types.len()
                ),
            );
        }
        match decisions.get(wr.decision.as_usize()) {
            Some(decision) => {
                if decision.condition_sets.len() != wr.candidates.len() {
                    issues.push(
                        position.clone(),
                        format!(
                            "candidate count {} does not match decision slot count {}",
                            wr.candidates.len(),
                            decision.condition_sets.len()
                        ),
                    );
                }
            }
            None => {
                issues.push(
                    position.clone(),
                    format!(
                        "decision index {} is out of range ({} defined)",
                        wr.decision,
                        decisions.len()
                    ),
                );
            }
        }
        let index = ResourceIndex::from_usize(i);
        if resources_by_id.insert(wr.id.clone(), index).is_some() {
            issues.push(position, format!("duplicate resource id '{}'", wr.id));
        }
        let name = wr.id.rsplit('.').next().unwrap_or_default().to_string();
        resources.push(Resource {
            index,
            id: wr.id,
            name,
            resource_type: wr.resource_type,
            decision: wr.decision,
            candidates: wr
                .candidates
                .into_iter()
                .map(|c| ResourceCandidate {
                    json: c.json,
                    is_partial: c.is_partial,
                    merge_method: c.merge_method,
                })
                .collect(),
        });
    }

    // An id that is also a dotted prefix of another id would make one tree
    // node both leaf and branch.
    for resource in &resources {
        let id = &resource.id;
        let mut end = 0;
        for segment in id.split('.') {
            end += segment.len();
            if end == id.len() {
                break;
            }
            let prefix = &id[..end];
            if resources_by_id.contains_key(prefix) {
                issues.push(
                    format!("resources[{}]", resource.index),
                    format!("id '{id}' conflicts with resource '{prefix}'"),
                );
            }
            end += 1; // the dot
        }
    }

    // Fail closed if any assigned index drifted from its wire position.
    audit_indices(
        &mut issues,
        "qualifierTypes",
        qualifier_types.iter().map(|e| e.index.as_usize()),
    );
    audit_indices(
        &mut issues,
        "qualifiers",
        qualifiers.iter().map(|e| e.index.as_usize()),
    );
    audit_indices(
        &mut issues,
        "resourceTypes",
        resource_types.iter().map(|e| e.index.as_usize()),
    );
    audit_indices(
        &mut issues,
        "conditions",
        conditions.iter().map(|e| e.index().as_usize()),
    );
    audit_indices(
        &mut issues,
        "conditionSets",
        condition_sets.iter().map(|e| e.index.as_usize()),
    );
    audit_indices(
        &mut issues,
        "decisions",
        decisions.iter().map(|e| e.index.as_usize()),
    );
    audit_indices(
        &mut issues,
        "resources",
        resources.iter().map(|e| e.index.as_usize()),
    );

    issues.finish()?;

    debug!(
        qualifier_types = qualifier_types.len(),
        qualifiers = qualifiers.len(),
        resource_types = resource_types.len(),
        conditions = conditions.len(),
        condition_sets = condition_sets.len(),
        decisions = decisions.len(),
        resources = resources.len(),
        "compiled collection loaded"
    );

    Ok(ResourceCollection {
        qualifier_types,
        qualifiers,
        resource_types,
        conditions,
        condition_sets,
        decisions,
        resources,
        resources_by_id,
        tree: OnceLock::new(),
    })
}
