//! On-wire compiled collection format.
//!
//! A single JSON object of dense arrays; each element's index is implied by
//! its position. Cross-references are plain numeric indices into the other
//! arrays. The shape is produced by an authoring/build pipeline outside
//! this crate; [`crate::load_collection`] validates and reconstructs it.
//!
//! ```json
//! {
//!   "qualifierTypes": [{ "name": "string-equals", "config": null }],
//!   "qualifiers": [{ "name": "language", "type": 0, "defaultPriority": 100 }],
//!   "resourceTypes": [{ "name": "json", "config": null }],
//!   "conditions": [{ "qualifierIndex": 0, "value": "en", "priority": 100 }],
//!   "conditionSets": [{ "conditions": [0] }],
//!   "decisions": [{ "conditionSets": [0] }],
//!   "resources": [{
//!     "id": "app.greeting", "type": 0, "decision": 0,
//!     "candidates": [{ "json": { "text": "Hello" } }]
//!   }]
//! }
//! ```

use qualifier::Operator;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::index::{
    ConditionIndex, ConditionSetIndex, DecisionIndex, QualifierIndex, QualifierTypeIndex,
    ResourceTypeIndex,
};
use crate::model::MergeMethod;

/// The complete compiled collection as it arrives over the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompiledCollection {
    pub qualifier_types: Vec<WireQualifierType>,
    pub qualifiers: Vec<WireQualifier>,
    pub resource_types: Vec<WireResourceType>,
    pub conditions: Vec<WireCondition>,
    pub condition_sets: Vec<WireConditionSet>,
    pub decisions: Vec<WireDecision>,
    pub resources: Vec<WireResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireQualifierType {
    pub name: String,
    #[serde(default)]
    pub config: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireQualifier {
    pub name: String,
    #[serde(rename = "type")]
    pub qualifier_type: QualifierTypeIndex,
    #[serde(default)]
    pub default_priority: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireResourceType {
    pub name: String,
    #[serde(default)]
    pub config: JsonValue,
}

/// Wire shape of a condition: the qualifier comparison of the format
/// reference, or the constant `{ "always": bool }` form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireCondition {
    #[serde(rename_all = "camelCase")]
    Binary {
        qualifier_index: QualifierIndex,
        /// Defaults to `matches` when omitted.
        #[serde(default)]
        operator: Operator,
        value: String,
        priority: u16,
        #[serde(default)]
        score_as_default: Option<f32>,
    },
    Unconditional { always: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireConditionSet {
    pub conditions: Vec<ConditionIndex>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDecision {
    pub condition_sets: Vec<ConditionSetIndex>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireResource {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceTypeIndex,
    pub decision: DecisionIndex,
    #[serde(default)]
    pub candidates: Vec<WireCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCandidate {
    pub json: JsonValue,
    #[serde(default)]
    pub is_partial: bool,
    /// Defaults to `replace` when omitted.
    #[serde(default)]
    pub merge_method: MergeMethod,
}
