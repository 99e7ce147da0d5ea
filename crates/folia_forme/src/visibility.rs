//! Conditional visibility rules.
//!
//! A rule is a disjunction of conjunctions: the rule passes when any
//! group passes, and a group passes when all of its conditions do.
//! Evaluation lives in the resolution pipeline; this module only models
//! the persisted shape.

use serde::{Deserialize, Serialize};

use folia_case::Str;

use crate::value::FieldValue;
use crate::ExtraFields;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRule {
    /// OR of groups.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<ConditionGroup>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroup {
    /// AND of conditions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    Field(FieldCondition),
    ItemCount(ItemCountCondition),
}

/// A comparison against a resolved field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCondition {
    pub field_id: Str,
    pub op: FieldOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
    /// Second bound for `between`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value2: Option<FieldValue>,
    /// Explicit ancestor-loop scope, like a field binding's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_layer_id: Option<Str>,
    /// The left-hand value, resolved during loop expansion so the
    /// visibility filter can stay a pure tree pass. Absent outside loops;
    /// the filter falls back to the ambient page values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<FieldValue>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Field comparison operators. Which operators are meaningful depends on
/// the declared field type; evaluation treats a type mismatch as false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOp {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    IsPresent,
    IsNotPresent,
    Lt,
    Lte,
    Gt,
    Gte,
    Before,
    After,
    Between,
    IsTrue,
    IsFalse,
}

/// A comparison against a loop's materialized item count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCountCondition {
    /// The collection layer whose clone count is inspected.
    pub layer_id: Str,
    pub op: CountOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountOp {
    HasItems,
    HasNoItems,
    Equals,
    NotEquals,
    Lt,
    Gt,
}
