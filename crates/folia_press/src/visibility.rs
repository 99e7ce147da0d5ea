//! Visibility evaluation and pruning.
//!
//! A pure tree pass, no I/O: field conditions compare against values
//! resolved during expansion (or the ambient page values), item-count
//! conditions read the clone counts the loops already materialized.
//! A failing layer is pruned with its entire subtree.

use chrono::DateTime;

use folia_case::{FxHashMap, Str};
use folia_forme::{
    Condition, CountOp, FieldCondition, FieldOp, FieldValue, Layer, ValueMap, VisibilityRule,
};

/// Count materialized clones per loop fragment id.
pub fn collect_loop_counts(layers: &[Layer]) -> FxHashMap<Str, u32> {
    let mut counts = FxHashMap::default();
    for layer in layers {
        collect_counts(layer, &mut counts);
    }
    counts
}

fn collect_counts(layer: &Layer, counts: &mut FxHashMap<Str, u32>) {
    if layer.is_fragment() {
        let clones = layer
            .children
            .iter()
            .filter(|c| c.collection_item_id.is_some())
            .count() as u32;
        counts.insert(layer.id.clone(), clones);
    }
    for child in &layer.children {
        collect_counts(child, counts);
    }
}

/// Drop hidden layers and layers whose visibility rule fails, along
/// with their whole subtrees.
pub fn filter_tree(layers: Vec<Layer>, ambient: &ValueMap) -> Vec<Layer> {
    let counts = collect_loop_counts(&layers);
    filter_layers(layers, ambient, &counts)
}

fn filter_layers(
    layers: Vec<Layer>,
    ambient: &ValueMap,
    counts: &FxHashMap<Str, u32>,
) -> Vec<Layer> {
    layers
        .into_iter()
        .filter_map(|mut layer| {
            if layer.settings.hidden {
                return None;
            }
            if let Some(rule) = &layer.visibility {
                let visible = evaluate_rule(rule, &|c| lookup_field(c, ambient), counts);
                if !visible {
                    return None;
                }
            }
            layer.children = filter_layers(std::mem::take(&mut layer.children), ambient, counts);
            Some(layer)
        })
        .collect()
}

fn lookup_field(condition: &FieldCondition, ambient: &ValueMap) -> Option<FieldValue> {
    condition
        .resolved
        .clone()
        .or_else(|| ambient.get(condition.field_id.as_str()).cloned())
}

/// Evaluate a rule: OR over groups, AND within a group. An empty rule
/// (or empty group) passes.
pub fn evaluate_rule(
    rule: &VisibilityRule,
    lookup: &dyn Fn(&FieldCondition) -> Option<FieldValue>,
    counts: &FxHashMap<Str, u32>,
) -> bool {
    if rule.groups.is_empty() {
        return true;
    }
    rule.groups.iter().any(|group| {
        group.conditions.iter().all(|condition| match condition {
            Condition::Field(c) => check_field(c, lookup(c).as_ref()),
            Condition::ItemCount(c) => {
                let count = counts.get(c.layer_id.as_str()).copied().unwrap_or(0);
                check_count(c.op, count, c.count.unwrap_or(0))
            }
        })
    })
}

fn check_field(condition: &FieldCondition, lhs: Option<&FieldValue>) -> bool {
    use FieldOp::*;
    match condition.op {
        IsPresent => lhs.is_some_and(FieldValue::is_present),
        IsNotPresent => !lhs.is_some_and(FieldValue::is_present),
        IsTrue => matches!(lhs, Some(FieldValue::Bool(true))),
        IsFalse => matches!(lhs, Some(FieldValue::Bool(false))),
        Equals => values_equal(lhs, condition.value.as_ref()),
        NotEquals => !values_equal(lhs, condition.value.as_ref()),
        Contains => text_contains(lhs, condition.value.as_ref()),
        NotContains => !text_contains(lhs, condition.value.as_ref()),
        Lt => numeric_cmp(lhs, condition.value.as_ref()).is_some_and(std::cmp::Ordering::is_lt),
        Lte => numeric_cmp(lhs, condition.value.as_ref()).is_some_and(std::cmp::Ordering::is_le),
        Gt => numeric_cmp(lhs, condition.value.as_ref()).is_some_and(std::cmp::Ordering::is_gt),
        Gte => numeric_cmp(lhs, condition.value.as_ref()).is_some_and(std::cmp::Ordering::is_ge),
        Before => date_cmp(lhs, condition.value.as_ref()).is_some_and(std::cmp::Ordering::is_lt),
        After => date_cmp(lhs, condition.value.as_ref()).is_some_and(std::cmp::Ordering::is_gt),
        Between => {
            date_cmp(lhs, condition.value.as_ref()).is_some_and(std::cmp::Ordering::is_ge)
                && date_cmp(lhs, condition.value2.as_ref()).is_some_and(std::cmp::Ordering::is_le)
        }
    }
}

fn check_count(op: CountOp, count: u32, expected: u32) -> bool {
    match op {
        CountOp::HasItems => count > 0,
        CountOp::HasNoItems => count == 0,
        CountOp::Equals => count == expected,
        CountOp::NotEquals => count != expected,
        CountOp::Lt => count < expected,
        CountOp::Gt => count > expected,
    }
}

fn values_equal(lhs: Option<&FieldValue>, rhs: Option<&FieldValue>) -> bool {
    let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
        return false;
    };
    match (lhs.as_number().or_else(|| parse_number(lhs)), rhs.as_number().or_else(|| parse_number(rhs))) {
        (Some(a), Some(b)) => a == b,
        _ => lhs.display() == rhs.display(),
    }
}

fn text_contains(lhs: Option<&FieldValue>, rhs: Option<&FieldValue>) -> bool {
    let (Some(lhs), Some(rhs)) = (lhs, rhs) else {
        return false;
    };
    lhs.display().contains(rhs.display().as_str())
}

fn parse_number(value: &FieldValue) -> Option<f64> {
    value.as_str().and_then(|s| s.trim().parse::<f64>().ok())
}

fn numeric_cmp(lhs: Option<&FieldValue>, rhs: Option<&FieldValue>) -> Option<std::cmp::Ordering> {
    let a = lhs.and_then(|v| v.as_number().or_else(|| parse_number(v)))?;
    let b = rhs.and_then(|v| v.as_number().or_else(|| parse_number(v)))?;
    Some(a.total_cmp(&b))
}

fn date_cmp(lhs: Option<&FieldValue>, rhs: Option<&FieldValue>) -> Option<std::cmp::Ordering> {
    let a = DateTime::parse_from_rfc3339(lhs?.as_str()?).ok()?;
    let b = DateTime::parse_from_rfc3339(rhs?.as_str()?).ok()?;
    Some(a.cmp(&b))
}
