//! Component-instance expansion.
//!
//! An instance node keeps its identity; its children are replaced by a
//! deep copy of the component's content tree. Nested instances expand
//! depth-first, then the instance's overrides resolve against the
//! component's slot definitions, and finally the produced subtree is
//! namespaced under the instance id.

use tracing::warn;

use folia_case::{FxHashMap, FxHashSet, Str};
use folia_forme::{Component, ComponentOverrides, Layer, SlotKind, Variable};

use crate::context::PassState;
use crate::errors::{Diagnostic, DiagnosticCode, RepositoryError};
use crate::namespace::namespace_subtree;
use crate::repository::Repository;

/// Fetch every component the tree references, transitively: components
/// referenced by fetched components are fetched in further batches until
/// the set closes.
pub async fn load_components<R: Repository>(
    repo: &R,
    state: &PassState,
    layers: &[Layer],
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<FxHashMap<Str, Component>, RepositoryError> {
    let mut loaded: FxHashMap<Str, Component> = FxHashMap::default();
    let mut known_missing: FxHashSet<Str> = FxHashSet::default();
    let mut pending: Vec<Str> = Vec::new();
    for layer in layers {
        collect_component_ids(layer, &mut pending);
    }

    // components-within-components close after a few rounds; the bound
    // only guards against pathological reference chains
    for _ in 0..32 {
        pending.retain(|id| !loaded.contains_key(id) && !known_missing.contains(id));
        pending.sort();
        pending.dedup();
        if pending.is_empty() {
            break;
        }
        let mut fetched = Vec::new();
        let mut to_fetch = Vec::new();
        for id in std::mem::take(&mut pending) {
            match state.cache.cached_component(&id) {
                Some(component) => fetched.push(component),
                None => to_fetch.push(id),
            }
        }
        if !to_fetch.is_empty() {
            let batch = repo
                .get_components_by_ids(&to_fetch, state.options.published)
                .await?;
            for id in &to_fetch {
                if !batch.iter().any(|c| &c.id == id) {
                    known_missing.insert(id.clone());
                }
            }
            for component in batch {
                state.cache.store_component(component.clone());
                fetched.push(component);
            }
        }
        for component in fetched {
            collect_component_ids(&component.layer, &mut pending);
            loaded.insert(component.id.clone(), component);
        }
    }

    if !known_missing.is_empty() {
        warn!(count = known_missing.len(), "referenced components not found");
        for id in &known_missing {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::ReferenceMissing,
                id.clone(),
                format!("component '{id}' not found"),
            ));
        }
    }
    Ok(loaded)
}

fn collect_component_ids(layer: &Layer, out: &mut Vec<Str>) {
    if let Some(id) = &layer.component_id {
        out.push(id.clone());
    }
    for child in &layer.children {
        collect_component_ids(child, out);
    }
}

/// Expand every component instance in the given layers.
pub fn expand_components(
    layers: Vec<Layer>,
    components: &FxHashMap<Str, Component>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Layer> {
    let mut path = Vec::new();
    layers
        .into_iter()
        .map(|layer| expand_layer(layer, components, &mut path, diagnostics))
        .collect()
}

fn expand_layer(
    mut layer: Layer,
    components: &FxHashMap<Str, Component>,
    path: &mut Vec<Str>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Layer {
    let Some(component_id) = layer.component_id.clone() else {
        layer.children = layer
            .children
            .into_iter()
            .map(|child| expand_layer(child, components, path, diagnostics))
            .collect();
        return layer;
    };

    let Some(component) = components.get(&component_id) else {
        diagnostics.push(Diagnostic::warning(
            DiagnosticCode::ReferenceMissing,
            layer.id.clone(),
            format!("component '{component_id}' not found"),
        ));
        layer.children = layer
            .children
            .into_iter()
            .map(|child| expand_layer(child, components, path, diagnostics))
            .collect();
        return layer;
    };

    if path.contains(&component_id) {
        // a component instancing itself transitively would recurse forever;
        // leave this branch unexpanded
        diagnostics.push(Diagnostic::warning(
            DiagnosticCode::ComponentCycle,
            layer.id.clone(),
            format!("component '{component_id}' instances itself"),
        ));
        return layer;
    }

    path.push(component_id.clone());
    let mut children: Vec<Layer> = component.layer.children.clone();
    for child in &mut children {
        tag_with_component(child, &component_id);
    }
    children = children
        .into_iter()
        .map(|child| expand_layer(child, components, path, diagnostics))
        .collect();

    let overrides = layer.component_overrides.clone().unwrap_or_default();
    for child in &mut children {
        apply_overrides(child, component, &overrides);
    }
    path.pop();

    namespace_subtree(&mut children, &layer.id);
    layer.children = children;
    layer
}

fn tag_with_component(layer: &mut Layer, component_id: &Str) {
    if layer.source_component_id.is_none() {
        layer.source_component_id = Some(component_id.clone());
    }
    for child in &mut layer.children {
        tag_with_component(child, component_id);
    }
}

/// Resolve linked slots: `override ?? slot default ?? empty`. A link
/// whose override entry is present but valueless resolves to an empty
/// value, never to the component's authored literal.
fn apply_overrides(layer: &mut Layer, component: &Component, overrides: &ComponentOverrides) {
    let links: Vec<(Str, Str)> = layer
        .variable_links
        .iter()
        .map(|(slot, var_id)| (slot.clone(), var_id.clone()))
        .collect();
    for (slot_name, variable_id) in links {
        let Some(definition) = component.variable(&variable_id) else {
            // belongs to another component on the path; leave for its owner
            continue;
        };
        if definition.kind == SlotKind::Link {
            layer.variables.link = match overrides.link_entry(&variable_id) {
                Some(Some(link)) => Some(link.clone()),
                Some(None) => None,
                None => definition.default_link.clone(),
            };
        } else {
            let effective = match overrides.value_entry(definition.kind, &variable_id) {
                Some(Some(variable)) => variable.clone(),
                Some(None) => Variable::empty(),
                None => definition
                    .default_value
                    .clone()
                    .unwrap_or_else(Variable::empty),
            };
            layer.variables.set_slot(&slot_name, effective);
        }
        layer.variable_links.remove(&slot_name);
    }
    for child in &mut layer.children {
        apply_overrides(child, component, overrides);
    }
}
