//! Identity namespacing.
//!
//! Every expansion rewrites the ids of the subtree it produced as a
//! deterministic function of (original id, expansion context id), and
//! remaps every id-valued back-reference inside that subtree through the
//! same mapping: interaction targets, item-count conditions, binding
//! scopes and pagination targets. Re-resolving the same input always
//! yields the same ids.

use folia_case::{FxHashMap, Str};
use folia_forme::{Condition, Layer, LinkVariable, RichTextNode, Variable};

/// Id of a descendant under an expansion context: `context_originalId`.
/// Component expansion passes the instance id; collection cloning passes
/// the clone id from [`item_scoped_id`].
pub fn scoped_id(instance_id: &str, original_id: &str) -> Str {
    let mut id = Str::from(instance_id);
    id.push('_');
    id.push_str(original_id);
    id
}

/// Id of a collection clone's root, keyed by (layer, item).
pub fn item_scoped_id(layer_id: &str, item_id: &str) -> Str {
    let mut id = Str::from(layer_id);
    id.push('_');
    id.push_str(item_id);
    id
}

/// Namespace a subtree in place under the given context id.
///
/// Builds the old->new id mapping over the whole subtree first, then
/// rewrites ids and every back-reference that points inside the subtree.
/// References to ids outside the subtree are left alone.
pub fn namespace_subtree(layers: &mut [Layer], context_id: &str) {
    let mut mapping = FxHashMap::default();
    for layer in layers.iter() {
        collect_ids(layer, context_id, &mut mapping);
    }
    for layer in layers.iter_mut() {
        apply_mapping(layer, &mapping);
    }
}

/// Namespace a collection clone: the root takes the context id itself
/// (`layerId_itemId`), descendants are prefixed with it. References to
/// the loop root from inside the clone follow along.
pub fn namespace_clone(root: &mut Layer, context_id: &str) {
    let mut mapping = FxHashMap::default();
    mapping.insert(root.id.clone(), Str::from(context_id));
    for child in &root.children {
        collect_ids(child, context_id, &mut mapping);
    }
    apply_mapping(root, &mapping);
}

fn collect_ids(layer: &Layer, context_id: &str, mapping: &mut FxHashMap<Str, Str>) {
    mapping.insert(
        layer.id.clone(),
        scoped_id(context_id, &layer.id),
    );
    for child in &layer.children {
        collect_ids(child, context_id, mapping);
    }
}

fn apply_mapping(layer: &mut Layer, mapping: &FxHashMap<Str, Str>) {
    if let Some(new_id) = mapping.get(layer.id.as_str()) {
        layer.id = new_id.clone();
    }
    for interaction in &mut layer.interactions {
        remap(&mut interaction.target_layer_id, mapping);
    }
    if let Some(rule) = &mut layer.visibility {
        for group in &mut rule.groups {
            for condition in &mut group.conditions {
                match condition {
                    Condition::ItemCount(c) => {
                        if let Some(new_id) = mapping.get(c.layer_id.as_str()) {
                            c.layer_id = new_id.clone();
                        }
                    }
                    Condition::Field(c) => {
                        remap(&mut c.collection_layer_id, mapping);
                    }
                }
            }
        }
    }
    remap(&mut layer.settings.pagination_target, mapping);
    remap_variables(layer, mapping);
    for child in &mut layer.children {
        apply_mapping(child, mapping);
    }
}

fn remap(slot: &mut Option<Str>, mapping: &FxHashMap<Str, Str>) {
    if let Some(id) = slot {
        if let Some(new_id) = mapping.get(id.as_str()) {
            *slot = Some(new_id.clone());
        }
    }
}

fn remap_variables(layer: &mut Layer, mapping: &FxHashMap<Str, Str>) {
    let vars = &mut layer.variables;
    for variable in [
        vars.text.as_mut(),
        vars.image.as_mut(),
        vars.icon.as_mut(),
        vars.video.as_mut(),
        vars.audio.as_mut(),
        vars.background.as_mut(),
        vars.design_color.as_mut(),
    ]
    .into_iter()
    .flatten()
    {
        remap_variable(variable, mapping);
    }
    if let Some(LinkVariable::Field(field)) = vars.link.as_mut() {
        remap(&mut field.collection_layer_id, mapping);
    }
}

fn remap_variable(variable: &mut Variable, mapping: &FxHashMap<Str, Str>) {
    match variable {
        Variable::Field(field) => remap(&mut field.collection_layer_id, mapping),
        Variable::DynamicRichText(rich) => {
            remap_rich_nodes(&mut rich.document.nodes, mapping);
        }
        _ => {}
    }
}

fn remap_rich_nodes(nodes: &mut [RichTextNode], mapping: &FxHashMap<Str, Str>) {
    for node in nodes {
        match node {
            RichTextNode::FieldPlaceholder(field) => {
                remap(&mut field.collection_layer_id, mapping);
            }
            RichTextNode::Paragraph(b)
            | RichTextNode::BulletedList(b)
            | RichTextNode::OrderedList(b)
            | RichTextNode::ListItem(b)
            | RichTextNode::Quote(b) => remap_rich_nodes(&mut b.children, mapping),
            RichTextNode::Heading(h) => remap_rich_nodes(&mut h.children, mapping),
            RichTextNode::Text(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folia_forme::{Interaction, NodeKind};

    #[test]
    fn test_scoped_ids_are_deterministic() {
        assert_eq!(scoped_id("inst1", "btn"), "inst1_btn");
        assert_eq!(item_scoped_id("loop1", "itemA"), "loop1_itemA");
        assert_eq!(
            scoped_id("inst1", "btn"),
            scoped_id("inst1", "btn")
        );
    }

    #[test]
    fn test_interaction_targets_follow_namespacing() {
        let mut trigger = Layer::new("trigger", NodeKind::Button);
        trigger.interactions.push(Interaction {
            trigger: Str::from("click"),
            action: Str::from("show"),
            target_layer_id: Some(Str::from("panel")),
            extra: Default::default(),
        });
        let panel = Layer::new("panel", NodeKind::Box);
        let mut layers = vec![trigger, panel];

        namespace_subtree(&mut layers, "inst1");

        assert_eq!(layers[0].id, "inst1_trigger");
        assert_eq!(layers[1].id, "inst1_panel");
        assert_eq!(
            layers[0].interactions[0].target_layer_id.as_deref(),
            Some("inst1_panel")
        );
    }

    #[test]
    fn test_external_references_untouched() {
        let mut layer = Layer::new("a", NodeKind::Button);
        layer.interactions.push(Interaction {
            trigger: Str::from("click"),
            action: Str::from("scroll"),
            target_layer_id: Some(Str::from("outside")),
            extra: Default::default(),
        });
        let mut layers = vec![layer];
        namespace_subtree(&mut layers, "inst1");
        assert_eq!(
            layers[0].interactions[0].target_layer_id.as_deref(),
            Some("outside")
        );
    }
}
