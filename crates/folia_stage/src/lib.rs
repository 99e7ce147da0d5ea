//! Stage - the interactive tree renderer for Folia.
//!
//! Walks a concrete, fully-resolved tree into a live UI node tree with
//! event wiring, plus the pagination side channel a pagination-control
//! collaborator consumes. Tags, attributes, hrefs and rich text all
//! come from the shared plate, so the stage can never disagree with the
//! galley on what a node looks like.
//!
//! ## Name Origin
//!
//! The **stage** is where the page performs live, in front of the
//! editor, as opposed to the galley proof printed for publication.

use serde::{Deserialize, Serialize};

use folia_case::{is_void_tag, FxHashMap, Str};
use folia_forme::{Layer, PaginationInfo};
use folia_plate::{
    element_attrs, element_tag, layer_content, rich_text_inline_only, rich_text_to_markup,
    AttrList, RenderRules, TextContent,
};

/// Pagination metadata per collection layer id.
pub type PaginationChannel = FxHashMap<Str, PaginationInfo>;

#[derive(Debug, Clone, Default)]
pub struct StageOptions {
    /// Edit mode marks nodes selectable for the editor chrome. It never
    /// changes tags, attributes or content.
    pub edit_mode: bool,
}

/// A live UI node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageNode {
    pub layer_id: Str,
    pub tag: Str,
    pub attrs: AttrList,
    pub content: StageContent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<StageNode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventBinding>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub editable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageContent {
    #[default]
    None,
    /// Plain text, set as the element's text content.
    Text(Str),
    /// Pre-rendered markup (rich text, embeds), set as inner HTML.
    Html(String),
}

/// An event wired from an interaction definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventBinding {
    pub event: Str,
    pub action: Str,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_layer_id: Option<Str>,
}

/// The stage's full output: live roots plus the pagination side channel.
#[derive(Debug, Clone, Default)]
pub struct StageTree {
    pub roots: Vec<StageNode>,
    pub pagination: PaginationChannel,
}

/// Render a concrete tree into live nodes.
pub fn render_stage(
    layers: &[Layer],
    rules: &RenderRules,
    pagination: PaginationChannel,
    options: &StageOptions,
) -> StageTree {
    let mut roots = Vec::new();
    for layer in layers {
        render_into(layer, rules, options, &mut roots);
    }
    StageTree { roots, pagination }
}

fn render_into(
    layer: &Layer,
    rules: &RenderRules,
    options: &StageOptions,
    out: &mut Vec<StageNode>,
) {
    // fragments splice their children into the parent
    if layer.is_fragment() {
        for child in &layer.children {
            render_into(child, rules, options, out);
        }
        return;
    }

    let tag = element_tag(layer);
    let attrs = element_attrs(layer, &tag, rules);
    let content = match layer_content(layer) {
        TextContent::None => StageContent::None,
        TextContent::Plain(text) => StageContent::Text(text),
        TextContent::RawHtml(html) => StageContent::Html(html.into()),
        TextContent::Rich(doc) => {
            StageContent::Html(rich_text_to_markup(&doc, rich_text_inline_only(&tag)))
        }
    };

    let mut children = Vec::new();
    if !is_void_tag(&tag) {
        for child in &layer.children {
            render_into(child, rules, options, &mut children);
        }
    }

    let events = layer
        .interactions
        .iter()
        .map(|interaction| EventBinding {
            event: interaction.trigger.clone(),
            action: interaction.action.clone(),
            target_layer_id: interaction.target_layer_id.clone(),
        })
        .collect();

    out.push(StageNode {
        layer_id: layer.id.clone(),
        tag,
        attrs,
        content,
        children,
        events,
        editable: options.edit_mode,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use folia_forme::{Interaction, NodeKind, Variable};

    #[test]
    fn test_fragment_children_splice_into_parent() {
        let mut inner = Layer::new("t1", NodeKind::Text);
        inner.variables.text = Some(Variable::text("x"));
        let fragment = Layer::fragment("f1", vec![inner]);
        let mut root = Layer::new("box1", NodeKind::Box);
        root.children.push(fragment);

        let tree = render_stage(
            &[root],
            &RenderRules::default(),
            PaginationChannel::default(),
            &StageOptions::default(),
        );
        assert_eq!(tree.roots.len(), 1);
        assert_eq!(tree.roots[0].children.len(), 1);
        assert_eq!(tree.roots[0].children[0].layer_id, "t1");
    }

    #[test]
    fn test_event_wiring() {
        let mut layer = Layer::new("btn", NodeKind::Button);
        layer.interactions.push(Interaction {
            trigger: Str::from("click"),
            action: Str::from("toggle"),
            target_layer_id: Some(Str::from("panel")),
            extra: Default::default(),
        });
        let tree = render_stage(
            &[layer],
            &RenderRules::default(),
            PaginationChannel::default(),
            &StageOptions::default(),
        );
        assert_eq!(tree.roots[0].events.len(), 1);
        assert_eq!(tree.roots[0].events[0].event, "click");
        assert_eq!(
            tree.roots[0].events[0].target_layer_id.as_deref(),
            Some("panel")
        );
    }

    #[test]
    fn test_edit_mode_only_marks_editable() {
        let mut layer = Layer::new("t1", NodeKind::Text);
        layer.variables.text = Some(Variable::text("x"));
        let rules = RenderRules::default();
        let published = render_stage(
            &[layer.clone()],
            &rules,
            PaginationChannel::default(),
            &StageOptions::default(),
        );
        let editing = render_stage(
            &[layer],
            &rules,
            PaginationChannel::default(),
            &StageOptions { edit_mode: true },
        );
        assert!(!published.roots[0].editable);
        assert!(editing.roots[0].editable);
        assert_eq!(published.roots[0].tag, editing.roots[0].tag);
        assert_eq!(published.roots[0].attrs, editing.roots[0].attrs);
        assert_eq!(published.roots[0].content, editing.roots[0].content);
    }
}
