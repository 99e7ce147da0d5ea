//! HTML tag selection.

use folia_case::{is_allowed_override_tag, is_block_tag, is_restrictive_tag, Str};
use folia_forme::{Layer, NodeKind, RichTextNode, Variable};

/// Default tag for a layer kind.
pub fn default_tag(kind: &NodeKind) -> &'static str {
    match kind {
        NodeKind::Box => "div",
        NodeKind::Text => "div",
        NodeKind::RichText => "div",
        NodeKind::Image => "img",
        NodeKind::Icon => "img",
        NodeKind::Video => "video",
        NodeKind::Audio => "audio",
        NodeKind::Button => "button",
        NodeKind::Link => "a",
        NodeKind::HtmlEmbed => "div",
        NodeKind::LocaleSelector => "div",
        NodeKind::PaginationControls => "nav",
        NodeKind::Fragment => "",
        NodeKind::Custom(_) => "div",
    }
}

/// Select the tag a layer renders as.
///
/// Order of rules:
/// 1. a validated settings tag override beats the kind default
/// 2. a layer carrying a link value renders as `a` (media tags keep
///    their tag; the link is dropped there)
/// 3. `p` holding block content promotes to `div`, since `<p>`
///    auto-closes on block children
pub fn element_tag(layer: &Layer) -> Str {
    let mut tag: Str = match &layer.settings.tag {
        Some(tag) if is_allowed_override_tag(tag) => tag.clone(),
        _ => Str::from(default_tag(&layer.kind)),
    };

    if layer.variables.link.is_some() && !is_media_tag(&tag) {
        tag = Str::from("a");
    }

    if tag == "p" && has_block_content(layer) {
        tag = Str::from("div");
    }
    tag
}

fn is_media_tag(tag: &str) -> bool {
    matches!(tag, "img" | "video" | "audio")
}

/// Whether a layer's rendered content contains block-level structure.
pub fn has_block_content(layer: &Layer) -> bool {
    if let Some(Variable::DynamicRichText(data)) = &layer.variables.text {
        if data.document.nodes.iter().any(rich_node_is_block) {
            return true;
        }
    }
    layer.children.iter().any(|child| {
        if child.is_fragment() {
            return has_block_content(child);
        }
        is_block_tag(&element_tag(child))
    })
}

/// Plain paragraphs render inline under a restrictive tag, so only
/// heavier structure forces the promotion.
fn rich_node_is_block(node: &RichTextNode) -> bool {
    matches!(
        node,
        RichTextNode::Heading(_)
            | RichTextNode::BulletedList(_)
            | RichTextNode::OrderedList(_)
            | RichTextNode::Quote(_)
    )
}

/// Whether rich text inside this tag must render with inline elements
/// only.
pub fn rich_text_inline_only(tag: &str) -> bool {
    is_restrictive_tag(tag)
}
