//! Galley - the static markup renderer for Folia.
//!
//! Walks a concrete, fully-resolved tree into HTML fragment strings,
//! one per top-level layer, suitable for direct response-body
//! insertion. Every rendering rule — tags, attributes, hrefs, rich
//! text, srcset — comes from the shared plate; this crate only does
//! the string assembly.
//!
//! ## Name Origin
//!
//! A **galley proof** is the flat, static impression pulled from
//! composed type to check what the press will produce.

use folia_case::is_void_tag;
use folia_forme::Layer;
use folia_plate::{
    element_attrs, element_tag, is_boolean_attr, layer_content, rich_text_inline_only,
    rich_text_to_markup, RenderRules, TextContent,
};

/// Render each top-level layer to its own self-contained fragment.
pub fn render_fragments(layers: &[Layer], rules: &RenderRules) -> Vec<String> {
    layers
        .iter()
        .map(|layer| {
            let mut out = String::with_capacity(1024);
            render_layer(layer, rules, &mut out);
            out
        })
        .collect()
}

/// Render the whole tree into one markup string.
pub fn render_markup(layers: &[Layer], rules: &RenderRules) -> String {
    let mut out = String::with_capacity(4096);
    for layer in layers {
        render_layer(layer, rules, &mut out);
    }
    out
}

fn render_layer(layer: &Layer, rules: &RenderRules, out: &mut String) {
    // fragments contribute children without a wrapper element
    if layer.is_fragment() {
        for child in &layer.children {
            render_layer(child, rules, out);
        }
        return;
    }

    let tag = element_tag(layer);
    let attrs = element_attrs(layer, &tag, rules);

    out.push('<');
    out.push_str(&tag);
    for (name, value) in &attrs {
        out.push(' ');
        out.push_str(name);
        if value.is_empty() && is_boolean_attr(name) {
            continue;
        }
        out.push_str("=\"");
        out.push_str(&htmlize::escape_attribute(value.as_str()));
        out.push('"');
    }

    if is_void_tag(&tag) {
        out.push_str("/>");
        return;
    }
    out.push('>');

    match layer_content(layer) {
        TextContent::Plain(text) => out.push_str(&htmlize::escape_text(text.as_str())),
        TextContent::RawHtml(html) => out.push_str(&html),
        TextContent::Rich(doc) => {
            out.push_str(&rich_text_to_markup(&doc, rich_text_inline_only(&tag)));
        }
        TextContent::None => {}
    }

    for child in &layer.children {
        render_layer(child, rules, out);
    }

    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}
