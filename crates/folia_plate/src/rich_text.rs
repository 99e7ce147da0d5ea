//! Rich-text-to-markup rendering and layer content extraction.

use folia_case::Str;
use folia_forme::{Layer, Mark, NodeKind, RichTextDocument, RichTextNode, Variable};

/// What a layer renders inside its element.
#[derive(Debug, Clone, PartialEq)]
pub enum TextContent {
    None,
    Plain(Str),
    /// Embed markup emitted verbatim, unescaped.
    RawHtml(Str),
    Rich(RichTextDocument),
}

/// Extract the renderable content of a layer's text binding. Unresolved
/// field bindings and malformed values render as nothing.
pub fn layer_content(layer: &Layer) -> TextContent {
    let Some(variable) = &layer.variables.text else {
        return TextContent::None;
    };
    match variable {
        Variable::StaticText(data) => {
            if layer.kind == NodeKind::HtmlEmbed {
                TextContent::RawHtml(data.value.clone())
            } else {
                TextContent::Plain(data.value.clone())
            }
        }
        Variable::DynamicText(data) => TextContent::Plain(data.value.clone()),
        Variable::DynamicRichText(data) => TextContent::Rich(data.document.clone()),
        Variable::Field(_) | Variable::Asset(_) | Variable::Video(_) | Variable::Malformed(_) => {
            TextContent::None
        }
    }
}

/// Render a rich text document to markup. With `inline_only`, block
/// nodes render as `span`s so the output stays legal inside restrictive
/// tags.
pub fn rich_text_to_markup(document: &RichTextDocument, inline_only: bool) -> String {
    let mut out = String::new();
    render_nodes(&document.nodes, inline_only, &mut out);
    out
}

fn render_nodes(nodes: &[RichTextNode], inline_only: bool, out: &mut String) {
    for node in nodes {
        render_node(node, inline_only, out);
    }
}

fn render_node(node: &RichTextNode, inline_only: bool, out: &mut String) {
    match node {
        RichTextNode::Paragraph(block) => {
            render_block("p", &block.children, inline_only, out);
        }
        RichTextNode::Heading(heading) => {
            let level = heading.level.clamp(1, 6);
            let tag = match level {
                1 => "h1",
                2 => "h2",
                3 => "h3",
                4 => "h4",
                5 => "h5",
                _ => "h6",
            };
            render_block(tag, &heading.children, inline_only, out);
        }
        RichTextNode::BulletedList(block) => {
            render_block("ul", &block.children, inline_only, out);
        }
        RichTextNode::OrderedList(block) => {
            render_block("ol", &block.children, inline_only, out);
        }
        RichTextNode::ListItem(block) => {
            render_block("li", &block.children, inline_only, out);
        }
        RichTextNode::Quote(block) => {
            render_block("blockquote", &block.children, inline_only, out);
        }
        RichTextNode::Text(span) => {
            let mut open = String::new();
            let mut close = String::new();
            for mark in &span.marks {
                let (o, c) = mark_tags(mark);
                open.push_str(&o);
                close.insert_str(0, &c);
            }
            out.push_str(&open);
            out.push_str(&htmlize::escape_text(span.text.as_str()));
            out.push_str(&close);
        }
        // placeholders that survived to rendering had no value
        RichTextNode::FieldPlaceholder(_) => {}
    }
}

fn render_block(tag: &str, children: &[RichTextNode], inline_only: bool, out: &mut String) {
    let tag = if inline_only { "span" } else { tag };
    out.push('<');
    out.push_str(tag);
    out.push('>');
    render_nodes(children, inline_only, out);
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn mark_tags(mark: &Mark) -> (String, String) {
    match mark {
        Mark::Bold => ("<strong>".into(), "</strong>".into()),
        Mark::Italic => ("<em>".into(), "</em>".into()),
        Mark::Underline => ("<u>".into(), "</u>".into()),
        Mark::Strikethrough => ("<s>".into(), "</s>".into()),
        Mark::Code => ("<code>".into(), "</code>".into()),
        Mark::Link(link) => (
            format!(
                "<a href=\"{}\"{}>",
                htmlize::escape_attribute(link.href.as_str()),
                if link.new_tab {
                    " target=\"_blank\" rel=\"noopener\""
                } else {
                    ""
                }
            ),
            "</a>".into(),
        ),
    }
}

/// Visible plain text of rendered content, shared by parity checks.
pub fn content_plain_text(content: &TextContent) -> Str {
    match content {
        TextContent::None | TextContent::RawHtml(_) => Str::from(""),
        TextContent::Plain(text) => text.clone(),
        TextContent::Rich(doc) => Str::from(doc.plain_text()),
    }
}
