//! Rich text document AST.
//!
//! A rich text value is a small block/inline tree. Inline field
//! placeholders are resolved per item during loop expansion; a
//! placeholder naming a rich-text-typed field is spliced in place,
//! everything else stringifies into a text span carrying the
//! placeholder's marks.

use serde::{Deserialize, Serialize};

use folia_case::Str;

use crate::variable::FieldRef;
use crate::ExtraFields;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichTextDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<RichTextNode>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl RichTextDocument {
    /// Wrap plain text into a single-paragraph document.
    pub fn from_plain_text(text: impl Into<Str>) -> Self {
        Self {
            nodes: vec![RichTextNode::Paragraph(RichTextBlock {
                children: vec![RichTextNode::Text(RichTextSpan {
                    text: text.into(),
                    marks: Vec::new(),
                    extra: ExtraFields::new(),
                })],
                extra: ExtraFields::new(),
            })],
            extra: ExtraFields::new(),
        }
    }

    /// Concatenated text content, ignoring structure. Used for plain-text
    /// fallbacks and translation-completeness checks.
    pub fn plain_text(&self) -> String {
        fn collect(nodes: &[RichTextNode], out: &mut String) {
            for node in nodes {
                match node {
                    RichTextNode::Text(span) => out.push_str(&span.text),
                    RichTextNode::FieldPlaceholder(_) => {}
                    other => collect(other.children(), out),
                }
            }
        }
        let mut out = String::new();
        collect(&self.nodes, &mut out);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RichTextNode {
    Paragraph(RichTextBlock),
    Heading(HeadingBlock),
    BulletedList(RichTextBlock),
    OrderedList(RichTextBlock),
    ListItem(RichTextBlock),
    Quote(RichTextBlock),
    Text(RichTextSpan),
    /// Inline field placeholder, resolved per item.
    FieldPlaceholder(FieldRef),
}

impl RichTextNode {
    pub fn children(&self) -> &[RichTextNode] {
        match self {
            Self::Paragraph(b)
            | Self::BulletedList(b)
            | Self::OrderedList(b)
            | Self::ListItem(b)
            | Self::Quote(b) => &b.children,
            Self::Heading(h) => &h.children,
            Self::Text(_) | Self::FieldPlaceholder(_) => &[],
        }
    }

    pub fn is_block(&self) -> bool {
        !matches!(self, Self::Text(_) | Self::FieldPlaceholder(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichTextBlock {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RichTextNode>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingBlock {
    /// 1 through 6.
    pub level: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RichTextNode>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichTextSpan {
    pub text: Str,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<Mark>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
    Link(LinkMark),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkMark {
    pub href: Str,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub new_tab: bool,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_collects_spans() {
        let doc = RichTextDocument::from_plain_text("hello world");
        assert_eq!(doc.plain_text(), "hello world");
    }

    #[test]
    fn test_node_round_trip() {
        let json = r#"{"type":"heading","level":2,"children":[{"type":"text","text":"Title","marks":[{"type":"bold"}]}]}"#;
        let node: RichTextNode = serde_json::from_str(json).unwrap();
        match &node {
            RichTextNode::Heading(h) => {
                assert_eq!(h.level, 2);
                assert_eq!(h.children.len(), 1);
            }
            other => panic!("expected heading, got {other:?}"),
        }
        let out = serde_json::to_value(&node).unwrap();
        assert_eq!(out["type"], "heading");
        assert_eq!(out["children"][0]["marks"][0]["type"], "bold");
    }

    #[test]
    fn test_field_placeholder_parses() {
        let json = r#"{"type":"field_placeholder","fieldId":"title"}"#;
        let node: RichTextNode = serde_json::from_str(json).unwrap();
        assert!(matches!(node, RichTextNode::FieldPlaceholder(_)));
    }
}
