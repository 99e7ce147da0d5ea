//! HTML tag configuration tables.
//!
//! Single source of truth for tag classification. Both the markup renderer
//! and the live-tree renderer consult these tables, so tag behavior can
//! never diverge between edit preview and published output.

use phf::{phf_set, Set};

/// Void elements: no children, self-closing in markup.
static VOID_TAGS: Set<&'static str> = phf_set! {
    "area", "base", "br", "col", "embed", "hr", "img", "input",
    "link", "meta", "param", "source", "track", "wbr",
};

/// Block-level elements. A paragraph containing any of these must be
/// promoted to a `div`, since `<p>` auto-closes on block content.
static BLOCK_TAGS: Set<&'static str> = phf_set! {
    "address", "article", "aside", "blockquote", "details", "dialog",
    "dd", "div", "dl", "dt", "fieldset", "figcaption", "figure",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hgroup", "hr", "li", "main", "nav", "ol", "p", "pre", "section",
    "table", "ul",
};

/// Restrictive tags: their content model forbids nested block structure,
/// so rich text inside them renders with inline elements only.
static RESTRICTIVE_TAGS: Set<&'static str> = phf_set! {
    "a", "button", "h1", "h2", "h3", "h4", "h5", "h6", "label", "p",
    "span", "summary",
};

/// Tags accepted as a layer's tag override. Anything else falls back to
/// the layer kind's default tag.
static ALLOWED_OVERRIDE_TAGS: Set<&'static str> = phf_set! {
    "a", "address", "article", "aside", "blockquote", "button", "div",
    "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "header", "label", "li", "main", "nav", "ol", "p",
    "section", "span", "summary", "ul",
};

/// Check if a tag is a void element.
#[inline]
pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(tag)
}

/// Check if a tag is block-level.
#[inline]
pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(tag)
}

/// Check if a tag restricts its content to inline elements.
#[inline]
pub fn is_restrictive_tag(tag: &str) -> bool {
    RESTRICTIVE_TAGS.contains(tag)
}

/// Check if a tag may be used as a tag override.
#[inline]
pub fn is_allowed_override_tag(tag: &str) -> bool {
    ALLOWED_OVERRIDE_TAGS.contains(tag)
}
