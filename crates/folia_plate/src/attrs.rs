//! Attribute construction and name mapping.
//!
//! One builder produces the ordered attribute list for a layer; both
//! renderers emit exactly this list. Internal attribute names map to
//! their markup-legal forms here.

use folia_case::Str;
use folia_forme::{Layer, NodeKind, Variable};

use crate::links::{href_for, opens_new_tab};
use crate::srcset::{srcset_for, DEFAULT_SIZES};
use crate::RenderRules;

/// Ordered attribute list; order is part of the output contract.
pub type AttrList = Vec<(Str, Str)>;

/// Attributes whose presence alone is the value. Emitted without `=""`.
pub fn is_boolean_attr(name: &str) -> bool {
    matches!(
        name,
        "controls"
            | "playsinline"
            | "autoplay"
            | "loop"
            | "muted"
            | "readonly"
            | "disabled"
            | "checked"
            | "selected"
            | "required"
            | "novalidate"
            | "hidden"
    )
}

/// Map an internal attribute name to its markup-legal form. `None`
/// rejects the attribute entirely.
pub fn map_attr_name(name: &str) -> Option<Str> {
    let mapped = match name {
        "className" => "class",
        "htmlFor" => "for",
        "tabIndex" => "tabindex",
        "readOnly" => "readonly",
        "autoPlay" => "autoplay",
        "playsInline" => "playsinline",
        "srcSet" => "srcset",
        "crossOrigin" => "crossorigin",
        "spellCheck" => "spellcheck",
        "autoComplete" => "autocomplete",
        other => other,
    };
    let lower = mapped.to_ascii_lowercase();
    // event handler attributes never pass through
    if lower.starts_with("on") {
        return None;
    }
    let valid = !lower.is_empty()
        && lower
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':'));
    valid.then(|| Str::from(lower))
}

/// Build the full attribute list for a layer.
pub fn element_attrs(layer: &Layer, tag: &str, rules: &RenderRules) -> AttrList {
    let mut attrs = AttrList::new();

    attrs.push((Str::from("data-layer-id"), layer.id.clone()));
    if let Some(item_id) = &layer.collection_item_id {
        attrs.push((Str::from("data-collection-item-id"), item_id.clone()));
    }
    if let Some(anchor) = &layer.settings.anchor {
        attrs.push((Str::from("id"), anchor.clone()));
    }

    if tag == "a" {
        if let Some(link) = &layer.variables.link {
            if let Some(href) = href_for(link, rules) {
                attrs.push((Str::from("href"), href));
            }
            if opens_new_tab(link) {
                attrs.push((Str::from("target"), Str::from("_blank")));
                attrs.push((Str::from("rel"), Str::from("noopener")));
            }
        }
    }

    match layer.kind {
        NodeKind::Image | NodeKind::Icon => image_attrs(layer, &mut attrs),
        NodeKind::Video => video_attrs(layer, &mut attrs),
        NodeKind::Audio => audio_attrs(layer, &mut attrs),
        NodeKind::PaginationControls => {
            if let Some(target) = &layer.settings.pagination_target {
                attrs.push((Str::from("data-pagination-target"), target.clone()));
            }
        }
        _ => {}
    }

    for (name, value) in &layer.settings.attributes {
        if let Some(mapped) = map_attr_name(name) {
            attrs.push((mapped, value.clone()));
        }
    }
    attrs
}

fn image_attrs(layer: &Layer, attrs: &mut AttrList) {
    let slot = match layer.kind {
        NodeKind::Icon => &layer.variables.icon,
        _ => &layer.variables.image,
    };
    let Some(Variable::Asset(data)) = slot else {
        return;
    };
    if let Some(url) = &data.url {
        attrs.push((Str::from("src"), url.clone()));
        if let Some(srcset) = srcset_for(url) {
            attrs.push((Str::from("srcset"), srcset));
            attrs.push((Str::from("sizes"), Str::from(DEFAULT_SIZES)));
        }
    }
    attrs.push((
        Str::from("alt"),
        data.alt.clone().unwrap_or_default(),
    ));
}

fn video_attrs(layer: &Layer, attrs: &mut AttrList) {
    let Some(Variable::Video(data)) = &layer.variables.video else {
        return;
    };
    if let Some(url) = &data.url {
        attrs.push((Str::from("src"), url.clone()));
    }
    if let Some(poster) = &data.poster_url {
        attrs.push((Str::from("poster"), poster.clone()));
    }
    attrs.push((Str::from("controls"), Str::from("")));
    attrs.push((Str::from("playsinline"), Str::from("")));
}

fn audio_attrs(layer: &Layer, attrs: &mut AttrList) {
    let Some(Variable::Asset(data)) = &layer.variables.audio else {
        return;
    };
    if let Some(url) = &data.url {
        attrs.push((Str::from("src"), url.clone()));
    }
    attrs.push((Str::from("controls"), Str::from("")));
}
