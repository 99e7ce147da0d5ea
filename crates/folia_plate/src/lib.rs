//! Plate - the shared rendering rule table for Folia.
//!
//! Both renderers — the live tree and the static markup string — print
//! from this one plate: tag selection, attribute mapping, href
//! construction, srcset generation and rich-text rendering live here
//! and nowhere else. A divergence between edit preview and published
//! output on any of these rules is a correctness bug, which is why
//! there is exactly one implementation to diverge from.
//!
//! ## Name Origin
//!
//! A printing **plate** carries the image both proof and production run
//! are printed from; two impressions from one plate cannot disagree.

pub mod attrs;
pub mod links;
pub mod rich_text;
pub mod srcset;
pub mod tags;

pub use attrs::*;
pub use links::*;
pub use rich_text::*;
pub use srcset::*;
pub use tags::*;

use folia_case::{FxHashMap, Str};
use folia_forme::{Layer, Page};

/// The per-tree context the rule table draws on: page records for link
/// targets, the anchor table, and the locale for slug selection.
#[derive(Debug, Default)]
pub struct RenderRules {
    pub pages: FxHashMap<Str, Page>,
    /// Layer id -> anchor name, built once per tree.
    pub anchors: FxHashMap<Str, Str>,
    pub locale: Option<Str>,
}

impl RenderRules {
    pub fn new(layers: &[Layer], pages: FxHashMap<Str, Page>, locale: Option<Str>) -> Self {
        let mut anchors = FxHashMap::default();
        for layer in layers {
            collect_anchors(layer, &mut anchors);
        }
        Self {
            pages,
            anchors,
            locale,
        }
    }
}

fn collect_anchors(layer: &Layer, anchors: &mut FxHashMap<Str, Str>) {
    if let Some(anchor) = &layer.settings.anchor {
        anchors.insert(layer.id.clone(), anchor.clone());
    }
    for child in &layer.children {
        collect_anchors(child, anchors);
    }
}
