//! Layer tree node types.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use folia_case::Str;

use crate::variable::VariableMap;
use crate::visibility::VisibilityRule;
use crate::ExtraFields;

/// The sentinel node name for a transparent wrapper.
pub const FRAGMENT_NAME: &str = "_fragment";

/// Closed enumeration of layer kinds.
///
/// The wire format stores the kind as the layer's `name` string; unknown
/// names round-trip through [`NodeKind::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Box,
    Text,
    RichText,
    Image,
    Icon,
    Video,
    Audio,
    Button,
    Link,
    HtmlEmbed,
    LocaleSelector,
    PaginationControls,
    /// Transparent wrapper produced by loop expansion. Never emits markup.
    Fragment,
    Custom(Str),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Box => "box",
            Self::Text => "text",
            Self::RichText => "richText",
            Self::Image => "image",
            Self::Icon => "icon",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Button => "button",
            Self::Link => "link",
            Self::HtmlEmbed => "htmlEmbed",
            Self::LocaleSelector => "localeSelector",
            Self::PaginationControls => "paginationControls",
            Self::Fragment => FRAGMENT_NAME,
            Self::Custom(name) => name.as_str(),
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "box" => Self::Box,
            "text" => Self::Text,
            "richText" => Self::RichText,
            "image" => Self::Image,
            "icon" => Self::Icon,
            "video" => Self::Video,
            "audio" => Self::Audio,
            "button" => Self::Button,
            "link" => Self::Link,
            "htmlEmbed" => Self::HtmlEmbed,
            "localeSelector" => Self::LocaleSelector,
            "paginationControls" => Self::PaginationControls,
            FRAGMENT_NAME => Self::Fragment,
            other => Self::Custom(Str::from(other)),
        }
    }
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = Str::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// A node in the authoring tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    /// Stable id, unique within the owning document at authoring time.
    pub id: Str,
    #[serde(rename = "name")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Layer>,
    #[serde(default, skip_serializing_if = "VariableMap::is_empty")]
    pub variables: VariableMap,
    #[serde(default, skip_serializing_if = "LayerSettings::is_empty")]
    pub settings: LayerSettings,
    /// Set when this node is a component instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_id: Option<Str>,
    /// Instance overrides, keyed by slot category then component variable id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_overrides: Option<crate::component::ComponentOverrides>,
    /// Links from this layer's binding slots to component variable ids.
    /// Only meaningful inside a component's tree.
    #[serde(default, skip_serializing_if = "std::collections::BTreeMap::is_empty")]
    pub variable_links: std::collections::BTreeMap<Str, Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<VisibilityRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interactions: Vec<Interaction>,
    /// The component this layer was expanded out of. Set by component
    /// expansion; used for translation-key lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_component_id: Option<Str>,
    /// The collection item this layer was cloned for. Set by loop
    /// expansion; emitted as `data-collection-item-id` for hydration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_item_id: Option<Str>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Layer {
    pub fn new(id: impl Into<Str>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            children: Vec::new(),
            variables: VariableMap::default(),
            settings: LayerSettings::default(),
            component_id: None,
            component_overrides: None,
            variable_links: std::collections::BTreeMap::new(),
            visibility: None,
            interactions: Vec::new(),
            source_component_id: None,
            collection_item_id: None,
            extra: ExtraFields::new(),
        }
    }

    /// Build a transparent fragment wrapping the given children.
    pub fn fragment(id: impl Into<Str>, children: Vec<Layer>) -> Self {
        let mut layer = Self::new(id, NodeKind::Fragment);
        layer.children = children;
        layer
    }

    pub fn is_fragment(&self) -> bool {
        self.kind == NodeKind::Fragment
    }

    pub fn is_component_instance(&self) -> bool {
        self.component_id.is_some()
    }

    pub fn is_collection_bound(&self) -> bool {
        self.variables.collection.is_some()
    }

    /// Depth-first walk over this layer and all descendants.
    pub fn walk(&self, f: &mut impl FnMut(&Layer)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    /// Count of nodes in this subtree, the fragment itself included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Layer::node_count).sum::<usize>()
    }
}

/// Per-layer presentation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerSettings {
    /// HTML tag override. Validated against the allowed-override table at
    /// render time; invalid overrides fall back to the kind's default tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Str>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
    /// In-page anchor name, targeted by page links.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Str>,
    /// For pagination-controls layers: the collection layer they page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination_target: Option<Str>,
    /// Custom attributes emitted verbatim (after name sanitization).
    #[serde(default, skip_serializing_if = "std::collections::BTreeMap::is_empty")]
    pub attributes: std::collections::BTreeMap<Str, Str>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl LayerSettings {
    pub fn is_empty(&self) -> bool {
        self.tag.is_none()
            && !self.hidden
            && self.anchor.is_none()
            && self.pagination_target.is_none()
            && self.attributes.is_empty()
            && self.extra.is_empty()
    }
}

/// An interaction or animation definition on a layer.
///
/// `target_layer_id` references a sibling by its authoring-time id and is
/// rewritten during expansion so it keeps pointing at the correct clone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub trigger: Str,
    pub action: Str,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_layer_id: Option<Str>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}
