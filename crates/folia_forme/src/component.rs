//! Reusable components and their variable slots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use folia_case::Str;

use crate::layer::Layer;
use crate::variable::Variable;
use crate::ExtraFields;

/// A named, standalone layer tree instanced by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: Str,
    pub name: Str,
    /// The root content node. Its children become the instance's children.
    pub layer: Layer,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<ComponentVariable>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Component {
    /// Look up a slot definition by its id.
    pub fn variable(&self, id: &str) -> Option<&ComponentVariable> {
        self.variables.iter().find(|v| v.id == id)
    }
}

/// A declared binding slot on a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentVariable {
    pub id: Str,
    pub name: Str,
    pub kind: SlotKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Variable>,
    /// Default for `link`-kind slots, which carry link-shaped values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_link: Option<crate::variable::LinkVariable>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Slot categories a component variable can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    Text,
    Image,
    Link,
    Audio,
    Video,
    Icon,
}

impl SlotKind {
    /// The layer binding-slot name this category writes to.
    pub fn slot_name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Link => "link",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Icon => "icon",
        }
    }
}

/// Instance overrides, keyed by slot category then component variable id.
///
/// An entry whose value is `None` is explicitly present but valueless; it
/// resolves to an empty value, not the component's authored literal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentOverrides {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub text: BTreeMap<Str, Option<Variable>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub image: BTreeMap<Str, Option<Variable>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub icon: BTreeMap<Str, Option<Variable>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub audio: BTreeMap<Str, Option<Variable>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub video: BTreeMap<Str, Option<Variable>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub link: BTreeMap<Str, Option<crate::variable::LinkVariable>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl ComponentOverrides {
    /// Media/text override entry for a slot category, if present.
    pub fn value_entry(&self, kind: SlotKind, variable_id: &str) -> Option<&Option<Variable>> {
        let map = match kind {
            SlotKind::Text => &self.text,
            SlotKind::Image => &self.image,
            SlotKind::Icon => &self.icon,
            SlotKind::Audio => &self.audio,
            SlotKind::Video => &self.video,
            SlotKind::Link => return None,
        };
        map.get(variable_id)
    }

    /// Link override entry, if present.
    pub fn link_entry(
        &self,
        variable_id: &str,
    ) -> Option<&Option<crate::variable::LinkVariable>> {
        self.link.get(variable_id)
    }
}
