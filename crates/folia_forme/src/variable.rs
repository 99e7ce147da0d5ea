//! Bindable variable types.
//!
//! Every bindable property on a layer (text, image, icon, video, audio,
//! background, link, design color) carries one of these tagged-union
//! values. A shape the current version cannot parse is captured verbatim
//! as [`Variable::Malformed`]: the pipeline treats it as an absent value,
//! and re-serialization writes the original JSON back out unchanged.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value as JsonValue;

use folia_case::Str;

use crate::collection::CollectionVariable;
use crate::rich_text::RichTextDocument;
use crate::ExtraFields;

/// A tagged-union bindable value.
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
    StaticText(StaticTextData),
    DynamicText(DynamicTextData),
    DynamicRichText(RichTextData),
    Asset(AssetData),
    Field(FieldRef),
    Video(VideoData),
    /// Unrecognized shape, preserved verbatim.
    Malformed(JsonValue),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum VariableRepr {
    StaticText(StaticTextData),
    DynamicText(DynamicTextData),
    DynamicRichText(RichTextData),
    Asset(AssetData),
    Field(FieldRef),
    Video(VideoData),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum VariableReprRef<'a> {
    StaticText(&'a StaticTextData),
    DynamicText(&'a DynamicTextData),
    DynamicRichText(&'a RichTextData),
    Asset(&'a AssetData),
    Field(&'a FieldRef),
    Video(&'a VideoData),
}

impl From<VariableRepr> for Variable {
    fn from(repr: VariableRepr) -> Self {
        match repr {
            VariableRepr::StaticText(d) => Self::StaticText(d),
            VariableRepr::DynamicText(d) => Self::DynamicText(d),
            VariableRepr::DynamicRichText(d) => Self::DynamicRichText(d),
            VariableRepr::Asset(d) => Self::Asset(d),
            VariableRepr::Field(d) => Self::Field(d),
            VariableRepr::Video(d) => Self::Video(d),
        }
    }
}

impl Serialize for Variable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::StaticText(d) => VariableReprRef::StaticText(d).serialize(serializer),
            Self::DynamicText(d) => VariableReprRef::DynamicText(d).serialize(serializer),
            Self::DynamicRichText(d) => VariableReprRef::DynamicRichText(d).serialize(serializer),
            Self::Asset(d) => VariableReprRef::Asset(d).serialize(serializer),
            Self::Field(d) => VariableReprRef::Field(d).serialize(serializer),
            Self::Video(d) => VariableReprRef::Video(d).serialize(serializer),
            Self::Malformed(v) => v.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Variable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        match serde_json::from_value::<VariableRepr>(value.clone()) {
            Ok(repr) => Ok(repr.into()),
            Err(_) => Ok(Self::Malformed(value)),
        }
    }
}

impl Variable {
    /// Plain text shorthand.
    pub fn text(value: impl Into<Str>) -> Self {
        Self::StaticText(StaticTextData {
            value: value.into(),
            extra: ExtraFields::new(),
        })
    }

    /// An empty value: what a linked-but-unset component slot resolves to.
    pub fn empty() -> Self {
        Self::text("")
    }

    pub fn field(field_id: impl Into<Str>) -> Self {
        Self::Field(FieldRef::new(field_id))
    }

    pub fn asset(asset_id: impl Into<Str>) -> Self {
        Self::Asset(AssetData {
            asset_id: asset_id.into(),
            alt: None,
            url: None,
            extra: ExtraFields::new(),
        })
    }

    pub fn as_field(&self) -> Option<&FieldRef> {
        match self {
            Self::Field(f) => Some(f),
            _ => None,
        }
    }

    /// The static text content, when this variable is one.
    pub fn as_static_text(&self) -> Option<&str> {
        match self {
            Self::StaticText(d) => Some(&d.value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticTextData {
    pub value: Str,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Text with inline `{{fieldId}}` placeholders, resolved per item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicTextData {
    pub value: Str,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichTextData {
    pub document: RichTextDocument,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetData {
    pub asset_id: Str,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<Str>,
    /// Concrete URL, filled in by asset resolution. Absent at authoring time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Str>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_asset_id: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<Str>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// A reference to a collection field, possibly reached through a chain of
/// reference-field hops, possibly scoped to a named ancestor loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRef {
    pub field_id: Str,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ValueFormat>,
    /// Explicit scope: the id of the ancestor collection layer whose item
    /// this reference resolves against. Absent means the nearest loop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_layer_id: Option<Str>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl FieldRef {
    pub fn new(field_id: impl Into<Str>) -> Self {
        Self {
            field_id: field_id.into(),
            relationships: Vec::new(),
            format: None,
            collection_layer_id: None,
            extra: ExtraFields::new(),
        }
    }

    /// The dotted lookup path: `fieldId` or `fieldId.hop1.hop2`.
    pub fn lookup_path(&self) -> Str {
        if self.relationships.is_empty() {
            return self.field_id.clone();
        }
        let mut path = self.field_id.clone();
        for hop in &self.relationships {
            path.push('.');
            path.push_str(hop);
        }
        path
    }
}

/// Display formatting for a resolved field value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueFormat {
    /// chrono format string for date values, e.g. `"%B %-d, %Y"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<Str>,
    /// Decimal places for number values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// A link value. Each kind maps to its own href construction rule.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkVariable {
    Url(UrlLink),
    Email(EmailLink),
    Phone(PhoneLink),
    Asset(AssetLink),
    Page(PageLink),
    Field(FieldRef),
    Malformed(JsonValue),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LinkRepr {
    Url(UrlLink),
    Email(EmailLink),
    Phone(PhoneLink),
    Asset(AssetLink),
    Page(PageLink),
    Field(FieldRef),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LinkReprRef<'a> {
    Url(&'a UrlLink),
    Email(&'a EmailLink),
    Phone(&'a PhoneLink),
    Asset(&'a AssetLink),
    Page(&'a PageLink),
    Field(&'a FieldRef),
}

impl From<LinkRepr> for LinkVariable {
    fn from(repr: LinkRepr) -> Self {
        match repr {
            LinkRepr::Url(d) => Self::Url(d),
            LinkRepr::Email(d) => Self::Email(d),
            LinkRepr::Phone(d) => Self::Phone(d),
            LinkRepr::Asset(d) => Self::Asset(d),
            LinkRepr::Page(d) => Self::Page(d),
            LinkRepr::Field(d) => Self::Field(d),
        }
    }
}

impl Serialize for LinkVariable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Url(d) => LinkReprRef::Url(d).serialize(serializer),
            Self::Email(d) => LinkReprRef::Email(d).serialize(serializer),
            Self::Phone(d) => LinkReprRef::Phone(d).serialize(serializer),
            Self::Asset(d) => LinkReprRef::Asset(d).serialize(serializer),
            Self::Page(d) => LinkReprRef::Page(d).serialize(serializer),
            Self::Field(d) => LinkReprRef::Field(d).serialize(serializer),
            Self::Malformed(v) => v.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for LinkVariable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        match serde_json::from_value::<LinkRepr>(value.clone()) {
            Ok(repr) => Ok(repr.into()),
            Err(_) => Ok(Self::Malformed(value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlLink {
    pub url: Str,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub new_tab: bool,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailLink {
    pub address: Str,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneLink {
    pub number: Str,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetLink {
    pub asset_id: Str,
    /// Concrete URL, filled in by asset resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Str>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageLink {
    pub page_id: Str,
    /// Target layer whose anchor this link scrolls to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_layer_id: Option<Str>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// The binding slots of a layer.
///
/// Known slots are typed; anything else passes through `extra`. The
/// `collection` slot is special: it binds the layer to a data source and
/// is consumed (and dropped) by loop expansion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableMap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_color: Option<Variable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<LinkVariable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<CollectionVariable>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl VariableMap {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.image.is_none()
            && self.icon.is_none()
            && self.video.is_none()
            && self.audio.is_none()
            && self.background.is_none()
            && self.design_color.is_none()
            && self.link.is_none()
            && self.collection.is_none()
            && self.extra.is_empty()
    }

    /// Get a media slot by name. Used by the slot-category dispatch in
    /// component override resolution.
    pub fn slot(&self, name: &str) -> Option<&Variable> {
        match name {
            "text" => self.text.as_ref(),
            "image" => self.image.as_ref(),
            "icon" => self.icon.as_ref(),
            "video" => self.video.as_ref(),
            "audio" => self.audio.as_ref(),
            "background" => self.background.as_ref(),
            "designColor" => self.design_color.as_ref(),
            _ => None,
        }
    }

    /// Set a media slot by name. Unknown names are ignored.
    pub fn set_slot(&mut self, name: &str, value: Variable) {
        match name {
            "text" => self.text = Some(value),
            "image" => self.image = Some(value),
            "icon" => self.icon = Some(value),
            "video" => self.video = Some(value),
            "audio" => self.audio = Some(value),
            "background" => self.background = Some(value),
            "designColor" => self.design_color = Some(value),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_tag_round_trip() {
        let json = r#"{"type":"static_text","value":"hello"}"#;
        let var: Variable = serde_json::from_str(json).unwrap();
        assert_eq!(var.as_static_text(), Some("hello"));
        let out = serde_json::to_value(&var).unwrap();
        assert_eq!(out["type"], "static_text");
        assert_eq!(out["value"], "hello");
    }

    #[test]
    fn test_malformed_variable_preserved() {
        let json = r#"{"type":"hologram","beam":42}"#;
        let var: Variable = serde_json::from_str(json).unwrap();
        assert!(matches!(var, Variable::Malformed(_)));
        let out = serde_json::to_string(&var).unwrap();
        assert_eq!(out, json);
    }

    #[test]
    fn test_field_lookup_path() {
        let mut field = FieldRef::new("author");
        assert_eq!(field.lookup_path(), "author");
        field.relationships.push(Str::from("name"));
        assert_eq!(field.lookup_path(), "author.name");
    }

    #[test]
    fn test_link_variable_kinds() {
        let json = r#"{"type":"email","address":"hi@folia.dev"}"#;
        let link: LinkVariable = serde_json::from_str(json).unwrap();
        assert!(matches!(link, LinkVariable::Email(_)));

        let json = r#"{"type":"page","pageId":"p1","anchorLayerId":"hero"}"#;
        let link: LinkVariable = serde_json::from_str(json).unwrap();
        match link {
            LinkVariable::Page(page) => {
                assert_eq!(page.page_id, "p1");
                assert_eq!(page.anchor_layer_id.as_deref(), Some("hero"));
            }
            other => panic!("expected page link, got {other:?}"),
        }
    }

    #[test]
    fn test_variable_extra_fields_survive() {
        let json = r#"{"type":"asset","assetId":"a1","crop":"16:9"}"#;
        let var: Variable = serde_json::from_str(json).unwrap();
        let out = serde_json::to_value(&var).unwrap();
        assert_eq!(out["crop"], "16:9");
    }
}
