//! Field values, field definitions, items and assets.
//!
//! Values are deliberately loose (JSON-shaped); the declared field type
//! drives interpretation — reference hops, date formatting, comparison
//! operators. Item value maps are ephemeral, built per resolution pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use folia_case::Str;

use crate::rich_text::RichTextDocument;
use crate::ExtraFields;

/// A scalar (or structured) field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    /// Plain text; also carries date strings (ISO-8601), asset ids and
    /// single reference ids, per the declared field type.
    Text(Str),
    /// Ordered id list: multi-reference or multi-asset, per field type.
    List(Vec<Str>),
    RichText(RichTextDocument),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Str]> {
        match self {
            Self::List(ids) => Some(ids),
            _ => None,
        }
    }

    /// Render this value as display text. Dates and numbers go through
    /// the resolver's formatting before reaching here.
    pub fn display(&self) -> Str {
        match self {
            Self::Bool(b) => Str::from(if *b { "true" } else { "false" }),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Str::from(format!("{}", *n as i64))
                } else {
                    Str::from(format!("{n}"))
                }
            }
            Self::Text(s) => s.clone(),
            Self::List(ids) => Str::from(
                ids.iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Self::RichText(doc) => Str::from(doc.plain_text()),
        }
    }

    /// Whether a presence check should treat this value as set.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Text(s) => !s.is_empty(),
            Self::List(ids) => !ids.is_empty(),
            Self::RichText(doc) => !doc.plain_text().is_empty(),
            Self::Bool(_) | Self::Number(_) => true,
        }
    }
}

/// Item values keyed by field id, including derived dotted paths for
/// resolved relationship hops (`"refFieldId.targetFieldId"`).
pub type ValueMap = BTreeMap<Str, FieldValue>;

/// A collection item with its values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Str,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<Str>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub values: ValueMap,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Item {
    pub fn new(id: impl Into<Str>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_value(mut self, field_id: impl Into<Str>, value: FieldValue) -> Self {
        self.values.insert(field_id.into(), value);
        self
    }
}

/// Declared field types. Unrecognized type names deserialize to
/// [`FieldType::Unknown`] and are treated as plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Text,
    RichText,
    Number,
    Bool,
    Date,
    Asset,
    MultiAsset,
    Reference,
    MultiReference,
    Color,
    Link,
    Unknown,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::RichText => "rich_text",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::Asset => "asset",
            Self::MultiAsset => "multi_asset",
            Self::Reference => "reference",
            Self::MultiReference => "multi_reference",
            Self::Color => "color",
            Self::Link => "link",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_name(name: &str) -> Self {
        match name {
            "text" => Self::Text,
            "rich_text" => Self::RichText,
            "number" => Self::Number,
            "bool" => Self::Bool,
            "date" => Self::Date,
            "asset" => Self::Asset,
            "multi_asset" => Self::MultiAsset,
            "reference" => Self::Reference,
            "multi_reference" => Self::MultiReference,
            "color" => Self::Color,
            "link" => Self::Link,
            _ => Self::Unknown,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference | Self::MultiReference)
    }
}

impl Serialize for FieldType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = Str::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// A field definition from a collection's schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: Str,
    /// Stable slug used by CMS translations and dynamic-text placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Str>,
    pub name: Str,
    pub field_type: FieldType,
    /// Target collection for reference-typed fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<Str>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Field {
    pub fn new(id: impl Into<Str>, name: impl Into<Str>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            key: None,
            name: name.into(),
            field_type,
            collection_id: None,
            extra: ExtraFields::new(),
        }
    }
}

/// An uploaded asset's metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: Str,
    pub url: Str,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Asset {
    pub fn new(id: impl Into<Str>, url: impl Into<Str>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            filename: None,
            alt: None,
            width: None,
            height: None,
            extra: ExtraFields::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_untagged_shapes() {
        assert_eq!(
            serde_json::from_str::<FieldValue>("true").unwrap(),
            FieldValue::Bool(true)
        );
        assert_eq!(
            serde_json::from_str::<FieldValue>("3.5").unwrap(),
            FieldValue::Number(3.5)
        );
        assert_eq!(
            serde_json::from_str::<FieldValue>(r#""Ada""#).unwrap(),
            FieldValue::Text(Str::from("Ada"))
        );
        assert_eq!(
            serde_json::from_str::<FieldValue>(r#"["a","b"]"#).unwrap(),
            FieldValue::List(vec![Str::from("a"), Str::from("b")])
        );
    }

    #[test]
    fn test_display_trims_integral_numbers() {
        assert_eq!(FieldValue::Number(12.0).display(), "12");
        assert_eq!(FieldValue::Number(2.25).display(), "2.25");
    }

    #[test]
    fn test_presence() {
        assert!(FieldValue::Text(Str::from("x")).is_present());
        assert!(!FieldValue::Text(Str::from("")).is_present());
        assert!(!FieldValue::List(Vec::new()).is_present());
        assert!(FieldValue::Bool(false).is_present());
    }

    #[test]
    fn test_unknown_field_type() {
        let field_type: FieldType = serde_json::from_str(r#""quaternion""#).unwrap();
        assert_eq!(field_type, FieldType::Unknown);
    }
}
