//! Locale translations.
//!
//! Layer translations target a layer's bindable content inside a page,
//! folder or component scope. CMS translations target item field values
//! and go through an independent table. Only complete translations are
//! ever applied; incomplete rows exist so the authoring tool can track
//! progress, the pipeline skips them.

use serde::{Deserialize, Serialize};

use folia_case::{FxHashMap, Str};

use crate::rich_text::RichTextDocument;
use crate::value::FieldValue;
use crate::ExtraFields;

/// What a layer translation replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKey {
    Text,
    ImageSrc,
    ImageAlt,
    VideoSrc,
    VideoPoster,
    AudioSrc,
    IconSrc,
}

/// Which document owns the translated layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationSource {
    Page,
    Folder,
    Component,
    Cms,
}

/// A translated value: plain text or a rich text document. The overlay
/// adapts it to the structural type of the variable it replaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslationValue {
    Text(Str),
    RichText(RichTextDocument),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerTranslation {
    pub locale_id: Str,
    pub source_type: TranslationSource,
    /// Page id or owning component id.
    pub source_id: Str,
    pub layer_id: Str,
    pub content_key: ContentKey,
    pub value: TranslationValue,
    #[serde(default)]
    pub complete: bool,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmsTranslation {
    pub locale_id: Str,
    pub item_id: Str,
    /// Field key, or field id for fields without a key.
    pub field_key: Str,
    pub value: FieldValue,
    #[serde(default)]
    pub complete: bool,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Indexed translations for one locale.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    layer: FxHashMap<(TranslationSource, Str, Str, ContentKey), TranslationValue>,
    cms: FxHashMap<(Str, Str), FieldValue>,
}

impl TranslationTable {
    pub fn from_rows(
        layer_rows: Vec<LayerTranslation>,
        cms_rows: Vec<CmsTranslation>,
    ) -> Self {
        let mut table = Self::default();
        for row in layer_rows {
            if !row.complete {
                continue;
            }
            table.layer.insert(
                (row.source_type, row.source_id, row.layer_id, row.content_key),
                row.value,
            );
        }
        for row in cms_rows {
            if !row.complete {
                continue;
            }
            table.cms.insert((row.item_id, row.field_key), row.value);
        }
        table
    }

    pub fn is_empty(&self) -> bool {
        self.layer.is_empty() && self.cms.is_empty()
    }

    /// Complete translation for a layer's content, if any.
    pub fn layer_value(
        &self,
        source_type: TranslationSource,
        source_id: &str,
        layer_id: &str,
        content_key: ContentKey,
    ) -> Option<&TranslationValue> {
        self.layer.get(&(
            source_type,
            Str::from(source_id),
            Str::from(layer_id),
            content_key,
        ))
    }

    /// Complete translation for an item's field value, if any.
    pub fn cms_value(&self, item_id: &str, field_key: &str) -> Option<&FieldValue> {
        self.cms.get(&(Str::from(item_id), Str::from(field_key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(complete: bool) -> LayerTranslation {
        LayerTranslation {
            locale_id: Str::from("fr"),
            source_type: TranslationSource::Page,
            source_id: Str::from("p1"),
            layer_id: Str::from("l1"),
            content_key: ContentKey::Text,
            value: TranslationValue::Text(Str::from("Bonjour")),
            complete,
            extra: ExtraFields::new(),
        }
    }

    #[test]
    fn test_complete_translation_found() {
        let table = TranslationTable::from_rows(vec![row(true)], vec![]);
        let value = table.layer_value(TranslationSource::Page, "p1", "l1", ContentKey::Text);
        assert!(matches!(value, Some(TranslationValue::Text(t)) if t == "Bonjour"));
    }

    #[test]
    fn test_incomplete_translation_skipped() {
        let table = TranslationTable::from_rows(vec![row(false)], vec![]);
        assert!(table
            .layer_value(TranslationSource::Page, "p1", "l1", ContentKey::Text)
            .is_none());
    }

    #[test]
    fn test_cms_lookup() {
        let table = TranslationTable::from_rows(
            vec![],
            vec![CmsTranslation {
                locale_id: Str::from("fr"),
                item_id: Str::from("i1"),
                field_key: Str::from("title"),
                value: FieldValue::Text(Str::from("Titre")),
                complete: true,
                extra: ExtraFields::new(),
            }],
        );
        assert_eq!(
            table.cms_value("i1", "title"),
            Some(&FieldValue::Text(Str::from("Titre")))
        );
    }
}
