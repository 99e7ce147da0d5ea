//! Minimal page records, consumed by link-href resolution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use folia_case::Str;

use crate::ExtraFields;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: Str,
    pub slug: Str,
    /// Per-locale slug overrides; absent locales use the default slug.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub locale_slugs: BTreeMap<Str, Str>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Page {
    pub fn new(id: impl Into<Str>, slug: impl Into<Str>) -> Self {
        Self {
            id: id.into(),
            slug: slug.into(),
            locale_slugs: BTreeMap::new(),
            extra: ExtraFields::new(),
        }
    }

    /// Slug for the given locale, falling back to the default slug.
    pub fn slug_for(&self, locale: Option<&str>) -> &str {
        locale
            .and_then(|l| self.locale_slugs.get(l))
            .map(Str::as_str)
            .unwrap_or(&self.slug)
    }
}
