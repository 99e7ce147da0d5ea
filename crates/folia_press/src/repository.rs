//! The repository contract the pipeline reads through.
//!
//! Persistence and querying live outside this crate; the pipeline only
//! ever issues pure reads through this trait. Every entity exists in a
//! draft and, once published, an independent published copy keyed by the
//! same logical id — the `published` flag selects which copy a read sees.

use folia_case::{FxHashMap, Str};
use folia_forme::{
    Asset, CmsTranslation, Component, Field, Item, LayerTranslation, Page,
};

use crate::errors::RepositoryError;

/// Narrowing options for an item query.
#[derive(Debug, Clone, Default)]
pub struct ItemQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    /// Restrict to these ids. Result order follows the stored order, not
    /// this list; callers re-order when list order matters.
    pub item_ids: Option<Vec<Str>>,
}

/// Translation rows for one locale.
#[derive(Debug, Clone, Default)]
pub struct LocaleTranslations {
    pub layers: Vec<LayerTranslation>,
    pub cms: Vec<CmsTranslation>,
}

/// Pure-read data access used by the resolution pipeline.
///
/// `Sync` because one resolution pass shares the repository across its
/// concurrent sibling branches.
pub trait Repository: Sync {
    fn get_components_by_ids(
        &self,
        ids: &[Str],
        published: bool,
    ) -> impl std::future::Future<Output = Result<Vec<Component>, RepositoryError>> + Send;

    fn get_items_with_values(
        &self,
        collection_id: &str,
        published: bool,
        query: ItemQuery,
    ) -> impl std::future::Future<Output = Result<Vec<Item>, RepositoryError>> + Send;

    fn get_fields_by_collection_id(
        &self,
        collection_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Field>, RepositoryError>> + Send;

    fn get_assets_by_ids(
        &self,
        ids: &[Str],
    ) -> impl std::future::Future<Output = Result<Vec<Asset>, RepositoryError>> + Send;

    fn get_pages_by_ids(
        &self,
        ids: &[Str],
    ) -> impl std::future::Future<Output = Result<Vec<Page>, RepositoryError>> + Send;

    fn load_translations_for_locale(
        &self,
        locale_id: &str,
    ) -> impl std::future::Future<Output = Result<LocaleTranslations, RepositoryError>> + Send;
}

/// In-memory repository over plain records. Backs tests and the CLI's
/// fixture files; published and draft views share the same data.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRepository {
    #[serde(default)]
    pub components: Vec<Component>,
    /// Collection id -> items in stored order.
    #[serde(default)]
    pub items: FxHashMap<Str, Vec<Item>>,
    /// Collection id -> field definitions.
    #[serde(default)]
    pub fields: FxHashMap<Str, Vec<Field>>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub layer_translations: Vec<LayerTranslation>,
    #[serde(default)]
    pub cms_translations: Vec<CmsTranslation>,
}

impl MemoryRepository {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_collection(
        mut self,
        collection_id: impl Into<Str>,
        fields: Vec<Field>,
        items: Vec<Item>,
    ) -> Self {
        let id = collection_id.into();
        self.fields.insert(id.clone(), fields);
        self.items.insert(id, items);
        self
    }

    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_asset(mut self, asset: Asset) -> Self {
        self.assets.push(asset);
        self
    }

    pub fn with_page(mut self, page: Page) -> Self {
        self.pages.push(page);
        self
    }
}

impl Repository for MemoryRepository {
    async fn get_components_by_ids(
        &self,
        ids: &[Str],
        _published: bool,
    ) -> Result<Vec<Component>, RepositoryError> {
        Ok(self
            .components
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn get_items_with_values(
        &self,
        collection_id: &str,
        _published: bool,
        query: ItemQuery,
    ) -> Result<Vec<Item>, RepositoryError> {
        let Some(items) = self.items.get(collection_id) else {
            return Err(RepositoryError::Fetch(Str::from(format!(
                "unknown collection '{collection_id}'"
            ))));
        };
        let mut out: Vec<Item> = match &query.item_ids {
            Some(ids) => items.iter().filter(|i| ids.contains(&i.id)).cloned().collect(),
            None => items.clone(),
        };
        if let Some(offset) = query.offset {
            out = out.into_iter().skip(offset as usize).collect();
        }
        if let Some(limit) = query.limit {
            out.truncate(limit as usize);
        }
        Ok(out)
    }

    async fn get_fields_by_collection_id(
        &self,
        collection_id: &str,
    ) -> Result<Vec<Field>, RepositoryError> {
        Ok(self.fields.get(collection_id).cloned().unwrap_or_default())
    }

    async fn get_assets_by_ids(&self, ids: &[Str]) -> Result<Vec<Asset>, RepositoryError> {
        Ok(self
            .assets
            .iter()
            .filter(|a| ids.contains(&a.id))
            .cloned()
            .collect())
    }

    async fn get_pages_by_ids(&self, ids: &[Str]) -> Result<Vec<Page>, RepositoryError> {
        Ok(self
            .pages
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn load_translations_for_locale(
        &self,
        locale_id: &str,
    ) -> Result<LocaleTranslations, RepositoryError> {
        Ok(LocaleTranslations {
            layers: self
                .layer_translations
                .iter()
                .filter(|t| t.locale_id == locale_id)
                .cloned()
                .collect(),
            cms: self
                .cms_translations
                .iter()
                .filter(|t| t.locale_id == locale_id)
                .cloned()
                .collect(),
        })
    }
}
