//! Resolve options and the context threaded through the pipeline.

use std::sync::{Mutex, PoisonError};

use folia_case::{FxHashMap, Str};
use folia_forme::{Component, Field, Item, PaginationInfo, TranslationTable, ValueMap};

/// Caller-supplied knobs for one resolution pass.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Read published copies instead of drafts.
    pub published: bool,
    /// Locale to overlay; `None` renders authored values.
    pub locale: Option<Str>,
    /// IANA timezone name used for date formatting.
    pub timezone: Str,
    /// The page being resolved; scopes page translations and anchors.
    pub page_id: Option<Str>,
    /// Requested page number per collection layer id.
    pub page_numbers: FxHashMap<Str, u32>,
    /// Page number for layers not present in `page_numbers`.
    pub default_page: u32,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            published: true,
            locale: None,
            timezone: Str::from("UTC"),
            page_id: None,
            page_numbers: FxHashMap::default(),
            default_page: 1,
        }
    }
}

impl ResolveOptions {
    /// Requested page for a collection layer.
    pub fn page_for(&self, layer_id: &str) -> u32 {
        self.page_numbers
            .get(layer_id)
            .copied()
            .unwrap_or(self.default_page)
            .max(1)
    }
}

/// The loop scope visible to a subtree: the current item's values plus
/// the value maps of every named ancestor loop. Immutable; each branch
/// gets its own copy, there are no mutable outer-scope lookups.
#[derive(Debug, Clone, Default)]
pub struct LoopScope {
    /// The nearest enclosing loop's item values (or the page item's).
    pub values: ValueMap,
    /// Ancestor loop values keyed by collection layer id, for bindings
    /// that scope themselves with `collection_layer_id`.
    pub layer_data: FxHashMap<Str, ValueMap>,
    /// Collection the current item belongs to; resolves source fields.
    pub collection_id: Option<Str>,
    /// Id of the item `values` belongs to, for CMS translation lookups.
    pub item_id: Option<Str>,
}

impl LoopScope {
    /// Scope for a descendant subtree entering the loop over `layer_id`
    /// with `item`'s values.
    pub fn enter_loop(
        &self,
        layer_id: &str,
        collection_id: Option<Str>,
        item_id: Str,
        values: ValueMap,
    ) -> Self {
        let mut layer_data = self.layer_data.clone();
        layer_data.insert(Str::from(layer_id), values.clone());
        Self {
            values,
            layer_data,
            collection_id,
            item_id: Some(item_id),
        }
    }

    /// Value map a binding resolves against: the named ancestor loop when
    /// scoped, the nearest enclosing loop otherwise.
    pub fn values_for(&self, collection_layer_id: Option<&str>) -> Option<&ValueMap> {
        match collection_layer_id {
            Some(layer_id) => self.layer_data.get(layer_id),
            None => Some(&self.values),
        }
    }
}

/// Per-pass memoization. Fetches within one resolution are cached by id,
/// so repeated lookups cost one repository round trip per distinct id.
/// Guards are never held across an await.
#[derive(Debug, Default)]
pub struct ResolveCache {
    fields: Mutex<FxHashMap<Str, Vec<Field>>>,
    components: Mutex<FxHashMap<Str, Component>>,
    items: Mutex<FxHashMap<(Str, Str), Option<Item>>>,
}

impl ResolveCache {
    pub fn cached_fields(&self, collection_id: &str) -> Option<Vec<Field>> {
        self.fields
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection_id)
            .cloned()
    }

    pub fn store_fields(&self, collection_id: &str, fields: Vec<Field>) {
        self.fields
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(Str::from(collection_id), fields);
    }

    pub fn cached_component(&self, id: &str) -> Option<Component> {
        self.components
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn store_component(&self, component: Component) {
        self.components
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(component.id.clone(), component);
    }

    /// Cached item lookup; `Some(None)` records a known miss.
    pub fn cached_item(&self, collection_id: &str, item_id: &str) -> Option<Option<Item>> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(Str::from(collection_id), Str::from(item_id)))
            .cloned()
    }

    pub fn store_item(&self, collection_id: &str, item_id: &str, item: Option<Item>) {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((Str::from(collection_id), Str::from(item_id)), item);
    }
}

/// Everything one resolution pass reads: options, translations and the
/// memo caches. Shared immutably across concurrent branches.
#[derive(Debug, Default)]
pub struct PassState {
    pub options: ResolveOptions,
    pub translations: TranslationTable,
    pub cache: ResolveCache,
}

impl PassState {
    pub fn new(options: ResolveOptions, translations: TranslationTable) -> Self {
        Self {
            options,
            translations,
            cache: ResolveCache::default(),
        }
    }
}

/// Pagination metadata per collection layer id, the side channel a
/// pagination-controls collaborator consumes.
pub type PaginationMap = FxHashMap<Str, PaginationInfo>;

#[cfg(test)]
mod tests {
    use super::*;
    use folia_forme::FieldValue;

    #[test]
    fn test_page_for_defaults() {
        let mut options = ResolveOptions::default();
        options.page_numbers.insert(Str::from("loop1"), 3);
        assert_eq!(options.page_for("loop1"), 3);
        assert_eq!(options.page_for("loop2"), 1);
    }

    #[test]
    fn test_scope_prefers_named_ancestor() {
        let mut outer_values = ValueMap::new();
        outer_values.insert(Str::from("title"), FieldValue::Text(Str::from("outer")));
        let scope = LoopScope::default().enter_loop(
            "outerLoop",
            Some(Str::from("posts")),
            Str::from("item1"),
            outer_values,
        );

        let mut inner_values = ValueMap::new();
        inner_values.insert(Str::from("title"), FieldValue::Text(Str::from("inner")));
        let scope = scope.enter_loop(
            "innerLoop",
            Some(Str::from("authors")),
            Str::from("item2"),
            inner_values,
        );

        let nearest = scope.values_for(None).unwrap();
        assert_eq!(nearest.get("title").unwrap().as_str(), Some("inner"));
        let named = scope.values_for(Some("outerLoop")).unwrap();
        assert_eq!(named.get("title").unwrap().as_str(), Some("outer"));
        assert!(scope.values_for(Some("missing")).is_none());
    }
}
