//! Collection bindings: the data side of layer loops.

use serde::{Deserialize, Serialize};

use folia_case::Str;

use crate::visibility::VisibilityRule;
use crate::ExtraFields;

/// Binds a layer to a data source.
///
/// Exactly one of `collection_id` / `source_field` is expected; when both
/// are present the source field wins (it narrows the queried collection).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionVariable {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<Str>,
    /// A field on the current item supplying the item set: a single
    /// reference, a multi-reference list, or a multi-asset list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_field: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    /// Per-candidate-item filter, evaluated against the item's own values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<VisibilityRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    #[serde(default)]
    pub mode: SortMode,
    /// Sort field, when `mode` is `field`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<Str>,
    #[serde(default)]
    pub direction: SortDirection,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Stored order.
    #[default]
    Manual,
    /// Stable shuffled order, keyed by layer and item ids.
    Random,
    /// No reordering at all.
    None,
    /// Order by a named field, numeric-aware.
    Field,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub mode: PaginationMode,
    pub items_per_page: u32,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Numbered pages with previous/next affordances.
    Pages,
    /// Append-only paging; the client re-renders appended items from the
    /// retained layer template.
    LoadMore,
}

/// Pagination facts emitted alongside an expanded loop, consumed by
/// pagination-control collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u32,
    pub items_per_page: u32,
    pub mode: PaginationMode,
    /// The per-item layer template, retained in load-more mode so the
    /// client can append later pages without a full re-render.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer_template: Option<Box<crate::layer::Layer>>,
}

impl PaginationInfo {
    /// Page arithmetic over the filtered item count.
    pub fn compute(mode: PaginationMode, items_per_page: u32, total_items: u32, page: u32) -> Self {
        let items_per_page = items_per_page.max(1);
        let total_pages = total_items.div_ceil(items_per_page).max(1);
        let current_page = page.clamp(1, total_pages);
        Self {
            current_page,
            total_pages,
            total_items,
            items_per_page,
            mode,
            layer_template: None,
        }
    }

    /// Item offset of the current page.
    pub fn offset(&self) -> u32 {
        (self.current_page - 1) * self.items_per_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_arithmetic() {
        let info = PaginationInfo::compute(PaginationMode::Pages, 10, 25, 3);
        assert_eq!(info.offset(), 20);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.current_page, 3);
    }

    #[test]
    fn test_pagination_clamps_page() {
        let info = PaginationInfo::compute(PaginationMode::Pages, 10, 25, 9);
        assert_eq!(info.current_page, 3);
        let info = PaginationInfo::compute(PaginationMode::Pages, 10, 0, 1);
        assert_eq!(info.total_pages, 1);
        assert_eq!(info.current_page, 1);
    }

    #[test]
    fn test_collection_variable_round_trip() {
        let json = r#"{"collectionId":"posts","sort":{"mode":"field","fieldId":"date","direction":"desc"},"pagination":{"mode":"load_more","itemsPerPage":12}}"#;
        let var: CollectionVariable = serde_json::from_str(json).unwrap();
        assert_eq!(var.collection_id.as_deref(), Some("posts"));
        assert_eq!(var.sort.as_ref().unwrap().mode, SortMode::Field);
        assert_eq!(
            var.pagination.as_ref().unwrap().mode,
            PaginationMode::LoadMore
        );
    }
}
