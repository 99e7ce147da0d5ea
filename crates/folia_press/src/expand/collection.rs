//! Collection-loop expansion.
//!
//! A collection-bound layer is replaced by a transparent fragment whose
//! children are one clone of the layer per item. Item sets come from a
//! direct collection query or from a source field on the current item
//! (single reference, multi-reference, or multi-asset). Filters, sort
//! and pagination apply in that order — pagination arithmetic runs over
//! the filtered set, so page counts stay correct.
//!
//! Sibling items resolve concurrently; every branch returns its own
//! subtree, diagnostics and pagination entries, merged by the caller.
//! A failed fetch degrades its own subtree to "no items" and never
//! aborts siblings.

use futures::future::{join_all, BoxFuture};
use tracing::warn;

use folia_case::{ordering_key, FxHashMap, Str};
use folia_forme::{
    Asset, CollectionVariable, Field, FieldType, FieldValue, Item, Layer, LinkVariable,
    PaginationInfo, PaginationMode, SortDirection, SortMode, SortSpec, ValueMap, Variable,
};

use crate::context::{LoopScope, PassState};
use crate::errors::{Diagnostic, DiagnosticCode};
use crate::fields::{
    build_item_values, display_text, fields_for_collection, resolve_dynamic_text, resolve_field,
    resolve_rich_text,
};
use crate::namespace::{item_scoped_id, namespace_clone};
use crate::repository::{ItemQuery, Repository};
use crate::visibility::evaluate_rule;

/// The result of expanding one subtree: replacement layers plus the
/// diagnostics and pagination entries that branch produced.
#[derive(Debug, Default)]
pub struct ExpandOutcome {
    pub layers: Vec<Layer>,
    pub diagnostics: Vec<Diagnostic>,
    pub pagination: Vec<(Str, PaginationInfo)>,
}

impl ExpandOutcome {
    fn absorb(&mut self, other: ExpandOutcome) {
        self.layers.extend(other.layers);
        self.diagnostics.extend(other.diagnostics);
        self.pagination.extend(other.pagination);
    }
}

/// Expand every collection-bound layer under the given roots, resolving
/// field bindings against the ambient scope as it goes.
pub async fn expand_collections<R: Repository>(
    repo: &R,
    state: &PassState,
    layers: Vec<Layer>,
    scope: &LoopScope,
) -> ExpandOutcome {
    let mut outcome = ExpandOutcome::default();
    let resolved = join_all(
        layers
            .into_iter()
            .map(|layer| resolve_layer(repo, state, layer, scope)),
    )
    .await;
    for branch in resolved {
        outcome.absorb(branch);
    }
    outcome
}

fn resolve_layer<'a, R: Repository>(
    repo: &'a R,
    state: &'a PassState,
    mut layer: Layer,
    scope: &'a LoopScope,
) -> BoxFuture<'a, ExpandOutcome> {
    Box::pin(async move {
        if let Some(binding) = layer.variables.collection.take() {
            return expand_collection(repo, state, layer, binding, scope).await;
        }
        resolve_in_scope(repo, state, layer, scope).await
    })
}

async fn expand_collection<R: Repository>(
    repo: &R,
    state: &PassState,
    layer: Layer,
    binding: CollectionVariable,
    scope: &LoopScope,
) -> ExpandOutcome {
    match item_set(repo, state, &layer, &binding, scope).await {
        Ok(ItemSet::Loop {
            collection_id,
            fields,
            items,
        }) => expand_loop(repo, state, layer, binding, scope, collection_id, fields, items).await,
        Ok(ItemSet::Context {
            collection_id,
            fields,
            item,
        }) => {
            // single reference: value context only, no cloning
            let mut outcome = ExpandOutcome::default();
            let values =
                build_item_values(repo, state, &fields, &item, &mut outcome.diagnostics).await;
            let item_scope =
                scope.enter_loop(&layer.id, Some(collection_id), item.id.clone(), values);
            let mut resolved = resolve_in_scope(repo, state, layer, &item_scope).await;
            if let Some(shell) = resolved.layers.first_mut() {
                shell.collection_item_id = Some(item.id.clone());
            }
            outcome.absorb(resolved);
            outcome
        }
        Err(mut diagnostics) => {
            // degrade to "no items": the un-cloned children resolve
            // against the parent context
            let mut outcome = ExpandOutcome::default();
            outcome.diagnostics.append(&mut diagnostics);
            let resolved = resolve_in_scope(repo, state, layer, scope).await;
            outcome.absorb(resolved);
            outcome
        }
    }
}

/// Resolve a layer shell and its children in the given scope, without
/// any cloning. Shared by the degrade path and single-reference context.
async fn resolve_in_scope<R: Repository>(
    repo: &R,
    state: &PassState,
    mut layer: Layer,
    scope: &LoopScope,
) -> ExpandOutcome {
    let mut outcome = ExpandOutcome::default();
    inject_bindings(&mut layer, scope, state, &mut outcome.diagnostics);
    let children = std::mem::take(&mut layer.children);
    let resolved = join_all(
        children
            .into_iter()
            .map(|child| resolve_layer(repo, state, child, scope)),
    )
    .await;
    let mut new_children = Vec::new();
    for mut branch in resolved {
        new_children.append(&mut branch.layers);
        outcome.diagnostics.extend(branch.diagnostics);
        outcome.pagination.extend(branch.pagination);
    }
    layer.children = new_children;
    outcome.layers.push(layer);
    outcome
}

enum ItemSet {
    Loop {
        collection_id: Option<Str>,
        fields: Vec<Field>,
        items: Vec<Item>,
    },
    Context {
        collection_id: Str,
        fields: Vec<Field>,
        item: Item,
    },
}

/// Determine the candidate item set, before filters/sort/pagination.
async fn item_set<R: Repository>(
    repo: &R,
    state: &PassState,
    layer: &Layer,
    binding: &CollectionVariable,
    scope: &LoopScope,
) -> Result<ItemSet, Vec<Diagnostic>> {
    if let Some(source_field) = &binding.source_field {
        return source_field_items(repo, state, layer, binding, scope, source_field).await;
    }

    let Some(collection_id) = &binding.collection_id else {
        return Err(vec![Diagnostic::warning(
            DiagnosticCode::ReferenceMissing,
            layer.id.clone(),
            "collection binding names no collection and no source field",
        )]);
    };
    let fields = fields_for_collection(repo, state, collection_id)
        .await
        .map_err(|err| fetch_failure(layer, &err))?;
    let items = repo
        .get_items_with_values(collection_id, state.options.published, ItemQuery::default())
        .await
        .map_err(|err| fetch_failure(layer, &err))?;
    Ok(ItemSet::Loop {
        collection_id: Some(collection_id.clone()),
        fields,
        items,
    })
}

async fn source_field_items<R: Repository>(
    repo: &R,
    state: &PassState,
    layer: &Layer,
    binding: &CollectionVariable,
    scope: &LoopScope,
    source_field: &Str,
) -> Result<ItemSet, Vec<Diagnostic>> {
    // the source field lives on the current item, so its definition
    // comes from the enclosing collection's schema
    let parent_fields = match &scope.collection_id {
        Some(collection_id) => fields_for_collection(repo, state, collection_id)
            .await
            .map_err(|err| fetch_failure(layer, &err))?,
        None => Vec::new(),
    };
    let definition = parent_fields.iter().find(|f| &f.id == source_field);
    let value = scope.values.get(source_field.as_str());

    match (definition.map(|d| d.field_type), value) {
        (Some(FieldType::MultiAsset), Some(FieldValue::List(asset_ids))) => {
            let assets = repo
                .get_assets_by_ids(asset_ids)
                .await
                .map_err(|err| fetch_failure(layer, &err))?;
            let by_id: FxHashMap<&str, &Asset> =
                assets.iter().map(|a| (a.id.as_str(), a)).collect();
            let items = asset_ids
                .iter()
                .filter_map(|id| by_id.get(id.as_str()).map(|a| virtual_asset_item(a)))
                .collect();
            Ok(ItemSet::Loop {
                collection_id: None,
                fields: Vec::new(),
                items,
            })
        }
        (Some(FieldType::Reference), Some(FieldValue::Text(item_id))) => {
            let Some(collection_id) = definition.and_then(|d| d.collection_id.clone()) else {
                return Err(vec![Diagnostic::warning(
                    DiagnosticCode::ReferenceMissing,
                    layer.id.clone(),
                    format!("source field '{source_field}' has no target collection"),
                )]);
            };
            let fields = fields_for_collection(repo, state, &collection_id)
                .await
                .map_err(|err| fetch_failure(layer, &err))?;
            let items = repo
                .get_items_with_values(
                    &collection_id,
                    state.options.published,
                    ItemQuery {
                        item_ids: Some(vec![item_id.clone()]),
                        ..ItemQuery::default()
                    },
                )
                .await
                .map_err(|err| fetch_failure(layer, &err))?;
            match items.into_iter().next() {
                Some(item) => Ok(ItemSet::Context {
                    collection_id,
                    fields,
                    item,
                }),
                None => Err(vec![Diagnostic::warning(
                    DiagnosticCode::ReferenceMissing,
                    layer.id.clone(),
                    format!("referenced item '{item_id}' not found"),
                )]),
            }
        }
        (Some(FieldType::MultiReference), Some(FieldValue::List(item_ids))) => {
            let Some(collection_id) = definition.and_then(|d| d.collection_id.clone()) else {
                return Err(vec![Diagnostic::warning(
                    DiagnosticCode::ReferenceMissing,
                    layer.id.clone(),
                    format!("source field '{source_field}' has no target collection"),
                )]);
            };
            let fields = fields_for_collection(repo, state, &collection_id)
                .await
                .map_err(|err| fetch_failure(layer, &err))?;
            let fetched = repo
                .get_items_with_values(
                    &collection_id,
                    state.options.published,
                    ItemQuery {
                        item_ids: Some(item_ids.clone()),
                        ..ItemQuery::default()
                    },
                )
                .await
                .map_err(|err| fetch_failure(layer, &err))?;
            // target order wins unless a sort override reorders later
            let by_id: FxHashMap<Str, Item> =
                fetched.into_iter().map(|i| (i.id.clone(), i)).collect();
            let items = item_ids
                .iter()
                .filter_map(|id| by_id.get(id).cloned())
                .collect();
            Ok(ItemSet::Loop {
                collection_id: Some(collection_id),
                fields,
                items,
            })
        }
        _ => {
            // absent value means an empty loop, not an error
            Ok(ItemSet::Loop {
                collection_id: None,
                fields: Vec::new(),
                items: Vec::new(),
            })
        }
    }
}

fn fetch_failure(layer: &Layer, err: &crate::errors::RepositoryError) -> Vec<Diagnostic> {
    warn!(layer = %layer.id, error = %err, "collection fetch failed, degrading to no items");
    vec![Diagnostic::warning(
        DiagnosticCode::DataFetchFailure,
        layer.id.clone(),
        format!("collection fetch failed: {err}"),
    )]
}

fn virtual_asset_item(asset: &Asset) -> Item {
    let mut item = Item::new(asset.id.clone());
    item.values
        .insert(Str::from("url"), FieldValue::Text(asset.url.clone()));
    if let Some(filename) = &asset.filename {
        item.values
            .insert(Str::from("filename"), FieldValue::Text(filename.clone()));
    }
    if let Some(alt) = &asset.alt {
        item.values
            .insert(Str::from("alt"), FieldValue::Text(alt.clone()));
    }
    if let Some(width) = asset.width {
        item.values
            .insert(Str::from("width"), FieldValue::Number(width as f64));
    }
    if let Some(height) = asset.height {
        item.values
            .insert(Str::from("height"), FieldValue::Number(height as f64));
    }
    item
}

#[allow(clippy::too_many_arguments)]
async fn expand_loop<R: Repository>(
    repo: &R,
    state: &PassState,
    layer: Layer,
    binding: CollectionVariable,
    scope: &LoopScope,
    collection_id: Option<Str>,
    fields: Vec<Field>,
    items: Vec<Item>,
) -> ExpandOutcome {
    let mut outcome = ExpandOutcome::default();

    // value maps first: filters compare against the item's own values
    let fields_ref = &fields;
    let with_values = join_all(items.iter().map(|item| async move {
        let mut diagnostics = Vec::new();
        let values = build_item_values(repo, state, fields_ref, item, &mut diagnostics).await;
        (item.clone(), values, diagnostics)
    }))
    .await;

    let mut candidates: Vec<(Item, ValueMap)> = Vec::with_capacity(with_values.len());
    for (item, values, diagnostics) in with_values {
        outcome.diagnostics.extend(diagnostics);
        candidates.push((item, values));
    }

    if let Some(filters) = &binding.filters {
        let no_counts = FxHashMap::default();
        candidates.retain(|(_, values)| {
            evaluate_rule(
                filters,
                &|c| values.get(c.field_id.as_str()).cloned(),
                &no_counts,
            )
        });
    }

    sort_items(&mut candidates, binding.sort.as_ref(), &layer.id);

    if let Some(offset) = binding.offset {
        let offset = (offset as usize).min(candidates.len());
        candidates.drain(..offset);
    }
    if let Some(limit) = binding.limit {
        candidates.truncate(limit as usize);
    }

    // pagination slices the filtered set; totals come from it too
    let page_items: Vec<(Item, ValueMap)> = match &binding.pagination {
        Some(pagination) => {
            let total = candidates.len() as u32;
            let page = state.options.page_for(&layer.id);
            let mut info =
                PaginationInfo::compute(pagination.mode, pagination.items_per_page, total, page);
            if pagination.mode == PaginationMode::LoadMore {
                // the binding was already taken off this shell, so the
                // retained template cannot re-trigger expansion
                info.layer_template = Some(Box::new(layer.clone()));
            }
            let start = info.offset() as usize;
            let end = (start + info.items_per_page as usize).min(candidates.len());
            let slice = if start < candidates.len() {
                candidates[start..end].to_vec()
            } else {
                Vec::new()
            };
            outcome.pagination.push((layer.id.clone(), info));
            slice
        }
        None => candidates,
    };

    // one clone per item, resolved concurrently
    let clones = join_all(page_items.into_iter().map(|(item, values)| {
        let item_scope =
            scope.enter_loop(&layer.id, collection_id.clone(), item.id.clone(), values);
        let shell = layer.clone();
        let clone_id = item_scoped_id(&layer.id, &item.id);
        let item_id = item.id;
        async move {
            let mut branch = resolve_in_scope(repo, state, shell, &item_scope).await;
            if let Some(clone) = branch.layers.first_mut() {
                clone.collection_item_id = Some(item_id);
                namespace_clone(clone, &clone_id);
            }
            branch
        }
    }))
    .await;

    let mut children = Vec::new();
    for mut branch in clones {
        children.append(&mut branch.layers);
        outcome.diagnostics.extend(branch.diagnostics);
        outcome.pagination.extend(branch.pagination);
    }

    // visibility stays on the clones, where its field conditions were
    // resolved per item; the fragment itself is transparent
    let fragment = Layer::fragment(layer.id.clone(), children);
    outcome.layers.push(fragment);
    outcome
}

/// Order candidates per the sort spec. `manual` keeps stored order,
/// `random` is a stable shuffle keyed by (layer, item), field sorts are
/// numeric-aware with a lexicographic fallback.
fn sort_items(candidates: &mut [(Item, ValueMap)], sort: Option<&SortSpec>, layer_id: &str) {
    let Some(sort) = sort else {
        return;
    };
    match sort.mode {
        SortMode::None => {}
        SortMode::Manual => {
            if sort.direction == SortDirection::Desc {
                candidates.reverse();
            }
        }
        SortMode::Random => {
            candidates.sort_by_key(|(item, _)| ordering_key(layer_id, &item.id));
        }
        SortMode::Field => {
            let Some(field_id) = &sort.field_id else {
                return;
            };
            candidates.sort_by(|(_, a), (_, b)| {
                let ordering =
                    compare_values(a.get(field_id.as_str()), b.get(field_id.as_str()));
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }
    }
}

/// Numeric when both sides are numbers (or parse as numbers),
/// lexicographic otherwise. Missing values sort last.
fn compare_values(a: Option<&FieldValue>, b: Option<&FieldValue>) -> std::cmp::Ordering {
    match (a, b) {
        (None, None) => std::cmp::Ordering::Equal,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (Some(_), None) => std::cmp::Ordering::Less,
        (Some(a), Some(b)) => {
            let numeric_a = a.as_number().or_else(|| parse_number_text(a));
            let numeric_b = b.as_number().or_else(|| parse_number_text(b));
            match (numeric_a, numeric_b) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.display().cmp(&b.display()),
            }
        }
    }
}

fn parse_number_text(value: &FieldValue) -> Option<f64> {
    value.as_str().and_then(|s| s.trim().parse::<f64>().ok())
}

/// Resolve this layer's own bindings against the scope: field values,
/// dynamic text, rich text placeholders, media and link references, and
/// the left-hand sides of its visibility field conditions.
pub fn inject_bindings(
    layer: &mut Layer,
    scope: &LoopScope,
    state: &PassState,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let timezone = state.options.timezone.clone();

    if let Some(variable) = layer.variables.text.take() {
        layer.variables.text = Some(match variable {
            Variable::Field(field) => match resolve_field(&field, scope) {
                Some(value) => {
                    Variable::text(display_text(&value, field.format.as_ref(), &timezone))
                }
                None => Variable::Field(field),
            },
            Variable::DynamicText(data) => {
                Variable::text(resolve_dynamic_text(&data.value, scope))
            }
            Variable::DynamicRichText(mut data) => {
                data.document = resolve_rich_text(&data.document, scope, state);
                Variable::DynamicRichText(data)
            }
            Variable::Malformed(value) => {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::MalformedVariable,
                    layer.id.clone(),
                    "text variable has an unexpected shape",
                ));
                Variable::Malformed(value)
            }
            other => other,
        });
    }

    for slot in ["image", "icon", "video", "audio", "background"] {
        let Some(Variable::Field(field)) = layer.variables.slot(slot).cloned() else {
            continue;
        };
        let asset_id = match resolve_field(&field, scope) {
            Some(FieldValue::Text(asset_id)) if !asset_id.is_empty() => asset_id,
            Some(FieldValue::List(ids)) => match ids.first() {
                Some(first) => first.clone(),
                None => continue,
            },
            _ => continue,
        };
        if slot == "video" {
            layer.variables.video = Some(Variable::Video(folia_forme::VideoData {
                asset_id: Some(asset_id),
                url: None,
                poster_asset_id: None,
                poster_url: None,
                extra: Default::default(),
            }));
        } else {
            layer.variables.set_slot(slot, Variable::asset(asset_id));
        }
    }

    if let Some(LinkVariable::Field(field)) = layer.variables.link.clone() {
        if let Some(FieldValue::Text(url)) = resolve_field(&field, scope) {
            if !url.is_empty() {
                layer.variables.link = Some(LinkVariable::Url(folia_forme::UrlLink {
                    url,
                    new_tab: false,
                    extra: Default::default(),
                }));
            }
        }
    }

    if let Some(rule) = &mut layer.visibility {
        for group in &mut rule.groups {
            for condition in &mut group.conditions {
                if let folia_forme::Condition::Field(c) = condition {
                    if c.resolved.is_some() {
                        continue;
                    }
                    let field = folia_forme::FieldRef {
                        field_id: c.field_id.clone(),
                        relationships: Vec::new(),
                        format: None,
                        collection_layer_id: c.collection_layer_id.clone(),
                        extra: Default::default(),
                    };
                    if let Some(value) = resolve_field(&field, scope) {
                        c.resolved = Some(value);
                    }
                }
            }
        }
    }
}
