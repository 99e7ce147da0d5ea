//! Field and relationship-path resolution.
//!
//! A field binding resolves to a value by looking its dotted path up in
//! the scope's value map. Reference hops are precomputed into those
//! dotted paths when an item's value map is built, so resolution itself
//! is a pure lookup. Formatting (timezone-aware dates, number precision)
//! happens when a resolved value is injected as display text.

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use tracing::warn;

use folia_case::{FxHashSet, Str};
use folia_forme::{
    Field, FieldRef, FieldType, FieldValue, Item, RichTextDocument, RichTextNode, RichTextSpan,
    ValueFormat, ValueMap,
};

use crate::context::{LoopScope, PassState};
use crate::errors::{Diagnostic, DiagnosticCode};
use crate::repository::{ItemQuery, Repository};

/// Default date rendering when a binding has no explicit format.
const DEFAULT_DATE_FORMAT: &str = "%B %-d, %Y";

/// Resolve a field binding against the scope. Pure lookup; returns
/// `None` for unknown paths and out-of-scope ancestor references.
pub fn resolve_field(field: &FieldRef, scope: &LoopScope) -> Option<FieldValue> {
    let values = scope.values_for(field.collection_layer_id.as_deref())?;
    values.get(field.lookup_path().as_str()).cloned()
}

/// Resolve a field binding and render it as display text, applying the
/// binding's format and the pass timezone.
pub fn resolve_field_text(
    field: &FieldRef,
    scope: &LoopScope,
    state: &PassState,
) -> Option<Str> {
    let value = resolve_field(field, scope)?;
    Some(format_value(
        &value,
        field.format.as_ref(),
        &state.options.timezone,
    ))
}

/// Render a value as display text.
pub fn format_value(value: &FieldValue, format: Option<&ValueFormat>, timezone: &str) -> Str {
    match value {
        FieldValue::Text(text) => {
            if let Some(formatted) = try_format_date(text, format, timezone) {
                return formatted;
            }
            text.clone()
        }
        FieldValue::Number(n) => {
            if let Some(precision) = format.and_then(|f| f.precision) {
                Str::from(format!("{:.*}", precision as usize, n))
            } else {
                value.display()
            }
        }
        other => other.display(),
    }
}

/// Format an ISO-8601 date string in the pass timezone. Returns `None`
/// when the text is not a date or no date format applies.
fn try_format_date(text: &str, format: Option<&ValueFormat>, timezone: &str) -> Option<Str> {
    let date_format = format.and_then(|f| f.date_format.as_deref())?;
    let local = parse_in_timezone(text, timezone)?;
    checked_format(&local, date_format)
}

/// Format a date-typed stored value with the default format. Used when a
/// date field is injected without an explicit binding format.
pub fn format_date_default(text: &str, timezone: &str) -> Option<Str> {
    let local = parse_in_timezone(text, timezone)?;
    checked_format(&local, DEFAULT_DATE_FORMAT)
}

fn parse_in_timezone(text: &str, timezone: &str) -> Option<DateTime<Tz>> {
    let parsed = DateTime::parse_from_rfc3339(text).ok()?;
    let tz: Tz = timezone.parse().unwrap_or(chrono_tz::UTC);
    Some(tz.from_utc_datetime(&parsed.naive_utc()))
}

/// Authored format strings are untrusted; a bad specifier renders the
/// raw value instead of panicking in `DelayedFormat`.
fn checked_format(date: &DateTime<Tz>, format: &str) -> Option<Str> {
    let items: Vec<chrono::format::Item> = chrono::format::StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, chrono::format::Item::Error)) {
        return None;
    }
    Some(Str::from(
        date.format_with_items(items.into_iter()).to_string(),
    ))
}

/// Render a resolved value for injection as display text. Date-shaped
/// text without an explicit format gets the default date rendering in
/// the pass timezone.
pub fn display_text(value: &FieldValue, format: Option<&ValueFormat>, timezone: &str) -> Str {
    if let FieldValue::Text(text) = value {
        let has_explicit = format.and_then(|f| f.date_format.as_deref()).is_some();
        if !has_explicit {
            if let Some(formatted) = format_date_default(text, timezone) {
                return formatted;
            }
        }
    }
    format_value(value, format, timezone)
}

/// Substitute `{{fieldId}}` placeholders in dynamic text. Placeholders
/// may carry dotted relationship paths; unresolved ones render empty.
pub fn resolve_dynamic_text(template: &str, scope: &LoopScope) -> Str {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let path = after[..end].trim();
                if let Some(value) = scope.values.get(path) {
                    out.push_str(&value.display());
                }
                rest = &after[end + 2..];
            }
            None => {
                // unterminated placeholder, keep the literal text
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    Str::from(out)
}

/// Resolve inline field placeholders in a rich text document.
///
/// A placeholder naming a rich-text-typed value is spliced in: its
/// document's nodes replace the placeholder, recursively resolved.
/// Every other value stringifies into a text span carrying the
/// placeholder's marks (none, since placeholders hold no marks of their
/// own — the surrounding span structure carries formatting).
pub fn resolve_rich_text(document: &RichTextDocument, scope: &LoopScope, state: &PassState) -> RichTextDocument {
    let mut resolved = document.clone();
    resolved.nodes = resolve_rich_nodes(&document.nodes, scope, state, 0);
    resolved
}

fn resolve_rich_nodes(
    nodes: &[RichTextNode],
    scope: &LoopScope,
    state: &PassState,
    depth: u32,
) -> Vec<RichTextNode> {
    // inlined documents may nest; keep a hard bound against authoring loops
    if depth > 16 {
        return nodes.to_vec();
    }
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            RichTextNode::FieldPlaceholder(field) => match resolve_field(field, scope) {
                Some(FieldValue::RichText(doc)) => {
                    out.extend(resolve_rich_nodes(&doc.nodes, scope, state, depth + 1));
                }
                Some(value) => {
                    out.push(RichTextNode::Text(RichTextSpan {
                        text: format_value(&value, field.format.as_ref(), &state.options.timezone),
                        marks: Vec::new(),
                        extra: Default::default(),
                    }));
                }
                None => {}
            },
            RichTextNode::Paragraph(b) => {
                let mut block = b.clone();
                block.children = resolve_rich_nodes(&b.children, scope, state, depth);
                out.push(RichTextNode::Paragraph(block));
            }
            RichTextNode::BulletedList(b) => {
                let mut block = b.clone();
                block.children = resolve_rich_nodes(&b.children, scope, state, depth);
                out.push(RichTextNode::BulletedList(block));
            }
            RichTextNode::OrderedList(b) => {
                let mut block = b.clone();
                block.children = resolve_rich_nodes(&b.children, scope, state, depth);
                out.push(RichTextNode::OrderedList(block));
            }
            RichTextNode::ListItem(b) => {
                let mut block = b.clone();
                block.children = resolve_rich_nodes(&b.children, scope, state, depth);
                out.push(RichTextNode::ListItem(block));
            }
            RichTextNode::Quote(b) => {
                let mut block = b.clone();
                block.children = resolve_rich_nodes(&b.children, scope, state, depth);
                out.push(RichTextNode::Quote(block));
            }
            RichTextNode::Heading(h) => {
                let mut heading = h.clone();
                heading.children = resolve_rich_nodes(&h.children, scope, state, depth);
                out.push(RichTextNode::Heading(heading));
            }
            RichTextNode::Text(_) => out.push(node.clone()),
        }
    }
    out
}

/// Fetch a collection's field definitions through the pass cache.
pub async fn fields_for_collection<R: Repository>(
    repo: &R,
    state: &PassState,
    collection_id: &str,
) -> Result<Vec<Field>, crate::errors::RepositoryError> {
    if let Some(fields) = state.cache.cached_fields(collection_id) {
        return Ok(fields);
    }
    let fields = repo.get_fields_by_collection_id(collection_id).await?;
    state.cache.store_fields(collection_id, fields.clone());
    Ok(fields)
}

/// Fetch one item by id through the pass cache.
async fn item_by_id<R: Repository>(
    repo: &R,
    state: &PassState,
    collection_id: &str,
    item_id: &str,
) -> Result<Option<Item>, crate::errors::RepositoryError> {
    if let Some(cached) = state.cache.cached_item(collection_id, item_id) {
        return Ok(cached);
    }
    let items = repo
        .get_items_with_values(
            collection_id,
            state.options.published,
            ItemQuery {
                item_ids: Some(vec![Str::from(item_id)]),
                ..ItemQuery::default()
            },
        )
        .await?;
    let item = items.into_iter().next();
    state.cache.store_item(collection_id, item_id, item.clone());
    Ok(item)
}

/// Build an item's value map: CMS translation overlay, then reference
/// hops copied in under dotted paths, recursively, with a visited-set
/// guard against reference cycles.
pub async fn build_item_values<R: Repository>(
    repo: &R,
    state: &PassState,
    fields: &[Field],
    item: &Item,
    diagnostics: &mut Vec<Diagnostic>,
) -> ValueMap {
    let mut values = item.values.clone();
    apply_cms_translations(state, fields, &item.id, &mut values);

    let mut visited = FxHashSet::default();
    visited.insert((Str::from(""), item.id.clone()));
    expand_reference_hops(repo, state, fields, &item.id, &mut values, "", &mut visited, diagnostics)
        .await;
    values
}

/// Overlay complete CMS field translations onto a value map.
pub fn apply_cms_translations(
    state: &PassState,
    fields: &[Field],
    item_id: &str,
    values: &mut ValueMap,
) {
    if state.options.locale.is_none() {
        return;
    }
    for field in fields {
        let key = field.key.as_deref().unwrap_or(field.id.as_str());
        if let Some(translated) = state.translations.cms_value(item_id, key) {
            values.insert(field.id.clone(), translated.clone());
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn expand_reference_hops<'a, R: Repository>(
    repo: &'a R,
    state: &'a PassState,
    fields: &'a [Field],
    item_id: &'a str,
    values: &'a mut ValueMap,
    prefix: &'a str,
    visited: &'a mut FxHashSet<(Str, Str)>,
    diagnostics: &'a mut Vec<Diagnostic>,
) -> futures::future::BoxFuture<'a, ()> {
    Box::pin(async move {
        let reference_fields: Vec<&Field> = fields
            .iter()
            .filter(|f| f.field_type == FieldType::Reference)
            .collect();
        for field in reference_fields {
            let path = if prefix.is_empty() {
                field.id.clone()
            } else {
                let mut p = Str::from(prefix);
                p.push('.');
                p.push_str(&field.id);
                p
            };
            let Some(FieldValue::Text(target_id)) = values.get(path.as_str()).cloned() else {
                continue;
            };
            if target_id.is_empty() {
                continue;
            }
            if !visited.insert((field.id.clone(), target_id.clone())) {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::ReferenceCycle,
                    item_id,
                    format!("reference '{}' revisits item '{target_id}'", field.id),
                ));
                continue;
            }
            let Some(collection_id) = field.collection_id.clone() else {
                continue;
            };
            let target = match item_by_id(repo, state, &collection_id, &target_id).await {
                Ok(Some(target)) => target,
                Ok(None) => {
                    diagnostics.push(Diagnostic::warning(
                        DiagnosticCode::ReferenceMissing,
                        item_id,
                        format!("referenced item '{target_id}' not found"),
                    ));
                    continue;
                }
                Err(err) => {
                    warn!(field = %field.id, error = %err, "reference hop fetch failed");
                    diagnostics.push(Diagnostic::warning(
                        DiagnosticCode::DataFetchFailure,
                        item_id,
                        format!("reference hop '{}' failed", field.id),
                    ));
                    continue;
                }
            };
            let target_fields = fields_for_collection(repo, state, &collection_id)
                .await
                .unwrap_or_default();
            let mut target_values = target.values.clone();
            apply_cms_translations(state, &target_fields, &target.id, &mut target_values);
            for (key, value) in &target_values {
                let mut hop_path = path.clone();
                hop_path.push('.');
                hop_path.push_str(key);
                values.insert(hop_path, value.clone());
            }
            expand_reference_hops(
                repo,
                state,
                &target_fields,
                item_id,
                values,
                path.as_str(),
                visited,
                diagnostics,
            )
            .await;
        }
    })
}
