//! Press - the layer resolution pipeline for Folia.
//!
//! The press turns an authoring-time layer tree into a concrete tree
//! ready for presentation:
//!
//! 1. component-instance expansion with override resolution
//! 2. collection-loop expansion with field/relationship resolution
//! 3. locale translation overlay
//! 4. batched asset resolution
//! 5. conditional-visibility pruning
//!
//! The pipeline is I/O-bound and fans out per tree level: sibling
//! subtrees resolve concurrently and each branch degrades independently
//! on failure. Nothing here mutates stored state; the output tree is
//! ephemeral.
//!
//! ## Name Origin
//!
//! The **press** is where a locked-up forme meets paper: the machinery
//! that turns a composed description into an actual impression.

pub mod assets;
pub mod context;
pub mod errors;
pub mod expand;
pub mod fields;
pub mod namespace;
pub mod repository;
pub mod translate;
pub mod visibility;

pub use assets::resolve_assets;
pub use context::{LoopScope, PaginationMap, PassState, ResolveCache, ResolveOptions};
pub use errors::{
    Diagnostic, DiagnosticCode, RepositoryError, ResolveError, ResolveResult, Severity,
};
pub use expand::{expand_collections, expand_components, load_components, ExpandOutcome};
pub use namespace::{item_scoped_id, namespace_clone, namespace_subtree, scoped_id};
pub use repository::{ItemQuery, LocaleTranslations, MemoryRepository, Repository};
pub use translate::apply_translations;
pub use visibility::{collect_loop_counts, evaluate_rule, filter_tree};

use tracing::{instrument, warn};

use folia_case::Str;
use folia_forme::{Document, Layer, TranslationTable, ValueMap};

/// The concrete tree a resolution pass produced, with the pagination
/// side channel and every diagnostic collected along the way.
#[derive(Debug, Default)]
pub struct ResolveOutcome {
    pub layers: Vec<Layer>,
    pub pagination: PaginationMap,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the whole pipeline over a document.
///
/// `ambient` carries the page-level item values (a CMS page template's
/// bound item), or is empty for static pages. Partial failures degrade
/// their subtree and surface as diagnostics; the returned tree always
/// renders.
#[instrument(skip_all, fields(page = ?options.page_id, locale = ?options.locale))]
pub async fn resolve_document<R: Repository>(
    repo: &R,
    document: &Document,
    ambient: ValueMap,
    options: ResolveOptions,
) -> ResolveOutcome {
    let mut diagnostics = Vec::new();

    let translations = match &options.locale {
        Some(locale) => match repo.load_translations_for_locale(locale).await {
            Ok(rows) => TranslationTable::from_rows(rows.layers, rows.cms),
            Err(err) => {
                warn!(error = %err, "translation load failed, rendering authored values");
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::DataFetchFailure,
                    Str::from("document"),
                    "translation load failed",
                ));
                TranslationTable::default()
            }
        },
        None => TranslationTable::default(),
    };
    let state = PassState::new(options, translations);

    let components =
        match load_components(repo, &state, &document.layers, &mut diagnostics).await {
            Ok(components) => components,
            Err(err) => {
                warn!(error = %err, "component load failed, instances stay unexpanded");
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::DataFetchFailure,
                    Str::from("document"),
                    "component load failed",
                ));
                Default::default()
            }
        };
    let layers = expand_components(document.layers.clone(), &components, &mut diagnostics);

    let scope = LoopScope {
        values: ambient.clone(),
        ..LoopScope::default()
    };
    let expanded = expand_collections(repo, &state, layers, &scope).await;
    let mut layers = expanded.layers;
    diagnostics.extend(expanded.diagnostics);
    let mut pagination = PaginationMap::default();
    for (layer_id, info) in expanded.pagination {
        pagination.insert(layer_id, info);
    }

    apply_translations(&mut layers, &state);

    if let Err(err) = resolve_assets(repo, &mut layers, &mut diagnostics).await {
        warn!(error = %err, "asset resolution failed");
        diagnostics.push(Diagnostic::warning(
            DiagnosticCode::DataFetchFailure,
            Str::from("document"),
            "asset resolution failed",
        ));
    }

    let layers = filter_tree(layers, &ambient);

    ResolveOutcome {
        layers,
        pagination,
        diagnostics,
    }
}
