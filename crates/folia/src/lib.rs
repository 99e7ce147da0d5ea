//! Folia - layer resolution and dual rendering for visual website
//! builders.
//!
//! This crate ties the workspace together: resolve an authoring-time
//! document through the press, then render the concrete tree either as
//! static markup (the galley) or as a live UI tree (the stage). Both
//! renderers print from the shared plate, so their output agrees.
//!
//! ```no_run
//! # async fn demo() {
//! use folia::{resolve_to_markup, MemoryRepository, ResolveOptions};
//! use folia_forme::Document;
//!
//! let repo = MemoryRepository::default();
//! let doc = Document::from_json(r#"{"layers":[]}"#).unwrap();
//! let output = resolve_to_markup(&repo, &doc, Default::default(), ResolveOptions::default(), None)
//!     .await
//!     .unwrap();
//! println!("{}", output.markup);
//! # }
//! ```

pub use folia_case as case;
pub use folia_forme as forme;
pub use folia_galley as galley;
pub use folia_plate as plate;
pub use folia_press as press;
pub use folia_stage as stage;

pub use folia_forme::{Document, Layer, NodeKind, Variable};
pub use folia_press::{
    Diagnostic, DiagnosticCode, MemoryRepository, Repository, ResolveError, ResolveOptions,
};
pub use folia_stage::{StageOptions, StageTree};

use std::time::Duration;

use tracing::warn;

use folia_case::{FxHashMap, Str};
use folia_forme::{LinkVariable, Page, ValueMap};
use folia_plate::RenderRules;
use folia_press::{resolve_document, ResolveOutcome};

/// Markup rendering output: the joined document markup plus one
/// self-contained fragment per top-level layer.
#[derive(Debug, Default)]
pub struct MarkupOutput {
    pub markup: String,
    pub fragments: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Stage rendering output: the live tree plus diagnostics.
#[derive(Debug, Default)]
pub struct StageOutput {
    pub tree: StageTree,
    pub diagnostics: Vec<Diagnostic>,
}

/// Resolve a document and render it as static markup.
pub async fn resolve_to_markup<R: Repository>(
    repo: &R,
    document: &Document,
    ambient: ValueMap,
    options: ResolveOptions,
    deadline: Option<Duration>,
) -> Result<MarkupOutput, ResolveError> {
    let locale = options.locale.clone();
    let outcome = resolve_with_deadline(repo, document, ambient, options, deadline).await?;
    let rules = render_rules(repo, &outcome.layers, locale).await;
    Ok(MarkupOutput {
        markup: folia_galley::render_markup(&outcome.layers, &rules),
        fragments: folia_galley::render_fragments(&outcome.layers, &rules),
        diagnostics: outcome.diagnostics,
    })
}

/// Resolve a document and render it as a live tree with the pagination
/// side channel.
pub async fn resolve_to_stage<R: Repository>(
    repo: &R,
    document: &Document,
    ambient: ValueMap,
    options: ResolveOptions,
    stage_options: &StageOptions,
    deadline: Option<Duration>,
) -> Result<StageOutput, ResolveError> {
    let locale = options.locale.clone();
    let outcome = resolve_with_deadline(repo, document, ambient, options, deadline).await?;
    let rules = render_rules(repo, &outcome.layers, locale).await;
    let mut pagination = folia_stage::PaginationChannel::default();
    for (layer_id, info) in outcome.pagination {
        pagination.insert(layer_id, info);
    }
    Ok(StageOutput {
        tree: folia_stage::render_stage(&outcome.layers, &rules, pagination, stage_options),
        diagnostics: outcome.diagnostics,
    })
}

async fn resolve_with_deadline<R: Repository>(
    repo: &R,
    document: &Document,
    ambient: ValueMap,
    options: ResolveOptions,
    deadline: Option<Duration>,
) -> Result<ResolveOutcome, ResolveError> {
    match deadline {
        Some(deadline) => tokio::time::timeout(
            deadline,
            resolve_document(repo, document, ambient, options),
        )
        .await
        .map_err(|_| ResolveError::DeadlineExceeded),
        None => Ok(resolve_document(repo, document, ambient, options).await),
    }
}

/// Build the shared render rules for a resolved tree: fetch the pages
/// its links reference and index the anchors.
async fn render_rules<R: Repository>(
    repo: &R,
    layers: &[Layer],
    locale: Option<Str>,
) -> RenderRules {
    let mut page_ids = Vec::new();
    for layer in layers {
        collect_page_ids(layer, &mut page_ids);
    }
    page_ids.sort();
    page_ids.dedup();

    let mut pages: FxHashMap<Str, Page> = FxHashMap::default();
    if !page_ids.is_empty() {
        match repo.get_pages_by_ids(&page_ids).await {
            Ok(records) => {
                for page in records {
                    pages.insert(page.id.clone(), page);
                }
            }
            Err(err) => warn!(error = %err, "page lookup for links failed"),
        }
    }
    RenderRules::new(layers, pages, locale)
}

fn collect_page_ids(layer: &Layer, out: &mut Vec<Str>) {
    if let Some(LinkVariable::Page(link)) = &layer.variables.link {
        out.push(link.page_id.clone());
    }
    for child in &layer.children {
        collect_page_ids(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_document_renders_empty() {
        let repo = MemoryRepository::default();
        let doc = Document::default();
        let output = resolve_to_markup(
            &repo,
            &doc,
            ValueMap::new(),
            ResolveOptions::default(),
            None,
        )
        .await
        .unwrap();
        assert!(output.markup.is_empty());
        assert!(output.fragments.is_empty());
    }

    #[tokio::test]
    async fn test_deadline_is_enforced() {
        use folia_press::{ItemQuery, LocaleTranslations, RepositoryError};

        /// Repository whose component lookup hangs far past any test
        /// deadline.
        struct StallingRepo;

        impl Repository for StallingRepo {
            async fn get_components_by_ids(
                &self,
                _ids: &[Str],
                _published: bool,
            ) -> Result<Vec<folia_forme::Component>, RepositoryError> {
                tokio::time::sleep(Duration::from_secs(600)).await;
                Ok(Vec::new())
            }
            async fn get_items_with_values(
                &self,
                _collection_id: &str,
                _published: bool,
                _query: ItemQuery,
            ) -> Result<Vec<folia_forme::Item>, RepositoryError> {
                Ok(Vec::new())
            }
            async fn get_fields_by_collection_id(
                &self,
                _collection_id: &str,
            ) -> Result<Vec<folia_forme::Field>, RepositoryError> {
                Ok(Vec::new())
            }
            async fn get_assets_by_ids(
                &self,
                _ids: &[Str],
            ) -> Result<Vec<folia_forme::Asset>, RepositoryError> {
                Ok(Vec::new())
            }
            async fn get_pages_by_ids(
                &self,
                _ids: &[Str],
            ) -> Result<Vec<Page>, RepositoryError> {
                Ok(Vec::new())
            }
            async fn load_translations_for_locale(
                &self,
                _locale_id: &str,
            ) -> Result<LocaleTranslations, RepositoryError> {
                Ok(LocaleTranslations::default())
            }
        }

        let mut instance = Layer::new("inst1", NodeKind::Box);
        instance.component_id = Some(Str::from("card"));
        let doc = Document {
            page_id: None,
            layers: vec![instance],
            extra: Default::default(),
        };
        let result = resolve_to_markup(
            &StallingRepo,
            &doc,
            ValueMap::new(),
            ResolveOptions::default(),
            Some(Duration::from_millis(20)),
        )
        .await;
        assert!(matches!(result, Err(ResolveError::DeadlineExceeded)));
    }
}
