//! Batched asset resolution.
//!
//! One pass collects every asset reference in the tree, a single bulk
//! lookup resolves them, and a second pass substitutes concrete URLs.
//! Deferring to the end of the tree walk turns O(assets-in-tree) round
//! trips into one.

use tracing::warn;

use folia_case::{FxHashMap, FxHashSet, Str};
use folia_forme::{Asset, Layer, LinkVariable, Variable};

use crate::errors::{Diagnostic, DiagnosticCode, RepositoryError};
use crate::repository::Repository;

/// Resolve every asset reference in the tree through one bulk lookup.
pub async fn resolve_assets<R: Repository>(
    repo: &R,
    layers: &mut [Layer],
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), RepositoryError> {
    let mut ids = FxHashSet::default();
    for layer in layers.iter() {
        collect_asset_ids(layer, &mut ids);
    }
    if ids.is_empty() {
        return Ok(());
    }

    let mut id_list: Vec<Str> = ids.into_iter().collect();
    id_list.sort();
    let assets = match repo.get_assets_by_ids(&id_list).await {
        Ok(assets) => assets,
        Err(err) => {
            // leave references unresolved rather than failing the tree
            warn!(error = %err, "asset batch lookup failed");
            for layer in layers.iter() {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticCode::DataFetchFailure,
                    layer.id.clone(),
                    "asset batch lookup failed",
                ));
            }
            return Ok(());
        }
    };
    let by_id: FxHashMap<Str, Asset> = assets.into_iter().map(|a| (a.id.clone(), a)).collect();

    for id in &id_list {
        if !by_id.contains_key(id) {
            diagnostics.push(Diagnostic::warning(
                DiagnosticCode::ReferenceMissing,
                id.clone(),
                format!("asset '{id}' not found"),
            ));
        }
    }

    for layer in layers.iter_mut() {
        substitute(layer, &by_id);
    }
    Ok(())
}

fn collect_asset_ids(layer: &Layer, ids: &mut FxHashSet<Str>) {
    let vars = &layer.variables;
    for variable in [&vars.image, &vars.icon, &vars.audio, &vars.background]
        .into_iter()
        .flatten()
    {
        if let Variable::Asset(data) = variable {
            if data.url.is_none() && !data.asset_id.is_empty() {
                ids.insert(data.asset_id.clone());
            }
        }
    }
    if let Some(Variable::Video(data)) = &vars.video {
        if data.url.is_none() {
            if let Some(asset_id) = &data.asset_id {
                ids.insert(asset_id.clone());
            }
        }
        if data.poster_url.is_none() {
            if let Some(poster_id) = &data.poster_asset_id {
                ids.insert(poster_id.clone());
            }
        }
    }
    if let Some(LinkVariable::Asset(link)) = &vars.link {
        if link.url.is_none() {
            ids.insert(link.asset_id.clone());
        }
    }
    for child in &layer.children {
        collect_asset_ids(child, ids);
    }
}

fn substitute(layer: &mut Layer, by_id: &FxHashMap<Str, Asset>) {
    let vars = &mut layer.variables;
    for variable in [
        vars.image.as_mut(),
        vars.icon.as_mut(),
        vars.audio.as_mut(),
        vars.background.as_mut(),
    ]
    .into_iter()
    .flatten()
    {
        if let Variable::Asset(data) = variable {
            if data.url.is_none() {
                if let Some(asset) = by_id.get(&data.asset_id) {
                    data.url = Some(asset.url.clone());
                    if data.alt.is_none() {
                        data.alt = asset.alt.clone();
                    }
                }
            }
        }
    }
    if let Some(Variable::Video(data)) = vars.video.as_mut() {
        if data.url.is_none() {
            if let Some(asset) = data.asset_id.as_ref().and_then(|id| by_id.get(id)) {
                data.url = Some(asset.url.clone());
            }
        }
        if data.poster_url.is_none() {
            if let Some(asset) = data.poster_asset_id.as_ref().and_then(|id| by_id.get(id)) {
                data.poster_url = Some(asset.url.clone());
            }
        }
    }
    if let Some(LinkVariable::Asset(link)) = vars.link.as_mut() {
        if link.url.is_none() {
            if let Some(asset) = by_id.get(&link.asset_id) {
                link.url = Some(asset.url.clone());
            }
        }
    }
    for child in &mut layer.children {
        substitute(child, by_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;
    use folia_forme::NodeKind;

    #[tokio::test]
    async fn test_batch_substitution() {
        let repo = MemoryRepository::default()
            .with_asset(Asset::new("a1", "https://cdn.folia.dev/a1.png"))
            .with_asset(Asset::new("a2", "https://cdn.folia.dev/a2.mp3"));

        let mut image = Layer::new("img", NodeKind::Image);
        image.variables.image = Some(Variable::asset("a1"));
        let mut audio = Layer::new("snd", NodeKind::Audio);
        audio.variables.audio = Some(Variable::asset("a2"));
        let mut root = Layer::new("root", NodeKind::Box);
        root.children = vec![image, audio];

        let mut layers = vec![root];
        let mut diagnostics = Vec::new();
        resolve_assets(&repo, &mut layers, &mut diagnostics).await.unwrap();

        let img = &layers[0].children[0];
        match img.variables.image.as_ref().unwrap() {
            Variable::Asset(data) => {
                assert_eq!(data.url.as_deref(), Some("https://cdn.folia.dev/a1.png"));
            }
            other => panic!("expected asset, got {other:?}"),
        }
        assert!(diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_missing_asset_degrades() {
        let repo = MemoryRepository::default();
        let mut image = Layer::new("img", NodeKind::Image);
        image.variables.image = Some(Variable::asset("ghost"));
        let mut layers = vec![image];
        let mut diagnostics = Vec::new();
        resolve_assets(&repo, &mut layers, &mut diagnostics).await.unwrap();

        match layers[0].variables.image.as_ref().unwrap() {
            Variable::Asset(data) => assert!(data.url.is_none()),
            other => panic!("expected asset, got {other:?}"),
        }
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, DiagnosticCode::ReferenceMissing);
    }
}
