//! Cross-crate conformance checks: determinism, namespacing, renderer
//! parity and the end-to-end behavior of the full pipeline.

use folia::{resolve_to_markup, resolve_to_stage, ResolveOptions, StageOptions};
use folia_case::{FxHashSet, Str};
use folia_conformance::{
    collect_ids, representative_document, representative_repo, stage_node_to_markup,
};
use folia_press::resolve_document;

#[tokio::test]
async fn resolved_ids_are_pairwise_distinct() {
    let repo = representative_repo();
    let doc = representative_document();
    let outcome = resolve_document(&repo, &doc, Default::default(), ResolveOptions::default()).await;

    let ids = collect_ids(&outcome.layers);
    let unique: FxHashSet<&Str> = ids.iter().collect();
    assert_eq!(ids.len(), unique.len(), "duplicate ids after expansion");
}

#[tokio::test]
async fn interaction_targets_resolve_within_tree() {
    use folia_forme::{Component, ComponentVariable, Interaction, Layer, NodeKind};

    // a component whose trigger targets a sibling by original id
    let mut root = Layer::new("content", NodeKind::Box);
    let mut trigger = Layer::new("trigger", NodeKind::Button);
    trigger.interactions.push(Interaction {
        trigger: Str::from("click"),
        action: Str::from("show"),
        target_layer_id: Some(Str::from("panel")),
        extra: Default::default(),
    });
    root.children.push(trigger);
    root.children.push(Layer::new("panel", NodeKind::Box));
    let component = Component {
        id: Str::from("toggle"),
        name: Str::from("Toggle"),
        layer: root,
        variables: Vec::<ComponentVariable>::new(),
        extra: Default::default(),
    };

    let repo = folia_press::MemoryRepository::default().with_component(component);
    let mut inst_a = Layer::new("a", NodeKind::Box);
    inst_a.component_id = Some(Str::from("toggle"));
    let mut inst_b = Layer::new("b", NodeKind::Box);
    inst_b.component_id = Some(Str::from("toggle"));
    let doc = folia_forme::Document {
        page_id: None,
        layers: vec![inst_a, inst_b],
        extra: Default::default(),
    };

    let outcome = resolve_document(&repo, &doc, Default::default(), ResolveOptions::default()).await;
    let ids: FxHashSet<Str> = collect_ids(&outcome.layers).into_iter().collect();

    let mut checked = 0;
    for layer in &outcome.layers {
        layer.walk(&mut |l| {
            for interaction in &l.interactions {
                if let Some(target) = &interaction.target_layer_id {
                    checked += 1;
                    assert!(ids.contains(target), "dangling target '{target}'");
                }
            }
        });
    }
    assert_eq!(checked, 2, "expected one rewired interaction per instance");
}

#[tokio::test]
async fn markup_is_deterministic() {
    let repo = representative_repo();
    let doc = representative_document();
    let first = resolve_to_markup(&repo, &doc, Default::default(), ResolveOptions::default(), None)
        .await
        .unwrap();
    let second = resolve_to_markup(&repo, &doc, Default::default(), ResolveOptions::default(), None)
        .await
        .unwrap();
    assert_eq!(first.markup, second.markup);
}

#[tokio::test]
async fn renderers_agree_on_the_representative_tree() {
    let repo = representative_repo();
    let doc = representative_document();

    let markup = resolve_to_markup(&repo, &doc, Default::default(), ResolveOptions::default(), None)
        .await
        .unwrap();
    let stage = resolve_to_stage(
        &repo,
        &doc,
        Default::default(),
        ResolveOptions::default(),
        &StageOptions::default(),
        None,
    )
    .await
    .unwrap();

    let from_stage: String = stage
        .tree
        .roots
        .iter()
        .map(stage_node_to_markup)
        .collect();
    assert_eq!(
        markup.markup, from_stage,
        "galley and stage describe different elements"
    );

    // spot-check the contract: same href, same src, same visible text
    assert!(markup.markup.contains(r#"href="https://folia.dev/start""#));
    assert!(markup.markup.contains(r#"src="https://cdn.folia.dev/hero.png""#));
    assert!(markup.markup.contains(">Overridden<"));
    assert!(markup.markup.contains(">Post 1<"));
}

#[tokio::test]
async fn pagination_side_channel_matches_markup() {
    let repo = representative_repo();
    let doc = representative_document();
    let stage = resolve_to_stage(
        &repo,
        &doc,
        Default::default(),
        ResolveOptions::default(),
        &StageOptions::default(),
        None,
    )
    .await
    .unwrap();

    let info = stage.tree.pagination.get("postLoop").unwrap();
    assert_eq!(info.total_items, 25);
    assert_eq!(info.total_pages, 3);
    assert_eq!(info.current_page, 1);
    assert_eq!(info.items_per_page, 10);

    // exactly ten clones render on page one
    let markup = resolve_to_markup(&repo, &doc, Default::default(), ResolveOptions::default(), None)
        .await
        .unwrap();
    assert_eq!(markup.markup.matches("data-collection-item-id").count(), 10);
}

#[tokio::test]
async fn fragment_never_renders_a_wrapper() {
    let repo = representative_repo();
    let doc = representative_document();
    let markup = resolve_to_markup(&repo, &doc, Default::default(), ResolveOptions::default(), None)
        .await
        .unwrap();
    // the loop fragment contributes clones, never an element of its own
    assert!(!markup.markup.contains(r#"data-layer-id="postLoop""#));
    assert!(markup.markup.contains(r#"data-layer-id="postLoop_post01""#));
}

#[tokio::test]
async fn one_fragment_per_top_level_layer() {
    let repo = representative_repo();
    let doc = representative_document();
    let markup = resolve_to_markup(&repo, &doc, Default::default(), ResolveOptions::default(), None)
        .await
        .unwrap();
    assert_eq!(markup.fragments.len(), 5);
    assert_eq!(markup.markup, markup.fragments.concat());
}
