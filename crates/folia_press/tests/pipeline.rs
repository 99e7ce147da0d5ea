//! End-to-end pipeline tests over the in-memory repository.

use folia_case::Str;
use folia_forme::{
    CollectionVariable, Document, Field, FieldType, FieldValue, Item, Layer, NodeKind, Pagination,
    PaginationMode, SortDirection, SortMode, SortSpec, Variable,
};
use folia_press::{
    resolve_document, MemoryRepository, ResolveOptions,
};

fn posts_repo() -> MemoryRepository {
    MemoryRepository::default().with_collection(
        "posts",
        vec![
            Field::new("title", "Title", FieldType::Text),
            Field::new("order", "Order", FieldType::Number),
            Field::new("status", "Status", FieldType::Text),
        ],
        vec![
            Item::new("p1")
                .with_value("title", FieldValue::Text(Str::from("First")))
                .with_value("order", FieldValue::Number(2.0))
                .with_value("status", FieldValue::Text(Str::from("live"))),
            Item::new("p2")
                .with_value("title", FieldValue::Text(Str::from("Second")))
                .with_value("order", FieldValue::Number(1.0))
                .with_value("status", FieldValue::Text(Str::from("draft"))),
            Item::new("p3")
                .with_value("title", FieldValue::Text(Str::from("Third")))
                .with_value("order", FieldValue::Number(3.0))
                .with_value("status", FieldValue::Text(Str::from("live"))),
        ],
    )
}

fn loop_layer(id: &str, collection_id: &str) -> Layer {
    let mut layer = Layer::new(id, NodeKind::Box);
    layer.variables.collection = Some(CollectionVariable {
        collection_id: Some(Str::from(collection_id)),
        ..CollectionVariable::default()
    });
    let mut title = Layer::new("title", NodeKind::Text);
    title.variables.text = Some(Variable::field("title"));
    layer.children.push(title);
    layer
}

fn document_of(layers: Vec<Layer>) -> Document {
    Document {
        page_id: Some(Str::from("page1")),
        layers,
        extra: Default::default(),
    }
}

fn title_text(clone: &Layer) -> Option<&str> {
    clone.children[0]
        .variables
        .text
        .as_ref()
        .and_then(Variable::as_static_text)
}

#[tokio::test]
async fn loop_expands_to_fragment_of_clones() {
    let repo = posts_repo();
    let doc = document_of(vec![loop_layer("loop1", "posts")]);
    let outcome = resolve_document(&repo, &doc, Default::default(), ResolveOptions::default()).await;

    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);
    let fragment = &outcome.layers[0];
    assert!(fragment.is_fragment());
    assert_eq!(fragment.id, "loop1");
    assert_eq!(fragment.children.len(), 3);

    let first = &fragment.children[0];
    assert_eq!(first.id, "loop1_p1");
    assert_eq!(first.collection_item_id.as_deref(), Some("p1"));
    assert_eq!(first.children[0].id, "loop1_p1_title");
    assert_eq!(title_text(first), Some("First"));
    assert_eq!(title_text(&fragment.children[2]), Some("Third"));
}

#[tokio::test]
async fn filters_narrow_the_item_set() {
    use folia_forme::{Condition, ConditionGroup, FieldCondition, FieldOp, VisibilityRule};
    let repo = posts_repo();
    let mut layer = loop_layer("loop1", "posts");
    layer.variables.collection.as_mut().unwrap().filters = Some(VisibilityRule {
        groups: vec![ConditionGroup {
            conditions: vec![Condition::Field(FieldCondition {
                field_id: Str::from("status"),
                op: FieldOp::Equals,
                value: Some(FieldValue::Text(Str::from("live"))),
                value2: None,
                collection_layer_id: None,
                resolved: None,
                extra: Default::default(),
            })],
            extra: Default::default(),
        }],
        extra: Default::default(),
    });
    let doc = document_of(vec![layer]);
    let outcome = resolve_document(&repo, &doc, Default::default(), ResolveOptions::default()).await;

    let fragment = &outcome.layers[0];
    assert_eq!(fragment.children.len(), 2);
    assert_eq!(title_text(&fragment.children[0]), Some("First"));
    assert_eq!(title_text(&fragment.children[1]), Some("Third"));
}

#[tokio::test]
async fn field_sort_orders_numerically() {
    let repo = posts_repo();
    let mut layer = loop_layer("loop1", "posts");
    layer.variables.collection.as_mut().unwrap().sort = Some(SortSpec {
        mode: SortMode::Field,
        field_id: Some(Str::from("order")),
        direction: SortDirection::Asc,
        extra: Default::default(),
    });
    let doc = document_of(vec![layer]);
    let outcome = resolve_document(&repo, &doc, Default::default(), ResolveOptions::default()).await;

    let fragment = &outcome.layers[0];
    let titles: Vec<_> = fragment.children.iter().filter_map(title_text).collect();
    assert_eq!(titles, vec!["Second", "First", "Third"]);
}

#[tokio::test]
async fn pagination_slices_the_filtered_set() {
    let items: Vec<Item> = (1..=25)
        .map(|n| {
            Item::new(format!("i{n:02}"))
                .with_value("title", FieldValue::Text(Str::from(format!("Post {n}"))))
        })
        .collect();
    let repo = MemoryRepository::default().with_collection(
        "posts",
        vec![Field::new("title", "Title", FieldType::Text)],
        items,
    );

    let mut layer = loop_layer("loop1", "posts");
    layer.variables.collection.as_mut().unwrap().pagination = Some(Pagination {
        mode: PaginationMode::Pages,
        items_per_page: 10,
        extra: Default::default(),
    });
    let doc = document_of(vec![layer]);
    let mut options = ResolveOptions::default();
    options.page_numbers.insert(Str::from("loop1"), 3);

    let outcome = resolve_document(&repo, &doc, Default::default(), options).await;
    let fragment = &outcome.layers[0];
    assert_eq!(fragment.children.len(), 5);
    assert_eq!(title_text(&fragment.children[0]), Some("Post 21"));

    let info = outcome.pagination.get("loop1").unwrap();
    assert_eq!(info.current_page, 3);
    assert_eq!(info.total_pages, 3);
    assert_eq!(info.total_items, 25);
    assert_eq!(info.offset(), 20);
    assert!(info.layer_template.is_none());
}

#[tokio::test]
async fn load_more_retains_the_template() {
    let repo = posts_repo();
    let mut layer = loop_layer("loop1", "posts");
    layer.variables.collection.as_mut().unwrap().pagination = Some(Pagination {
        mode: PaginationMode::LoadMore,
        items_per_page: 2,
        extra: Default::default(),
    });
    let doc = document_of(vec![layer]);
    let outcome = resolve_document(&repo, &doc, Default::default(), ResolveOptions::default()).await;

    let info = outcome.pagination.get("loop1").unwrap();
    let template = info.layer_template.as_ref().expect("template retained");
    assert_eq!(template.id, "loop1");
    assert!(template.variables.collection.is_none());
    // the template keeps the unresolved field binding for later pages
    assert!(matches!(
        template.children[0].variables.text,
        Some(Variable::Field(_))
    ));
}

#[tokio::test]
async fn nested_loop_uses_multi_reference_source_field() {
    let repo = MemoryRepository::default()
        .with_collection(
            "albums",
            vec![
                Field::new("name", "Name", FieldType::Text),
                {
                    let mut f = Field::new("tracks", "Tracks", FieldType::MultiReference);
                    f.collection_id = Some(Str::from("songs"));
                    f
                },
            ],
            vec![Item::new("al1")
                .with_value("name", FieldValue::Text(Str::from("Blue")))
                .with_value(
                    "tracks",
                    FieldValue::List(vec![Str::from("s2"), Str::from("s1")]),
                )],
        )
        .with_collection(
            "songs",
            vec![Field::new("title", "Title", FieldType::Text)],
            vec![
                Item::new("s1").with_value("title", FieldValue::Text(Str::from("One"))),
                Item::new("s2").with_value("title", FieldValue::Text(Str::from("Two"))),
            ],
        );

    let mut inner = Layer::new("trackLoop", NodeKind::Box);
    inner.variables.collection = Some(CollectionVariable {
        source_field: Some(Str::from("tracks")),
        ..CollectionVariable::default()
    });
    let mut track_title = Layer::new("trackTitle", NodeKind::Text);
    track_title.variables.text = Some(Variable::field("title"));
    inner.children.push(track_title);

    let mut outer = Layer::new("albumLoop", NodeKind::Box);
    outer.variables.collection = Some(CollectionVariable {
        collection_id: Some(Str::from("albums")),
        ..CollectionVariable::default()
    });
    outer.children.push(inner);

    let doc = document_of(vec![outer]);
    let outcome = resolve_document(&repo, &doc, Default::default(), ResolveOptions::default()).await;
    assert!(outcome.diagnostics.is_empty(), "{:?}", outcome.diagnostics);

    let album_fragment = &outcome.layers[0];
    let album_clone = &album_fragment.children[0];
    let track_fragment = &album_clone.children[0];
    assert!(track_fragment.is_fragment());
    // stored list order preserved: s2 before s1
    let titles: Vec<_> = track_fragment.children.iter().filter_map(title_text).collect();
    assert_eq!(titles, vec!["Two", "One"]);
    // clone ids namespaced per (layer, item), under the album clone's prefix
    assert!(track_fragment.children[0].id.ends_with("_s2"));
}

#[tokio::test]
async fn fetch_failure_degrades_to_no_items() {
    let repo = MemoryRepository::default();
    let doc = document_of(vec![loop_layer("loop1", "ghosts")]);
    let outcome = resolve_document(&repo, &doc, Default::default(), ResolveOptions::default()).await;

    // the layer shell stays with its children resolved in parent scope
    assert_eq!(outcome.layers.len(), 1);
    assert_eq!(outcome.layers[0].id, "loop1");
    assert!(!outcome.layers[0].is_fragment());
    assert!(outcome
        .diagnostics
        .iter()
        .any(|d| d.code == folia_press::DiagnosticCode::DataFetchFailure));
}

#[tokio::test]
async fn resolution_is_deterministic() {
    let repo = posts_repo();
    let mut layer = loop_layer("loop1", "posts");
    layer.variables.collection.as_mut().unwrap().sort = Some(SortSpec {
        mode: SortMode::Random,
        field_id: None,
        direction: SortDirection::Asc,
        extra: Default::default(),
    });
    let doc = document_of(vec![layer]);

    let first = resolve_document(&repo, &doc, Default::default(), ResolveOptions::default()).await;
    let second = resolve_document(&repo, &doc, Default::default(), ResolveOptions::default()).await;
    let a = serde_json::to_string(&first.layers).unwrap();
    let b = serde_json::to_string(&second.layers).unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn dynamic_text_resolves_per_item() {
    let repo = posts_repo();
    let mut layer = loop_layer("loop1", "posts");
    let mut tagline = Layer::new("tagline", NodeKind::Text);
    tagline.variables.text = Some(Variable::DynamicText(folia_forme::DynamicTextData {
        value: Str::from("Now reading: {{title}}"),
        extra: Default::default(),
    }));
    layer.children.push(tagline);
    let doc = document_of(vec![layer]);
    let outcome = resolve_document(&repo, &doc, Default::default(), ResolveOptions::default()).await;

    let clone = &outcome.layers[0].children[1];
    let tagline = clone
        .children
        .iter()
        .find(|c| c.id.ends_with("_tagline"))
        .unwrap();
    assert_eq!(
        tagline.variables.text.as_ref().and_then(Variable::as_static_text),
        Some("Now reading: Second")
    );
}
