//! Shared fixtures and helpers for the conformance suite.
//!
//! The representative document exercises the surface both renderers
//! must agree on: plain text, an image, a link-wrapped button, a
//! paginated collection loop and a component instance with an
//! overridden text variable.

use folia_case::Str;
use folia_forme::{
    Asset, CollectionVariable, Component, ComponentOverrides, ComponentVariable, Document, Field,
    FieldType, FieldValue, Item, Layer, LinkVariable, NodeKind, Page, Pagination, PaginationMode,
    SlotKind, UrlLink, Variable,
};
use folia_press::MemoryRepository;
use folia_stage::{StageContent, StageNode};

/// A card component with one overridable text slot.
pub fn card_component() -> Component {
    let mut root = Layer::new("content", NodeKind::Box);
    let mut title = Layer::new("cardTitle", NodeKind::Text);
    title.variables.text = Some(Variable::text("Card title"));
    title
        .variable_links
        .insert(Str::from("text"), Str::from("var_title"));
    root.children.push(title);
    Component {
        id: Str::from("card"),
        name: Str::from("Card"),
        layer: root,
        variables: vec![ComponentVariable {
            id: Str::from("var_title"),
            name: Str::from("Title"),
            kind: SlotKind::Text,
            default_value: Some(Variable::text("Default title")),
            default_link: None,
            extra: Default::default(),
        }],
        extra: Default::default(),
    }
}

/// Repository with a posts collection, an image asset, a target page
/// and the card component.
pub fn representative_repo() -> MemoryRepository {
    let items: Vec<Item> = (1..=25)
        .map(|n| {
            Item::new(format!("post{n:02}"))
                .with_value("title", FieldValue::Text(Str::from(format!("Post {n}"))))
        })
        .collect();
    MemoryRepository::default()
        .with_collection(
            "posts",
            vec![Field::new("title", "Title", FieldType::Text)],
            items,
        )
        .with_component(card_component())
        .with_asset({
            let mut asset = Asset::new("heroAsset", "https://cdn.folia.dev/hero.png");
            asset.alt = Some(Str::from("Hero"));
            asset
        })
        .with_page(Page::new("aboutPage", "about"))
}

/// The representative document itself.
pub fn representative_document() -> Document {
    let mut text = Layer::new("intro", NodeKind::Text);
    text.variables.text = Some(Variable::text("Welcome"));

    let mut image = Layer::new("hero", NodeKind::Image);
    image.variables.image = Some(Variable::asset("heroAsset"));

    let mut button = Layer::new("cta", NodeKind::Button);
    button.variables.text = Some(Variable::text("Read more"));
    button.variables.link = Some(LinkVariable::Url(UrlLink {
        url: Str::from("https://folia.dev/start"),
        new_tab: false,
        extra: Default::default(),
    }));

    let mut loop_layer = Layer::new("postLoop", NodeKind::Box);
    loop_layer.variables.collection = Some(CollectionVariable {
        collection_id: Some(Str::from("posts")),
        pagination: Some(Pagination {
            mode: PaginationMode::Pages,
            items_per_page: 10,
            extra: Default::default(),
        }),
        ..CollectionVariable::default()
    });
    let mut post_title = Layer::new("postTitle", NodeKind::Text);
    post_title.variables.text = Some(Variable::field("title"));
    loop_layer.children.push(post_title);

    let mut instance = Layer::new("inst1", NodeKind::Box);
    instance.component_id = Some(Str::from("card"));
    let mut overrides = ComponentOverrides::default();
    overrides
        .text
        .insert(Str::from("var_title"), Some(Variable::text("Overridden")));
    instance.component_overrides = Some(overrides);

    Document {
        page_id: Some(Str::from("page1")),
        layers: vec![text, image, button, loop_layer, instance],
        extra: Default::default(),
    }
}

/// Assemble markup from a stage node with the same emission rules the
/// galley uses. Agreement between this and the galley's string output
/// proves both renderers describe the same elements.
pub fn stage_node_to_markup(node: &StageNode) -> String {
    let mut out = String::new();
    write_stage_node(node, &mut out);
    out
}

fn write_stage_node(node: &StageNode, out: &mut String) {
    out.push('<');
    out.push_str(&node.tag);
    for (name, value) in &node.attrs {
        out.push(' ');
        out.push_str(name);
        if value.is_empty() && folia_plate::is_boolean_attr(name) {
            continue;
        }
        out.push_str("=\"");
        out.push_str(&htmlize::escape_attribute(value.as_str()));
        out.push('"');
    }
    if folia_case::is_void_tag(&node.tag) {
        out.push_str("/>");
        return;
    }
    out.push('>');
    match &node.content {
        StageContent::None => {}
        StageContent::Text(text) => out.push_str(&htmlize::escape_text(text.as_str())),
        StageContent::Html(html) => out.push_str(html),
    }
    for child in &node.children {
        write_stage_node(child, out);
    }
    out.push_str("</");
    out.push_str(&node.tag);
    out.push('>');
}

/// Collect every id in a resolved tree.
pub fn collect_ids(layers: &[Layer]) -> Vec<Str> {
    let mut ids = Vec::new();
    for layer in layers {
        layer.walk(&mut |l| ids.push(l.id.clone()));
    }
    ids
}
