//! Locale translation overlay.
//!
//! Substitutes complete layer translations into a resolved tree. The
//! scope of a layer's translation key is the component it was expanded
//! out of, or the page otherwise. The structural type of the authored
//! variable is preserved either way: a rich-text binding receives a
//! rich-text value even when the translation was stored as plain text,
//! and vice versa. CMS field values are translated separately, when the
//! item value maps are built.

use folia_case::Str;
use folia_forme::{
    ContentKey, Layer, RichTextDocument, TranslationSource, TranslationValue, Variable, VideoData,
};

use crate::context::PassState;

/// Overlay translations onto every layer in the tree. A no-op when the
/// pass has no locale.
pub fn apply_translations(layers: &mut [Layer], state: &PassState) {
    if state.options.locale.is_none() {
        return;
    }
    for layer in layers {
        apply_layer(layer, state);
    }
}

fn apply_layer(layer: &mut Layer, state: &PassState) {
    let (source_type, source_id) = match (&layer.source_component_id, &state.options.page_id) {
        (Some(component_id), _) => (TranslationSource::Component, component_id.clone()),
        (None, Some(page_id)) => (TranslationSource::Page, page_id.clone()),
        (None, None) => {
            for child in &mut layer.children {
                apply_layer(child, state);
            }
            return;
        }
    };

    // translations key on the authoring-time id; expansion suffixes are
    // stripped by keying on the trailing original segment
    let layer_key = Str::from(original_id(&layer.id));

    let lookup = |content_key: ContentKey| {
        state
            .translations
            .layer_value(source_type, &source_id, &layer_key, content_key)
            .cloned()
    };

    if let Some(variable) = layer.variables.text.take() {
        layer.variables.text = Some(translate_text(variable, lookup(ContentKey::Text)));
    }
    if let Some(Variable::Asset(data)) = layer.variables.image.as_mut() {
        if let Some(TranslationValue::Text(asset_id)) = lookup(ContentKey::ImageSrc) {
            data.asset_id = asset_id;
            data.url = None;
        }
        if let Some(TranslationValue::Text(alt)) = lookup(ContentKey::ImageAlt) {
            data.alt = Some(alt);
        }
    }
    if let Some(Variable::Asset(data)) = layer.variables.icon.as_mut() {
        if let Some(TranslationValue::Text(asset_id)) = lookup(ContentKey::IconSrc) {
            data.asset_id = asset_id;
            data.url = None;
        }
    }
    if let Some(Variable::Asset(data)) = layer.variables.audio.as_mut() {
        if let Some(TranslationValue::Text(asset_id)) = lookup(ContentKey::AudioSrc) {
            data.asset_id = asset_id;
            data.url = None;
        }
    }
    if let Some(Variable::Video(data)) = layer.variables.video.as_mut() {
        if let Some(TranslationValue::Text(src)) = lookup(ContentKey::VideoSrc) {
            set_video_source(data, src);
        }
        if let Some(TranslationValue::Text(poster)) = lookup(ContentKey::VideoPoster) {
            if is_url(&poster) {
                data.poster_url = Some(poster);
                data.poster_asset_id = None;
            } else {
                data.poster_asset_id = Some(poster);
                data.poster_url = None;
            }
        }
    }

    for child in &mut layer.children {
        apply_layer(child, state);
    }
}

/// The authoring-time id a namespaced id derives from: the segment
/// after the last expansion separator.
fn original_id(id: &str) -> &str {
    id.rsplit('_').next().unwrap_or(id)
}

fn translate_text(variable: Variable, translation: Option<TranslationValue>) -> Variable {
    let Some(translation) = translation else {
        return variable;
    };
    match (&variable, translation) {
        // plain binding stays plain
        (Variable::StaticText(_) | Variable::DynamicText(_), TranslationValue::Text(text)) => {
            Variable::text(text)
        }
        (Variable::StaticText(_) | Variable::DynamicText(_), TranslationValue::RichText(doc)) => {
            Variable::text(Str::from(doc.plain_text()))
        }
        // rich binding stays rich
        (Variable::DynamicRichText(data), TranslationValue::Text(text)) => {
            let mut data = data.clone();
            data.document = RichTextDocument::from_plain_text(text);
            Variable::DynamicRichText(data)
        }
        (Variable::DynamicRichText(data), TranslationValue::RichText(doc)) => {
            let mut data = data.clone();
            data.document = doc;
            Variable::DynamicRichText(data)
        }
        _ => variable,
    }
}

fn set_video_source(data: &mut VideoData, src: Str) {
    if is_url(&src) {
        data.url = Some(src);
        data.asset_id = None;
    } else {
        data.asset_id = Some(src);
        data.url = None;
    }
}

fn is_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}
