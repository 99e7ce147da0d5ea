//! Document serialization helpers.
//!
//! The document is the unit the authoring tool persists and the resolver
//! reads: a page id plus its top-level layers. Round-trips must be
//! faithful — unknown fields pass through untouched — because the
//! authoring tool and the resolver share this format.

use serde::{Deserialize, Serialize};

use folia_case::{content_hash, Str};

use crate::layer::Layer;
use crate::ExtraFields;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_id: Option<Str>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<Layer>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Document {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Content hash of the serialized document, for cache keys and
    /// change detection.
    pub fn hash(&self) -> Result<String, serde_json::Error> {
        Ok(content_hash(&self.to_json()?))
    }

    /// Find a layer anywhere in the document by id.
    pub fn find_layer(&self, id: &str) -> Option<&Layer> {
        fn find<'a>(layers: &'a [Layer], id: &str) -> Option<&'a Layer> {
            for layer in layers {
                if layer.id == id {
                    return Some(layer);
                }
                if let Some(found) = find(&layer.children, id) {
                    return Some(found);
                }
            }
            None
        }
        find(&self.layers, id)
    }
}
