//! Shapes for the models-list endpoint. Providers disagree on where the
//! context length and modality flags live, so every field beyond `id` is
//! optional and probed in the documented fallback order.

use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ModelListResponse {
    pub data: Vec<ModelListEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelListEntry {
    pub id: String,
    #[serde(default)]
    pub context_length: Option<u32>,
    #[serde(default)]
    pub max_context_length: Option<u32>,
    #[serde(default)]
    pub context_window: Option<u32>,
    #[serde(default)]
    pub max_model_len: Option<u32>,
    #[serde(default)]
    pub meta: Option<NestedFields>,
    #[serde(default)]
    pub model_info: Option<NestedFields>,
    #[serde(default)]
    pub modalities: Option<Vec<String>>,
    #[serde(default)]
    pub architecture: Option<Architecture>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NestedFields {
    #[serde(default)]
    pub context_length: Option<u32>,
    #[serde(default)]
    pub max_context_length: Option<u32>,
    #[serde(default)]
    pub context_window: Option<u32>,
    #[serde(default)]
    pub max_model_len: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Architecture {
    #[serde(default)]
    pub input_modalities: Option<Vec<String>>,
    #[serde(default)]
    pub modality: Option<String>,
}

impl ModelListEntry {
    /// Probe fields in the documented order: `context_length` →
    /// `max_context_length` → `context_window` → `max_model_len`, then the
    /// same order inside a nested `meta` or `model_info` object.
    pub fn probe_context_length(&self) -> Option<u32> {
        self.context_length
            .or(self.max_context_length)
            .or(self.context_window)
            .or(self.max_model_len)
            .or_else(|| self.meta.as_ref().and_then(NestedFields::probe))
            .or_else(|| self.model_info.as_ref().and_then(NestedFields::probe))
    }

    /// Vision support, read from a `modalities` array or an OpenRouter-style
    /// `architecture.input_modalities` / `architecture.modality` field.
    pub fn supports_vision(&self) -> bool {
        let list_has_image = |list: &[String]| {
            list.iter().any(|m| m.eq_ignore_ascii_case("image") || m.eq_ignore_ascii_case("vision"))
        };
        if let Some(modalities) = &self.modalities {
            if list_has_image(modalities) {
                return true;
            }
        }
        if let Some(arch) = &self.architecture {
            if let Some(list) = &arch.input_modalities {
                if list_has_image(list) {
                    return true;
                }
            }
            if let Some(modality) = &arch.modality {
                if modality.to_ascii_lowercase().contains("image") {
                    return true;
                }
            }
        }
        false
    }
}

impl NestedFields {
    fn probe(&self) -> Option<u32> {
        self.context_length
            .or(self.max_context_length)
            .or(self.context_window)
            .or(self.max_model_len)
    }
}
