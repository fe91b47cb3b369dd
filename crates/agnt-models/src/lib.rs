//! Model registry: discovers context-window sizes from the upstream
//! models-list endpoint, falls back to a baked-in table of
//! name-prefix matches when no API advertises the length, and
//! tracks whether a model was documented as vision-capable.
//!
//! Kept deliberately small: OAuth, npm-package routing, and provider
//! discovery beyond context-length/vision metadata aren't needed here.

mod fallback;
mod wire;

use std::collections::HashMap;

use parking_lot::RwLock;

pub use fallback::fallback_context_length;
pub use wire::{ModelListEntry, ModelListResponse};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("http error: {0}")]
    Http(Box<dyn std::error::Error + Send + Sync>),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What the registry knows about one model.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub id: String,
    pub max_context_length: u32,
    pub vision: bool,
}

/// Thread-safe table of model metadata, mutated as servers report
/// `max_context_length` on live responses.
#[derive(Default)]
pub struct ModelRegistry {
    models: RwLock<HashMap<String, ModelInfo>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate entries from a fetched models-list response.
    pub fn ingest(&self, response: &ModelListResponse) {
        let mut models = self.models.write();
        for entry in &response.data {
            let max_context_length = entry
                .probe_context_length()
                .unwrap_or_else(|| fallback_context_length(&entry.id));
            models.insert(
                entry.id.clone(),
                ModelInfo {
                    id: entry.id.clone(),
                    max_context_length,
                    vision: entry.supports_vision(),
                },
            );
        }
    }

    /// Register or update a single model's known context length, e.g. from
    /// a `usage.max_context_length` value freshly reported in a live
    /// response. Only applied if it differs from what's registered.
    pub fn update_context_length(&self, model_id: &str, max_context_length: u32) {
        let mut models = self.models.write();
        let entry = models.entry(model_id.to_string()).or_insert_with(|| ModelInfo {
            id: model_id.to_string(),
            max_context_length,
            vision: false,
        });
        if entry.max_context_length != max_context_length {
            tracing::debug!(
                model = model_id,
                old = entry.max_context_length,
                new = max_context_length,
                "updating registered max context length"
            );
            entry.max_context_length = max_context_length;
        }
    }

    pub fn set_vision(&self, model_id: &str, vision: bool) {
        let mut models = self.models.write();
        models
            .entry(model_id.to_string())
            .or_insert_with(|| ModelInfo {
                id: model_id.to_string(),
                max_context_length: fallback_context_length(model_id),
                vision,
            })
            .vision = vision;
    }

    /// The max context length for a model: the registered value if known,
    /// else the baked-in fallback table.
    pub fn max_context_length(&self, model_id: &str) -> u32 {
        self.models
            .read()
            .get(model_id)
            .map(|m| m.max_context_length)
            .unwrap_or_else(|| fallback_context_length(model_id))
    }

    pub fn supports_vision(&self, model_id: &str) -> bool {
        self.models
            .read()
            .get(model_id)
            .map(|m| m.vision)
            .unwrap_or(false)
    }

    pub fn get(&self, model_id: &str) -> Option<ModelInfo> {
        self.models.read().get(model_id).cloned()
    }
}

/// Fetch the models-list endpoint and ingest it.
pub async fn fetch_and_ingest(
    client: &reqwest::Client,
    base_url: &str,
    auth_token: &str,
    registry: &ModelRegistry,
) -> Result<(), Error> {
    let url = format!("{}/models", base_url.trim_end_matches('/'));
    let resp = client
        .get(&url)
        .bearer_auth(auth_token)
        .send()
        .await
        .map_err(|e| Error::Http(Box::new(e)))?;
    let body: ModelListResponse = resp.json().await.map_err(|e| Error::Http(Box::new(e)))?;
    registry.ingest(&body);
    Ok(())
}
