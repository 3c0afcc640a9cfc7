use crate::animals::AnimalFacts;
use crate::model::classifier::Prediction;
use crate::model::registry::ModelRegistry;
use crate::news::NewsClient;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared Application State
#[derive(Clone)]
pub struct AppState {
    pub registry: ModelRegistry,
    pub animals: Arc<AnimalFacts>,
    pub news: Option<NewsClient>,
}

// --- DTOs (Data Transfer Objects) ---

// Image Classification
#[derive(Deserialize)]
pub struct ImageClassifyRequest {
    /// Base64 encoded image data
    pub image: String,
}

#[derive(Serialize)]
pub struct ImageClassifyResponse {
    pub model: String,
    pub predictions: Vec<Prediction>,
    pub inference_time_ms: f64,
}

// Model listing
#[derive(Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub num_classes: usize,
    pub input_size: u32,
    pub default: bool,
}

#[derive(Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelInfo>,
}

// Animal facts
#[derive(Deserialize)]
pub struct AnimalQuery {
    #[serde(default)]
    pub animal: String,
}
