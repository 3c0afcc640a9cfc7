use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    extract::{Multipart, Path, Query, State},
    Json,
};
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;
use std::time::Instant;

use crate::animals::AnimalDetails;
use crate::error::AppError;
use crate::model::classifier::Classifier;
use crate::server::types::*;

/// Multipart form field carrying the upload.
const IMAGE_FIELD: &str = "image";

pub async fn health_check() -> &'static str {
    "OK"
}

/// Classifies an uploaded image (`multipart/form-data`, field `image`) with the default model.
pub async fn predict_upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ImageClassifyResponse>, AppError> {
    let mut multipart = multipart?;
    let mut image_bytes = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(IMAGE_FIELD) {
            image_bytes = Some(field.bytes().await?);
            break;
        }
    }
    let image_bytes = image_bytes
        .ok_or_else(|| AppError::BadRequest(format!("missing form field {:?}", IMAGE_FIELD)))?;

    let classifier = state
        .registry
        .default_classifier()
        .ok_or_else(|| AppError::UnknownModel(state.registry.default_model().to_string()))?;

    run_classification(classifier, image_bytes.to_vec()).await.map(Json)
}

/// Classifies a base64 encoded image with the named model.
pub async fn image_classification_predict(
    State(state): State<Arc<AppState>>,
    Path(model_name): Path<String>,
    payload: Result<Json<ImageClassifyRequest>, JsonRejection>,
) -> Result<Json<ImageClassifyResponse>, AppError> {
    let Json(payload) = payload?;
    let classifier = state
        .registry
        .get(&model_name)
        .ok_or_else(|| AppError::UnknownModel(model_name.clone()))?;

    let image_bytes = general_purpose::STANDARD
        .decode(payload.image.trim())
        .map_err(|e| AppError::BadRequest(format!("Base64 decode failed: {}", e)))?;

    run_classification(classifier, image_bytes).await.map(Json)
}

/// Decode, resize and the forward pass are CPU bound, so they run on the blocking pool.
async fn run_classification(
    classifier: Arc<Classifier>,
    image_bytes: Vec<u8>,
) -> Result<ImageClassifyResponse, AppError> {
    let model = classifier.name().to_string();
    let start = Instant::now();

    let predictions =
        tokio::task::spawn_blocking(move || classifier.classify_bytes(&image_bytes)).await??;

    let duration = start.elapsed();
    metrics::counter!("wildsight_predictions_total", "model" => model.clone()).increment(1);
    metrics::histogram!("wildsight_inference_duration_seconds", "model" => model.clone())
        .record(duration.as_secs_f64());
    tracing::debug!(
        model = %model,
        top = predictions.first().map(|p| p.label.as_str()).unwrap_or(""),
        elapsed_ms = duration.as_secs_f64() * 1000.0,
        "classified image"
    );

    Ok(ImageClassifyResponse {
        model,
        predictions,
        inference_time_ms: duration.as_secs_f64() * 1000.0,
    })
}

pub async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    let default = state.registry.default_model();
    let models = state
        .registry
        .list()
        .iter()
        .map(|c| ModelInfo {
            name: c.name().to_string(),
            num_classes: c.labels().len(),
            input_size: c.input_size(),
            default: c.name() == default,
        })
        .collect();

    Json(ModelsResponse { models })
}

pub async fn animal_details(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnimalQuery>,
) -> Json<AnimalDetails> {
    Json(state.animals.lookup(&query.animal))
}

pub async fn wild_news(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let client = state.news.as_ref().ok_or(AppError::NewsUnavailable)?;
    Ok(Json(client.latest().await?))
}
