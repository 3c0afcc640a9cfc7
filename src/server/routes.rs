use crate::config::ServerConfig;
use crate::server::{handlers, types::AppState};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

pub fn create_router(
    state: AppState,
    metrics_handle: PrometheusHandle,
    server: &ServerConfig,
) -> Router {
    let state = Arc::new(state);

    let router = Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/metrics",
            get(move || std::future::ready(metrics_handle.render())),
        )
        .route("/models", get(handlers::list_models))
        .route("/predict", post(handlers::predict_upload))
        .route(
            "/image-classification/:model_name",
            post(handlers::image_classification_predict),
        )
        .route("/animal-details", get(handlers::animal_details))
        .route("/wild-news", get(handlers::wild_news))
        .with_state(state);

    let router = match &server.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(DefaultBodyLimit::max(server.max_upload_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
}
