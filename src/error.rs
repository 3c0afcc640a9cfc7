use axum::{
    extract::multipart::MultipartError,
    extract::{multipart::MultipartRejection, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ndarray::ShapeError;
use serde_json::json;
use thiserror::Error;

/// Coarse classification of [`AppError`], used for status mapping and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fatal at startup: bad model, label index or config file.
    Config,
    /// Per request: the payload is not a decodable image.
    Decode,
    /// Per request: the forward pass or its postprocessing failed.
    Inference,
    /// Per request: the HTTP request itself is malformed or names an unknown model.
    Request,
    /// Per request: a proxied third-party service failed or is not configured.
    Upstream,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Decode => "decode",
            ErrorKind::Inference => "inference",
            ErrorKind::Request => "request",
            ErrorKind::Upstream => "upstream",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Model not found at path: {0}")]
    ModelNotFound(String),

    #[error("Label index error: {0}")]
    LabelIndex(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Image decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("ONNX Runtime error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Input shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },

    #[error("Model produced {got} scores but the label index has {expected} classes")]
    ClassCountMismatch { expected: usize, got: usize },

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Shape error: {0}")]
    Shape(#[from] ShapeError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("News service is not configured")]
    NewsUnavailable,

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ModelNotFound(_) | AppError::LabelIndex(_) | AppError::Config(_) => {
                ErrorKind::Config
            }
            AppError::Decode(_) => ErrorKind::Decode,
            AppError::Ort(_)
            | AppError::ShapeMismatch { .. }
            | AppError::ClassCountMismatch { .. }
            | AppError::Inference(_)
            | AppError::Shape(_) => ErrorKind::Inference,
            AppError::BadRequest(_)
            | AppError::PayloadTooLarge(_)
            | AppError::UnknownModel(_) => ErrorKind::Request,
            AppError::NewsUnavailable | AppError::Upstream(_) => ErrorKind::Upstream,
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Inference(format!("classification task failed: {}", err))
    }
}

impl AppError {
    /// Maps an extractor rejection onto the request taxonomy, keeping 413 for
    /// bodies over the upload limit.
    fn from_rejection(status: StatusCode, detail: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(detail)
        } else {
            AppError::BadRequest(detail)
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::from_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self::from_rejection(err.status(), err.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        metrics::counter!("wildsight_request_errors_total", "kind" => self.kind().as_str())
            .increment(1);

        let (status, error_message) = match &self {
            AppError::Decode(_) => (StatusCode::BAD_REQUEST, "Invalid image data".to_string()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            AppError::UnknownModel(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::NewsUnavailable => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
            AppError::Upstream(_) => (
                StatusCode::BAD_GATEWAY,
                "News service request failed".to_string(),
            ),
            AppError::ShapeMismatch { .. } | AppError::ClassCountMismatch { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind().as_str(), "request failed");
        } else {
            tracing::debug!(error = %self, kind = self.kind().as_str(), "request rejected");
        }

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
