use crate::error::AppError;
use crate::preprocessing::image::{DEFAULT_MAX_DECODE_BYTES, DEFAULT_MAX_DIMENSION};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Model used by `POST /predict`. Defaults to the first entry of `models`.
    #[serde(default)]
    pub default_model: Option<String>,
    pub models: Vec<ModelConfig>,
    #[serde(default)]
    pub animals: Option<AnimalConfig>,
    #[serde(default)]
    pub news: Option<NewsConfig>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub static_dir: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// One exported network. MobileNetV2 and VGG16 differ only in these values.
#[derive(Deserialize, Clone, Debug)]
pub struct ModelConfig {
    pub name: String,
    pub path: String,
    pub labels_path: String,
    #[serde(default = "default_input_name")]
    pub input_name: String,
    #[serde(default = "default_output_name")]
    pub output_name: String,
    /// Expected class count; checked against the label index at startup when set.
    #[serde(default)]
    pub num_classes: Option<usize>,
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
    /// Uploads wider or taller than this are rejected before decoding.
    #[serde(default = "default_max_image_dimension")]
    pub max_image_dimension: u32,
    #[serde(default = "default_max_decode_bytes")]
    pub max_decode_bytes: u64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AnimalConfig {
    pub data_path: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct NewsConfig {
    #[serde(default = "default_news_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_news_query")]
    pub query: String,
    #[serde(default = "default_news_lang")]
    pub lang: String,
    #[serde(default = "default_news_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_news_max_articles")]
    pub max_articles: u32,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_news_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_news_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_input_name() -> String {
    "input".to_string()
}

fn default_output_name() -> String {
    "output".to_string()
}

fn default_input_size() -> u32 {
    224
}

fn default_top_k() -> usize {
    3
}

fn default_intra_threads() -> usize {
    4
}

fn default_max_image_dimension() -> u32 {
    DEFAULT_MAX_DIMENSION
}

fn default_max_decode_bytes() -> u64 {
    DEFAULT_MAX_DECODE_BYTES
}

fn default_news_endpoint() -> String {
    "https://gnews.io/api/v4/search".to_string()
}

fn default_news_query() -> String {
    "wildlife OR endangered OR conservation".to_string()
}

fn default_news_lang() -> String {
    "en".to_string()
}

fn default_news_sort_by() -> String {
    "publishedAt".to_string()
}

fn default_news_max_articles() -> u32 {
    6
}

fn default_news_api_key_env() -> String {
    "NEWS_API_KEY".to_string()
}

fn default_news_timeout_secs() -> u64 {
    10
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, AppError> {
        let config: AppConfig = serde_yaml::from_str(content)
            .map_err(|e| AppError::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.models.is_empty() {
            return Err(AppError::Config("at least one model is required".to_string()));
        }

        let mut seen = HashSet::new();
        for model in &self.models {
            if !seen.insert(model.name.as_str()) {
                return Err(AppError::Config(format!(
                    "duplicate model name: {}",
                    model.name
                )));
            }
            if model.top_k == 0 {
                return Err(AppError::Config(format!(
                    "model {}: top_k must be at least 1",
                    model.name
                )));
            }
            if model.max_image_dimension == 0 || model.max_decode_bytes == 0 {
                return Err(AppError::Config(format!(
                    "model {}: decode limits must be positive",
                    model.name
                )));
            }
            if model.input_size == 0 {
                return Err(AppError::Config(format!(
                    "model {}: input_size must be positive",
                    model.name
                )));
            }
        }

        if let Some(default) = &self.default_model {
            if !seen.contains(default.as_str()) {
                return Err(AppError::Config(format!(
                    "default_model {} is not among the configured models",
                    default
                )));
            }
        }

        Ok(())
    }

    pub fn default_model_name(&self) -> &str {
        self.default_model
            .as_deref()
            .unwrap_or_else(|| self.models[0].name.as_str())
    }
}
