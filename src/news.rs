use crate::config::NewsConfig;
use crate::error::AppError;
use std::time::Duration;

/// Passthrough client for the wildlife news search.
#[derive(Clone)]
pub struct NewsClient {
    http: reqwest::Client,
    config: NewsConfig,
    api_key: Option<String>,
}

impl NewsClient {
    /// Reads the API key from the environment variable named in `config`.
    pub fn from_env(config: NewsConfig) -> Result<Self, AppError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!(
                env = %config.api_key_env,
                "news API key not set; /wild-news will be unavailable"
            );
        }
        Self::new(config, api_key)
    }

    pub fn new(config: NewsConfig, api_key: Option<String>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            api_key,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Query parameters sent upstream, API key last.
    fn query(&self, api_key: &str) -> Vec<(&'static str, String)> {
        vec![
            ("q", self.config.query.clone()),
            ("lang", self.config.lang.clone()),
            ("sortby", self.config.sort_by.clone()),
            ("max", self.config.max_articles.to_string()),
            ("apiKey", api_key.to_string()),
        ]
    }

    /// Fetches the latest articles and returns the upstream JSON untouched.
    pub async fn latest(&self) -> Result<serde_json::Value, AppError> {
        let api_key = self.api_key.as_deref().ok_or(AppError::NewsUnavailable)?;

        let response = self
            .http
            .get(&self.config.endpoint)
            .query(&self.query(api_key))
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}
