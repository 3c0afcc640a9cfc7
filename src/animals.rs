use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const FALLBACK_DESCRIPTION: &str = "Details not available.";
const FALLBACK_SAFETY_TIPS: &str = "Be cautious around wild animals.";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AnimalDetails {
    pub description: String,
    pub safety_tips: String,
}

impl AnimalDetails {
    pub fn fallback() -> Self {
        Self {
            description: FALLBACK_DESCRIPTION.to_string(),
            safety_tips: FALLBACK_SAFETY_TIPS.to_string(),
        }
    }
}

/// Read-only table of animal facts keyed by lowercase name.
#[derive(Debug, Clone, Default)]
pub struct AnimalFacts {
    entries: HashMap<String, AnimalDetails>,
}

impl AnimalFacts {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, AppError> {
        let raw: HashMap<String, AnimalDetails> = serde_json::from_str(content)
            .map_err(|e| AppError::Config(format!("malformed animal data: {}", e)))?;

        let entries = raw
            .into_iter()
            .map(|(name, details)| (name.trim().to_lowercase(), details))
            .collect();

        Ok(Self { entries })
    }

    /// Case-insensitive lookup; unknown names get the generic fallback.
    pub fn lookup(&self, animal: &str) -> AnimalDetails {
        self.entries
            .get(&animal.trim().to_lowercase())
            .cloned()
            .unwrap_or_else(AnimalDetails::fallback)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
