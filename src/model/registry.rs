use crate::model::classifier::Classifier;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps a model name to its classifier. Filled once during startup, read-only afterwards.
#[derive(Clone)]
pub struct ModelRegistry {
    classifiers: Arc<HashMap<String, Arc<Classifier>>>,
    default_model: String,
}

impl ModelRegistry {
    /// `default_model` must be one of `classifiers`' names.
    pub fn new(classifiers: Vec<Classifier>, default_model: impl Into<String>) -> Self {
        let classifiers = classifiers
            .into_iter()
            .map(|c| (c.name().to_string(), Arc::new(c)))
            .collect();

        Self {
            classifiers: Arc::new(classifiers),
            default_model: default_model.into(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Classifier>> {
        self.classifiers.get(name).cloned()
    }

    pub fn default_classifier(&self) -> Option<Arc<Classifier>> {
        self.get(&self.default_model)
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Classifiers sorted by name.
    pub fn list(&self) -> Vec<Arc<Classifier>> {
        let mut all: Vec<_> = self.classifiers.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }
}
