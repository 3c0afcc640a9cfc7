use crate::error::AppError;
use crate::model::engine::InferenceEngine;
use crate::model::labels::LabelIndex;
use crate::preprocessing::image::Preprocessor;
use ndarray::Array4;
use serde::Serialize;
use std::cmp::Ordering;

pub const DEFAULT_TOP_K: usize = 3;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    /// Percentage in `[0, 100]`, rounded to two decimals.
    pub confidence: f64,
}

/// One loaded model together with everything needed to turn image bytes
/// into ranked labels. Built once at startup and shared read-only.
pub struct Classifier {
    name: String,
    preprocessor: Preprocessor,
    engine: Box<dyn InferenceEngine>,
    labels: LabelIndex,
    top_k: usize,
}

impl Classifier {
    pub fn new(
        name: impl Into<String>,
        preprocessor: Preprocessor,
        engine: Box<dyn InferenceEngine>,
        labels: LabelIndex,
        top_k: usize,
    ) -> Self {
        Self {
            name: name.into(),
            preprocessor,
            engine,
            labels,
            top_k,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> &LabelIndex {
        &self.labels
    }

    pub fn input_size(&self) -> u32 {
        self.preprocessor.input_size()
    }

    pub fn preprocess(&self, image_bytes: &[u8]) -> Result<Array4<f32>, AppError> {
        self.preprocessor.process(image_bytes)
    }

    /// Runs one forward pass and returns the top-k labels, best first.
    pub fn classify(&self, tensor: Array4<f32>) -> Result<Vec<Prediction>, AppError> {
        let expected = self.preprocessor.output_shape();
        if tensor.shape() != &expected[..] {
            return Err(AppError::ShapeMismatch {
                expected: expected.to_vec(),
                got: tensor.shape().to_vec(),
            });
        }

        let scores = self.engine.run(tensor)?;
        if scores.len() != self.labels.len() {
            return Err(AppError::ClassCountMismatch {
                expected: self.labels.len(),
                got: scores.len(),
            });
        }
        if scores.iter().any(|s| !s.is_finite()) {
            return Err(AppError::Inference(
                "model produced non-finite scores".to_string(),
            ));
        }

        let probabilities = softmax(&scores);

        top_k(&probabilities, self.top_k)
            .into_iter()
            .map(|(class_id, probability)| {
                let label = self.labels.get(class_id).ok_or_else(|| {
                    AppError::Inference(format!("class id {} has no label", class_id))
                })?;
                Ok(Prediction {
                    label: label.to_string(),
                    confidence: to_percentage(probability),
                })
            })
            .collect()
    }

    pub fn classify_bytes(&self, image_bytes: &[u8]) -> Result<Vec<Prediction>, AppError> {
        let tensor = self.preprocess(image_bytes)?;
        self.classify(tensor)
    }
}

/// Softmax with the maximum subtracted first so large logits cannot overflow.
pub fn softmax(scores: &[f32]) -> Vec<f64> {
    let max = scores
        .iter()
        .map(|&s| s as f64)
        .fold(f64::NEG_INFINITY, f64::max);

    let exps: Vec<f64> = scores.iter().map(|&s| (s as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();

    exps.into_iter().map(|e| e / sum).collect()
}

/// Indices of the `k` largest values, descending; equal values keep the lower index first.
pub fn top_k(values: &[f64], k: usize) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| match b.1.total_cmp(&a.1) {
        Ordering::Equal => a.0.cmp(&b.0),
        other => other,
    });
    ranked.truncate(k);
    ranked
}

fn to_percentage(probability: f64) -> f64 {
    (probability * 100.0 * 100.0).round() / 100.0
}
