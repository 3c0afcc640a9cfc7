//! Fixtures shared by the unit and router tests.

use crate::error::AppError;
use crate::model::classifier::{Classifier, DEFAULT_TOP_K};
use crate::model::engine::InferenceEngine;
use crate::model::labels::LabelIndex;
use crate::preprocessing::image::Preprocessor;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ndarray::Array4;
use std::io::Cursor;

/// Engine that ignores its input and returns the same scores every call.
pub struct FixedScores {
    scores: Vec<f32>,
}

impl FixedScores {
    pub fn new(scores: Vec<f32>) -> Self {
        Self { scores }
    }
}

impl InferenceEngine for FixedScores {
    fn run(&self, _input: Array4<f32>) -> Result<Vec<f32>, AppError> {
        Ok(self.scores.clone())
    }
}

pub fn sample_labels(n: usize) -> LabelIndex {
    LabelIndex::new((0..n).map(|i| format!("class_{}", i)).collect())
}

/// Five-class classifier whose best guesses are always class_4, class_3, class_2.
pub fn stub_classifier(name: &str) -> Classifier {
    Classifier::new(
        name,
        Preprocessor::default(),
        Box::new(FixedScores::new(vec![0.0, 1.0, 2.0, 3.0, 4.0])),
        sample_labels(5),
        DEFAULT_TOP_K,
    )
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([120, 80, 40]));
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}
