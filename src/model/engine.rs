use crate::error::AppError;
use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;
use std::sync::Mutex;

/// A single forward pass: one input tensor in, one flat score vector out.
pub trait InferenceEngine: Send + Sync {
    fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, AppError>;
}

/// ONNX Runtime backed engine bound to one named input and one named output.
pub struct OrtEngine {
    // `Session::run` takes `&mut self`; the lock is held only for the forward pass.
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OrtEngine {
    pub fn new(session: Session, input_name: String, output_name: String) -> Self {
        Self {
            session: Mutex::new(session),
            input_name,
            output_name,
        }
    }
}

impl InferenceEngine for OrtEngine {
    fn run(&self, input: Array4<f32>) -> Result<Vec<f32>, AppError> {
        let input_value = Tensor::from_array(input)?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| AppError::Inference("session lock poisoned".to_string()))?;
        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_value])?;

        // The output name was checked against the session when it was loaded.
        let output = outputs[self.output_name.as_str()].try_extract_array::<f32>()?;

        Ok(output.iter().copied().collect())
    }
}
