use crate::config::ModelConfig;
use crate::error::AppError;
use crate::model::classifier::Classifier;
use crate::model::engine::OrtEngine;
use crate::model::labels::LabelIndex;
use crate::preprocessing::image::{DecodeLimits, Preprocessor};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;

// Initialize the global environment for ORT (only needed once)
pub fn init_ort() -> Result<(), AppError> {
    ort::init()
        .with_name("wildsight")
        .commit()
        .map_err(|e| startup_failure("cannot initialize ONNX Runtime", &e))?;
    Ok(())
}

/// Runtime failures before serving starts are fatal configuration errors.
fn startup_failure(context: &str, err: &dyn std::fmt::Display) -> AppError {
    AppError::Config(format!("{}: {}", context, err))
}

/// Decode bounds configured for one model.
pub fn decode_limits(config: &ModelConfig) -> DecodeLimits {
    DecodeLimits {
        max_dimension: config.max_image_dimension,
        max_alloc_bytes: config.max_decode_bytes,
    }
}

/// Loads an ONNX model from disk and creates an inference session.
///
/// # Arguments
/// * `model_path` - Path to the .onnx file
/// * `intra_threads` - Parallelism within a single operator
pub fn load_model(model_path: impl AsRef<Path>, intra_threads: usize) -> Result<Session, AppError> {
    let path = model_path.as_ref();
    if !path.exists() {
        return Err(AppError::ModelNotFound(path.display().to_string()));
    }

    let context = format!("cannot load {}", path.display());
    let load_failed = |e: &dyn std::fmt::Display| startup_failure(&context, e);
    let session = Session::builder()
        .map_err(|e| load_failed(&e))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| load_failed(&e))?
        .with_intra_threads(intra_threads)
        .map_err(|e| load_failed(&e))?
        .commit_from_file(path)
        .map_err(|e| load_failed(&e))?;

    tracing::info!(path = %path.display(), "loaded model");
    for (i, input) in session.inputs.iter().enumerate() {
        tracing::debug!(index = i, name = %input.name, kind = ?input.input_type, "model input");
    }
    for (i, output) in session.outputs.iter().enumerate() {
        tracing::debug!(index = i, name = %output.name, kind = ?output.output_type, "model output");
    }

    Ok(session)
}

/// Checks that the configured tensor names exist on the loaded graph.
pub fn check_bindings(session: &Session, config: &ModelConfig) -> Result<(), AppError> {
    let inputs: Vec<&str> = session.inputs.iter().map(|i| i.name.as_str()).collect();
    let outputs: Vec<&str> = session.outputs.iter().map(|o| o.name.as_str()).collect();
    verify_names(&config.name, &config.input_name, &inputs, "input")?;
    verify_names(&config.name, &config.output_name, &outputs, "output")
}

fn verify_names(model: &str, wanted: &str, available: &[&str], role: &str) -> Result<(), AppError> {
    if available.contains(&wanted) {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "model {} has no {} named {:?} (found {:?})",
            model, role, wanted, available
        )))
    }
}

/// Loads the label index and verifies it against the configured class count.
pub fn load_labels(config: &ModelConfig) -> Result<LabelIndex, AppError> {
    let labels = LabelIndex::from_file(&config.labels_path)?;

    if let Some(expected) = config.num_classes {
        if labels.len() != expected {
            return Err(AppError::Config(format!(
                "model {} expects {} classes but {} has {}",
                config.name,
                expected,
                config.labels_path,
                labels.len()
            )));
        }
    }

    Ok(labels)
}

/// Builds a ready-to-serve classifier for one configured model.
pub fn build_classifier(config: &ModelConfig) -> Result<Classifier, AppError> {
    let labels = load_labels(config)?;
    let session = load_model(&config.path, config.intra_threads)?;
    check_bindings(&session, config)?;

    let engine = OrtEngine::new(
        session,
        config.input_name.clone(),
        config.output_name.clone(),
    );

    tracing::info!(
        model = %config.name,
        classes = labels.len(),
        input_size = config.input_size,
        "classifier ready"
    );

    Ok(Classifier::new(
        config.name.clone(),
        Preprocessor::new(config.input_size).with_limits(decode_limits(config)),
        Box::new(engine),
        labels,
        config.top_k,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn model_config(path: &str, labels_path: &str) -> ModelConfig {
        serde_yaml::from_str(&format!(
            "name: mobilenetv2\npath: {}\nlabels_path: {}\n",
            path, labels_path
        ))
        .unwrap()
    }

    fn labels_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"0": ["n0", "cat"], "1": ["n1", "dog"], "2": ["n2", "owl"]}"#)
            .unwrap();
        file
    }

    #[test]
    fn test_load_model_nonexistent_file() {
        let result = load_model("nonexistent_model.onnx", 1);
        assert!(matches!(result, Err(AppError::ModelNotFound(_))));
    }

    #[test]
    fn test_load_model_with_invalid_file() {
        // Exists, but is not an ONNX graph.
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"definitely not protobuf").unwrap();

        let result = load_model(temp_file.path(), 1);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_load_labels_checks_class_count() {
        let labels = labels_file();
        let path = labels.path().to_str().unwrap();

        let mut config = model_config("model.onnx", path);
        assert_eq!(load_labels(&config).unwrap().len(), 3);

        config.num_classes = Some(1000);
        assert!(matches!(load_labels(&config), Err(AppError::Config(_))));
    }

    #[test]
    fn test_build_classifier_missing_labels_is_config_error() {
        let config = model_config("model.onnx", "missing_labels.json");
        let err = build_classifier(&config).err().unwrap();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn test_build_classifier_missing_model_is_config_error() {
        let labels = labels_file();
        let config = model_config("missing_model.onnx", labels.path().to_str().unwrap());

        let err = build_classifier(&config).err().unwrap();
        assert!(matches!(err, AppError::ModelNotFound(_)));
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn test_runtime_errors_at_startup_are_config_errors() {
        let err = startup_failure("cannot initialize ONNX Runtime", &ort::Error::new("no dylib"));
        assert!(matches!(err, AppError::Config(_)));
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
        assert_eq!(
            err.to_string(),
            "Configuration error: cannot initialize ONNX Runtime: no dylib"
        );
    }

    #[test]
    fn test_init_ort_failure_is_config_error() {
        // Either the runtime initializes, or startup sees a Config error.
        if let Err(err) = init_ort() {
            assert!(matches!(err, AppError::Config(_)));
            assert_eq!(err.kind(), crate::error::ErrorKind::Config);
        }
    }

    #[test]
    fn test_decode_limits_follow_config() {
        let mut config = model_config("model.onnx", "labels.json");
        assert_eq!(decode_limits(&config), DecodeLimits::default());

        config.max_image_dimension = 1024;
        config.max_decode_bytes = 4096;
        assert_eq!(
            decode_limits(&config),
            DecodeLimits {
                max_dimension: 1024,
                max_alloc_bytes: 4096,
            }
        );
    }

    #[test]
    fn test_verify_names() {
        assert!(verify_names("m", "input", &["input"], "input").is_ok());
        assert!(matches!(
            verify_names("m", "data", &["input"], "input"),
            Err(AppError::Config(_))
        ));
    }
}
