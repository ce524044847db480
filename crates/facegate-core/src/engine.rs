//! Inference engine contract and its ONNX Runtime implementation.
//!
//! The liveness model is opaque: this crate never inspects its graph beyond
//! logging the declared inputs and outputs. It feeds one tensor in and reads
//! the first output back as a flat score vector.

use crate::types::OutputVector;
use facegate_models::ModelIntegrityError;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

const DEFAULT_INTRA_THREADS: usize = 2;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("model file not found: {0}; place the liveness model in the model directory")]
    ModelNotFound(String),
    #[error("failed to load model {path}: {reason}")]
    ModelLoad { path: String, reason: String },
    #[error("model integrity check failed: {0}")]
    Integrity(#[from] ModelIntegrityError),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// A loaded model, shared read-only between concurrent attempts.
pub trait LivenessModel: Send + Sync {
    /// Run the model on one `[1, 3, H, W]` tensor.
    fn run(&self, input: &Array4<f32>) -> Result<OutputVector, EngineError>;
}

/// Something that can turn a model artifact on disk into a [`LivenessModel`].
pub trait InferenceEngine: Send + Sync {
    fn load_model(&self, path: &Path) -> Result<Box<dyn LivenessModel>, EngineError>;
}

/// ONNX Runtime backed engine.
#[derive(Debug, Clone)]
pub struct OnnxEngine {
    intra_threads: usize,
}

impl OnnxEngine {
    pub fn new(intra_threads: usize) -> Self {
        Self {
            intra_threads: intra_threads.max(1),
        }
    }
}

impl Default for OnnxEngine {
    fn default() -> Self {
        Self::new(DEFAULT_INTRA_THREADS)
    }
}

impl InferenceEngine for OnnxEngine {
    fn load_model(&self, path: &Path) -> Result<Box<dyn LivenessModel>, EngineError> {
        let path_display = path.display().to_string();
        if !path.exists() {
            return Err(EngineError::ModelNotFound(path_display));
        }

        let session = build_session(path, self.intra_threads).map_err(|e| EngineError::ModelLoad {
            path: path_display.clone(),
            reason: e.to_string(),
        })?;

        tracing::info!(
            path = %path_display,
            intra_threads = self.intra_threads,
            inputs = ?session.inputs().iter().map(|i| (i.name(), i.dtype())).collect::<Vec<_>>(),
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded liveness model"
        );

        if session.inputs().is_empty() || session.outputs().is_empty() {
            return Err(EngineError::ModelLoad {
                path: path_display,
                reason: "model must declare at least one input and one output".into(),
            });
        }

        Ok(Box::new(OnnxModel {
            session: Mutex::new(session),
        }))
    }
}

fn build_session(path: &Path, intra_threads: usize) -> Result<Session, ort::Error> {
    let session = Session::builder()?
        .with_intra_threads(intra_threads)?
        .commit_from_file(path)?;
    Ok(session)
}

/// An ONNX session. `Session::run` needs exclusive access, so concurrent
/// attempts take turns on the mutex.
struct OnnxModel {
    session: Mutex<Session>,
}

impl LivenessModel for OnnxModel {
    fn run(&self, input: &Array4<f32>) -> Result<OutputVector, EngineError> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| EngineError::Inference("session lock poisoned".into()))?;

        let values = run_session(&mut session, input)
            .map_err(|e| EngineError::Inference(format!("shape {:?}: {e}", input.shape())))?;

        tracing::debug!(len = values.len(), "liveness model output");
        Ok(OutputVector::new(values))
    }
}

fn run_session(session: &mut Session, input: &Array4<f32>) -> Result<Vec<f32>, ort::Error> {
    let outputs = session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;
    let (_, data) = outputs[0].try_extract_tensor::<f32>()?;
    Ok(data.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_reported_before_runtime() {
        let path = std::env::temp_dir().join("facegate-engine-test-definitely-missing.onnx");
        let err = OnnxEngine::default().load_model(&path).err().unwrap();
        assert!(matches!(err, EngineError::ModelNotFound(_)));
        assert!(err.to_string().contains("definitely-missing"));
    }

    #[test]
    fn test_intra_threads_floor() {
        assert_eq!(OnnxEngine::new(0).intra_threads, 1);
        assert_eq!(OnnxEngine::default().intra_threads, DEFAULT_INTRA_THREADS);
    }
}
