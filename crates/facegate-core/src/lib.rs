//! facegate-core — On-device liveness pipeline.
//!
//! A captured image is resized and normalized into a `[1, 3, 224, 224]`
//! tensor, run through an opaque liveness model via ONNX Runtime, reduced
//! to a scalar signal and gated against a fixed threshold.

pub mod cache;
pub mod decision;
pub mod engine;
pub mod pipeline;
pub mod postprocess;
pub mod preprocess;
pub mod types;

pub use cache::ModelCache;
pub use decision::{decide, DEFAULT_LIVENESS_THRESHOLD};
pub use engine::{EngineError, InferenceEngine, LivenessModel, OnnxEngine};
pub use pipeline::{LivenessPipeline, PipelineError, PipelineOptions};
pub use postprocess::{PostprocessError, ScoreRule};
pub use preprocess::PreprocessError;
pub use types::{LivenessReport, OutputVector};
