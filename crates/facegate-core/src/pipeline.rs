//! Liveness pipeline orchestrator.
//!
//! Preprocess → model (via [`ModelCache`]) → score → threshold.
//! [`LivenessPipeline::attempt`] runs that sequence under the deadline and
//! attempt span, logging any failure and returning it intact for diagnostics;
//! [`LivenessPipeline::authenticate_liveness`] folds every failure into a
//! "not live" verdict.
//!
//! Decoding and inference run on tokio's blocking pool. Dropping the future
//! abandons the attempt; the blocking job finishes on its own and its result
//! is discarded.

use crate::cache::ModelCache;
use crate::decision::{decide, DEFAULT_LIVENESS_THRESHOLD};
use crate::engine::{EngineError, InferenceEngine};
use crate::postprocess::{arg_max, PostprocessError, ScoreRule};
use crate::preprocess::{preprocess_bytes, PreprocessError};
use crate::types::LivenessReport;
use facegate_models::{default_model_dir, DEFAULT_MODEL_FILE};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] PreprocessError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Postprocess(#[from] PostprocessError),
    #[error("liveness check timed out after {0:?}")]
    TimedOut(Duration),
    #[error("worker task failed: {0}")]
    Worker(String),
}

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub model_path: PathBuf,
    /// Expected SHA-256 of the model file; verified before loading when set.
    pub model_sha256: Option<String>,
    pub threshold: f32,
    pub score_rule: ScoreRule,
    /// Deadline for one attempt. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            model_path: default_model_dir().join(DEFAULT_MODEL_FILE),
            model_sha256: None,
            threshold: DEFAULT_LIVENESS_THRESHOLD,
            score_rule: ScoreRule::default(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

pub struct LivenessPipeline {
    cache: ModelCache,
    threshold: f32,
    score_rule: ScoreRule,
    timeout: Option<Duration>,
}

impl LivenessPipeline {
    pub fn new(engine: Arc<dyn InferenceEngine>, options: PipelineOptions) -> Self {
        let cache = ModelCache::new(engine, options.model_path).with_checksum(options.model_sha256);
        Self {
            cache,
            threshold: options.threshold,
            score_rule: options.score_rule,
            timeout: options.timeout,
        }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn score_rule(&self) -> ScoreRule {
        self.score_rule
    }

    pub fn model_path(&self) -> &Path {
        self.cache.path()
    }

    pub fn is_model_loaded(&self) -> bool {
        self.cache.is_loaded()
    }

    /// Load the model ahead of the first attempt.
    pub async fn warm_up(&self) -> Result<(), PipelineError> {
        self.cache.get().await?;
        Ok(())
    }

    /// Release the cached model; the next attempt loads it again.
    pub fn teardown(&mut self) -> bool {
        self.cache.teardown()
    }

    /// Run one attempt and report the outcome, or the first error hit.
    pub async fn assess(&self, image: &[u8]) -> Result<LivenessReport, PipelineError> {
        let bytes = image.to_vec();
        let input = tokio::task::spawn_blocking(move || preprocess_bytes(&bytes))
            .await
            .map_err(|e| PipelineError::Worker(format!("preprocess: {e}")))??;

        let model = self.cache.get().await?;

        let output = tokio::task::spawn_blocking(move || model.run(&input))
            .await
            .map_err(|e| EngineError::Inference(format!("inference task failed: {e}")))??;

        let class_index = arg_max(&output)?;
        let score = self.score_rule.score(&output)?;
        let threshold = self.threshold;
        let is_live = decide(score, threshold);

        tracing::info!(
            class_index,
            score,
            threshold,
            is_live,
            rule = %self.score_rule,
            "liveness decided"
        );

        Ok(LivenessReport {
            is_live,
            score,
            class_index,
            threshold,
            output,
        })
    }

    /// One full attempt: [`Self::assess`] inside an attempt span, bounded by
    /// the configured deadline. Failures are logged before being returned.
    pub async fn attempt(&self, image: &[u8]) -> Result<LivenessReport, PipelineError> {
        let attempt = Uuid::new_v4();
        let span = tracing::info_span!("liveness", %attempt);

        async {
            let result = match self.timeout {
                Some(limit) => tokio::time::timeout(limit, self.assess(image))
                    .await
                    .unwrap_or_else(|_| Err(PipelineError::TimedOut(limit))),
                None => self.assess(image).await,
            };
            if let Err(err) = &result {
                log_denial(err);
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Liveness verdict for one captured image. Never fails: any error,
    /// including a missed deadline, yields `false`.
    pub async fn authenticate_liveness(&self, image: &[u8]) -> bool {
        self.attempt(image)
            .await
            .map(|report| report.is_live)
            .unwrap_or(false)
    }
}

fn log_denial(err: &PipelineError) {
    match err {
        PipelineError::Engine(EngineError::ModelNotFound(path)) => {
            tracing::error!(
                path = %path,
                "liveness model file not found; check the model directory. Denying"
            );
        }
        _ => tracing::warn!(error = %err, "liveness check failed; denying"),
    }
}
