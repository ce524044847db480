use anyhow::{Context, Result};
use facegate_core::{PipelineOptions, ScoreRule, DEFAULT_LIVENESS_THRESHOLD};
use facegate_models::{default_model_dir, DEFAULT_MODEL_FILE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// CLI configuration: optional TOML file, then `FACEGATE_*` environment
/// variables on top, defaults for everything left unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory containing the ONNX model file.
    pub model_dir: PathBuf,
    /// Model file name inside `model_dir`.
    pub model_file: String,
    /// Expected SHA-256 of the model file; checked before loading when set.
    pub model_sha256: Option<String>,
    /// Liveness passes when the score is strictly above this.
    pub liveness_threshold: f32,
    /// `argmax-index` or `class-probability:<N>`.
    pub score_rule: String,
    /// Deadline per attempt in seconds; 0 disables it.
    pub infer_timeout_secs: u64,
    /// ONNX Runtime intra-op threads.
    pub intra_threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_dir: default_model_dir(),
            model_file: DEFAULT_MODEL_FILE.to_string(),
            model_sha256: None,
            liveness_threshold: DEFAULT_LIVENESS_THRESHOLD,
            score_rule: ScoreRule::default().to_string(),
            infer_timeout_secs: 10,
            intra_threads: 2,
        }
    }
}

impl Config {
    /// Load from `path` (if given), then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config at {}", path.display()))?;
                toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?
            }
            None => Self::default(),
        };
        Ok(base.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Apply `FACEGATE_*` overrides looked up through `var`.
    fn with_env_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = var("FACEGATE_MODEL_DIR") {
            self.model_dir = PathBuf::from(v);
        }
        if let Some(v) = var("FACEGATE_MODEL_FILE") {
            self.model_file = v;
        }
        if let Some(v) = var("FACEGATE_MODEL_SHA256") {
            self.model_sha256 = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Some(v) = var("FACEGATE_SCORE_RULE") {
            self.score_rule = v;
        }
        self.liveness_threshold =
            parsed(&var, "FACEGATE_LIVENESS_THRESHOLD").unwrap_or(self.liveness_threshold);
        self.infer_timeout_secs =
            parsed(&var, "FACEGATE_INFER_TIMEOUT_SECS").unwrap_or(self.infer_timeout_secs);
        self.intra_threads = parsed(&var, "FACEGATE_INTRA_THREADS").unwrap_or(self.intra_threads);
        self
    }

    /// Full path to the liveness model.
    pub fn model_path(&self) -> PathBuf {
        self.model_dir.join(&self.model_file)
    }

    pub fn pipeline_options(&self) -> Result<PipelineOptions> {
        let score_rule: ScoreRule = self
            .score_rule
            .parse()
            .context("invalid score_rule in configuration")?;
        Ok(PipelineOptions {
            model_path: self.model_path(),
            model_sha256: self.model_sha256.clone(),
            threshold: self.liveness_threshold,
            score_rule,
            timeout: (self.infer_timeout_secs > 0)
                .then(|| Duration::from_secs(self.infer_timeout_secs)),
        })
    }
}

fn parsed<T: std::str::FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    var(key).and_then(|v| v.trim().parse().ok())
}
