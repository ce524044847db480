//! Load-once model handle.
//!
//! The load runs on a detached task, so a caller that gives up (deadline,
//! dropped future) does not cancel it: the model still lands in the cache
//! and later attempts reuse it. Concurrent callers wait on the same load.
//! A failed load leaves the cache empty so the next attempt retries.
//! [`ModelCache::teardown`] drops the handle explicitly.

use crate::engine::{EngineError, InferenceEngine, LivenessModel};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;

type ModelCell = OnceCell<Arc<dyn LivenessModel>>;

pub struct ModelCache {
    engine: Arc<dyn InferenceEngine>,
    path: PathBuf,
    /// Pinned SHA-256 of the artifact, checked before every load.
    expected_sha256: Option<String>,
    model: Arc<ModelCell>,
}

impl ModelCache {
    pub fn new(engine: Arc<dyn InferenceEngine>, path: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            path: path.into(),
            expected_sha256: None,
            model: Arc::new(OnceCell::new()),
        }
    }

    pub fn with_checksum(mut self, expected_sha256: Option<String>) -> Self {
        self.expected_sha256 = expected_sha256;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// Return the cached model, loading it on first use.
    pub async fn get(&self) -> Result<Arc<dyn LivenessModel>, EngineError> {
        if let Some(model) = self.model.get() {
            return Ok(Arc::clone(model));
        }

        let cell = Arc::clone(&self.model);
        let engine = Arc::clone(&self.engine);
        let path = self.path.clone();
        let expected = self.expected_sha256.clone();

        // Dropping the JoinHandle detaches the task; the cell still gets filled.
        tokio::spawn(async move {
            cell.get_or_try_init(|| load(engine, path, expected))
                .await
                .map(Arc::clone)
        })
        .await
        .map_err(|e| EngineError::ModelLoad {
            path: self.path.display().to_string(),
            reason: format!("load task failed: {e}"),
        })?
    }

    /// Drop the cached model. Returns whether one was loaded.
    ///
    /// A load still in flight fills the released cell, not the new one.
    pub fn teardown(&mut self) -> bool {
        let released = std::mem::replace(&mut self.model, Arc::new(OnceCell::new()));
        let dropped = released.initialized();
        if dropped {
            tracing::info!(path = %self.path.display(), "liveness model released");
        }
        dropped
    }
}

async fn load(
    engine: Arc<dyn InferenceEngine>,
    path: PathBuf,
    expected_sha256: Option<String>,
) -> Result<Arc<dyn LivenessModel>, EngineError> {
    let started = Instant::now();
    let path_display = path.display().to_string();

    let model = tokio::task::spawn_blocking(move || -> Result<Arc<dyn LivenessModel>, EngineError> {
        if let Some(expected) = expected_sha256.as_deref() {
            facegate_models::verify_file_sha256(&path, expected)?;
        }
        Ok(Arc::from(engine.load_model(&path)?))
    })
    .await
    .map_err(|e| EngineError::ModelLoad {
        path: path_display.clone(),
        reason: format!("load task failed: {e}"),
    })??;

    tracing::info!(
        path = %path_display,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "liveness model ready"
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OutputVector;
    use ndarray::Array4;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FixedModel;

    impl LivenessModel for FixedModel {
        fn run(&self, _input: &Array4<f32>) -> Result<OutputVector, EngineError> {
            Ok(OutputVector::new(vec![0.0, 1.0]))
        }
    }

    /// Counts loads; each takes `delay` and the first `fail_first` fail.
    #[derive(Default)]
    struct CountingEngine {
        loads: AtomicUsize,
        fail_first: usize,
        delay: Duration,
    }

    impl InferenceEngine for CountingEngine {
        fn load_model(&self, path: &Path) -> Result<Box<dyn LivenessModel>, EngineError> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            if n < self.fail_first {
                return Err(EngineError::ModelLoad {
                    path: path.display().to_string(),
                    reason: "corrupt".into(),
                });
            }
            Ok(Box::new(FixedModel))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_use_loads_once() {
        let engine = Arc::new(CountingEngine {
            delay: Duration::from_millis(20),
            ..Default::default()
        });
        let cache = Arc::new(ModelCache::new(engine.clone(), "liveness.onnx"));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get().await.is_ok() })
            })
            .collect();
        for h in handles {
            assert!(h.await.unwrap());
        }

        assert_eq!(engine.loads.load(Ordering::SeqCst), 1);
        assert!(cache.is_loaded());
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let engine = Arc::new(CountingEngine {
            fail_first: 1,
            ..Default::default()
        });
        let cache = ModelCache::new(engine.clone(), "liveness.onnx");

        assert!(matches!(cache.get().await, Err(EngineError::ModelLoad { .. })));
        assert!(!cache.is_loaded());
        assert!(cache.get().await.is_ok());
        assert!(cache.get().await.is_ok());
        assert_eq!(engine.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_teardown_forces_reload() {
        let engine = Arc::new(CountingEngine::default());
        let mut cache = ModelCache::new(engine.clone(), "liveness.onnx");

        assert!(!cache.teardown());
        cache.get().await.unwrap();
        assert!(cache.teardown());
        assert!(!cache.is_loaded());
        cache.get().await.unwrap();
        assert_eq!(engine.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_checksum_mismatch_skips_engine() {
        let dir = std::env::temp_dir().join(format!(
            "facegate-cache-test-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("liveness.onnx");
        std::fs::write(&path, b"not really onnx").unwrap();

        let engine = Arc::new(CountingEngine::default());
        let cache = ModelCache::new(engine.clone(), &path).with_checksum(Some("00".into()));

        assert!(matches!(cache.get().await, Err(EngineError::Integrity(_))));
        assert_eq!(engine.loads.load(Ordering::SeqCst), 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_abandoned_callers_do_not_restart_load() {
        let engine = Arc::new(CountingEngine {
            delay: Duration::from_millis(150),
            ..Default::default()
        });
        let cache = ModelCache::new(engine.clone(), "liveness.onnx");

        for _ in 0..4 {
            let attempt = tokio::time::timeout(Duration::from_millis(20), cache.get()).await;
            assert!(attempt.is_err());
        }

        assert!(cache.get().await.is_ok());
        assert!(cache.is_loaded());
        assert_eq!(engine.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_load_finishes_after_caller_leaves() {
        let engine = Arc::new(CountingEngine {
            delay: Duration::from_millis(50),
            ..Default::default()
        });
        let cache = ModelCache::new(engine.clone(), "liveness.onnx");

        assert!(tokio::time::timeout(Duration::from_millis(5), cache.get())
            .await
            .is_err());
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(cache.is_loaded());
        assert_eq!(engine.loads.load(Ordering::SeqCst), 1);
    }
}
