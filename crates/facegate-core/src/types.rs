use serde::{Deserialize, Serialize};

/// Raw scores produced by the liveness model.
///
/// Length and meaning (per-class confidence) are defined by the model, not
/// by this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputVector {
    pub values: Vec<f32>,
}

impl OutputVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<f32>> for OutputVector {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

/// Outcome of one successful liveness attempt.
#[derive(Debug, Clone, Serialize)]
pub struct LivenessReport {
    /// Verdict: `score > threshold`.
    pub is_live: bool,
    /// Decision signal handed to the gate.
    pub score: f32,
    /// Arg-max of the output vector.
    pub class_index: usize,
    pub threshold: f32,
    pub output: OutputVector,
}
