//! Model output → scalar decision signal.

use crate::types::OutputVector;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PostprocessError {
    #[error("model produced an empty output vector")]
    EmptyOutput,
    #[error("model output has a NaN at index {index}")]
    NanOutput { index: usize },
    #[error("class {class} out of range for output of length {len}")]
    ClassOutOfRange { class: usize, len: usize },
    #[error("unknown score rule: {0} (expected `argmax-index` or `class-probability:<N>`)")]
    UnknownRule(String),
}

/// Index of the largest score. Ties go to the first occurrence.
///
/// Any NaN makes the whole output unusable, so it is rejected rather than
/// ranked around.
pub fn arg_max(output: &OutputVector) -> Result<usize, PostprocessError> {
    let mut best: Option<(usize, f32)> = None;

    for (i, &v) in output.values.iter().enumerate() {
        if v.is_nan() {
            return Err(PostprocessError::NanOutput { index: i });
        }
        match best {
            Some((_, best_v)) if v <= best_v => {}
            _ => best = Some((i, v)),
        }
    }

    best.map(|(i, _)| i).ok_or(PostprocessError::EmptyOutput)
}

/// How the output vector is reduced to the number handed to the decision gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoreRule {
    /// The arg-max class index itself is the score. With a 0.5 threshold any
    /// index other than 0 passes.
    #[default]
    ArgMaxIndex,
    /// The score of one designated class.
    ClassProbability { class: usize },
}

impl ScoreRule {
    /// Reduce `output` to a decision signal.
    pub fn score(&self, output: &OutputVector) -> Result<f32, PostprocessError> {
        let index = arg_max(output)?;
        match *self {
            ScoreRule::ArgMaxIndex => Ok(index as f32),
            ScoreRule::ClassProbability { class } => {
                output
                    .values
                    .get(class)
                    .copied()
                    .ok_or(PostprocessError::ClassOutOfRange {
                        class,
                        len: output.len(),
                    })
            }
        }
    }
}

impl fmt::Display for ScoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreRule::ArgMaxIndex => write!(f, "argmax-index"),
            ScoreRule::ClassProbability { class } => write!(f, "class-probability:{class}"),
        }
    }
}

impl FromStr for ScoreRule {
    type Err = PostprocessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "argmax-index" {
            return Ok(ScoreRule::ArgMaxIndex);
        }
        s.strip_prefix("class-probability:")
            .and_then(|n| n.parse().ok())
            .map(|class| ScoreRule::ClassProbability { class })
            .ok_or_else(|| PostprocessError::UnknownRule(s.to_string()))
    }
}
