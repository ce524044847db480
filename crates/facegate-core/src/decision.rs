/// Threshold observed in the deployed configuration.
pub const DEFAULT_LIVENESS_THRESHOLD: f32 = 0.5;

/// Liveness verdict: live iff `score` is strictly above `threshold`.
pub fn decide(score: f32, threshold: f32) -> bool {
    score > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decide_boundary_is_strict() {
        assert!(!decide(0.5, 0.5));
        assert!(decide(0.500001, 0.5));
    }

    #[test]
    fn test_decide_index_scores() {
        assert!(!decide(0.0, DEFAULT_LIVENESS_THRESHOLD));
        assert!(decide(1.0, DEFAULT_LIVENESS_THRESHOLD));
        assert!(decide(7.0, DEFAULT_LIVENESS_THRESHOLD));
    }

    #[test]
    fn test_decide_nan_is_not_live() {
        assert!(!decide(f32::NAN, DEFAULT_LIVENESS_THRESHOLD));
    }
}
