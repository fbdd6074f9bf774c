// Error types shared across the analysis services

use thiserror::Error;

/// Rejection raised by weight updates that would violate the sum-to-1.0
/// invariant. The registry state is unchanged when this is returned.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("weights must sum to 1.0 (±{tolerance}), got {total:.4}")]
    WeightSum { total: f64, tolerance: f64 },

    #[error("unknown dimension id: {0}")]
    UnknownDimension(String),
}

/// Failure reported by a dimension analyzer. The scheduler converts these
/// into neutral-score markers; they never reach the engine's caller.
#[derive(Debug, Clone, Error)]
pub enum AnalyzerError {
    #[error("{dimension} analysis failed: {message}")]
    Failed {
        dimension: &'static str,
        message: String,
    },
}
