//! Errors raised by the statistics pipeline.

use thiserror::Error;

/// Structured pipeline failure.
///
/// Every variant is recoverable by the caller; a failed run never panics.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("insufficient data for {context}: need at least {required} observations, got {available}")]
    InsufficientData {
        context: String,
        required: usize,
        available: usize,
    },

    #[error("degenerate regression for {context}: independent variable has zero variance")]
    DegenerateRegression { context: String },

    #[error("misaligned series '{symbol}': {reason}")]
    MisalignedSeries { symbol: String, reason: String },

    #[error("benchmark '{symbol}' was not supplied to the pipeline")]
    UnknownBenchmark { symbol: String },

    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}
