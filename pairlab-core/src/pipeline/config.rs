//! Numeric parameters of a pipeline run.

use crate::error::PipelineError;
use crate::stats::NormalizationPolicy;
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW: usize = 20;
pub const DEFAULT_ROC_LAG: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Rolling correlation window, in trading days.
    pub window: usize,
    /// Lag of the rate-of-change applied to each correlation series.
    pub roc_lag: usize,
    pub normalization: NormalizationPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            roc_lag: DEFAULT_ROC_LAG,
            normalization: NormalizationPolicy::FullHistory,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.window < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "window must be >= 2, got {}",
                self.window
            )));
        }
        if self.roc_lag == 0 {
            return Err(PipelineError::InvalidConfig("roc_lag must be >= 1".into()));
        }
        self.normalization.validate()
    }
}
