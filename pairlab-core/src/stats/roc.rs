//! Rate of Change (ROC) of a derived series.
//!
//! ROC[t] = value[t] / value[t-lag] - 1, as a fraction (not percent).
//! Lookback: lag.

use crate::domain::DerivedSeries;
use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roc {
    lag: usize,
}

impl Roc {
    pub fn new(lag: usize) -> Result<Self, PipelineError> {
        if lag == 0 {
            return Err(PipelineError::InvalidConfig("ROC lag must be >= 1".into()));
        }
        Ok(Self { lag })
    }

    pub fn lookback(&self) -> usize {
        self.lag
    }

    pub fn compute(&self, series: &DerivedSeries) -> DerivedSeries {
        let values = series.values();
        let n = values.len();
        let mut result = vec![f64::NAN; n];

        for i in self.lag..n {
            let prev = values[i - self.lag];
            let curr = values[i];
            if !(prev.is_nan() || curr.is_nan() || prev == 0.0) {
                result[i] = curr / prev - 1.0;
            }
        }

        DerivedSeries::from_parts(series.dates().to_vec(), result)
    }
}
