//! Z-score normalization with a configurable statistics policy.
//!
//! Both policies use population statistics (divide by N) over non-missing
//! values. Missing inputs stay missing; a zero standard deviation makes
//! the affected outputs missing.

use super::negligible_spread;
use crate::domain::DerivedSeries;
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Where the mean and standard deviation come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NormalizationPolicy {
    /// One mean/stddev over the whole non-missing history.
    #[default]
    FullHistory,
    /// Trailing statistics over the last `window` non-missing values.
    Rolling { window: usize },
}

impl NormalizationPolicy {
    pub fn validate(&self) -> Result<(), PipelineError> {
        match self {
            Self::FullHistory => Ok(()),
            Self::Rolling { window } if *window >= 2 => Ok(()),
            Self::Rolling { window } => Err(PipelineError::InvalidConfig(format!(
                "rolling normalization window must be >= 2, got {window}"
            ))),
        }
    }
}

pub fn normalize(series: &DerivedSeries, policy: NormalizationPolicy) -> DerivedSeries {
    let values = match policy {
        NormalizationPolicy::FullHistory => full_history(series.values()),
        NormalizationPolicy::Rolling { window } => rolling(series.values(), window),
    };
    DerivedSeries::from_parts(series.dates().to_vec(), values)
}

/// Population mean and standard deviation, `None` if empty or without spread.
fn population_stats(sample: &[f64]) -> Option<(f64, f64)> {
    if sample.is_empty() {
        return None;
    }
    let n = sample.len() as f64;
    let mean = sample.iter().sum::<f64>() / n;
    let sum_sq_dev: f64 = sample.iter().map(|v| (v - mean).powi(2)).sum();
    if negligible_spread(sample, sum_sq_dev) {
        return None;
    }
    Some((mean, (sum_sq_dev / n).sqrt()))
}

fn full_history(values: &[f64]) -> Vec<f64> {
    let valid: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    match population_stats(&valid) {
        Some((mean, std)) => values.iter().map(|v| (v - mean) / std).collect(),
        None => vec![f64::NAN; values.len()],
    }
}

fn rolling(values: &[f64], window: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    let mut trailing: VecDeque<f64> = VecDeque::with_capacity(window);

    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        if trailing.len() == window {
            trailing.pop_front();
        }
        trailing.push_back(v);
        if trailing.len() < window {
            continue;
        }
        let sample: Vec<f64> = trailing.iter().copied().collect();
        if let Some((mean, std)) = population_stats(&sample) {
            result[i] = (v - mean) / std;
        }
    }

    result
}
