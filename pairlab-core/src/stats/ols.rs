//! Ordinary least squares with intercept: y = β0 + β1·x + ε.
//!
//! The two series are inner-joined by date (rows with a missing value on
//! either side are dropped), the fit is in-sample over every remaining row,
//! and the residuals are returned on the dates of those rows.

use super::negligible_spread;
use crate::domain::DerivedSeries;
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// Minimum number of observations for a two-parameter fit.
pub const MIN_OBSERVATIONS: usize = 2;

/// Fitted coefficients and goodness of fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionFit {
    pub intercept: f64,
    pub slope: f64,
    pub r_squared: f64,
    pub observations: usize,
}

impl RegressionFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// A fit together with its in-sample residuals.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub fit: RegressionFit,
    pub residuals: DerivedSeries,
}

/// Regress `y` on `x` with an intercept.
///
/// `context` names the regression in error messages.
pub fn fit_ols(
    y: &DerivedSeries,
    x: &DerivedSeries,
    context: &str,
) -> Result<OlsFit, PipelineError> {
    let joined = y.join_complete(x);
    let n = joined.len();
    if n < MIN_OBSERVATIONS {
        return Err(PipelineError::InsufficientData {
            context: context.to_string(),
            required: MIN_OBSERVATIONS,
            available: n,
        });
    }

    let ys = &joined.left;
    let xs = &joined.right;
    let nf = n as f64;
    let mean_x = xs.iter().sum::<f64>() / nf;
    let mean_y = ys.iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (xi, yi) in xs.iter().zip(ys) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }

    if negligible_spread(xs, sxx) {
        return Err(PipelineError::DegenerateRegression {
            context: context.to_string(),
        });
    }

    let slope = sxy / sxx;
    let mut fit = RegressionFit {
        intercept: mean_y - slope * mean_x,
        slope,
        r_squared: 1.0,
        observations: n,
    };

    let residuals: Vec<f64> = xs
        .iter()
        .zip(ys)
        .map(|(xi, yi)| yi - fit.predict(*xi))
        .collect();
    let ssr: f64 = residuals.iter().map(|e| e * e).sum();
    if syy > 0.0 {
        fit.r_squared = 1.0 - ssr / syy;
    }

    Ok(OlsFit {
        fit,
        residuals: DerivedSeries::from_parts(joined.dates, residuals),
    })
}
