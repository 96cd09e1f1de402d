//! Statistical primitives over date-indexed series.
//!
//! Every primitive is a pure function of its inputs. Missing values are
//! `NaN` and propagate: a primitive never turns a missing input into a
//! valid-looking output.

pub mod correlation;
pub mod normalize;
pub mod ols;
pub mod returns;
pub mod roc;
pub mod vwap;

pub use correlation::{pearson, RollingCorrelation};
pub use normalize::{normalize, NormalizationPolicy};
pub use ols::{fit_ols, OlsFit, RegressionFit};
pub use returns::{pct_change, simple_returns};
pub use roc::Roc;
pub use vwap::cumulative_vwap;

/// Relative spread below which a sample is treated as constant.
///
/// Compounding rounding noise on an otherwise constant series sits many
/// orders of magnitude below this.
pub(crate) const RELATIVE_SPREAD_EPSILON: f64 = 1e-12;

/// True when the standard deviation implied by `sum_sq_dev` over `n`
/// points is negligible relative to the sample's magnitude.
pub(crate) fn negligible_spread(values: &[f64], sum_sq_dev: f64) -> bool {
    let n = values.len() as f64;
    let scale = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let threshold = scale * RELATIVE_SPREAD_EPSILON;
    sum_sq_dev <= n * threshold * threshold
}

/// Create synthetic bars from close prices for testing.
///
/// high = close + 1, low = close - 1, open = previous close, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2022, 3, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: base_date + chrono::Duration::days(i as i64),
            open: if i == 0 { close } else { closes[i - 1] },
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        })
        .collect()
}

/// Derived series on a consecutive-day axis starting 2022-03-02.
#[cfg(test)]
pub fn make_series(values: &[f64]) -> crate::domain::DerivedSeries {
    let base_date = chrono::NaiveDate::from_ymd_opt(2022, 3, 2).unwrap();
    let dates = (0..values.len())
        .map(|i| base_date + chrono::Duration::days(i as i64))
        .collect();
    crate::domain::DerivedSeries::new(dates, values.to_vec()).unwrap()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for statistics tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
