//! Simple step returns.
//!
//! return[t] = x[t] / x[t-1] - 1, return[0] missing.
//! Missing if either operand is missing or the previous value is zero.

use crate::domain::{DerivedSeries, PriceSeries};

pub fn pct_change(series: &DerivedSeries) -> DerivedSeries {
    let values = series.values();
    let mut result = vec![f64::NAN; values.len()];

    for i in 1..values.len() {
        let prev = values[i - 1];
        let curr = values[i];
        if !(prev.is_nan() || curr.is_nan() || prev == 0.0) {
            result[i] = curr / prev - 1.0;
        }
    }

    DerivedSeries::from_parts(series.dates().to_vec(), result)
}

/// Close-to-close returns of a price series.
pub fn simple_returns(series: &PriceSeries) -> DerivedSeries {
    pct_change(&series.closes())
}
