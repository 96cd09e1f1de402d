//! Rolling Pearson correlation between two date-indexed series.
//!
//! The inputs are outer-joined by date. Output[t] is the correlation over
//! the `window` joined rows ending at t; it is missing during warm-up, when
//! any value in the window is missing, or when either side is constant over
//! the window.

use super::negligible_spread;
use crate::domain::DerivedSeries;
use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingCorrelation {
    window: usize,
}

impl RollingCorrelation {
    pub fn new(window: usize) -> Result<Self, PipelineError> {
        if window < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "correlation window must be >= 2, got {window}"
            )));
        }
        Ok(Self { window })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Number of leading entries that are always missing.
    pub fn lookback(&self) -> usize {
        self.window - 1
    }

    pub fn compute(&self, a: &DerivedSeries, b: &DerivedSeries) -> DerivedSeries {
        let joined = a.join(b);
        let n = joined.len();
        let mut result = vec![f64::NAN; n];

        for end in self.lookback()..n {
            let start = end + 1 - self.window;
            if let Some(r) = pearson(&joined.left[start..=end], &joined.right[start..=end]) {
                result[end] = r;
            }
        }

        DerivedSeries::from_parts(joined.dates, result)
    }
}

/// Pearson correlation of two equal-length samples.
///
/// `None` when the lengths differ, fewer than two points are given, any
/// value is missing, or either sample has no spread.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    if x.iter().chain(y).any(|v| v.is_nan()) {
        return None;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if negligible_spread(x, var_x) || negligible_spread(y, var_y) {
        return None;
    }

    Some((cov / (var_x * var_y).sqrt()).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{assert_approx, make_series, DEFAULT_EPSILON};
    use chrono::NaiveDate;

    fn wave(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect()
    }

    #[test]
    fn window_below_two_is_rejected() {
        assert!(RollingCorrelation::new(1).is_err());
        assert!(RollingCorrelation::new(0).is_err());
    }

    #[test]
    fn length_and_warmup() {
        let a = make_series(&wave(30));
        let b = make_series(&wave(30).iter().map(|v| v * 2.0 + 1.0).collect::<Vec<_>>());
        let corr = RollingCorrelation::new(20).unwrap().compute(&a, &b);

        assert_eq!(corr.len(), 30);
        for i in 0..19 {
            assert_eq!(corr.value_at(i), None, "expected missing at {i}");
        }
        for i in 19..30 {
            assert_approx(corr.value_at(i).unwrap(), 1.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn self_correlation_is_one() {
        let a = make_series(&wave(25));
        let corr = RollingCorrelation::new(20).unwrap().compute(&a, &a);
        for i in 19..25 {
            assert_approx(corr.value_at(i).unwrap(), 1.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn perfect_negative() {
        let up: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let down: Vec<f64> = (0..10).map(|i| 10.0 - i as f64).collect();
        let corr = RollingCorrelation::new(5)
            .unwrap()
            .compute(&make_series(&up), &make_series(&down));
        assert_approx(corr.value_at(9).unwrap(), -1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn constant_window_is_missing_not_zero() {
        let flat = make_series(&[5.0; 10]);
        let moving = make_series(&wave(10));
        let corr = RollingCorrelation::new(5).unwrap().compute(&flat, &moving);
        assert!(corr.is_all_missing());
    }

    #[test]
    fn missing_value_poisons_its_windows() {
        let mut values = wave(12);
        values[6] = f64::NAN;
        let a = make_series(&values);
        let b = make_series(&wave(12));
        let corr = RollingCorrelation::new(3).unwrap().compute(&a, &b);

        assert!(corr.value_at(5).is_some());
        assert_eq!(corr.value_at(6), None);
        assert_eq!(corr.value_at(7), None);
        assert_eq!(corr.value_at(8), None);
        assert!(corr.value_at(9).is_some());
    }

    #[test]
    fn joins_by_date_not_position() {
        let base = NaiveDate::from_ymd_opt(2022, 3, 2).unwrap();
        let days = |r: std::ops::Range<i64>| -> Vec<NaiveDate> {
            r.map(|i| base + chrono::Duration::days(i)).collect()
        };
        let a = DerivedSeries::new(days(0..10), wave(10)).unwrap();
        // Same values shifted two days later: positional pairing would give 1.0.
        let b = DerivedSeries::new(days(2..12), wave(10)).unwrap();
        let corr = RollingCorrelation::new(3).unwrap().compute(&a, &b);

        assert_eq!(corr.len(), 12);
        assert_eq!(corr.dates()[0], base);
        let on_overlap = corr.get(base + chrono::Duration::days(6)).unwrap();
        assert!(on_overlap < 0.999);
    }

    #[test]
    fn pearson_rejects_mismatched_lengths() {
        assert_eq!(pearson(&[1.0, 2.0], &[1.0]), None);
        assert_eq!(pearson(&[1.0], &[1.0]), None);
    }
}
