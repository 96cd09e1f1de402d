//! Per-series summary statistics for reports.

use crate::domain::DerivedSeries;
use crate::pipeline::{PipelineOutput, SeriesKind};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SeriesSummary {
    pub kind: SeriesKind,
    pub points: usize,
    pub valid: usize,
    pub last: Option<(NaiveDate, f64)>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl SeriesSummary {
    pub fn from_series(kind: SeriesKind, series: &DerivedSeries) -> Self {
        let valid = series.valid_values();
        let (min, max, mean) = if valid.is_empty() {
            (None, None, None)
        } else {
            let min = valid.iter().copied().fold(f64::INFINITY, f64::min);
            let max = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let mean = valid.iter().sum::<f64>() / valid.len() as f64;
            (Some(min), Some(max), Some(mean))
        };
        Self {
            kind,
            points: series.len(),
            valid: valid.len(),
            last: series.last_valid(),
            min,
            max,
            mean,
        }
    }
}

/// One summary per output series, in `SeriesKind::ALL` order.
pub fn summarize(output: &PipelineOutput) -> Vec<SeriesSummary> {
    SeriesKind::ALL
        .iter()
        .filter_map(|&kind| output.get(kind).map(|s| SeriesSummary::from_series(kind, s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 5, day).unwrap()
    }

    #[test]
    fn ignores_missing_values() {
        let series =
            DerivedSeries::new(vec![d(2), d(3), d(4), d(5)], vec![f64::NAN, 0.5, -0.5, f64::NAN])
                .unwrap();
        let s = SeriesSummary::from_series(SeriesKind::PriceCorrelation, &series);
        assert_eq!(s.points, 4);
        assert_eq!(s.valid, 2);
        assert_eq!(s.last, Some((d(4), -0.5)));
        assert_eq!(s.min, Some(-0.5));
        assert_eq!(s.max, Some(0.5));
        assert_eq!(s.mean, Some(0.0));
    }

    #[test]
    fn all_missing_has_no_stats() {
        let series = DerivedSeries::missing(vec![d(2), d(3)]);
        let s = SeriesSummary::from_series(SeriesKind::VwapCorrelation, &series);
        assert_eq!(s.valid, 0);
        assert!(s.last.is_none() && s.mean.is_none());
    }
}
