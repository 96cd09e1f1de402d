//! Date-indexed series: raw price history and derived scalar series.
//!
//! Missing values are stored as `NaN` and surface as `None` through the
//! accessors. Any operation combining two series joins them by date first.

use super::bar::Bar;
use crate::error::PipelineError;
use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;

/// Daily OHLCV history for one instrument.
///
/// Invariant: dates strictly increasing (no duplicates, no reordering).
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a price series, rejecting non-monotonic or duplicate dates.
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, PipelineError> {
        let symbol = symbol.into();
        if let Some(pos) = bars.windows(2).position(|w| w[0].date >= w[1].date) {
            return Err(PipelineError::MisalignedSeries {
                reason: format!(
                    "dates not strictly increasing at {} -> {}",
                    bars[pos].date,
                    bars[pos + 1].date
                ),
                symbol,
            });
        }
        Ok(Self { symbol, bars })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Close prices as a derived series on this series' date axis.
    pub fn closes(&self) -> DerivedSeries {
        DerivedSeries::from_parts(self.dates(), self.bars.iter().map(|b| b.close).collect())
    }

    /// Restrict to bars with `start <= date <= end`.
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            symbol: self.symbol.clone(),
            bars: self
                .bars
                .iter()
                .filter(|b| b.date >= start && b.date <= end)
                .cloned()
                .collect(),
        }
    }
}

/// Scalar series aligned to a date axis.
#[derive(Debug, Clone, Serialize)]
pub struct DerivedSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl DerivedSeries {
    /// Build a derived series from matching date and value vectors.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self, PipelineError> {
        if dates.len() != values.len() {
            return Err(PipelineError::MisalignedSeries {
                symbol: "derived".into(),
                reason: format!("{} dates but {} values", dates.len(), values.len()),
            });
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(PipelineError::MisalignedSeries {
                symbol: "derived".into(),
                reason: "dates not strictly increasing".into(),
            });
        }
        Ok(Self::from_parts(dates, values))
    }

    /// Unchecked constructor for internal callers that already hold a valid axis.
    pub(crate) fn from_parts(dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        Self { dates, values }
    }

    /// A series of the given axis with every entry missing.
    pub fn missing(dates: Vec<NaiveDate>) -> Self {
        let values = vec![f64::NAN; dates.len()];
        Self { dates, values }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Raw values, `NaN` where missing.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().filter(|v| !v.is_nan())
    }

    /// Value on a given date, `None` if the date is absent or the entry is missing.
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .and_then(|i| self.value_at(i))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (NaiveDate, Option<f64>)> + '_ {
        self.dates
            .iter()
            .zip(&self.values)
            .map(|(d, v)| (*d, if v.is_nan() { None } else { Some(*v) }))
    }

    /// Non-missing values in date order.
    pub fn valid_values(&self) -> Vec<f64> {
        self.values.iter().copied().filter(|v| !v.is_nan()).collect()
    }

    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(|v| v.is_nan())
    }

    pub fn last_valid(&self) -> Option<(NaiveDate, f64)> {
        self.iter().rev().find_map(|(d, v)| v.map(|v| (d, v)))
    }

    /// Outer join on the union of both date axes. Dates present in only
    /// one side get a missing value on the other.
    pub fn join(&self, other: &DerivedSeries) -> JoinedPair {
        let mut dates = Vec::with_capacity(self.len().max(other.len()));
        let mut left = Vec::with_capacity(dates.capacity());
        let mut right = Vec::with_capacity(dates.capacity());
        let (mut i, mut j) = (0, 0);

        while i < self.len() || j < other.len() {
            let order = match (self.dates.get(i), other.dates.get(j)) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => Ordering::Less,
                (None, _) => Ordering::Greater,
            };
            match order {
                Ordering::Less => {
                    dates.push(self.dates[i]);
                    left.push(self.values[i]);
                    right.push(f64::NAN);
                    i += 1;
                }
                Ordering::Greater => {
                    dates.push(other.dates[j]);
                    left.push(f64::NAN);
                    right.push(other.values[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    dates.push(self.dates[i]);
                    left.push(self.values[i]);
                    right.push(other.values[j]);
                    i += 1;
                    j += 1;
                }
            }
        }

        JoinedPair { dates, left, right }
    }

    /// Inner join keeping only dates where both sides have a value.
    pub fn join_complete(&self, other: &DerivedSeries) -> JoinedPair {
        let joined = self.join(other);
        let mut out = JoinedPair {
            dates: Vec::with_capacity(joined.dates.len()),
            left: Vec::with_capacity(joined.dates.len()),
            right: Vec::with_capacity(joined.dates.len()),
        };
        for ((d, l), r) in joined.dates.iter().zip(&joined.left).zip(&joined.right) {
            if !l.is_nan() && !r.is_nan() {
                out.dates.push(*d);
                out.left.push(*l);
                out.right.push(*r);
            }
        }
        out
    }
}

/// Two value vectors sharing one date axis, the result of a date join.
#[derive(Debug, Clone)]
pub struct JoinedPair {
    pub dates: Vec<NaiveDate>,
    pub left: Vec<f64>,
    pub right: Vec<f64>,
}

impl JoinedPair {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 3, day).unwrap()
    }

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: d(day),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn price_series_rejects_duplicate_dates() {
        let err = PriceSeries::new("AVGO", vec![bar(2, 1.0), bar(2, 2.0)]).unwrap_err();
        assert!(matches!(err, PipelineError::MisalignedSeries { .. }));
    }

    #[test]
    fn price_series_rejects_unsorted_dates() {
        let err = PriceSeries::new("AVGO", vec![bar(3, 1.0), bar(2, 2.0)]).unwrap_err();
        assert!(err.to_string().contains("AVGO"));
    }

    #[test]
    fn between_trims_inclusive() {
        let s = PriceSeries::new("X", vec![bar(1, 1.0), bar(2, 2.0), bar(3, 3.0)]).unwrap();
        let t = s.between(d(2), d(3));
        assert_eq!(t.len(), 2);
        assert_eq!(t.first_date(), Some(d(2)));
    }

    #[test]
    fn join_uses_date_union() {
        let a = DerivedSeries::new(vec![d(1), d(2), d(4)], vec![1.0, 2.0, 4.0]).unwrap();
        let b = DerivedSeries::new(vec![d(2), d(3), d(4)], vec![20.0, 30.0, 40.0]).unwrap();
        let j = a.join(&b);

        assert_eq!(j.dates, vec![d(1), d(2), d(3), d(4)]);
        assert!(j.right[0].is_nan());
        assert_eq!(j.left[1], 2.0);
        assert_eq!(j.right[1], 20.0);
        assert!(j.left[2].is_nan());
        assert_eq!(j.right[3], 40.0);
    }

    #[test]
    fn join_complete_drops_missing_rows() {
        let a = DerivedSeries::new(vec![d(1), d(2), d(3)], vec![f64::NAN, 2.0, 3.0]).unwrap();
        let b = DerivedSeries::new(vec![d(1), d(2), d(3)], vec![1.0, f64::NAN, 3.0]).unwrap();
        let j = a.join_complete(&b);
        assert_eq!(j.dates, vec![d(3)]);
    }

    #[test]
    fn get_and_last_valid() {
        let s = DerivedSeries::new(vec![d(1), d(2), d(3)], vec![1.0, 2.0, f64::NAN]).unwrap();
        assert_eq!(s.get(d(2)), Some(2.0));
        assert_eq!(s.get(d(3)), None);
        assert_eq!(s.get(d(9)), None);
        assert_eq!(s.last_valid(), Some((d(2), 2.0)));
        assert_eq!(s.valid_count(), 2);
    }

    #[test]
    fn new_rejects_length_mismatch() {
        assert!(DerivedSeries::new(vec![d(1)], vec![]).is_err());
    }
}
