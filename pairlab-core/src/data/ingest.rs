//! Ingest: turn provider output into a clean, strictly ordered bar list.
//!
//! - sorts by date
//! - drops void bars (any OHLC field NaN)
//! - drops bars that fail the OHLC sanity check (inverted range, close <= 0)
//! - collapses duplicate dates, keeping the last occurrence (Yahoo repeats
//!   the live session as a trailing row while the market is open)

use super::provider::DataError;
use crate::domain::Bar;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct IngestResult {
    pub bars: Vec<Bar>,
    pub dropped_void: usize,
    pub dropped_invalid: usize,
    pub dropped_duplicate: usize,
}

pub fn ingest(mut bars: Vec<Bar>) -> Result<IngestResult, DataError> {
    let before = bars.len();
    bars.retain(|b| !b.is_void());
    let dropped_void = before - bars.len();

    let before = bars.len();
    bars.retain(Bar::is_sane);
    let dropped_invalid = before - bars.len();
    if dropped_invalid > 0 {
        warn!(dropped_invalid, "dropped bars failing OHLC sanity check");
    }

    // Stable sort keeps provider order among equal dates, so "last" wins below.
    bars.sort_by_key(|b| b.date);
    let mut deduped: Vec<Bar> = Vec::with_capacity(bars.len());
    let mut dropped_duplicate = 0;
    for bar in bars {
        match deduped.last_mut() {
            Some(last) if last.date == bar.date => {
                *last = bar;
                dropped_duplicate += 1;
            }
            _ => deduped.push(bar),
        }
    }

    if deduped.is_empty() {
        return Err(DataError::ValidationError(
            "no usable bars after dropping void and invalid rows".into(),
        ));
    }

    debug!(
        kept = deduped.len(),
        dropped_void, dropped_invalid, dropped_duplicate, "ingested bars"
    );

    Ok(IngestResult {
        bars: deduped,
        dropped_void,
        dropped_invalid,
        dropped_duplicate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    fn bar(day: u32, close: f64) -> Bar {
        Bar {
            date: NaiveDate::from_ymd_opt(2022, 5, day).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10,
        }
    }

    #[test]
    fn sorts_and_dedupes_keeping_last() {
        let result = ingest(vec![bar(3, 3.0), bar(2, 2.0), bar(3, 3.5)]).unwrap();
        let closes: Vec<f64> = result.bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![2.0, 3.5]);
        assert_eq!(result.dropped_duplicate, 1);
    }

    #[test]
    fn drops_void_bars() {
        let result = ingest(vec![bar(2, 2.0), bar(3, f64::NAN)]).unwrap();
        assert_eq!(result.bars.len(), 1);
        assert_eq!(result.dropped_void, 1);
    }

    #[test]
    fn drops_bars_failing_sanity_check() {
        let mut inverted = bar(3, 3.0);
        inverted.high = 2.5;
        let zero_close = bar(4, 0.0);
        let result = ingest(vec![bar(2, 2.0), inverted, zero_close, bar(5, 5.0)]).unwrap();

        let days: Vec<u32> = result.bars.iter().map(|b| b.date.day()).collect();
        assert_eq!(days, vec![2, 5]);
        assert_eq!(result.dropped_invalid, 2);
        assert_eq!(result.dropped_void, 0);
    }

    #[test]
    fn all_void_is_an_error() {
        assert!(ingest(vec![bar(2, f64::NAN)]).is_err());
        assert!(ingest(Vec::new()).is_err());
    }
}
