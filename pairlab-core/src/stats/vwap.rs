//! Cumulative volume-weighted average price.
//!
//! VWAP[t] = Σ_{i<=t} typical[i]·volume[i] / Σ_{i<=t} volume[i],
//! typical = (high + low + close) / 3, anchored at the first bar.
//!
//! Maintained as a running weighted mean, so the first bar with volume
//! returns its typical price exactly. Entries are missing while the
//! cumulative volume is zero, and on bars whose typical price is not finite
//! (those bars also contribute nothing to later entries).

use crate::domain::{DerivedSeries, PriceSeries};

pub fn cumulative_vwap(series: &PriceSeries) -> DerivedSeries {
    let mut values = Vec::with_capacity(series.len());
    let mut cum_volume = 0.0_f64;
    let mut vwap = f64::NAN;

    for bar in series.bars() {
        let typical = bar.typical_price();
        if !typical.is_finite() {
            values.push(f64::NAN);
            continue;
        }

        let volume = bar.volume as f64;
        cum_volume += volume;
        if cum_volume > 0.0 {
            let weight = volume / cum_volume;
            vwap = if vwap.is_nan() {
                typical
            } else {
                vwap + (typical - vwap) * weight
            };
        }
        values.push(vwap);
    }

    DerivedSeries::from_parts(series.dates(), values)
}
