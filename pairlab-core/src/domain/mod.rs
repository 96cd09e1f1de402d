//! Domain types: daily bars, price histories and date-indexed derived series.

pub mod bar;
pub mod series;

pub use bar::Bar;
pub use series::{DerivedSeries, JoinedPair, PriceSeries};
