//! Named pipeline outputs.

use crate::domain::DerivedSeries;
use crate::stats::RegressionFit;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Identifies one derived output series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    PriceCorrelation,
    VwapCorrelation,
    ReturnCorrelation,
    RocPriceCorrelation,
    RocVwapCorrelation,
    RocReturnCorrelation,
    NormalizedRocPriceCorrelation,
    NormalizedRocVwapCorrelation,
    NormalizedRocReturnCorrelation,
    DetrendedPriceCorrelation,
    DetrendedVwapCorrelation,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 11] = [
        SeriesKind::PriceCorrelation,
        SeriesKind::VwapCorrelation,
        SeriesKind::ReturnCorrelation,
        SeriesKind::RocPriceCorrelation,
        SeriesKind::RocVwapCorrelation,
        SeriesKind::RocReturnCorrelation,
        SeriesKind::NormalizedRocPriceCorrelation,
        SeriesKind::NormalizedRocVwapCorrelation,
        SeriesKind::NormalizedRocReturnCorrelation,
        SeriesKind::DetrendedPriceCorrelation,
        SeriesKind::DetrendedVwapCorrelation,
    ];

    /// Column/key name used in exports.
    pub fn key(&self) -> &'static str {
        match self {
            Self::PriceCorrelation => "price_correlation",
            Self::VwapCorrelation => "vwap_correlation",
            Self::ReturnCorrelation => "return_correlation",
            Self::RocPriceCorrelation => "roc_price_correlation",
            Self::RocVwapCorrelation => "roc_vwap_correlation",
            Self::RocReturnCorrelation => "roc_return_correlation",
            Self::NormalizedRocPriceCorrelation => "normalized_roc_price_correlation",
            Self::NormalizedRocVwapCorrelation => "normalized_roc_vwap_correlation",
            Self::NormalizedRocReturnCorrelation => "normalized_roc_return_correlation",
            Self::DetrendedPriceCorrelation => "detrended_price_correlation",
            Self::DetrendedVwapCorrelation => "detrended_vwap_correlation",
        }
    }

    /// Human-readable chart label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PriceCorrelation => "Price Action Correlation",
            Self::VwapCorrelation => "VWAP Correlation",
            Self::ReturnCorrelation => "Return Correlation",
            Self::RocPriceCorrelation => "ROC Price Corr",
            Self::RocVwapCorrelation => "ROC VWAP Corr",
            Self::RocReturnCorrelation => "ROC Return Corr",
            Self::NormalizedRocPriceCorrelation => "Normalized ROC Price Corr",
            Self::NormalizedRocVwapCorrelation => "Normalized ROC VWAP Corr",
            Self::NormalizedRocReturnCorrelation => "Normalized ROC Return Corr",
            Self::DetrendedPriceCorrelation => "Det. Price Correlation",
            Self::DetrendedVwapCorrelation => "Det. VWAP Correlation",
        }
    }
}

impl fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Which return series a regression was fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnBasis {
    Close,
    Vwap,
}

impl fmt::Display for ReturnBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Close => f.write_str("close"),
            Self::Vwap => f.write_str("vwap"),
        }
    }
}

/// One detrending regression: an instrument's returns on its benchmark's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionSummary {
    pub symbol: String,
    pub benchmark: String,
    pub basis: ReturnBasis,
    pub fit: RegressionFit,
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub first_symbol: String,
    pub second_symbol: String,
    pub window: usize,
    pub series: BTreeMap<SeriesKind, DerivedSeries>,
    pub regressions: Vec<RegressionSummary>,
}

impl PipelineOutput {
    pub fn get(&self, kind: SeriesKind) -> Option<&DerivedSeries> {
        self.series.get(&kind)
    }

    /// Union of every output series' date axis, ascending.
    pub fn date_axis(&self) -> Vec<NaiveDate> {
        let dates: BTreeSet<NaiveDate> = self
            .series
            .values()
            .flat_map(|s| s.dates().iter().copied())
            .collect();
        dates.into_iter().collect()
    }
}
