//! Correlation and detrending pipeline.
//!
//! Given daily history for two instruments and their benchmark indices,
//! derives VWAP and returns per instrument, rolling correlations between the
//! pair, the ROC and normalized ROC of each correlation, and correlations of
//! the residuals left after regressing each instrument on its own benchmark.
//!
//! Each instrument names its benchmark, so a shared index and two distinct
//! indices go through the same code. The pipeline is deterministic: no
//! clock, no I/O, no shared state.

pub mod config;
pub mod output;

pub use config::PipelineConfig;
pub use output::{PipelineOutput, RegressionSummary, ReturnBasis, SeriesKind};

use crate::domain::{DerivedSeries, PriceSeries};
use crate::error::PipelineError;
use crate::stats::{
    cumulative_vwap, fit_ols, normalize, pct_change, simple_returns, Roc, RollingCorrelation,
};
use std::collections::BTreeMap;
use tracing::debug;

/// One side of the pair: its price history and the symbol of its benchmark.
#[derive(Debug, Clone)]
pub struct PairLeg {
    pub series: PriceSeries,
    pub benchmark: String,
}

impl PairLeg {
    pub fn new(series: PriceSeries, benchmark: impl Into<String>) -> Self {
        Self {
            series,
            benchmark: benchmark.into(),
        }
    }

    pub fn symbol(&self) -> &str {
        self.series.symbol()
    }
}

/// Already-fetched input to a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub first: PairLeg,
    pub second: PairLeg,
    /// Benchmark history keyed by symbol. One entry when both legs share
    /// an index, two when they differ.
    pub benchmarks: BTreeMap<String, PriceSeries>,
}

impl PipelineInput {
    pub fn new(first: PairLeg, second: PairLeg, benchmarks: Vec<PriceSeries>) -> Self {
        let benchmarks = benchmarks
            .into_iter()
            .map(|s| (s.symbol().to_string(), s))
            .collect();
        Self {
            first,
            second,
            benchmarks,
        }
    }

    fn benchmark_for(&self, leg: &PairLeg) -> Result<&PriceSeries, PipelineError> {
        self.benchmarks
            .get(&leg.benchmark)
            .ok_or_else(|| PipelineError::UnknownBenchmark {
                symbol: leg.benchmark.clone(),
            })
    }
}

/// Per-instrument fields every downstream stage reads.
struct LegFields {
    close: DerivedSeries,
    vwap: DerivedSeries,
    close_returns: DerivedSeries,
    vwap_returns: DerivedSeries,
}

impl LegFields {
    fn derive(series: &PriceSeries) -> Self {
        let vwap = cumulative_vwap(series);
        let vwap_returns = pct_change(&vwap);
        Self {
            close: series.closes(),
            close_returns: simple_returns(series),
            vwap,
            vwap_returns,
        }
    }
}

/// Run the full pipeline.
pub fn run_pipeline(
    input: &PipelineInput,
    config: &PipelineConfig,
) -> Result<PipelineOutput, PipelineError> {
    config.validate()?;

    for leg in [&input.first, &input.second] {
        if leg.series.is_empty() {
            return Err(PipelineError::InsufficientData {
                context: format!("{} price history", leg.symbol()),
                required: 1,
                available: 0,
            });
        }
    }
    let first_bench = input.benchmark_for(&input.first)?;
    let second_bench = input.benchmark_for(&input.second)?;

    let a = LegFields::derive(&input.first.series);
    let b = LegFields::derive(&input.second.series);
    debug!(
        first = input.first.symbol(),
        second = input.second.symbol(),
        first_bars = input.first.series.len(),
        second_bars = input.second.series.len(),
        "derived vwap and returns"
    );

    let corr = RollingCorrelation::new(config.window)?;
    let roc = Roc::new(config.roc_lag)?;
    let mut series = BTreeMap::new();

    let correlations = [
        (
            SeriesKind::PriceCorrelation,
            SeriesKind::RocPriceCorrelation,
            SeriesKind::NormalizedRocPriceCorrelation,
            corr.compute(&a.close, &b.close),
        ),
        (
            SeriesKind::VwapCorrelation,
            SeriesKind::RocVwapCorrelation,
            SeriesKind::NormalizedRocVwapCorrelation,
            corr.compute(&a.vwap, &b.vwap),
        ),
        (
            SeriesKind::ReturnCorrelation,
            SeriesKind::RocReturnCorrelation,
            SeriesKind::NormalizedRocReturnCorrelation,
            corr.compute(&a.close_returns, &b.close_returns),
        ),
    ];
    for (kind, roc_kind, norm_kind, values) in correlations {
        let roc_values = roc.compute(&values);
        let normalized = normalize(&roc_values, config.normalization);
        debug!(
            series = %kind,
            valid = values.valid_count(),
            roc_valid = roc_values.valid_count(),
            "rolling correlation"
        );
        series.insert(kind, values);
        series.insert(roc_kind, roc_values);
        series.insert(norm_kind, normalized);
    }

    let first_bench_returns = simple_returns(first_bench);
    let second_bench_returns = simple_returns(second_bench);

    let mut regressions = Vec::with_capacity(4);
    let mut detrend = |leg: &PairLeg,
                       returns: &DerivedSeries,
                       bench_returns: &DerivedSeries,
                       basis: ReturnBasis|
     -> Result<DerivedSeries, PipelineError> {
        let context = format!("{} {basis} returns on {}", leg.symbol(), leg.benchmark);
        let ols = fit_ols(returns, bench_returns, &context)?;
        debug!(
            %context,
            slope = ols.fit.slope,
            intercept = ols.fit.intercept,
            r_squared = ols.fit.r_squared,
            observations = ols.fit.observations,
            "fitted detrending regression"
        );
        regressions.push(RegressionSummary {
            symbol: leg.symbol().to_string(),
            benchmark: leg.benchmark.clone(),
            basis,
            fit: ols.fit,
        });
        Ok(ols.residuals)
    };

    let a_price_resid = detrend(
        &input.first,
        &a.close_returns,
        &first_bench_returns,
        ReturnBasis::Close,
    )?;
    let b_price_resid = detrend(
        &input.second,
        &b.close_returns,
        &second_bench_returns,
        ReturnBasis::Close,
    )?;
    let a_vwap_resid = detrend(
        &input.first,
        &a.vwap_returns,
        &first_bench_returns,
        ReturnBasis::Vwap,
    )?;
    let b_vwap_resid = detrend(
        &input.second,
        &b.vwap_returns,
        &second_bench_returns,
        ReturnBasis::Vwap,
    )?;

    series.insert(
        SeriesKind::DetrendedPriceCorrelation,
        corr.compute(&a_price_resid, &b_price_resid),
    );
    series.insert(
        SeriesKind::DetrendedVwapCorrelation,
        corr.compute(&a_vwap_resid, &b_vwap_resid),
    );

    Ok(PipelineOutput {
        first_symbol: input.first.symbol().to_string(),
        second_symbol: input.second.symbol().to_string(),
        window: config.window,
        series,
        regressions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;
    use crate::stats::make_bars;

    fn leg(symbol: &str, closes: &[f64], benchmark: &str) -> PairLeg {
        PairLeg::new(PriceSeries::new(symbol, make_bars(closes)).unwrap(), benchmark)
    }

    fn bench(symbol: &str, closes: &[f64]) -> PriceSeries {
        PriceSeries::new(symbol, make_bars(closes)).unwrap()
    }

    fn wave(n: usize, phase: f64) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + (i as f64 * 0.45 + phase).sin() * 4.0 + i as f64 * 0.1)
            .collect()
    }

    #[test]
    fn produces_every_named_series() {
        let input = PipelineInput::new(
            leg("AVGO", &wave(60, 0.0), "^IXIC"),
            leg("VMW", &wave(60, 0.8), "^NYA"),
            vec![bench("^IXIC", &wave(60, 1.7)), bench("^NYA", &wave(60, 2.9))],
        );
        let out = run_pipeline(&input, &PipelineConfig::default()).unwrap();

        for kind in SeriesKind::ALL {
            assert!(out.get(kind).is_some(), "missing {kind}");
        }
        assert_eq!(out.regressions.len(), 4);
        assert_eq!(out.get(SeriesKind::PriceCorrelation).unwrap().len(), 60);
    }

    #[test]
    fn unknown_benchmark_is_reported() {
        let input = PipelineInput::new(
            leg("AVGO", &wave(30, 0.0), "^IXIC"),
            leg("VMW", &wave(30, 0.5), "^NYA"),
            vec![bench("^IXIC", &wave(30, 1.0))],
        );
        let err = run_pipeline(&input, &PipelineConfig::default()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::UnknownBenchmark {
                symbol: "^NYA".into()
            }
        );
    }

    #[test]
    fn empty_leg_is_insufficient() {
        let input = PipelineInput::new(
            PairLeg::new(PriceSeries::new("AVGO", Vec::<Bar>::new()).unwrap(), "^IXIC"),
            leg("VMW", &wave(30, 0.5), "^IXIC"),
            vec![bench("^IXIC", &wave(30, 1.0))],
        );
        assert!(matches!(
            run_pipeline(&input, &PipelineConfig::default()),
            Err(PipelineError::InsufficientData { .. })
        ));
    }

    #[test]
    fn invalid_config_fails_fast() {
        let input = PipelineInput::new(
            leg("AVGO", &wave(30, 0.0), "^IXIC"),
            leg("VMW", &wave(30, 0.5), "^IXIC"),
            vec![bench("^IXIC", &wave(30, 1.0))],
        );
        let config = PipelineConfig {
            window: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            run_pipeline(&input, &config),
            Err(PipelineError::InvalidConfig(_))
        ));
    }
}
