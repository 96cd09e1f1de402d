//! End-to-end pipeline scenarios on hand-built price histories.

use chrono::NaiveDate;
use pairlab_core::pipeline::{RegressionSummary, ReturnBasis};
use pairlab_core::stats::NormalizationPolicy;
use pairlab_core::{
    run_pipeline, Bar, PairLeg, PipelineConfig, PipelineError, PipelineInput, PriceSeries,
    SeriesKind,
};

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 3, 2).unwrap()
}

/// Bars on consecutive days starting `offset` days after the base date.
fn series(symbol: &str, closes: &[f64], offset: i64) -> PriceSeries {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar {
            date: base_date() + chrono::Duration::days(offset + i as i64),
            open: close,
            high: close * 1.01,
            low: close * 0.99,
            close,
            volume: 1_000_000 + (i as u64 % 7) * 50_000,
        })
        .collect();
    PriceSeries::new(symbol, bars).unwrap()
}

fn wave(n: usize, phase: f64, drift: f64) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + (i as f64 * 0.37 + phase).sin() * 5.0 + i as f64 * drift)
        .collect()
}

fn shared_input(first: PriceSeries, second: PriceSeries, bench: PriceSeries) -> PipelineInput {
    let bench_symbol = bench.symbol().to_string();
    PipelineInput::new(
        PairLeg::new(first, &bench_symbol),
        PairLeg::new(second, &bench_symbol),
        vec![bench],
    )
}

#[test]
fn identical_pair_has_unit_detrended_correlation() {
    let closes = wave(40, 0.0, 0.2);
    let input = shared_input(
        series("AAA", &closes, 0),
        series("BBB", &closes, 0),
        series("^IDX", &wave(40, 1.3, 0.05), 0),
    );
    let out = run_pipeline(&input, &PipelineConfig::default()).unwrap();

    for kind in [
        SeriesKind::DetrendedPriceCorrelation,
        SeriesKind::DetrendedVwapCorrelation,
        SeriesKind::PriceCorrelation,
    ] {
        let s = out.get(kind).unwrap();
        assert!(s.valid_count() > 0, "{kind} has no valid values");
        for v in s.valid_values() {
            assert!((v - 1.0).abs() < 1e-9, "{kind}: {v}");
        }
    }
}

#[test]
fn warm_up_is_window_minus_one() {
    let input = shared_input(
        series("AAA", &wave(60, 0.0, 0.1), 0),
        series("BBB", &wave(60, 0.9, 0.1), 0),
        series("^IDX", &wave(60, 2.0, 0.0), 0),
    );
    let config = PipelineConfig::default();
    let out = run_pipeline(&input, &config).unwrap();

    let price = out.get(SeriesKind::PriceCorrelation).unwrap();
    assert_eq!(price.len(), 60);
    for i in 0..config.window - 1 {
        assert_eq!(price.value_at(i), None);
    }
    assert!(price.value_at(config.window - 1).is_some());

    // returns start one day later
    let returns = out.get(SeriesKind::ReturnCorrelation).unwrap();
    assert_eq!(returns.value_at(config.window - 1), None);
    assert!(returns.value_at(config.window).is_some());
}

#[test]
fn constant_benchmark_is_degenerate() {
    let input = shared_input(
        series("AAA", &wave(40, 0.0, 0.1), 0),
        series("BBB", &wave(40, 0.5, 0.1), 0),
        series("^FLAT", &[250.0; 40], 0),
    );
    match run_pipeline(&input, &PipelineConfig::default()) {
        Err(PipelineError::DegenerateRegression { context }) => {
            assert!(context.contains("^FLAT"), "{context}");
        }
        other => panic!("expected DegenerateRegression, got {other:?}"),
    }
}

#[test]
fn short_overlap_yields_all_missing_correlations() {
    // 30 days each, overlapping on 15 days: no 20-day window is complete.
    let input = shared_input(
        series("AAA", &wave(30, 0.0, 0.1), 0),
        series("BBB", &wave(30, 0.7, 0.1), 15),
        series("^IDX", &wave(45, 1.9, 0.0), 0),
    );
    let out = run_pipeline(&input, &PipelineConfig::default()).unwrap();

    for kind in SeriesKind::ALL {
        let s = out.get(kind).unwrap();
        assert!(s.is_all_missing(), "{kind} should be all missing");
    }
    assert_eq!(out.get(SeriesKind::PriceCorrelation).unwrap().len(), 45);
    assert_eq!(out.regressions.len(), 4);
}

#[test]
fn holidays_are_aligned_by_date() {
    let closes = wave(50, 0.0, 0.15);
    let full = series("AAA", &closes, 0);
    let holey_bars: Vec<Bar> = full
        .bars()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 25)
        .map(|(_, b)| b.clone())
        .collect();
    let holey = PriceSeries::new("BBB", holey_bars).unwrap();

    let input = shared_input(full, holey, series("^IDX", &wave(50, 2.2, 0.0), 0));
    let out = run_pipeline(&input, &PipelineConfig::default()).unwrap();

    let price = out.get(SeriesKind::PriceCorrelation).unwrap();
    assert_eq!(price.len(), 50);
    let gap = base_date() + chrono::Duration::days(25);
    assert_eq!(price.get(gap), None);
    assert_eq!(price.value_at(44), None);
    let v = price.value_at(45).unwrap();
    assert!((v - 1.0).abs() < 1e-9);
}

fn benchmarks_of(regressions: &[RegressionSummary], basis: ReturnBasis) -> Vec<&str> {
    regressions
        .iter()
        .filter(|r| r.basis == basis)
        .map(|r| r.benchmark.as_str())
        .collect()
}

#[test]
fn shared_and_distinct_benchmarks_use_same_pipeline() {
    let first = series("AVGO", &wave(80, 0.0, 0.2), 0);
    let second = series("VMW", &wave(80, 1.1, -0.1), 0);
    let nasdaq = series("^IXIC", &wave(80, 2.3, 0.05), 0);
    let nyse = series("^NYA", &wave(80, 0.4, 0.02), 0);

    let shared = PipelineInput::new(
        PairLeg::new(first.clone(), "^IXIC"),
        PairLeg::new(second.clone(), "^IXIC"),
        vec![nasdaq.clone()],
    );
    let distinct = PipelineInput::new(
        PairLeg::new(first, "^IXIC"),
        PairLeg::new(second, "^NYA"),
        vec![nasdaq, nyse],
    );

    let config = PipelineConfig::default();
    let a = run_pipeline(&shared, &config).unwrap();
    let b = run_pipeline(&distinct, &config).unwrap();

    assert_eq!(
        benchmarks_of(&a.regressions, ReturnBasis::Close),
        vec!["^IXIC", "^IXIC"]
    );
    assert_eq!(
        benchmarks_of(&b.regressions, ReturnBasis::Close),
        vec!["^IXIC", "^NYA"]
    );

    // Undetrended series do not depend on benchmarks.
    assert_eq!(
        a.get(SeriesKind::PriceCorrelation).unwrap().valid_values(),
        b.get(SeriesKind::PriceCorrelation).unwrap().valid_values()
    );
    assert_ne!(
        a.get(SeriesKind::DetrendedPriceCorrelation)
            .unwrap()
            .valid_values(),
        b.get(SeriesKind::DetrendedPriceCorrelation)
            .unwrap()
            .valid_values()
    );
}

#[test]
fn rolling_normalization_delays_output() {
    let input = shared_input(
        series("AAA", &wave(90, 0.0, 0.1), 0),
        series("BBB", &wave(90, 0.6, 0.05), 0),
        series("^IDX", &wave(90, 1.5, 0.0), 0),
    );
    let full = run_pipeline(&input, &PipelineConfig::default()).unwrap();
    let rolling = run_pipeline(
        &input,
        &PipelineConfig {
            normalization: NormalizationPolicy::Rolling { window: 10 },
            ..PipelineConfig::default()
        },
    )
    .unwrap();

    let kind = SeriesKind::NormalizedRocPriceCorrelation;
    let f = full.get(kind).unwrap();
    let r = rolling.get(kind).unwrap();
    assert_eq!(f.len(), r.len());
    assert!(r.valid_count() < f.valid_count());
    assert!(r.valid_count() > 0);
}

#[test]
fn pipeline_is_deterministic() {
    let input = shared_input(
        series("AAA", &wave(60, 0.0, 0.1), 0),
        series("BBB", &wave(60, 0.4, 0.1), 0),
        series("^IDX", &wave(60, 1.0, 0.0), 0),
    );
    let config = PipelineConfig::default();
    let a = run_pipeline(&input, &config).unwrap();
    let b = run_pipeline(&input, &config).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}
