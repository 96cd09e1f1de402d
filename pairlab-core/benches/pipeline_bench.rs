//! Criterion benchmarks for PairLab hot paths.
//!
//! Benchmarks:
//! 1. Rolling correlation over a multi-year daily series
//! 2. OLS fit on aligned return series
//! 3. Full pipeline run (distinct benchmarks)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pairlab_core::data::generate_synthetic_bars;
use pairlab_core::stats::{fit_ols, simple_returns, RollingCorrelation};
use pairlab_core::{run_pipeline, PairLeg, PipelineConfig, PipelineInput, PriceSeries};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(symbol: &str, years: i64) -> PriceSeries {
    let start = chrono::NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
    let end = start + chrono::Duration::days(365 * years);
    PriceSeries::new(symbol, generate_synthetic_bars(symbol, start, end)).unwrap()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_rolling_correlation(c: &mut Criterion) {
    let mut group = c.benchmark_group("rolling_correlation");
    let a = make_series("AAA", 10).closes();
    let b = make_series("BBB", 10).closes();
    for window in [20usize, 60, 250] {
        let corr = RollingCorrelation::new(window).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(window), &window, |bench, _| {
            bench.iter(|| corr.compute(black_box(&a), black_box(&b)))
        });
    }
    group.finish();
}

fn bench_ols(c: &mut Criterion) {
    let y = simple_returns(&make_series("AAA", 10));
    let x = simple_returns(&make_series("^IDX", 10));
    c.bench_function("ols_fit_10y", |bench| {
        bench.iter(|| fit_ols(black_box(&y), black_box(&x), "bench").unwrap())
    });
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    for years in [1i64, 5, 10] {
        let input = PipelineInput::new(
            PairLeg::new(make_series("AVGO", years), "^IXIC"),
            PairLeg::new(make_series("VMW", years), "^NYA"),
            vec![make_series("^IXIC", years), make_series("^NYA", years)],
        );
        let config = PipelineConfig::default();
        group.bench_with_input(BenchmarkId::new("years", years), &years, |bench, _| {
            bench.iter(|| run_pipeline(black_box(&input), &config).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_rolling_correlation,
    bench_ols,
    bench_pipeline
);
criterion_main!(benches);
