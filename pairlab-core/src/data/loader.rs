//! Series loading with the cache freshness rule and fallbacks.
//!
//! Resolution order per symbol:
//! 1. cache written today and spanning the range (unless `force`) → use it
//! 2. provider reachable and not `offline` → download, ingest, cache
//! 3. any other cache entry (older, or too narrow) → use it, with a warning
//! 4. `synthetic` → seeded random walk, tagged as synthetic
//! 5. otherwise → `LoadError`
//!
//! The wall-clock time is part of `LoadOptions`, never read here.

use super::cache::{Freshness, ParquetCache};
use super::download::download_single;
use super::provider::{DataError, DataProvider, DataSource, DownloadProgress};
use crate::domain::{Bar, PriceSeries};
use crate::error::PipelineError;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no cached data for '{symbol}' and no network access (use --synthetic for synthetic data)")]
    NoCachedDataOffline { symbol: String },

    #[error("no cached data for '{symbol}' and download failed: {reason}")]
    DownloadFailed { symbol: String, reason: String },

    #[error("no bars for '{symbol}' between {start} and {end}")]
    EmptyRange {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error(transparent)]
    Series(#[from] PipelineError),
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Current time; decides cache freshness and stamps new cache entries.
    pub now: NaiveDateTime,
    /// Never make network requests.
    pub offline: bool,
    /// Generate synthetic bars when no real data is available.
    pub synthetic: bool,
    /// Refetch even if the cache is fresh.
    pub force: bool,
}

#[derive(Debug)]
pub struct LoadedSeries {
    /// Price history per symbol, trimmed to the requested range.
    pub series: BTreeMap<String, PriceSeries>,
    pub sources: BTreeMap<String, DataSource>,
    /// BLAKE3 over every loaded bar, in symbol order.
    pub dataset_hash: String,
}

impl LoadedSeries {
    /// True if any symbol fell back to generated bars.
    pub fn has_synthetic(&self) -> bool {
        self.sources.values().any(|s| *s == DataSource::Synthetic)
    }
}

pub fn load_series(
    symbols: &[&str],
    cache: &ParquetCache,
    provider: Option<&dyn DataProvider>,
    progress: Option<&dyn DownloadProgress>,
    opts: &LoadOptions,
) -> Result<LoadedSeries, LoadError> {
    let mut series = BTreeMap::new();
    let mut sources = BTreeMap::new();
    let total = symbols.len();

    for (i, &symbol) in symbols.iter().enumerate() {
        if series.contains_key(symbol) {
            continue;
        }
        if let Some(p) = progress {
            p.on_start(symbol, i, total);
        }

        let (bars, source) = resolve(symbol, cache, provider, opts)?;
        if let Some(p) = progress {
            p.on_complete(symbol, i, total, &Ok(()));
        }

        let full = PriceSeries::new(symbol, bars)?;
        let trimmed = full.between(opts.start, opts.end);
        if trimmed.is_empty() {
            return Err(LoadError::EmptyRange {
                symbol: symbol.to_string(),
                start: opts.start,
                end: opts.end,
            });
        }
        info!(symbol, bars = trimmed.len(), ?source, "loaded series");
        series.insert(symbol.to_string(), trimmed);
        sources.insert(symbol.to_string(), source);
    }

    if let Some(p) = progress {
        p.on_batch_complete(series.len(), 0, total);
    }

    let dataset_hash = dataset_hash(&series);
    Ok(LoadedSeries {
        series,
        sources,
        dataset_hash,
    })
}

fn resolve(
    symbol: &str,
    cache: &ParquetCache,
    provider: Option<&dyn DataProvider>,
    opts: &LoadOptions,
) -> Result<(Vec<Bar>, DataSource), LoadError> {
    let today = opts.now.date();
    let freshness = cache.freshness(symbol, today);

    if !opts.force && cache.serves(symbol, today, opts.start, opts.end) {
        if let Ok(bars) = cache.load(symbol) {
            return Ok((bars, DataSource::Cache));
        }
    }

    let mut download_error = None;
    if !opts.offline {
        if let Some(prov) = provider.filter(|p| p.is_available()) {
            match download_single(prov, cache, symbol, opts.start, opts.end, opts.now) {
                Ok(()) => return Ok((cache.load(symbol)?, DataSource::YahooFinance)),
                Err(e) => {
                    warn!(symbol, error = %e, "download failed");
                    download_error = Some(e);
                }
            }
        }
    }

    if freshness != Freshness::Missing {
        if let Ok(bars) = cache.load(symbol) {
            match freshness {
                Freshness::Stale { cached_on } => {
                    warn!(symbol, %cached_on, "using stale cache entry")
                }
                _ => warn!(
                    symbol,
                    start = %opts.start,
                    end = %opts.end,
                    "cache entry does not cover requested range, using it as is"
                ),
            }
            return Ok((bars, DataSource::StaleCache));
        }
    }

    if opts.synthetic {
        warn!(symbol, "generating synthetic data, results will be tagged as synthetic");
        return Ok((
            generate_synthetic_bars(symbol, opts.start, opts.end),
            DataSource::Synthetic,
        ));
    }

    if opts.offline || provider.is_none() {
        return Err(LoadError::NoCachedDataOffline {
            symbol: symbol.to_string(),
        });
    }
    Err(LoadError::DownloadFailed {
        symbol: symbol.to_string(),
        reason: download_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "provider unavailable".into()),
    })
}

fn dataset_hash(series: &BTreeMap<String, PriceSeries>) -> String {
    let mut hasher = blake3::Hasher::new();
    for (symbol, s) in series {
        hasher.update(symbol.as_bytes());
        for bar in s.bars() {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Seeded random walk on weekdays, starting at 100.0.
///
/// The seed is derived from the symbol, so the same symbol always yields the
/// same bars.
pub fn generate_synthetic_bars(symbol: &str, start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(symbol.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::new();
    let mut price = 100.0_f64;
    let mut current = start;

    while current <= end {
        let weekday = current.weekday();
        if weekday != chrono::Weekday::Sat && weekday != chrono::Weekday::Sun {
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);

            bars.push(Bar {
                date: current,
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
        }
        current += chrono::Duration::days(1);
    }

    bars
}
