//! Download orchestrator: fetch → ingest → cache for several symbols.

use super::cache::ParquetCache;
use super::ingest;
use super::provider::{DataError, DataProvider, DownloadProgress};
use chrono::{NaiveDate, NaiveDateTime};

/// Download multiple symbols, skipping ones cached today over the requested
/// range unless `force`.
#[allow(clippy::too_many_arguments)]
pub fn download_symbols(
    provider: &dyn DataProvider,
    cache: &ParquetCache,
    symbols: &[&str],
    start: NaiveDate,
    end: NaiveDate,
    force: bool,
    now: NaiveDateTime,
    progress: &dyn DownloadProgress,
) -> DownloadSummary {
    let total = symbols.len();
    let mut succeeded = 0;
    let mut errors: Vec<(String, DataError)> = Vec::new();

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_start(symbol, i, total);

        if !force && cache.serves(symbol, now.date(), start, end) {
            progress.on_complete(symbol, i, total, &Ok(()));
            succeeded += 1;
            continue;
        }

        let result = download_single(provider, cache, symbol, start, end, now);
        progress.on_complete(symbol, i, total, &result);
        match result {
            Ok(()) => succeeded += 1,
            Err(e) => errors.push((symbol.to_string(), e)),
        }

        if !provider.is_available() {
            for sym in &symbols[(i + 1)..] {
                errors.push((
                    sym.to_string(),
                    DataError::Other(format!("{} refused further requests", provider.name())),
                ));
            }
            break;
        }
    }

    let failed = errors.len();
    progress.on_batch_complete(succeeded, failed, total);

    DownloadSummary {
        total,
        succeeded,
        failed,
        errors,
    }
}

/// Fetch, ingest and cache one symbol.
pub fn download_single(
    provider: &dyn DataProvider,
    cache: &ParquetCache,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
    now: NaiveDateTime,
) -> Result<(), DataError> {
    let fetched = provider.fetch(symbol, start, end)?;
    let ingested = ingest::ingest(fetched.bars)?;
    cache.write(symbol, &ingested.bars, provider.name(), now)
}

#[derive(Debug)]
pub struct DownloadSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(String, DataError)>,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
