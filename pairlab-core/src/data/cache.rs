//! Parquet cache of raw daily history, one directory per symbol.
//!
//! Layout: `{cache_dir}/symbol={SYMBOL}/bars.parquet` plus a `meta.json`
//! sidecar. Characters outside `[A-Za-z0-9.-]` are percent-escaped
//! (`^IXIC` → `%5EIXIC`), so distinct symbols never share a directory.
//!
//! - Atomic writes (write to .tmp, rename into place)
//! - Integrity validation on load; corrupt files are quarantined
//! - Freshness is "cached today": the caller supplies `today`, the cache
//!   never reads the clock for that decision

use super::provider::DataError;
use crate::domain::Bar;
use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const BARS_FILE: &str = "bars.parquet";
const META_FILE: &str = "meta.json";

/// Calendar days an entry may fall short of a requested range at either
/// edge and still count as covering it (weekends plus a holiday).
pub const COVERAGE_SLACK_DAYS: i64 = 4;

/// Metadata sidecar for a cached symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub bar_count: usize,
    pub data_hash: String,
    pub source: String,
    pub cached_at: NaiveDateTime,
}

impl CacheMeta {
    /// True if the cached bars span `[start, end]`, allowing
    /// [`COVERAGE_SLACK_DAYS`] of non-trading days at each edge.
    pub fn covers(&self, start: NaiveDate, end: NaiveDate) -> bool {
        let slack = chrono::Duration::days(COVERAGE_SLACK_DAYS);
        self.start_date <= start + slack && self.end_date + slack >= end
    }
}

/// Whether a cached entry can be used without refetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale { cached_on: NaiveDate },
    Missing,
}

pub struct ParquetCache {
    cache_dir: PathBuf,
}

impl ParquetCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Directory holding one symbol's bars and sidecar.
    pub fn symbol_dir(&self, symbol: &str) -> PathBuf {
        self.cache_dir
            .join(format!("symbol={}", sanitize_symbol(symbol)))
    }

    fn bars_path(&self, symbol: &str) -> PathBuf {
        self.symbol_dir(symbol).join(BARS_FILE)
    }

    fn meta_path(&self, symbol: &str) -> PathBuf {
        self.symbol_dir(symbol).join(META_FILE)
    }

    /// Replace the cached bars for a symbol.
    ///
    /// `cached_at` is recorded in the sidecar and drives freshness.
    pub fn write(
        &self,
        symbol: &str,
        bars: &[Bar],
        source: &str,
        cached_at: NaiveDateTime,
    ) -> Result<(), DataError> {
        let (first, last) = match (bars.first(), bars.last()) {
            (Some(f), Some(l)) => (f.date, l.date),
            _ => return Err(DataError::CacheError("no bars to cache".into())),
        };

        let sym_dir = self.symbol_dir(symbol);
        fs::create_dir_all(&sym_dir)
            .map_err(|e| DataError::CacheError(format!("failed to create dir: {e}")))?;

        let mut df = bars_to_dataframe(bars)?;
        let path = self.bars_path(symbol);
        let tmp_path = path.with_extension("parquet.tmp");
        write_parquet(&mut df, &tmp_path)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DataError::CacheError(format!("atomic rename failed: {e}"))
        })?;

        let meta = CacheMeta {
            symbol: symbol.to_string(),
            start_date: first,
            end_date: last,
            bar_count: bars.len(),
            data_hash: data_hash(bars)?,
            source: source.to_string(),
            cached_at,
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| DataError::CacheError(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(symbol), meta_json)
            .map_err(|e| DataError::CacheError(format!("meta write: {e}")))?;

        debug!(symbol, bars = bars.len(), %first, %last, "cached bars");
        Ok(())
    }

    /// Load cached bars for a symbol, sorted by date ascending.
    pub fn load(&self, symbol: &str) -> Result<Vec<Bar>, DataError> {
        let path = self.bars_path(symbol);
        if !path.exists() {
            return Err(DataError::NoCachedData {
                symbol: symbol.to_string(),
            });
        }

        match load_and_validate_parquet(&path) {
            Ok(mut bars) => {
                bars.sort_by_key(|b| b.date);
                Ok(bars)
            }
            Err(e) => {
                let quarantine = path.with_extension("parquet.quarantined");
                warn!(path = %path.display(), error = %e, "quarantining corrupt cache file");
                let _ = fs::rename(&path, &quarantine);
                Err(DataError::NoCachedData {
                    symbol: symbol.to_string(),
                })
            }
        }
    }

    pub fn get_meta(&self, symbol: &str) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(symbol)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Fresh iff the entry was written on `today`.
    pub fn freshness(&self, symbol: &str, today: NaiveDate) -> Freshness {
        if !self.bars_path(symbol).exists() {
            return Freshness::Missing;
        }
        match self.get_meta(symbol) {
            None => Freshness::Missing,
            Some(meta) if meta.cached_at.date() == today => Freshness::Fresh,
            Some(meta) => Freshness::Stale {
                cached_on: meta.cached_at.date(),
            },
        }
    }

    /// Fresh and spanning `[start, end]`: safe to use without refetching.
    pub fn serves(
        &self,
        symbol: &str,
        today: NaiveDate,
        start: NaiveDate,
        end: NaiveDate,
    ) -> bool {
        self.freshness(symbol, today) == Freshness::Fresh
            && self
                .get_meta(symbol)
                .is_some_and(|meta| meta.covers(start, end))
    }

    /// Metadata for every symbol in the cache, sorted by symbol.
    pub fn entries(&self) -> Result<Vec<CacheMeta>, DataError> {
        if !self.cache_dir.exists() {
            return Ok(Vec::new());
        }
        let read = fs::read_dir(&self.cache_dir)
            .map_err(|e| DataError::CacheError(format!("read dir: {e}")))?;

        let mut metas = Vec::new();
        for entry in read {
            let entry = entry.map_err(|e| DataError::CacheError(format!("dir entry: {e}")))?;
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with("symbol=") {
                continue;
            }
            let content = match fs::read_to_string(entry.path().join(META_FILE)) {
                Ok(c) => c,
                Err(_) => continue,
            };
            if let Ok(meta) = serde_json::from_str::<CacheMeta>(&content) {
                metas.push(meta);
            }
        }
        metas.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(metas)
    }
}

/// Filesystem-safe directory name for a ticker, escaped byte-wise as `%XX`.
pub fn sanitize_symbol(symbol: &str) -> String {
    let mut out = String::with_capacity(symbol.len());
    for byte in symbol.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'.' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// BLAKE3 over the JSON encoding of the bars.
fn data_hash(bars: &[Bar]) -> Result<String, DataError> {
    let bytes = serde_json::to_vec(bars)
        .map_err(|e| DataError::CacheError(format!("hash serialization: {e}")))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

fn bars_to_dataframe(bars: &[Bar]) -> Result<DataFrame, DataError> {
    let dates: Vec<i32> = bars
        .iter()
        .map(|b| (b.date - epoch()).num_days() as i32)
        .collect();
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<u64> = bars.iter().map(|b| b.volume).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| DataError::ParquetError(format!("date cast: {e}")))?,
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| DataError::ParquetError(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<(), DataError> {
    let file =
        fs::File::create(path).map_err(|e| DataError::ParquetError(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(df)
        .map_err(|e| DataError::ParquetError(format!("write parquet: {e}")))?;
    Ok(())
}

fn load_and_validate_parquet(path: &Path) -> Result<Vec<Bar>, DataError> {
    let file = fs::File::open(path).map_err(|e| DataError::ParquetError(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| DataError::ParquetError(format!("read: {e}")))?;

    if df.height() == 0 {
        return Err(DataError::ValidationError("empty parquet file".into()));
    }
    for col_name in ["date", "open", "high", "low", "close", "volume"] {
        if df.column(col_name).is_err() {
            return Err(DataError::ValidationError(format!(
                "missing column '{col_name}'"
            )));
        }
    }

    dataframe_to_bars(&df)
}

fn dataframe_to_bars(df: &DataFrame) -> Result<Vec<Bar>, DataError> {
    let column = |name: &str| {
        df.column(name)
            .map_err(|e| DataError::ParquetError(format!("column read: {e}")))
    };
    let float = |name: &str| -> Result<Float64Chunked, DataError> {
        column(name)?
            .f64()
            .cloned()
            .map_err(|e| DataError::ParquetError(format!("{name} column type: {e}")))
    };

    let date_ca = column("date")?
        .date()
        .cloned()
        .map_err(|e| DataError::ParquetError(format!("date column type: {e}")))?;
    let vol_ca = column("volume")?
        .u64()
        .cloned()
        .map_err(|e| DataError::ParquetError(format!("volume column type: {e}")))?;
    let open_ca = float("open")?;
    let high_ca = float("high")?;
    let low_ca = float("low")?;
    let close_ca = float("close")?;

    let n = df.height();
    let mut bars = Vec::with_capacity(n);
    for i in 0..n {
        let days = date_ca
            .get(i)
            .ok_or_else(|| DataError::ParquetError(format!("null date at row {i}")))?;
        bars.push(Bar {
            date: epoch() + chrono::Duration::days(days as i64),
            open: open_ca.get(i).unwrap_or(f64::NAN),
            high: high_ca.get(i).unwrap_or(f64::NAN),
            low: low_ca.get(i).unwrap_or(f64::NAN),
            close: close_ca.get(i).unwrap_or(f64::NAN),
            volume: vol_ca.get(i).unwrap_or(0),
        });
    }

    Ok(bars)
}
