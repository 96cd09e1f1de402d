//! Data acquisition: provider abstraction, Yahoo client, ingest, Parquet
//! cache and the loader that ties them together.

pub mod cache;
pub mod download;
pub mod ingest;
pub mod loader;
pub mod provider;
pub mod yahoo;

pub use cache::{CacheMeta, Freshness, ParquetCache};
pub use download::{download_single, download_symbols, DownloadSummary};
pub use ingest::{ingest, IngestResult};
pub use loader::{generate_synthetic_bars, load_series, LoadError, LoadOptions, LoadedSeries};
pub use provider::{DataError, DataProvider, DataSource, DownloadProgress, FetchResult, LogProgress};
pub use yahoo::YahooProvider;
