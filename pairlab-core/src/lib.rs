//! PairLab core: correlation and detrending analysis of two instruments.
//!
//! - Domain types (bars, price series, date-indexed derived series)
//! - Statistical primitives (VWAP, returns, rolling correlation, ROC,
//!   normalization, OLS)
//! - The pipeline that composes them into the named output series
//! - Data acquisition with a Parquet cache and synthetic fallback
//! - TOML configuration and run reports

pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod stats;

pub use config::{AnalysisConfig, ConfigError, InstrumentSpec, RunId};
pub use domain::{Bar, DerivedSeries, PriceSeries};
pub use error::PipelineError;
pub use pipeline::{
    run_pipeline, PairLeg, PipelineConfig, PipelineInput, PipelineOutput, SeriesKind,
};
