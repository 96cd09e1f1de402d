//! Serializable analysis configuration.
//!
//! One TOML file describes a run: the date range, the numeric pipeline
//! parameters and the two instruments with their benchmarks.

use crate::domain::PriceSeries;
use crate::error::PipelineError;
use crate::pipeline::config::{DEFAULT_ROC_LAG, DEFAULT_WINDOW};
use crate::pipeline::{PairLeg, PipelineConfig, PipelineInput};
use crate::stats::NormalizationPolicy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Unique identifier for an analysis run (content hash of its config).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("unknown preset '{name}' (available: {available})")]
    UnknownPreset { name: String, available: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub analysis: AnalysisSection,
    #[serde(default)]
    pub normalization: NormalizationPolicy,
    pub pair: PairSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSection {
    /// First date of the analysis range (inclusive).
    pub start_date: NaiveDate,
    /// Last date (inclusive). `None` means "up to today", resolved by the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_window")]
    pub window: usize,
    #[serde(default = "default_roc_lag")]
    pub roc_lag: usize,
}

fn default_window() -> usize {
    DEFAULT_WINDOW
}

fn default_roc_lag() -> usize {
    DEFAULT_ROC_LAG
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSection {
    pub first: InstrumentSpec,
    pub second: InstrumentSpec,
}

/// An instrument and the index it is detrended against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub symbol: String,
    pub benchmark: String,
}

impl InstrumentSpec {
    pub fn new(symbol: impl Into<String>, benchmark: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            benchmark: benchmark.into(),
        }
    }
}

/// Built-in configurations, by name.
pub const PRESETS: [&str; 2] = ["avgo_vmw", "avgo_vmw_nasdaq"];

impl AnalysisConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// A named built-in configuration.
    ///
    /// - `avgo_vmw`: AVGO against the Nasdaq Composite, VMW against the NYSE
    ///   Composite.
    /// - `avgo_vmw_nasdaq`: both against the Nasdaq Composite.
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        let (first, second) = match name {
            "avgo_vmw" => (
                InstrumentSpec::new("AVGO", "^IXIC"),
                InstrumentSpec::new("VMW", "^NYA"),
            ),
            "avgo_vmw_nasdaq" => (
                InstrumentSpec::new("AVGO", "^IXIC"),
                InstrumentSpec::new("VMW", "^IXIC"),
            ),
            _ => {
                return Err(ConfigError::UnknownPreset {
                    name: name.to_string(),
                    available: PRESETS.join(", "),
                })
            }
        };
        Ok(Self {
            analysis: AnalysisSection {
                start_date: NaiveDate::from_ymd_opt(2022, 3, 2)
                    .ok_or_else(|| ConfigError::Invalid("bad preset start date".into()))?,
                end_date: None,
                window: DEFAULT_WINDOW,
                roc_lag: DEFAULT_ROC_LAG,
            },
            normalization: NormalizationPolicy::FullHistory,
            pair: PairSection { first, second },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pipeline_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if let Some(end) = self.analysis.end_date {
            if end < self.analysis.start_date {
                return Err(ConfigError::Invalid(format!(
                    "end_date {end} is before start_date {}",
                    self.analysis.start_date
                )));
            }
        }

        for instrument in [&self.pair.first, &self.pair.second] {
            if instrument.symbol.trim().is_empty() || instrument.benchmark.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "instrument and benchmark symbols must be non-empty".into(),
                ));
            }
        }
        if self.pair.first.symbol == self.pair.second.symbol {
            return Err(ConfigError::Invalid(format!(
                "pair must name two different instruments, got {} twice",
                self.pair.first.symbol
            )));
        }
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            window: self.analysis.window,
            roc_lag: self.analysis.roc_lag,
            normalization: self.normalization,
        }
    }

    /// End of the analysis range, `today` when the config leaves it open.
    pub fn end_date_or(&self, today: NaiveDate) -> NaiveDate {
        self.analysis.end_date.unwrap_or(today)
    }

    /// Distinct benchmark symbols, in pair order.
    pub fn benchmarks(&self) -> Vec<&str> {
        let mut out: Vec<&str> = vec![&self.pair.first.benchmark];
        if self.pair.second.benchmark != self.pair.first.benchmark {
            out.push(&self.pair.second.benchmark);
        }
        out
    }

    /// Every symbol the run needs: the pair, then the benchmarks.
    pub fn symbols(&self) -> Vec<&str> {
        let mut out: Vec<&str> = vec![&self.pair.first.symbol, &self.pair.second.symbol];
        for bench in self.benchmarks() {
            if !out.contains(&bench) {
                out.push(bench);
            }
        }
        out
    }

    /// Assemble pipeline input from loaded history keyed by symbol.
    pub fn pipeline_input(
        &self,
        series: &BTreeMap<String, PriceSeries>,
    ) -> Result<PipelineInput, PipelineError> {
        let lookup = |symbol: &str| {
            series
                .get(symbol)
                .cloned()
                .ok_or_else(|| PipelineError::InsufficientData {
                    context: format!("{symbol} price history"),
                    required: 1,
                    available: 0,
                })
        };
        let first = PairLeg::new(lookup(&self.pair.first.symbol)?, &self.pair.first.benchmark);
        let second = PairLeg::new(
            lookup(&self.pair.second.symbol)?,
            &self.pair.second.benchmark,
        );
        let benchmarks = self
            .benchmarks()
            .into_iter()
            .map(|b| {
                series
                    .get(b)
                    .cloned()
                    .ok_or_else(|| PipelineError::UnknownBenchmark {
                        symbol: b.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PipelineInput::new(first, second, benchmarks))
    }

    /// Deterministic hash of the config over its resolved date range.
    ///
    /// An open-ended config is hashed with `today` as its end, so runs on
    /// different days get different run directories.
    pub fn run_id(&self, today: NaiveDate) -> RunId {
        let mut hasher = blake3::Hasher::new();
        let a = &self.analysis;
        hasher.update(a.start_date.to_string().as_bytes());
        hasher.update(self.end_date_or(today).to_string().as_bytes());
        hasher.update(&(a.window as u64).to_le_bytes());
        hasher.update(&(a.roc_lag as u64).to_le_bytes());
        match self.normalization {
            NormalizationPolicy::FullHistory => {
                hasher.update(b"full_history");
            }
            NormalizationPolicy::Rolling { window } => {
                hasher.update(b"rolling");
                hasher.update(&(window as u64).to_le_bytes());
            }
        }
        for instrument in [&self.pair.first, &self.pair.second] {
            hasher.update(instrument.symbol.as_bytes());
            hasher.update(b"\0");
            hasher.update(instrument.benchmark.as_bytes());
            hasher.update(b"\0");
        }
        hasher.finalize().to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[analysis]
start_date = "2022-03-02"
end_date = "2023-06-30"
window = 30
roc_lag = 2

[normalization]
type = "rolling"
window = 50

[pair.first]
symbol = "AVGO"
benchmark = "^IXIC"

[pair.second]
symbol = "VMW"
benchmark = "^NYA"
"#;

    #[test]
    fn parses_full_config() {
        let config = AnalysisConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.analysis.window, 30);
        assert_eq!(config.analysis.roc_lag, 2);
        assert_eq!(
            config.normalization,
            NormalizationPolicy::Rolling { window: 50 }
        );
        assert_eq!(config.pair.second.benchmark, "^NYA");
        assert_eq!(config.symbols(), vec!["AVGO", "VMW", "^IXIC", "^NYA"]);
    }

    #[test]
    fn optional_fields_default() {
        let text = r#"
[analysis]
start_date = "2022-03-02"

[pair.first]
symbol = "AVGO"
benchmark = "^IXIC"

[pair.second]
symbol = "VMW"
benchmark = "^IXIC"
"#;
        let config = AnalysisConfig::from_toml(text).unwrap();
        assert_eq!(config.analysis.window, DEFAULT_WINDOW);
        assert_eq!(config.analysis.end_date, None);
        assert_eq!(config.normalization, NormalizationPolicy::FullHistory);
        assert_eq!(config.benchmarks(), vec!["^IXIC"]);
        assert_eq!(config.symbols(), vec!["AVGO", "VMW", "^IXIC"]);
    }

    #[test]
    fn rejects_inverted_range() {
        let text = SAMPLE.replace("2023-06-30", "2021-01-01");
        assert!(matches!(
            AnalysisConfig::from_toml(&text),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_small_window() {
        let text = SAMPLE.replace("window = 30", "window = 1");
        assert!(matches!(
            AnalysisConfig::from_toml(&text),
            Err(ConfigError::Invalid(_))
        ));
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn run_id_is_deterministic() {
        let today = day(2023, 7, 3);
        let a = AnalysisConfig::from_toml(SAMPLE).unwrap();
        let b = AnalysisConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(a.run_id(today), b.run_id(today));
        assert_eq!(a.run_id(today).len(), 64);

        let mut c = a.clone();
        c.analysis.window = 31;
        assert_ne!(a.run_id(today), c.run_id(today));
    }

    #[test]
    fn run_id_tracks_resolved_end_date() {
        let fixed = AnalysisConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(fixed.run_id(day(2023, 7, 3)), fixed.run_id(day(2024, 1, 2)));

        let open = AnalysisConfig::preset("avgo_vmw").unwrap();
        assert_ne!(open.run_id(day(2023, 7, 3)), open.run_id(day(2023, 7, 4)));

        let mut pinned = open.clone();
        pinned.analysis.end_date = Some(day(2023, 7, 3));
        assert_eq!(pinned.run_id(day(2023, 9, 1)), open.run_id(day(2023, 7, 3)));
    }

    #[test]
    fn presets_are_valid() {
        for name in PRESETS {
            let config = AnalysisConfig::preset(name).unwrap();
            config.validate().unwrap();
        }
        let shared = AnalysisConfig::preset("avgo_vmw_nasdaq").unwrap();
        assert_eq!(shared.benchmarks(), vec!["^IXIC"]);
        assert!(AnalysisConfig::preset("nope").is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let config = AnalysisConfig::preset("avgo_vmw").unwrap();
        let text = toml::to_string(&config).unwrap();
        assert_eq!(AnalysisConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn pipeline_input_requires_every_symbol() {
        let config = AnalysisConfig::preset("avgo_vmw_nasdaq").unwrap();
        let d = NaiveDate::from_ymd_opt(2022, 3, 2).unwrap();
        let bar = crate::domain::Bar {
            date: d,
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 1,
        };
        let mut series = BTreeMap::new();
        for symbol in ["AVGO", "VMW"] {
            series.insert(
                symbol.to_string(),
                PriceSeries::new(symbol, vec![bar.clone()]).unwrap(),
            );
        }
        assert_eq!(
            config.pipeline_input(&series).unwrap_err(),
            PipelineError::UnknownBenchmark {
                symbol: "^IXIC".into()
            }
        );

        series.insert(
            "^IXIC".to_string(),
            PriceSeries::new("^IXIC", vec![bar]).unwrap(),
        );
        let input = config.pipeline_input(&series).unwrap();
        assert_eq!(input.benchmarks.len(), 1);
        assert_eq!(input.second.benchmark, "^IXIC");
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            AnalysisConfig::from_file("/nonexistent/pairlab.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
