//! PairLab CLI: download, run, and cache inspection commands.
//!
//! Commands:
//! - `download`: fetch daily history from Yahoo Finance and cache as Parquet
//! - `run`: run the correlation analysis from a TOML config or named preset
//! - `cache status`: list cached symbols with date ranges and freshness

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use pairlab_core::config::PRESETS;
use pairlab_core::data::{
    download_symbols, load_series, DataProvider, DownloadProgress, Freshness, LoadOptions,
    LogProgress, ParquetCache, YahooProvider,
};
use pairlab_core::report::{save_artifacts, summarize, RunManifest};
use pairlab_core::{run_pipeline, AnalysisConfig, PipelineOutput};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pairlab",
    about = "PairLab CLI: rolling and detrended correlation of two instruments"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download daily history from Yahoo Finance and cache as Parquet.
    Download {
        /// Symbols to download (e.g., AVGO VMW ^IXIC).
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Start date (YYYY-MM-DD). Defaults to 2022-03-02.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Force re-download even if cached today.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
    /// Run the analysis from a TOML config file or named preset.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Named preset: avgo_vmw, avgo_vmw_nasdaq.
        #[arg(long)]
        preset: Option<String>,

        /// Override the start date (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// Override the end date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Offline mode: no network access.
        #[arg(long, default_value_t = false)]
        offline: bool,

        /// Use synthetic data when nothing else is available.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,

        /// Output directory for run artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Cache inspection commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached symbols with date ranges and freshness.
    Status {
        /// Cache directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        cache_dir: PathBuf,
    },
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let now = chrono::Local::now().naive_local();

    match cli.command {
        Commands::Download {
            symbols,
            start,
            end,
            force,
            cache_dir,
        } => run_download(symbols, start, end, force, cache_dir, now),
        Commands::Run {
            config,
            preset,
            start,
            end,
            offline,
            synthetic,
            cache_dir,
            output_dir,
        } => run_analysis_cmd(
            config, preset, start, end, offline, synthetic, cache_dir, output_dir, now,
        ),
        Commands::Cache { action } => match action {
            CacheAction::Status { cache_dir } => run_cache_status(&cache_dir, now.date()),
        },
    }
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn run_download(
    symbols: Vec<String>,
    start: Option<String>,
    end: Option<String>,
    force: bool,
    cache_dir: PathBuf,
    now: NaiveDateTime,
) -> Result<()> {
    let start_date = match start.as_deref() {
        Some(s) => parse_date(s)?,
        None => parse_date("2022-03-02")?,
    };
    let end_date = match end.as_deref() {
        Some(s) => parse_date(s)?,
        None => now.date(),
    };
    if end_date < start_date {
        bail!("end date {end_date} is before start date {start_date}");
    }

    let provider = YahooProvider::new()?;
    let cache = ParquetCache::new(cache_dir);
    let sym_refs: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();

    let summary = download_symbols(
        &provider,
        &cache,
        &sym_refs,
        start_date,
        end_date,
        force,
        now,
        &LogProgress,
    );

    if !summary.all_succeeded() {
        for (sym, err) in &summary.errors {
            eprintln!("Error for {sym}: {err}");
        }
        bail!("{} of {} downloads failed", summary.failed, summary.total);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_analysis_cmd(
    config_path: Option<PathBuf>,
    preset_name: Option<String>,
    start: Option<String>,
    end: Option<String>,
    offline: bool,
    synthetic: bool,
    cache_dir: PathBuf,
    output_dir: PathBuf,
    now: NaiveDateTime,
) -> Result<()> {
    let mut config = match (config_path, preset_name) {
        (Some(_), Some(_)) => bail!("--config and --preset are mutually exclusive"),
        (Some(path), None) => AnalysisConfig::from_file(&path)?,
        (None, Some(name)) => AnalysisConfig::preset(&name)?,
        (None, None) => bail!(
            "one of --config or --preset is required (presets: {})",
            PRESETS.join(", ")
        ),
    };
    if let Some(s) = start.as_deref() {
        config.analysis.start_date = parse_date(s)?;
    }
    if let Some(e) = end.as_deref() {
        config.analysis.end_date = Some(parse_date(e)?);
    }
    config.validate()?;

    let start_date = config.analysis.start_date;
    let end_date = config.end_date_or(now.date());
    if end_date < start_date {
        bail!("end date {end_date} is before start date {start_date}");
    }
    let opts = LoadOptions {
        start: start_date,
        end: end_date,
        now,
        offline,
        synthetic,
        force: false,
    };

    let cache = ParquetCache::new(&cache_dir);
    let provider = if offline {
        None
    } else {
        match YahooProvider::new() {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(error = %e, "Yahoo provider unavailable, continuing from cache");
                None
            }
        }
    };
    let provider_ref = provider.as_ref().map(|p| p as &dyn DataProvider);

    let progress: &dyn DownloadProgress = &LogProgress;
    let loaded = load_series(&config.symbols(), &cache, provider_ref, Some(progress), &opts)?;
    let input = config.pipeline_input(&loaded.series)?;
    let output = run_pipeline(&input, &config.pipeline_config())?;

    let manifest = RunManifest::new(&config, end_date, now, &loaded);
    print_summary(&output, &manifest);

    let paths = save_artifacts(&output, &manifest, &output_dir)?;
    println!("Artifacts saved to: {}", paths.run_dir.display());
    Ok(())
}

fn print_summary(output: &PipelineOutput, manifest: &RunManifest) {
    println!();
    println!(
        "=== {} vs {} ({} to {}) ===",
        output.first_symbol, output.second_symbol, manifest.start_date, manifest.end_date
    );
    if manifest.has_synthetic {
        println!("WARNING: results include synthetic data");
    }
    println!("Run ID:  {}", manifest.run_id);
    println!("Window:  {} days", output.window);
    println!();
    println!("{:<30} {:>11} {:>10} {:>10}", "Series", "Valid", "Last", "Mean");
    println!("{}", "-".repeat(64));
    for s in summarize(output) {
        let last = s
            .last
            .map(|(_, v)| format!("{v:.4}"))
            .unwrap_or_else(|| "-".into());
        let mean = s
            .mean
            .map(|v| format!("{v:.4}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<30} {:>11} {:>10} {:>10}",
            s.kind.label(),
            format!("{}/{}", s.valid, s.points),
            last,
            mean
        );
    }
    println!();
    for r in &output.regressions {
        println!(
            "OLS {} {} on {}: slope {:.4}, intercept {:+.6}, R² {:.4} (n={})",
            r.symbol, r.basis, r.benchmark, r.fit.slope, r.fit.intercept, r.fit.r_squared,
            r.fit.observations
        );
    }
    println!();
}

fn run_cache_status(cache_dir: &Path, today: NaiveDate) -> Result<()> {
    if !cache_dir.exists() {
        println!("Cache directory does not exist: {}", cache_dir.display());
        return Ok(());
    }

    let cache = ParquetCache::new(cache_dir);
    let mut entries = cache.entries()?;
    if entries.is_empty() {
        println!("Cache is empty: {}", cache_dir.display());
        return Ok(());
    }
    entries.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let total_size: u64 = entries
        .iter()
        .map(|m| dir_size(&cache.symbol_dir(&m.symbol)))
        .sum();

    println!("Cache: {}", cache_dir.display());
    println!("Symbols: {}", entries.len());
    println!("Total size: {}", format_size(total_size));
    println!();
    println!(
        "{:<8} {:<25} {:>8} {:<20}",
        "Symbol", "Date Range", "Bars", "Freshness"
    );
    println!("{}", "-".repeat(64));
    for meta in &entries {
        let freshness = match cache.freshness(&meta.symbol, today) {
            Freshness::Fresh => "fresh".to_string(),
            Freshness::Stale { cached_on } => format!("stale ({cached_on})"),
            Freshness::Missing => "missing".to_string(),
        };
        println!(
            "{:<8} {:<25} {:>8} {:<20}",
            meta.symbol,
            format!("{} to {}", meta.start_date, meta.end_date),
            meta.bar_count,
            freshness
        );
    }
    Ok(())
}

fn dir_size(path: &Path) -> u64 {
    std::fs::read_dir(path)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter_map(|e| e.metadata().ok())
                .filter(|m| m.is_file())
                .map(|m| m.len())
                .sum()
        })
        .unwrap_or(0)
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}
