//! Persisting run outputs to disk.

use super::export::{export_json, export_series_csv};
use super::manifest::RunManifest;
use super::markdown::MarkdownReportGenerator;
use crate::pipeline::PipelineOutput;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Artifact paths returned after export.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub run_dir: PathBuf,
    pub manifest: PathBuf,
    pub series_csv: PathBuf,
    pub output_json: PathBuf,
    pub report_markdown: PathBuf,
}

/// Save the full artifact set for a run.
///
/// Creates `{output_dir}/{run_id}/` containing:
/// - `manifest.json`: run id, config, data sources and dataset hash
/// - `series.csv`: every output series on the union date axis
/// - `output.json`: the full `PipelineOutput`
/// - `report.md`: the Markdown report
///
/// Rerunning the same config overwrites the previous artifacts.
pub fn save_artifacts(
    output: &PipelineOutput,
    manifest: &RunManifest,
    output_dir: &Path,
) -> Result<ArtifactPaths> {
    let run_dir = output_dir.join(&manifest.run_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create run directory {}", run_dir.display()))?;

    let manifest_path = run_dir.join("manifest.json");
    let json = serde_json::to_string_pretty(manifest).context("failed to serialize run manifest")?;
    write(&manifest_path, &json)?;

    let series_csv = run_dir.join("series.csv");
    write(&series_csv, &export_series_csv(output)?)?;

    let output_json = run_dir.join("output.json");
    write(&output_json, &export_json(output)?)?;

    let report_markdown = run_dir.join("report.md");
    write(
        &report_markdown,
        &MarkdownReportGenerator.generate(output, manifest),
    )?;

    info!(dir = %run_dir.display(), "saved artifacts");
    Ok(ArtifactPaths {
        run_dir,
        manifest: manifest_path,
        series_csv,
        output_json,
        report_markdown,
    })
}

fn write(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write {}", path.display()))
}
