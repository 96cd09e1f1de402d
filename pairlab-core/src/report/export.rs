//! CSV and JSON export of pipeline output.
//!
//! The CSV is wide: one `date` column plus one column per output series,
//! on the union of every series' dates. Missing values are empty cells.

use crate::pipeline::{PipelineOutput, SeriesKind};
use anyhow::{Context, Result};

/// Serialize a `PipelineOutput` to pretty JSON. Missing values become `null`.
pub fn export_json(output: &PipelineOutput) -> Result<String> {
    serde_json::to_string_pretty(output).context("failed to serialize pipeline output to JSON")
}

pub fn export_series_csv(output: &PipelineOutput) -> Result<String> {
    let kinds: Vec<SeriesKind> = SeriesKind::ALL
        .into_iter()
        .filter(|k| output.get(*k).is_some())
        .collect();

    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["date"];
    header.extend(kinds.iter().map(|k| k.key()));
    wtr.write_record(&header)?;

    for date in output.date_axis() {
        let mut row = Vec::with_capacity(kinds.len() + 1);
        row.push(date.to_string());
        for kind in &kinds {
            let cell = output
                .get(*kind)
                .and_then(|s| s.get(date))
                .map(|v| format!("{v:.6}"))
                .unwrap_or_default();
            row.push(cell);
        }
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}
