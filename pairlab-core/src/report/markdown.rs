//! Markdown report generator.
//!
//! One section per chart of the correlation dashboard, each with a short
//! explanation, followed by the summary table and the regression fits.

use super::manifest::RunManifest;
use super::summary::{summarize, SeriesSummary};
use crate::pipeline::{PipelineOutput, SeriesKind};
use std::fmt::Write;

/// Chart sections in display order: title, explanation, series shown.
const SECTIONS: [(&str, &str, &[SeriesKind]); 6] = [
    (
        "Price Action & VWAP Correlation",
        "Rolling correlation of the two closing prices next to the rolling \
         correlation of their cumulative VWAPs. VWAP weighs each day's typical \
         price by its volume; a small gap between the two lines means volume \
         adds little to the relationship.",
        &[SeriesKind::PriceCorrelation, SeriesKind::VwapCorrelation],
    ),
    (
        "Normalized ROC of Correlations",
        "Rate of change of the price, VWAP and return correlations, each \
         z-normalized. Large excursions mark days where the relationship \
         between the two instruments shifted abruptly and are worth checking \
         against the news.",
        &[
            SeriesKind::NormalizedRocPriceCorrelation,
            SeriesKind::NormalizedRocVwapCorrelation,
            SeriesKind::NormalizedRocReturnCorrelation,
        ],
    ),
    (
        "Correlation of Daily Returns",
        "Rolling correlation of daily close-to-close returns.",
        &[SeriesKind::ReturnCorrelation],
    ),
    (
        "Detrended Price Action Correlation",
        "Each instrument's daily returns are regressed on the returns of its \
         benchmark index and only the residuals are correlated. This strips \
         out the market moves both instruments share with their index and \
         leaves the idiosyncratic part of the relationship.",
        &[SeriesKind::DetrendedPriceCorrelation],
    ),
    (
        "Detrended VWAP Correlation",
        "The same detrending applied to VWAP returns.",
        &[SeriesKind::DetrendedVwapCorrelation],
    ),
    (
        "Detrended Price Action and VWAP Correlations Together",
        "Both detrended correlations side by side.",
        &[
            SeriesKind::DetrendedPriceCorrelation,
            SeriesKind::DetrendedVwapCorrelation,
        ],
    ),
];

pub struct MarkdownReportGenerator;

impl MarkdownReportGenerator {
    pub fn generate(&self, output: &PipelineOutput, manifest: &RunManifest) -> String {
        let summaries = summarize(output);
        let mut report = String::new();

        let _ = writeln!(
            report,
            "# {} & {} Correlation Analysis\n",
            output.first_symbol, output.second_symbol
        );
        let _ = writeln!(report, "Run ID: `{}`\n", manifest.run_id);
        let _ = writeln!(
            report,
            "- Range: {} to {}",
            manifest.start_date, manifest.end_date
        );
        let _ = writeln!(report, "- Rolling window: {} days", output.window);
        let _ = writeln!(report, "- Dataset hash: `{}`", manifest.dataset_hash);
        for (symbol, source) in &manifest.sources {
            let _ = writeln!(report, "- {symbol}: {source:?}");
        }
        if manifest.has_synthetic {
            report.push_str(
                "\n> **Warning:** some series were generated synthetically. \
                 These results do not describe real market data.\n",
            );
        }

        for (title, text, kinds) in SECTIONS {
            let _ = writeln!(report, "\n## {title}\n\n{text}\n");
            report.push_str("| Series | Valid | Last | Min | Max | Mean |\n");
            report.push_str("|--------|-------|------|-----|-----|------|\n");
            for kind in kinds {
                if let Some(s) = summaries.iter().find(|s| s.kind == *kind) {
                    report.push_str(&summary_row(s));
                }
            }
        }

        if !output.regressions.is_empty() {
            report.push_str("\n## Detrending Regressions\n\n");
            report.push_str("| Symbol | Benchmark | Basis | Intercept | Slope | R² | N |\n");
            report.push_str("|--------|-----------|-------|-----------|-------|----|---|\n");
            for r in &output.regressions {
                let _ = writeln!(
                    report,
                    "| {} | {} | {} | {:+.6} | {:.4} | {:.4} | {} |",
                    r.symbol,
                    r.benchmark,
                    r.basis,
                    r.fit.intercept,
                    r.fit.slope,
                    r.fit.r_squared,
                    r.fit.observations
                );
            }
        }

        report.push_str(
            "\n## Disclaimer\n\nDivergences between instruments can occur at any \
             time for reasons these statistics cannot capture. This report is \
             not investment advice.\n",
        );
        report
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".into())
}

fn summary_row(s: &SeriesSummary) -> String {
    let last = s
        .last
        .map(|(date, v)| format!("{v:.4} ({date})"))
        .unwrap_or_else(|| "-".into());
    format!(
        "| {} | {}/{} | {} | {} | {} | {} |\n",
        s.kind.label(),
        s.valid,
        s.points,
        last,
        fmt_opt(s.min),
        fmt_opt(s.max),
        fmt_opt(s.mean)
    )
}
