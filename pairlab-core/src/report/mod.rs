//! Reporting: CSV/JSON export, Markdown report and the on-disk artifact set.

mod artifacts;
pub mod export;
pub mod manifest;
pub mod markdown;
pub mod summary;

pub use artifacts::{save_artifacts, ArtifactPaths};
pub use export::{export_json, export_series_csv};
pub use manifest::RunManifest;
pub use markdown::MarkdownReportGenerator;
pub use summary::{summarize, SeriesSummary};
