//! Run manifest: what was run, on which data.

use crate::config::{AnalysisConfig, RunId};
use crate::data::{DataSource, LoadedSeries};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub generated_at: NaiveDateTime,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub config: AnalysisConfig,
    /// BLAKE3 over every loaded bar.
    pub dataset_hash: String,
    pub sources: BTreeMap<String, DataSource>,
    pub has_synthetic: bool,
}

impl RunManifest {
    pub fn new(
        config: &AnalysisConfig,
        end_date: NaiveDate,
        generated_at: NaiveDateTime,
        loaded: &LoadedSeries,
    ) -> Self {
        Self {
            run_id: config.run_id(end_date),
            generated_at,
            start_date: config.analysis.start_date,
            end_date,
            config: config.clone(),
            dataset_hash: loaded.dataset_hash.clone(),
            sources: loaded.sources.clone(),
            has_synthetic: loaded.has_synthetic(),
        }
    }
}
