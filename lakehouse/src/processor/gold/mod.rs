pub mod aggregate;

use chrono::NaiveDate;
use common::paths::{create_timestamped_file, LayerPaths};
use common::Result;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use crate::processor::loader::{load_silver, resolve_silver_root};
use crate::processor::quality::{filter_allowed, normalize_batch};
use crate::utils::parquet::write_parquet;

pub const GOLD_FILE_PREFIX: &str = "breweries_by_type_and_location";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoldSummary {
    pub path: PathBuf,
    pub groups: usize,
    /// Validated silver rows that were counted.
    pub rows: usize,
    pub checksum: String,
    /// Silver root the rows were read from.
    pub source: PathBuf,
}

pub struct GoldAggregator {
    paths: LayerPaths,
    fallback_to_root: bool,
}

impl GoldAggregator {
    pub fn new(paths: LayerPaths, fallback_to_root: bool) -> Self {
        Self {
            paths,
            fallback_to_root,
        }
    }

    /// Aggregates the validated silver rows for `run_date` into a new gold
    /// file. Earlier gold files for the date are left in place.
    pub fn aggregate(&self, run_date: NaiveDate) -> Result<GoldSummary> {
        let source = resolve_silver_root(&self.paths, run_date, self.fallback_to_root)?;
        let silver = normalize_batch(&load_silver(&source.root)?)?;
        let validated = filter_allowed(&silver)?.batch;

        let aggregated = aggregate::aggregate_by_type_and_location(&validated)?;
        let checksum = aggregate::content_checksum(&aggregated)?;

        let (path, file) = create_timestamped_file(&self.paths.gold_dir(run_date), GOLD_FILE_PREFIX, "parquet")?;
        write_parquet(
            file,
            aggregated.schema(),
            &[aggregated.clone()],
            &[
                ("layer", "gold".to_string()),
                ("run_date", run_date.to_string()),
            ],
        )?;

        let summary = GoldSummary {
            path,
            groups: aggregated.num_rows(),
            rows: validated.num_rows(),
            checksum,
            source: source.root,
        };
        info!(
            groups = summary.groups,
            rows = summary.rows,
            checksum = %summary.checksum,
            path = %summary.path.display(),
            source = %summary.source.display(),
            "Gold aggregate written"
        );
        Ok(summary)
    }
}
