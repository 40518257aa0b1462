pub mod normalize;
pub mod validation;

use arrow::array::{ArrayRef, BooleanArray};
use arrow::compute::filter_record_batch;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use common::paths::LayerPaths;
use common::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::processor::loader::{load_silver, resolve_silver_root};
use crate::schema::is_allowed_brewery_type;
use crate::utils::arrow::string_column;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub valid_rows: usize,
    pub dropped_rows: usize,
    /// Distinct normalized values that were not in the allow-list.
    pub invalid_values: Vec<String>,
    pub source: PathBuf,
}

/// Outcome of normalizing `brewery_type` and dropping rows outside the
/// allow-list.
#[derive(Debug)]
pub struct FilteredBatch {
    pub batch: RecordBatch,
    pub dropped_rows: usize,
    pub invalid_values: Vec<String>,
}

/// Replaces `brewery_type` in a silver key batch with its normalized form.
pub fn normalize_batch(batch: &RecordBatch) -> Result<RecordBatch> {
    let index = batch.schema().index_of("brewery_type")?;
    let normalized = normalize::normalize_brewery_type_column(string_column(batch, "brewery_type")?);

    let mut columns: Vec<ArrayRef> = batch.columns().to_vec();
    columns[index] = Arc::new(normalized);
    Ok(RecordBatch::try_new(batch.schema(), columns)?)
}

/// Keeps only rows whose normalized `brewery_type` is in the allow-list.
/// Expects a batch that already went through `normalize_batch`.
pub fn filter_allowed(batch: &RecordBatch) -> Result<FilteredBatch> {
    let kinds = string_column(batch, "brewery_type")?;

    let mut invalid = BTreeSet::new();
    let mask: BooleanArray = kinds
        .iter()
        .map(|value| match value {
            Some(v) if is_allowed_brewery_type(v) => Some(true),
            Some(v) => {
                invalid.insert(v.to_string());
                Some(false)
            }
            None => Some(false),
        })
        .collect();

    let filtered = filter_record_batch(batch, &mask)?;
    let dropped_rows = batch.num_rows() - filtered.num_rows();
    let invalid_values: Vec<String> = invalid.into_iter().collect();

    if dropped_rows > 0 {
        warn!(
            dropped = dropped_rows,
            invalid_values = ?invalid_values,
            "Dropped rows with brewery_type outside the allow-list"
        );
    }

    Ok(FilteredBatch {
        batch: filtered,
        dropped_rows,
        invalid_values,
    })
}

pub struct QualityGate {
    paths: LayerPaths,
    fallback_to_root: bool,
}

impl QualityGate {
    pub fn new(paths: LayerPaths, fallback_to_root: bool) -> Self {
        Self {
            paths,
            fallback_to_root,
        }
    }

    pub fn validate(&self, run_date: NaiveDate) -> Result<QualityReport> {
        let source = resolve_silver_root(&self.paths, run_date, self.fallback_to_root)?;
        let batch = normalize_batch(&load_silver(&source.root)?)?;

        let filtered = filter_allowed(&batch)?;
        validation::validate_silver_batch(&filtered.batch)?;

        let report = QualityReport {
            valid_rows: filtered.batch.num_rows(),
            dropped_rows: filtered.dropped_rows,
            invalid_values: filtered.invalid_values,
            source: source.root,
        };
        info!(
            valid_rows = report.valid_rows,
            dropped_rows = report.dropped_rows,
            path = %report.source.display(),
            "Quality checks passed"
        );
        Ok(report)
    }
}
