use arrow::compute::concat_batches;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use common::paths::LayerPaths;
use common::{Error, Result};
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::schema::{silver_key_schema_ref, SILVER_KEY_COLUMNS};
use crate::utils::arrow::utf8_column_or_nulls;
use crate::utils::fs::list_files;
use crate::utils::parquet::read_parquet;

/// Where a stage read its silver input from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SilverSource {
    pub root: PathBuf,
    pub fallback_used: bool,
}

/// Picks the silver partition for `run_date`, or the whole silver tree when the
/// partition is missing and `fallback` allows it.
pub fn resolve_silver_root(paths: &LayerPaths, run_date: NaiveDate, fallback: bool) -> Result<SilverSource> {
    let dated = paths.silver_dir(run_date);
    if dated.exists() {
        return Ok(SilverSource {
            root: dated,
            fallback_used: false,
        });
    }

    let root = paths.silver_root();
    if fallback && root.exists() {
        warn!(
            expected = %dated.display(),
            fallback = %root.display(),
            "Silver partition for run date not found, reading the whole silver root"
        );
        return Ok(SilverSource {
            root,
            fallback_used: true,
        });
    }

    Err(Error::SourceNotFound(format!(
        "silver data not found at {}{}",
        dated.display(),
        if fallback {
            format!(" or {}", root.display())
        } else {
            String::new()
        }
    )))
}

/// Reads the silver key columns from every Parquet file under `root` into a
/// single batch. Columns a file lacks come back as nulls.
pub fn load_silver(root: &std::path::Path) -> Result<RecordBatch> {
    let files = list_files(root, &["parquet"])?;
    if files.is_empty() {
        return Err(Error::SourceNotFound(format!(
            "no parquet files found under {}",
            root.display()
        )));
    }

    let schema = silver_key_schema_ref();
    let mut projected = Vec::new();
    for file in &files {
        for batch in read_parquet(file)? {
            let columns = SILVER_KEY_COLUMNS
                .iter()
                .map(|name| utf8_column_or_nulls(&batch, name))
                .collect::<Result<Vec<_>>>()?;
            projected.push(RecordBatch::try_new(schema.clone(), columns)?);
        }
        debug!(file = %file.display(), "Loaded silver file");
    }

    Ok(concat_batches(&schema, &projected)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::arrow::{string_column, string_values};
    use crate::utils::parquet::write_parquet;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::fs::{self, File};
    use std::sync::Arc;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn write_file(path: &std::path::Path, batch: RecordBatch) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        write_parquet(File::create(path).unwrap(), batch.schema(), &[batch], &[]).unwrap();
    }

    #[test]
    fn prefers_dated_partition() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LayerPaths::new(dir.path());
        fs::create_dir_all(paths.silver_dir(date())).unwrap();

        let source = resolve_silver_root(&paths, date(), true).unwrap();
        assert_eq!(source.root, paths.silver_dir(date()));
        assert!(!source.fallback_used);
    }

    #[test]
    fn falls_back_to_silver_root_only_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LayerPaths::new(dir.path());
        fs::create_dir_all(paths.silver_root().join("ingestion_date=2024-04-30")).unwrap();

        let source = resolve_silver_root(&paths, date(), true).unwrap();
        assert_eq!(source.root, paths.silver_root());
        assert!(source.fallback_used);

        let err = resolve_silver_root(&paths, date(), false).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)));
    }

    #[test]
    fn nothing_to_resolve_is_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_silver_root(&LayerPaths::new(dir.path()), date(), true).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)));
    }

    #[test]
    fn loads_key_columns_across_files() {
        let dir = tempfile::tempdir().unwrap();

        let full = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("country", DataType::Utf8, true),
            Field::new("state", DataType::Utf8, true),
            Field::new("city", DataType::Utf8, true),
            Field::new("brewery_type", DataType::Utf8, true),
        ]));
        write_file(
            &dir.path().join("A/X/part-0.parquet"),
            RecordBatch::try_new(
                full,
                vec![
                    Arc::new(Int64Array::from(vec![1])),
                    Arc::new(StringArray::from(vec!["A"])),
                    Arc::new(StringArray::from(vec!["X"])),
                    Arc::new(StringArray::from(vec!["c1"])),
                    Arc::new(StringArray::from(vec!["micro"])),
                ],
            )
            .unwrap(),
        );

        let partial = Arc::new(Schema::new(vec![
            Field::new("country", DataType::Utf8, true),
            Field::new("state", DataType::Utf8, true),
        ]));
        write_file(
            &dir.path().join("B/Y/part-0.parquet"),
            RecordBatch::try_new(
                partial,
                vec![
                    Arc::new(StringArray::from(vec!["B"])),
                    Arc::new(StringArray::from(vec!["Y"])),
                ],
            )
            .unwrap(),
        );

        let batch = load_silver(dir.path()).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 4);

        let country = string_values(string_column(&batch, "country").unwrap());
        assert_eq!(country, vec![Some("A".to_string()), Some("B".to_string())]);
        let kind = string_values(string_column(&batch, "brewery_type").unwrap());
        assert_eq!(kind, vec![Some("micro".to_string()), None]);
    }

    #[test]
    fn empty_root_is_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_silver(dir.path()).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)));
    }
}
