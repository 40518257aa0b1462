pub mod source;
pub mod storage;
pub mod transform;

use chrono::NaiveDate;
use common::paths::LayerPaths;
use common::Result;
use etl::Record;
use std::path::{Path, PathBuf};
use tracing::info;

use storage::PartitionWriter;

pub struct SilverProcessor {
    paths: LayerPaths,
}

impl SilverProcessor {
    pub fn new(paths: LayerPaths) -> Self {
        Self { paths }
    }

    /// Builds the silver partitions for `ingestion_date` from every bronze
    /// file landed for that date.
    pub fn process_to_silver(&self, ingestion_date: NaiveDate) -> Result<PathBuf> {
        let bronze_dir = self.paths.bronze_dir(ingestion_date);
        let out_dir = self.paths.silver_dir(ingestion_date);
        info!(source = %bronze_dir.display(), target = %out_dir.display(), "Silver: loading bronze");

        let records = source::load_bronze_records(&bronze_dir)?;
        self.normalize_and_write(records, &out_dir, ingestion_date)
    }

    pub fn normalize_and_write(
        &self,
        records: Vec<Record>,
        out_dir: &Path,
        ingestion_date: NaiveDate,
    ) -> Result<PathBuf> {
        let records = transform::normalize_fields(records)?;
        let schema = transform::infer_silver_schema(&records)?;

        let written = PartitionWriter::new(schema, ingestion_date).write_partitioned(&records, out_dir)?;

        info!(
            rows = records.len(),
            partitions = written.len(),
            path = %out_dir.display(),
            "Silver: partitions written"
        );
        Ok(out_dir.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::parquet::read_parquet;
    use arrow::array::{Array, StringArray};
    use serde_json::{json, Value};
    use std::fs;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn records(values: Vec<Value>) -> Vec<Record> {
        values.into_iter().map(|v| v.as_object().cloned().unwrap()).collect()
    }

    fn column(path: &Path, name: &str) -> Vec<Option<String>> {
        let batches = read_parquet(path).unwrap();
        batches
            .iter()
            .flat_map(|b| {
                let col = b
                    .column_by_name(name)
                    .unwrap()
                    .as_any()
                    .downcast_ref::<StringArray>()
                    .unwrap()
                    .clone();
                (0..col.len())
                    .map(|i| (!col.is_null(i)).then(|| col.value(i).to_string()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    #[test]
    fn partitions_by_country_and_state() {
        let dir = tempfile::tempdir().unwrap();
        let processor = SilverProcessor::new(LayerPaths::new(dir.path()));
        let out = dir.path().join("silver_out");

        let input = records(vec![
            json!({"id": "1", "name": " Alpha ", "country": "United States", "state": "Texas", "city": "Austin", "brewery_type": "micro"}),
            json!({"id": "2", "name": "Beta", "country": "Portugal", "state": "Lisboa", "city": null, "brewery_type": "brewpub"}),
            json!({"id": "3", "name": "Gamma", "country": "United States", "state": "Texas", "city": "Dallas", "brewery_type": "large"}),
        ]);

        let result = processor.normalize_and_write(input, &out, date()).unwrap();
        assert_eq!(result, out);

        let texas = out.join("United States/Texas/part-0.parquet");
        let lisboa = out.join("Portugal/Lisboa/part-0.parquet");
        assert!(texas.exists());
        assert!(lisboa.exists());

        assert_eq!(
            column(&texas, "city"),
            vec![Some("Austin".to_string()), Some("Dallas".to_string())]
        );
        assert_eq!(column(&texas, "name")[0], Some("Alpha".to_string()));
        assert_eq!(column(&lisboa, "city"), vec![Some(String::new())]);
    }

    #[test]
    fn sanitized_partitions_keep_original_values() {
        let dir = tempfile::tempdir().unwrap();
        let processor = SilverProcessor::new(LayerPaths::new(dir.path()));
        let out = dir.path().join("silver_out");

        let input = records(vec![
            json!({"country": "Bosnia/Herzegovina", "state": "", "brewery_type": "micro"}),
        ]);
        processor.normalize_and_write(input, &out, date()).unwrap();

        let path = out.join("Bosnia_Herzegovina/unknown/part-0.parquet");
        assert_eq!(column(&path, "country"), vec![Some("Bosnia/Herzegovina".to_string())]);
        assert_eq!(column(&path, "state"), vec![Some(String::new())]);
    }

    #[test]
    fn rerun_overwrites_partition_file() {
        let dir = tempfile::tempdir().unwrap();
        let processor = SilverProcessor::new(LayerPaths::new(dir.path()));
        let out = dir.path().join("silver_out");

        let first = records(vec![
            json!({"country": "Portugal", "state": "Lisboa", "city": "Lisboa"}),
            json!({"country": "Portugal", "state": "Lisboa", "city": "Sintra"}),
        ]);
        processor.normalize_and_write(first, &out, date()).unwrap();

        let second = records(vec![json!({"country": "Portugal", "state": "Lisboa", "city": "Cascais"})]);
        processor.normalize_and_write(second, &out, date()).unwrap();

        let path = out.join("Portugal/Lisboa/part-0.parquet");
        assert_eq!(column(&path, "city"), vec![Some("Cascais".to_string())]);
    }

    #[test]
    fn process_to_silver_reads_bronze_for_the_date() {
        let dir = tempfile::tempdir().unwrap();
        let paths = LayerPaths::new(dir.path());
        let bronze = paths.bronze_dir(date());
        fs::create_dir_all(&bronze).unwrap();
        fs::write(
            bronze.join("breweries_120000000.jsonl"),
            "{\"country\":\"Ireland\",\"state\":\"Dublin\",\"brewery_type\":\"micro\"}\n",
        )
        .unwrap();

        let out = SilverProcessor::new(paths.clone()).process_to_silver(date()).unwrap();

        assert_eq!(out, paths.silver_dir(date()));
        assert!(out.join("Ireland/Dublin/part-0.parquet").exists());
    }

    #[test]
    fn missing_bronze_is_source_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = SilverProcessor::new(LayerPaths::new(dir.path()))
            .process_to_silver(date())
            .unwrap_err();
        assert!(matches!(err, common::Error::SourceNotFound(_)));
    }
}
